//! Domain models for para-cli
//!
//! Pure path, validation and naming logic without any I/O concerns.

pub mod path;
mod category;
mod validate;
mod destination;
mod sort;

pub use category::{ArchivableItem, Category, CategoryError, RootConfig};
pub use validate::{
    validate_named_roots, validate_root_set, validate_single_field_change, ConflictKind,
    ConflictReport,
};
pub use destination::{
    archived_label, generate_destination, ExistingNames, NamingError, MAX_COLLISION_ATTEMPTS,
};
pub use sort::{
    compare_by_recency, extract_date_prefix_format, format_item_name, parse_name_date,
    sort_items, sort_key_for, KeySource, ListedItem, NameFormatError, SortKey, SortOrder,
    NAME_TOKEN,
};

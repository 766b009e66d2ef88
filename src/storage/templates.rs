//! Initial content for newly created items
//!
//! Templates are plain markdown files in `.para/templates/{id}.md`.
//! `{name}` and `{date}` are substituted; nothing else is interpreted.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

/// Produces the index document for a new item
pub trait ContentRenderer {
    fn render_initial_content(&self, name: &str, template_id: Option<&str>) -> Result<String>;
}

/// Renders templates from a directory of markdown files
pub struct TemplateRenderer {
    dir: PathBuf,
    date: NaiveDate,
}

impl TemplateRenderer {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            date: Local::now().date_naive(),
        }
    }

    /// Overrides the date used for `{date}`
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    fn template_path(&self, id: &str) -> Result<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.starts_with('.') {
            anyhow::bail!("Invalid template name: '{}'", id);
        }
        Ok(self.dir.join(format!("{}.md", id)))
    }
}

impl ContentRenderer for TemplateRenderer {
    fn render_initial_content(&self, name: &str, template_id: Option<&str>) -> Result<String> {
        let Some(id) = template_id else {
            return Ok(format!("# {}\n", name));
        };

        let path = self.template_path(id)?;
        let template = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read template: {}", path.display()))?;

        Ok(template
            .replace("{name}", name)
            .replace("{date}", &self.date.format("%Y-%m-%d").to_string()))
    }
}

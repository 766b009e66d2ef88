//! para - Local-first PARA folder organizer

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = para_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

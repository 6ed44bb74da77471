//! Pretty-printing diagnostics to the console

use colored::Colorize;
use std::fmt;

/// Pretty-print a fatal diagnostic to stderr
pub fn error(message: impl fmt::Display) {
    let error_title = "error:".red().bold();
    eprintln!("{} {}", error_title, message);
}

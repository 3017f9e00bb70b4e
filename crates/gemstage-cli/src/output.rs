//! Terminal output helpers.
//!
//! Status lines go to stderr so stdout stays machine-readable.

use console::style;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress everything except errors.
pub fn init(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// Print an error message.
pub fn error(message: &str) {
    eprintln!("{} {message}", style("error:").red().bold());
}

/// Print a success message.
pub fn success(message: &str) {
    if !quiet() {
        eprintln!("{} {message}", style("✓").green().bold());
    }
}

/// Print a progress message.
pub fn step(message: &str) {
    if !quiet() {
        eprintln!("{} {message}", style("→").cyan());
    }
}

/// Print a labelled value.
pub fn field(label: &str, value: impl std::fmt::Display) {
    if !quiet() {
        eprintln!("  {} {value}", style(format!("{label}:")).dim());
    }
}

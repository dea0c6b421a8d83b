//! Terminal output utilities

use brokkr_core::AggregateError;
use console::style;

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

/// Print a warning message
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

/// Print a header
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// Print every problem of a failed resolution, grouped under its component
pub fn aggregate(err: &AggregateError) {
    error(&format!("{} error(s) occurred:", err.len()));
    let mut current: Option<&str> = None;
    for e in err.errors() {
        if current != Some(e.component.as_str()) {
            eprintln!("  {}", style(&e.component).bold());
            current = Some(&e.component);
        }
        eprintln!("    {} {}", style("*").red(), e.error);
    }
}

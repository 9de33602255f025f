//! Output formatting for CLI results

use crate::cli::OutputFormat;
use credkeeper::error::Result;

pub mod json;
pub mod session;
pub mod table;

pub use session::SessionSummary;

/// Trait for types that can be formatted for output
pub trait Formattable {
    /// Format the data according to the specified format
    fn format(&self, format: OutputFormat) -> Result<String>;
}

/// Format and print data to stdout
pub fn print<T: Formattable>(data: &T, format: OutputFormat) -> Result<()> {
    let output = data.format(format)?;
    println!("{}", output);
    Ok(())
}

#[cfg(feature = "csv")]
pub mod csv;
#[cfg(feature = "json")]
pub mod json;

#[cfg(feature = "csv")]
pub use csv::CsvAdapter;
#[cfg(feature = "json")]
pub use json::JsonAdapter;

use std::io::Write;
use std::path::Path;

/// Where a backend should write its serialized workbook.
pub enum SaveDestination<'a> {
    /// Back to the path the adapter was opened from.
    InPlace,
    Path(&'a Path),
    Writer(&'a mut dyn Write),
    /// Return the serialized bytes to the caller.
    Bytes,
}

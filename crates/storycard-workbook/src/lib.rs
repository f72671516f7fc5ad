//! Spreadsheet host for Story Cards.
//!
//! [`Workbook`] is the in-memory implementation of the [`SheetReader`] and
//! [`SheetWriter`] traits the card engine runs against. The JSON backend
//! persists whole workbooks including geometry; the CSV backend loads a single
//! table of values into a sheet.

pub mod backends;
pub mod error;
pub mod formula;
pub mod traits;
pub mod workbook;

pub use backends::SaveDestination;
#[cfg(feature = "csv")]
pub use backends::CsvAdapter;
#[cfg(feature = "csv")]
pub use backends::csv::{CsvReadOptions, CsvTrim, CsvTypeInference};
#[cfg(feature = "json")]
pub use backends::JsonAdapter;
pub use error::IoError;
pub use formula::shift_formula;
pub use traits::{CellData, SheetHost, SheetReader, SheetWriter, StyleId};
pub use workbook::{Sheet, Workbook, WorkbookConfig};

pub use storycard_common::{CellRef, LiteralValue, RangeAddress};

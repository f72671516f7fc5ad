//! The table interface the card engine runs against.
//!
//! A host exposes sheets addressed by name with 1-based rows and columns. The
//! reader half covers everything the record extractor and the template
//! descriptor consume; the writer half covers what the output preparer and the
//! compositor mutate.

use storycard_common::{LiteralValue, RangeAddress};

pub type StyleId = u32;

/// Contents of a single cell: value, formula text and an opaque style id.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CellData {
    pub value: Option<LiteralValue>,
    pub formula: Option<String>,
    pub style: Option<StyleId>,
}

impl CellData {
    pub fn from_value(value: impl Into<LiteralValue>) -> Self {
        Self {
            value: Some(value.into()),
            formula: None,
            style: None,
        }
    }

    pub fn from_formula(formula: impl Into<String>) -> Self {
        Self {
            value: None,
            formula: Some(formula.into()),
            style: None,
        }
    }

    pub fn with_style(mut self, style: StyleId) -> Self {
        self.style = Some(style);
        self
    }

    /// A cell has content when it holds a non-empty value or any formula.
    /// Style-only cells do not extend a sheet's populated bounds.
    pub fn has_content(&self) -> bool {
        self.formula.as_ref().is_some_and(|f| !f.is_empty())
            || self.value.as_ref().is_some_and(|v| !v.is_blank())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_content() && self.style.is_none()
    }
}

/// Read access to a host's sheets.
pub trait SheetReader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Sheet names in tab order.
    fn sheet_names(&self) -> Vec<String>;

    fn has_sheet(&self, name: &str) -> bool {
        self.sheet_names().iter().any(|s| s == name)
    }

    /// Last populated (row, column), or `None` for a sheet without content.
    fn sheet_bounds(&self, sheet: &str) -> Result<Option<(u32, u32)>, Self::Error>;

    /// Number of rows the sheet currently has, populated or not.
    fn max_rows(&self, sheet: &str) -> Result<u32, Self::Error>;

    fn read_cell(&self, sheet: &str, row: u32, col: u32) -> Result<Option<CellData>, Self::Error>;

    /// Values of `range` as rows of columns; blank cells read as `Empty`.
    fn read_values(&self, range: &RangeAddress) -> Result<Vec<Vec<LiteralValue>>, Self::Error>;

    fn column_width(&self, sheet: &str, col: u32) -> Result<f64, Self::Error>;

    fn row_height(&self, sheet: &str, row: u32) -> Result<f64, Self::Error>;
}

/// Mutating access to a host's sheets.
pub trait SheetWriter: SheetReader {
    /// Insert an empty sheet at tab position `index` (clamped to the sheet count).
    fn create_sheet(&mut self, name: &str, index: usize) -> Result<(), Self::Error>;

    /// Remove all content and formatting. Row count and dimensions stay.
    fn clear_sheet(&mut self, sheet: &str) -> Result<(), Self::Error>;

    fn write_cell(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        data: CellData,
    ) -> Result<(), Self::Error>;

    /// Replace the value (and any formula) of a cell, keeping its formatting.
    fn set_value(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        value: LiteralValue,
    ) -> Result<(), Self::Error>;

    fn set_column_width(&mut self, sheet: &str, col: u32, width: f64) -> Result<(), Self::Error>;

    fn set_row_height(&mut self, sheet: &str, row: u32, height: f64) -> Result<(), Self::Error>;

    /// Insert `count` empty rows before row `before`, shifting existing rows down.
    fn insert_rows(&mut self, sheet: &str, before: u32, count: u32) -> Result<(), Self::Error>;

    /// Copy values, formulas and formatting of `source` onto `dest`, which must
    /// have the same shape. Relative references in copied formulas move with
    /// the copy.
    fn copy_range(&mut self, source: &RangeAddress, dest: &RangeAddress)
    -> Result<(), Self::Error>;
}

/// A host that can be both read and written; what the card engine needs.
pub trait SheetHost: SheetWriter {}

impl<T: SheetWriter + ?Sized> SheetHost for T {}

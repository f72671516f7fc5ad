use core::fmt;
use std::error::Error;

use crate::coord::{A1ParseError, CellRef, CoordError, column_to_letters};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Errors that can occur while constructing a range address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RangeError {
    /// Encountered a 0 where a 1-based index was expected.
    ZeroIndex,
    /// Start/end coordinates were not ordered (start <= end).
    RangeOrder,
    /// Textual range was not of the form `<cell>:<cell>`.
    MissingSeparator(String),
    Parse(A1ParseError),
    Coord(CoordError),
}

impl fmt::Display for RangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeError::ZeroIndex => write!(f, "row and column indices must be 1-based"),
            RangeError::RangeOrder => {
                write!(
                    f,
                    "range must be ordered so the start is above/left of the end"
                )
            }
            RangeError::MissingSeparator(s) => {
                write!(f, "`{s}` is not a range of the form `A1:F10`")
            }
            RangeError::Parse(err) => err.fmt(f),
            RangeError::Coord(err) => err.fmt(f),
        }
    }
}

impl Error for RangeError {}

impl From<A1ParseError> for RangeError {
    fn from(value: A1ParseError) -> Self {
        RangeError::Parse(value)
    }
}

impl From<CoordError> for RangeError {
    fn from(value: CoordError) -> Self {
        RangeError::Coord(value)
    }
}

/// Inclusive, 1-based rectangular range on a named sheet.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RangeAddress {
    pub sheet: String,
    pub start_row: u32,
    pub start_col: u32,
    pub end_row: u32,
    pub end_col: u32,
}

impl RangeAddress {
    pub fn new(
        sheet: impl Into<String>,
        start_row: u32,
        start_col: u32,
        end_row: u32,
        end_col: u32,
    ) -> Result<Self, RangeError> {
        if start_row == 0 || start_col == 0 || end_row == 0 || end_col == 0 {
            return Err(RangeError::ZeroIndex);
        }
        if start_row > end_row || start_col > end_col {
            return Err(RangeError::RangeOrder);
        }
        Ok(Self {
            sheet: sheet.into(),
            start_row,
            start_col,
            end_row,
            end_col,
        })
    }

    /// Parse `"<Col><Row>:<Col><Row>"` (e.g. `A1:F10`) for `sheet`.
    ///
    /// Each endpoint is tokenized independently, so `AA1:AB120` is as valid as
    /// `A1:F10`. A single cell (`B2`) is accepted as a 1x1 range.
    pub fn parse_a1(sheet: impl Into<String>, area: &str) -> Result<Self, RangeError> {
        let area = area.trim();
        let (start, end) = match area.split_once(':') {
            Some((start, end)) => (CellRef::try_from_a1(start)?, CellRef::try_from_a1(end)?),
            None if !area.is_empty() => {
                let cell = CellRef::try_from_a1(area)?;
                (cell, cell)
            }
            None => return Err(RangeError::MissingSeparator(area.to_string())),
        };
        Self::new(sheet, start.row(), start.col(), end.row(), end.col())
    }

    pub fn width(&self) -> u32 {
        self.end_col - self.start_col + 1
    }

    pub fn height(&self) -> u32 {
        self.end_row - self.start_row + 1
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.start_row && row <= self.end_row && col >= self.start_col && col <= self.end_col
    }

    /// Same shape moved down by `rows` rows.
    pub fn shifted_down(&self, rows: u32) -> Result<Self, RangeError> {
        let start = CellRef::new(self.start_row, self.start_col)?.offset(rows as i64, 0)?;
        let end = CellRef::new(self.end_row, self.end_col)?.offset(rows as i64, 0)?;
        Self::new(
            self.sheet.clone(),
            start.row(),
            start.col(),
            end.row(),
            end.col(),
        )
    }

    /// Same bounds on another sheet.
    pub fn on_sheet(&self, sheet: impl Into<String>) -> Self {
        Self {
            sheet: sheet.into(),
            ..self.clone()
        }
    }

    /// Sheet-less A1 text, e.g. `A1:F10`.
    pub fn to_a1(&self) -> String {
        format!(
            "{}{}:{}{}",
            column_to_letters(self.start_col),
            self.start_row,
            column_to_letters(self.end_col),
            self.end_row
        )
    }
}

impl fmt::Display for RangeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sheet.contains(|c: char| !c.is_ascii_alphanumeric() && c != '_') {
            write!(f, "'{}'!{}", self.sheet.replace('\'', "''"), self.to_a1())
        } else {
            write!(f, "{}!{}", self.sheet, self.to_a1())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_validates_order_and_base() {
        assert_eq!(
            RangeAddress::new("Sheet1", 0, 1, 1, 1).unwrap_err(),
            RangeError::ZeroIndex
        );
        assert_eq!(
            RangeAddress::new("Sheet1", 3, 1, 2, 1).unwrap_err(),
            RangeError::RangeOrder
        );
        let range = RangeAddress::new("Sheet1", 1, 1, 3, 4).unwrap();
        assert_eq!(range.width(), 4);
        assert_eq!(range.height(), 3);
    }

    #[test]
    fn parse_template_area() {
        let range = RangeAddress::parse_a1("Template", "A1:F10").unwrap();
        assert_eq!(
            (range.start_row, range.start_col, range.end_row, range.end_col),
            (1, 1, 10, 6)
        );
        assert_eq!(range.to_a1(), "A1:F10");
        assert_eq!(range.to_string(), "Template!A1:F10");
    }

    #[test]
    fn parse_multi_character_bounds() {
        let range = RangeAddress::parse_a1("S", "B12:AA140").unwrap();
        assert_eq!(range.start_row, 12);
        assert_eq!(range.end_row, 140);
        assert_eq!(range.end_col, 27);
        assert_eq!(range.height(), 129);
    }

    #[test]
    fn parse_rejects_inverted_and_malformed() {
        assert_eq!(
            RangeAddress::parse_a1("S", "F10:A1").unwrap_err(),
            RangeError::RangeOrder
        );
        assert!(matches!(
            RangeAddress::parse_a1("S", "A1:"),
            Err(RangeError::Parse(A1ParseError::Empty))
        ));
        assert!(matches!(
            RangeAddress::parse_a1("S", ""),
            Err(RangeError::MissingSeparator(_))
        ));
    }

    #[test]
    fn shifted_down_keeps_columns() {
        let range = RangeAddress::parse_a1("Cards", "A1:F10").unwrap();
        let moved = range.shifted_down(20).unwrap();
        assert_eq!(moved.to_a1(), "A21:F30");
        assert!(moved.contains(25, 6));
        assert!(!moved.contains(20, 1));
    }

    #[test]
    fn display_quotes_sheet_names() {
        let range = RangeAddress::new("User story", 1, 1, 1, 1).unwrap();
        assert_eq!(range.to_string(), "'User story'!A1:A1");
    }
}

//! A1-style cell coordinates shared by the template parser, the workbook and
//! formula reference shifting.
//!
//! Every coordinate in this workspace is 1-based, matching the row and column
//! numbers a spreadsheet user sees. `CellRef` also carries the `$` anchor flags
//! so that `$A$1` survives a round-trip and can be kept fixed when a formula is
//! copied to another place.

use core::fmt;
use std::error::Error;

/// Largest addressable row (Excel/Sheets limit).
pub const MAX_ROWS: u32 = 1_048_576;
/// Largest addressable column (`XFD`).
pub const MAX_COLS: u32 = 16_384;

/// Errors returned when constructing coordinates from unchecked inputs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoordError {
    /// Row or column 0 (or an offset that moved the cell above/left of row/column 1).
    ZeroIndex,
    RowOverflow(i64),
    ColOverflow(i64),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::ZeroIndex => write!(f, "row and column indices must be 1-based (>= 1)"),
            CoordError::RowOverflow(row) => write!(f, "row {row} exceeds {MAX_ROWS}"),
            CoordError::ColOverflow(col) => write!(f, "col {col} exceeds {MAX_COLS}"),
        }
    }
}

impl Error for CoordError {}

/// Errors produced while tokenizing an A1 reference such as `B12` or `$AA$3`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum A1ParseError {
    Empty,
    MissingColumn(String),
    MissingRow(String),
    InvalidRow(String),
    Coord(CoordError),
}

impl fmt::Display for A1ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            A1ParseError::Empty => write!(f, "empty cell reference"),
            A1ParseError::MissingColumn(s) => write!(f, "`{s}` has no column letters"),
            A1ParseError::MissingRow(s) => write!(f, "`{s}` has no row number"),
            A1ParseError::InvalidRow(s) => write!(f, "`{s}` has an invalid row number"),
            A1ParseError::Coord(err) => err.fmt(f),
        }
    }
}

impl Error for A1ParseError {}

impl From<CoordError> for A1ParseError {
    fn from(value: CoordError) -> Self {
        A1ParseError::Coord(value)
    }
}

/// 1-based cell position with `$` anchor flags.
///
/// * `row_abs = true` keeps the row fixed during [`CellRef::rebase`].
/// * `col_abs = true` keeps the column fixed during [`CellRef::rebase`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CellRef {
    row: u32,
    col: u32,
    row_abs: bool,
    col_abs: bool,
}

impl CellRef {
    /// Relative reference to (`row`, `col`).
    pub fn new(row: u32, col: u32) -> Result<Self, CoordError> {
        Self::anchored(row, col, false, false)
    }

    pub fn anchored(row: u32, col: u32, row_abs: bool, col_abs: bool) -> Result<Self, CoordError> {
        check_row(row as i64)?;
        check_col(col as i64)?;
        Ok(Self {
            row,
            col,
            row_abs,
            col_abs,
        })
    }

    /// Parse an A1 reference. Column letters are case-insensitive; the row is
    /// everything after the letters, so multi-letter columns and multi-digit
    /// rows are both accepted.
    pub fn try_from_a1(reference: &str) -> Result<Self, A1ParseError> {
        let s = reference.trim();
        if s.is_empty() {
            return Err(A1ParseError::Empty);
        }

        let (col_abs, rest) = match s.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let split = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (letters, rest) = rest.split_at(split);
        if letters.is_empty() {
            return Err(A1ParseError::MissingColumn(s.to_string()));
        }

        let (row_abs, digits) = match rest.strip_prefix('$') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };
        if digits.is_empty() {
            return Err(A1ParseError::MissingRow(s.to_string()));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(A1ParseError::InvalidRow(s.to_string()));
        }

        let col = letters_to_column(&letters.to_ascii_uppercase())
            .ok_or(CoordError::ColOverflow(i64::MAX))?;
        let row: u32 = digits
            .parse()
            .map_err(|_| CoordError::RowOverflow(i64::MAX))?;
        Ok(Self::anchored(row, col, row_abs, col_abs)?)
    }

    #[inline]
    pub fn row(self) -> u32 {
        self.row
    }

    #[inline]
    pub fn col(self) -> u32 {
        self.col
    }

    #[inline]
    pub fn row_abs(self) -> bool {
        self.row_abs
    }

    #[inline]
    pub fn col_abs(self) -> bool {
        self.col_abs
    }

    /// Offset by signed deltas, ignoring anchor flags.
    pub fn offset(self, drow: i64, dcol: i64) -> Result<Self, CoordError> {
        let row = check_row(self.row as i64 + drow)?;
        let col = check_col(self.col as i64 + dcol)?;
        Ok(Self { row, col, ..self })
    }

    /// Move the reference as if the formula holding it moved by (`drow`, `dcol`).
    /// Anchored axes stay where they are.
    pub fn rebase(self, drow: i64, dcol: i64) -> Result<Self, CoordError> {
        let drow = if self.row_abs { 0 } else { drow };
        let dcol = if self.col_abs { 0 } else { dcol };
        self.offset(drow, dcol)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.col_abs {
            write!(f, "$")?;
        }
        write!(f, "{}", column_to_letters(self.col))?;
        if self.row_abs {
            write!(f, "$")?;
        }
        write!(f, "{}", self.row)
    }
}

fn check_row(row: i64) -> Result<u32, CoordError> {
    if row < 1 {
        return Err(CoordError::ZeroIndex);
    }
    if row > MAX_ROWS as i64 {
        return Err(CoordError::RowOverflow(row));
    }
    Ok(row as u32)
}

fn check_col(col: i64) -> Result<u32, CoordError> {
    if col < 1 {
        return Err(CoordError::ZeroIndex);
    }
    if col > MAX_COLS as i64 {
        return Err(CoordError::ColOverflow(col));
    }
    Ok(col as u32)
}

/// `1 -> "A"`, `27 -> "AA"`. Column 0 renders as an empty string.
pub fn column_to_letters(mut col: u32) -> String {
    let mut buf = Vec::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        buf.push((b'A' + rem) as char);
        col = (col - 1) / 26;
    }
    buf.iter().rev().collect()
}

/// `"A" -> 1`, `"AA" -> 27`. Only uppercase ASCII letters are accepted.
pub fn letters_to_column(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for ch in s.bytes() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        col = col.checked_mul(26)?.checked_add((ch - b'A') as u32 + 1)?;
    }
    Some(col)
}

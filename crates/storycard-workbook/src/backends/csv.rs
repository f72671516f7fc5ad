use crate::error::IoError;
use crate::traits::{CellData, SheetReader};
use crate::workbook::Workbook;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;
use storycard_common::{LiteralValue, RangeAddress};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CsvTrim {
    #[default]
    None,
    All,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CsvTypeInference {
    /// Treat all non-empty fields as text.
    Off,
    /// Infer booleans and numbers when unambiguous.
    #[default]
    Basic,
    /// Like `Basic`, plus ISO date and date-time parsing.
    BasicWithDates,
}

#[derive(Clone, Debug)]
pub struct CsvReadOptions {
    /// Field delimiter as a single byte. Use `b'\t'` for TSV.
    pub delimiter: u8,
    /// When true the first record is a header row. Headers still land in
    /// row 1, but they are never type-inferred.
    pub has_headers: bool,
    pub trim: CsvTrim,
    pub type_inference: CsvTypeInference,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_headers: true,
            trim: CsvTrim::None,
            type_inference: CsvTypeInference::Basic,
        }
    }
}

/// A single CSV table held as sparse 1-based cells.
///
/// CSV carries values only, so loading into a workbook replaces the target
/// sheet's cells and leaves its geometry alone.
#[derive(Debug, Default)]
pub struct CsvAdapter {
    options: CsvReadOptions,
    cells: BTreeMap<(u32, u32), LiteralValue>,
    rows: u32,
    cols: u32,
}

impl CsvAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CsvReadOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        Self::open_path_with_options(path, CsvReadOptions::default())
    }

    pub fn open_path_with_options<P: AsRef<Path>>(
        path: P,
        options: CsvReadOptions,
    ) -> Result<Self, IoError> {
        let file = File::open(path.as_ref())?;
        let mut adapter = Self::with_options(options);
        adapter.read_from(BufReader::new(file))?;
        Ok(adapter)
    }

    pub fn open_reader(reader: impl Read, options: CsvReadOptions) -> Result<Self, IoError> {
        let mut adapter = Self::with_options(options);
        adapter.read_from(reader)?;
        Ok(adapter)
    }

    pub fn open_bytes(bytes: &[u8], options: CsvReadOptions) -> Result<Self, IoError> {
        Self::open_reader(bytes, options)
    }

    /// Populated extent as (rows, cols); `None` when nothing was read.
    pub fn bounds(&self) -> Option<(u32, u32)> {
        if self.rows == 0 || self.cols == 0 {
            None
        } else {
            Some((self.rows, self.cols))
        }
    }

    pub fn value(&self, row: u32, col: u32) -> Option<&LiteralValue> {
        self.cells.get(&(row, col))
    }

    fn read_from(&mut self, reader: impl Read) -> Result<(), IoError> {
        let mut rb = csv::ReaderBuilder::new();
        rb.delimiter(self.options.delimiter)
            .has_headers(self.options.has_headers)
            .flexible(true);
        match self.options.trim {
            CsvTrim::None => rb.trim(csv::Trim::None),
            CsvTrim::All => rb.trim(csv::Trim::All),
        };

        let mut rdr = rb.from_reader(reader);
        self.cells.clear();
        self.rows = 0;
        self.cols = 0;

        let mut row: u32 = 1;
        if self.options.has_headers {
            let headers = rdr
                .headers()
                .map_err(|e| IoError::from_backend("csv", e))?
                .clone();
            self.ingest(row, headers.iter(), CsvTypeInference::Off);
            row += 1;
        }
        for rec in rdr.records() {
            let rec = rec.map_err(|e| IoError::from_backend("csv", e))?;
            self.ingest(row, rec.iter(), self.options.type_inference);
            row += 1;
        }
        Ok(())
    }

    fn ingest<'a>(&mut self, row: u32, fields: impl Iterator<Item = &'a str>, mode: CsvTypeInference) {
        let mut width = 0;
        for (ci, field) in fields.enumerate() {
            let col = ci as u32 + 1;
            width = col;
            if let Some(v) = infer_field(field, mode) {
                self.cells.insert((row, col), v);
            }
        }
        self.rows = self.rows.max(row);
        self.cols = self.cols.max(width);
    }

    /// Replace the contents of `sheet` with this table, creating the sheet
    /// at the end of the tab order when it does not exist yet.
    pub fn load_into(&self, workbook: &mut Workbook, sheet: &str) -> Result<(), IoError> {
        if workbook.sheet(sheet).is_none() {
            workbook.add_sheet(sheet)?;
        }
        let target = workbook
            .sheet_mut(sheet)
            .ok_or_else(|| IoError::SheetNotFound(sheet.to_string()))?;
        target.cells.clear();
        let rows = target.max_rows().max(self.rows);
        let cols = target.max_cols().max(self.cols);
        target.set_dimensions(rows, cols);
        for (&(r, c), v) in &self.cells {
            target.put(r, c, CellData::from_value(v.clone()));
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(sheet, rows = self.rows, cols = self.cols, "loaded csv");
        Ok(())
    }
}

/// Write the populated extent of a workbook sheet as CSV values.
pub fn write_sheet_csv<W: Write>(
    workbook: &Workbook,
    sheet: &str,
    writer: W,
) -> Result<(), IoError> {
    let mut wtr = csv::WriterBuilder::new().flexible(false).from_writer(writer);
    if let Some((rows, cols)) = workbook.sheet_bounds(sheet)? {
        let range = RangeAddress::new(sheet, 1, 1, rows, cols)?;
        for row in workbook.read_values(&range)? {
            let fields: Vec<String> = row.iter().map(literal_to_field).collect();
            wtr.write_record(&fields)
                .map_err(|e| IoError::from_backend("csv", e))?;
        }
    }
    wtr.flush()?;
    Ok(())
}

fn literal_to_field(v: &LiteralValue) -> String {
    match v {
        LiteralValue::Empty => String::new(),
        LiteralValue::Boolean(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        LiteralValue::Date(d) => d.format("%Y-%m-%d").to_string(),
        LiteralValue::DateTime(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        other => other.to_string(),
    }
}

fn infer_field(field: &str, mode: CsvTypeInference) -> Option<LiteralValue> {
    if field.is_empty() {
        return None;
    }
    if mode == CsvTypeInference::Off {
        return Some(LiteralValue::Text(field.to_string()));
    }

    if let Some(b) = parse_bool(field) {
        return Some(LiteralValue::Boolean(b));
    }
    if let Some(i) = parse_unambiguous_i64(field) {
        return Some(LiteralValue::Int(i));
    }
    if let Some(n) = parse_unambiguous_f64(field) {
        return Some(LiteralValue::Number(n));
    }
    if mode == CsvTypeInference::BasicWithDates {
        if let Some(d) = parse_date(field) {
            return Some(LiteralValue::Date(d));
        }
        if let Some(dt) = parse_datetime(field) {
            return Some(LiteralValue::DateTime(dt));
        }
    }
    Some(LiteralValue::Text(field.to_string()))
}

fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn parse_unambiguous_i64(s: &str) -> Option<i64> {
    // Leading zeros stay text: "007" is an id, not seven.
    let (negative, digits) = match s.as_bytes().first()? {
        b'+' => (false, &s[1..]),
        b'-' => (true, &s[1..]),
        _ => (false, s),
    };
    if digits.is_empty() || (digits.len() > 1 && digits.starts_with('0')) {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let parsed: i64 = digits.parse().ok()?;
    Some(if negative { -parsed } else { parsed })
}

fn parse_unambiguous_f64(s: &str) -> Option<f64> {
    if !(s.contains('.') || s.contains('e') || s.contains('E')) {
        return None;
    }
    let unsigned = s.trim_start_matches(['+', '-']);
    if unsigned.len() > 1 && unsigned.starts_with('0') && !unsigned.starts_with("0.") {
        return None;
    }
    let n: f64 = s.parse().ok()?;
    n.is_finite().then_some(n)
}

fn parse_date(s: &str) -> Option<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_datetime(s: &str) -> Option<chrono::NaiveDateTime> {
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

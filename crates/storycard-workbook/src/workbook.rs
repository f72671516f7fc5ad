use crate::error::IoError;
use crate::formula::shift_formula;
use crate::traits::{CellData, SheetReader, SheetWriter};
use std::collections::BTreeMap;
use storycard_common::{LiteralValue, RangeAddress};

pub const DEFAULT_ROWS: u32 = 1000;
pub const DEFAULT_COLS: u32 = 26;
pub const DEFAULT_COLUMN_WIDTH: f64 = 100.0;
pub const DEFAULT_ROW_HEIGHT: f64 = 21.0;

/// Geometry given to sheets created without explicit dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct WorkbookConfig {
    pub default_rows: u32,
    pub default_cols: u32,
    pub default_column_width: f64,
    pub default_row_height: f64,
}

impl Default for WorkbookConfig {
    fn default() -> Self {
        Self {
            default_rows: DEFAULT_ROWS,
            default_cols: DEFAULT_COLS,
            default_column_width: DEFAULT_COLUMN_WIDTH,
            default_row_height: DEFAULT_ROW_HEIGHT,
        }
    }
}

impl WorkbookConfig {
    /// Small sheets; handy for tests that care about row insertion.
    pub fn compact(rows: u32, cols: u32) -> Self {
        Self {
            default_rows: rows,
            default_cols: cols,
            ..Self::default()
        }
    }
}

/// One tab of a [`Workbook`].
#[derive(Clone, Debug, PartialEq)]
pub struct Sheet {
    pub(crate) name: String,
    pub(crate) cells: BTreeMap<(u32, u32), CellData>,
    pub(crate) column_widths: BTreeMap<u32, f64>,
    pub(crate) row_heights: BTreeMap<u32, f64>,
    pub(crate) max_rows: u32,
    pub(crate) max_cols: u32,
    default_column_width: f64,
    default_row_height: f64,
}

impl Sheet {
    pub fn new(name: impl Into<String>, config: &WorkbookConfig) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
            column_widths: BTreeMap::new(),
            row_heights: BTreeMap::new(),
            max_rows: config.default_rows,
            max_cols: config.default_cols,
            default_column_width: config.default_column_width,
            default_row_height: config.default_row_height,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_rows(&self) -> u32 {
        self.max_rows
    }

    pub fn max_cols(&self) -> u32 {
        self.max_cols
    }

    pub fn set_dimensions(&mut self, rows: u32, cols: u32) {
        self.max_rows = rows;
        self.max_cols = cols;
    }

    pub fn cells(&self) -> &BTreeMap<(u32, u32), CellData> {
        &self.cells
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&CellData> {
        self.cells.get(&(row, col))
    }

    /// Explicitly sized columns; unlisted columns use the default width.
    pub fn column_widths(&self) -> &BTreeMap<u32, f64> {
        &self.column_widths
    }

    /// Explicitly sized rows; unlisted rows use the default height.
    pub fn row_heights(&self) -> &BTreeMap<u32, f64> {
        &self.row_heights
    }

    pub fn column_width(&self, col: u32) -> f64 {
        self.column_widths
            .get(&col)
            .copied()
            .unwrap_or(self.default_column_width)
    }

    pub fn row_height(&self, row: u32) -> f64 {
        self.row_heights
            .get(&row)
            .copied()
            .unwrap_or(self.default_row_height)
    }

    /// Last (row, column) holding content.
    pub fn bounds(&self) -> Option<(u32, u32)> {
        self.cells
            .iter()
            .filter(|(_, cell)| cell.has_content())
            .fold(None, |acc, ((r, c), _)| match acc {
                None => Some((*r, *c)),
                Some((mr, mc)) => Some((mr.max(*r), mc.max(*c))),
            })
    }

    fn check_range(&self, range: &RangeAddress) -> Result<(), IoError> {
        if range.end_row > self.max_rows || range.end_col > self.max_cols {
            return Err(IoError::OutOfBounds {
                range: range.clone(),
                max_rows: self.max_rows,
                max_cols: self.max_cols,
            });
        }
        Ok(())
    }

    fn check_cell(&self, row: u32, col: u32) -> Result<(), IoError> {
        let range = RangeAddress::new(self.name.clone(), row, col, row, col)?;
        self.check_range(&range)
    }

    pub(crate) fn put(&mut self, row: u32, col: u32, data: CellData) {
        if data.is_empty() {
            self.cells.remove(&(row, col));
        } else {
            self.cells.insert((row, col), data);
        }
    }

    fn insert_rows(&mut self, before: u32, count: u32) {
        self.cells = std::mem::take(&mut self.cells)
            .into_iter()
            .map(|((r, c), d)| if r >= before { ((r + count, c), d) } else { ((r, c), d) })
            .collect();
        self.row_heights = std::mem::take(&mut self.row_heights)
            .into_iter()
            .map(|(r, h)| if r >= before { (r + count, h) } else { (r, h) })
            .collect();
        self.max_rows += count;
    }
}

/// In-memory spreadsheet implementing the host table interface.
///
/// Sheets keep their tab order, which matters when the engine recreates a
/// missing destination sheet at a fixed position.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Workbook {
    config: WorkbookConfig,
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new() -> Self {
        Self::new_with_config(WorkbookConfig::default())
    }

    pub fn new_with_config(config: WorkbookConfig) -> Self {
        Self {
            config,
            sheets: Vec::new(),
        }
    }

    pub fn config(&self) -> &WorkbookConfig {
        &self.config
    }

    /// Append a sheet at the end of the tab list.
    pub fn add_sheet(&mut self, name: &str) -> Result<&mut Sheet, IoError> {
        let index = self.sheets.len();
        self.insert_sheet(name, index)
    }

    pub fn insert_sheet(&mut self, name: &str, index: usize) -> Result<&mut Sheet, IoError> {
        if self.sheet(name).is_some() {
            return Err(IoError::SheetExists(name.to_string()));
        }
        let index = index.min(self.sheets.len());
        self.sheets.insert(index, Sheet::new(name, &self.config));
        Ok(&mut self.sheets[index])
    }

    /// Insert a fully built sheet, replacing any sheet with the same name in place.
    pub fn put_sheet(&mut self, sheet: Sheet) {
        match self.sheets.iter_mut().find(|s| s.name == sheet.name) {
            Some(slot) => *slot = sheet,
            None => self.sheets.push(sheet),
        }
    }

    pub fn delete_sheet(&mut self, name: &str) {
        self.sheets.retain(|s| s.name != name);
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    fn require(&self, name: &str) -> Result<&Sheet, IoError> {
        self.sheet(name)
            .ok_or_else(|| IoError::SheetNotFound(name.to_string()))
    }

    fn require_mut(&mut self, name: &str) -> Result<&mut Sheet, IoError> {
        self.sheet_mut(name)
            .ok_or_else(|| IoError::SheetNotFound(name.to_string()))
    }

    pub fn get_value(&self, sheet: &str, row: u32, col: u32) -> Option<LiteralValue> {
        self.sheet(sheet)?.cell(row, col)?.value.clone()
    }

    pub fn get_formula(&self, sheet: &str, row: u32, col: u32) -> Option<String> {
        self.sheet(sheet)?.cell(row, col)?.formula.clone()
    }

    /// Write a row-major block of values starting at (`row`, `col`).
    pub fn set_values(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        rows: &[Vec<LiteralValue>],
    ) -> Result<(), IoError> {
        for (dr, values) in rows.iter().enumerate() {
            for (dc, value) in values.iter().enumerate() {
                self.set_value(sheet, row + dr as u32, col + dc as u32, value.clone())?;
            }
        }
        Ok(())
    }
}

impl SheetReader for Workbook {
    type Error = IoError;

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    fn has_sheet(&self, name: &str) -> bool {
        self.sheet(name).is_some()
    }

    fn sheet_bounds(&self, sheet: &str) -> Result<Option<(u32, u32)>, IoError> {
        Ok(self.require(sheet)?.bounds())
    }

    fn max_rows(&self, sheet: &str) -> Result<u32, IoError> {
        Ok(self.require(sheet)?.max_rows)
    }

    fn read_cell(&self, sheet: &str, row: u32, col: u32) -> Result<Option<CellData>, IoError> {
        let s = self.require(sheet)?;
        s.check_cell(row, col)?;
        Ok(s.cell(row, col).cloned())
    }

    fn read_values(&self, range: &RangeAddress) -> Result<Vec<Vec<LiteralValue>>, IoError> {
        let s = self.require(&range.sheet)?;
        s.check_range(range)?;
        Ok((range.start_row..=range.end_row)
            .map(|r| {
                (range.start_col..=range.end_col)
                    .map(|c| {
                        s.cell(r, c)
                            .and_then(|cell| cell.value.clone())
                            .unwrap_or(LiteralValue::Empty)
                    })
                    .collect()
            })
            .collect())
    }

    fn column_width(&self, sheet: &str, col: u32) -> Result<f64, IoError> {
        let s = self.require(sheet)?;
        s.check_cell(1, col)?;
        Ok(s.column_width(col))
    }

    fn row_height(&self, sheet: &str, row: u32) -> Result<f64, IoError> {
        let s = self.require(sheet)?;
        s.check_cell(row, 1)?;
        Ok(s.row_height(row))
    }
}

impl SheetWriter for Workbook {
    fn create_sheet(&mut self, name: &str, index: usize) -> Result<(), IoError> {
        self.insert_sheet(name, index).map(|_| ())
    }

    fn clear_sheet(&mut self, sheet: &str) -> Result<(), IoError> {
        self.require_mut(sheet)?.cells.clear();
        Ok(())
    }

    fn write_cell(&mut self, sheet: &str, row: u32, col: u32, data: CellData) -> Result<(), IoError> {
        let s = self.require_mut(sheet)?;
        s.check_cell(row, col)?;
        s.put(row, col, data);
        Ok(())
    }

    fn set_value(
        &mut self,
        sheet: &str,
        row: u32,
        col: u32,
        value: LiteralValue,
    ) -> Result<(), IoError> {
        let s = self.require_mut(sheet)?;
        s.check_cell(row, col)?;
        let style = s.cell(row, col).and_then(|c| c.style);
        s.put(
            row,
            col,
            CellData {
                value: Some(value),
                formula: None,
                style,
            },
        );
        Ok(())
    }

    fn set_column_width(&mut self, sheet: &str, col: u32, width: f64) -> Result<(), IoError> {
        let s = self.require_mut(sheet)?;
        s.check_cell(1, col)?;
        s.column_widths.insert(col, width);
        Ok(())
    }

    fn set_row_height(&mut self, sheet: &str, row: u32, height: f64) -> Result<(), IoError> {
        let s = self.require_mut(sheet)?;
        s.check_cell(row, 1)?;
        s.row_heights.insert(row, height);
        Ok(())
    }

    fn insert_rows(&mut self, sheet: &str, before: u32, count: u32) -> Result<(), IoError> {
        let s = self.require_mut(sheet)?;
        if before == 0 || before > s.max_rows + 1 {
            return Err(IoError::Backend {
                backend: "workbook".to_string(),
                message: format!(
                    "cannot insert before row {before} of a {}-row sheet",
                    s.max_rows
                ),
            });
        }
        if count > 0 {
            s.insert_rows(before, count);
        }
        Ok(())
    }

    fn copy_range(&mut self, source: &RangeAddress, dest: &RangeAddress) -> Result<(), IoError> {
        if source.width() != dest.width() || source.height() != dest.height() {
            return Err(IoError::ShapeMismatch {
                source_range: source.clone(),
                dest: dest.clone(),
            });
        }
        let src = self.require(&source.sheet)?;
        src.check_range(source)?;
        self.require(&dest.sheet)?.check_range(dest)?;

        let drow = dest.start_row as i64 - source.start_row as i64;
        let dcol = dest.start_col as i64 - source.start_col as i64;

        // Snapshot first so overlapping copies on one sheet read the original cells.
        let mut block = Vec::with_capacity((source.width() * source.height()) as usize);
        for r in source.start_row..=source.end_row {
            for c in source.start_col..=source.end_col {
                let copied = src.cell(r, c).cloned().map(|mut cell| {
                    cell.formula = cell.formula.map(|f| shift_formula(&f, drow, dcol));
                    cell
                });
                let tr = (r as i64 + drow) as u32;
                let tc = (c as i64 + dcol) as u32;
                block.push(((tr, tc), copied.unwrap_or_default()));
            }
        }

        let dst = self.require_mut(&dest.sheet)?;
        for ((r, c), cell) in block {
            dst.put(r, c, cell);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(source = %source, dest = %dest, "copied range");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook() -> Workbook {
        let mut wb = Workbook::new_with_config(WorkbookConfig::compact(20, 8));
        wb.add_sheet("Template").unwrap();
        wb.add_sheet("Cards").unwrap();
        wb
    }

    #[test]
    fn bounds_ignore_style_only_cells() {
        let mut wb = workbook();
        wb.set_value("Template", 3, 2, LiteralValue::from("x")).unwrap();
        wb.write_cell("Template", 9, 7, CellData::default().with_style(4))
            .unwrap();
        assert_eq!(wb.sheet_bounds("Template").unwrap(), Some((3, 2)));
        assert_eq!(wb.sheet_bounds("Cards").unwrap(), None);
    }

    #[test]
    fn set_value_keeps_style_and_drops_formula() {
        let mut wb = workbook();
        wb.write_cell(
            "Cards",
            1,
            1,
            CellData::from_formula("=B1").with_style(2),
        )
        .unwrap();
        wb.set_value("Cards", 1, 1, LiteralValue::Int(5)).unwrap();
        let cell = wb.read_cell("Cards", 1, 1).unwrap().unwrap();
        assert_eq!(cell.value, Some(LiteralValue::Int(5)));
        assert_eq!(cell.formula, None);
        assert_eq!(cell.style, Some(2));
    }

    #[test]
    fn reads_outside_sheet_fail() {
        let wb = workbook();
        let range = RangeAddress::new("Cards", 1, 1, 21, 1).unwrap();
        assert!(matches!(
            wb.read_values(&range),
            Err(IoError::OutOfBounds { max_rows: 20, .. })
        ));
        assert!(matches!(
            wb.read_values(&range.on_sheet("Nope")),
            Err(IoError::SheetNotFound(_))
        ));
    }

    #[test]
    fn insert_rows_shifts_content_and_heights() {
        let mut wb = workbook();
        wb.set_value("Cards", 2, 1, LiteralValue::from("keep")).unwrap();
        wb.set_row_height("Cards", 2, 40.0).unwrap();
        wb.insert_rows("Cards", 1, 5).unwrap();

        assert_eq!(wb.max_rows("Cards").unwrap(), 25);
        assert_eq!(
            wb.get_value("Cards", 7, 1),
            Some(LiteralValue::from("keep"))
        );
        assert_eq!(wb.row_height("Cards", 7).unwrap(), 40.0);
        assert_eq!(wb.row_height("Cards", 2).unwrap(), DEFAULT_ROW_HEIGHT);
        assert!(wb.insert_rows("Cards", 0, 1).is_err());
    }

    #[test]
    fn clear_keeps_geometry() {
        let mut wb = workbook();
        wb.set_value("Cards", 1, 1, LiteralValue::Int(1)).unwrap();
        wb.set_column_width("Cards", 2, 250.0).unwrap();
        wb.clear_sheet("Cards").unwrap();
        assert!(wb.sheet("Cards").unwrap().cells().is_empty());
        assert_eq!(wb.column_width("Cards", 2).unwrap(), 250.0);
    }

    #[test]
    fn copy_range_moves_formulas_and_clears_blank_cells() {
        let mut wb = workbook();
        wb.write_cell("Template", 1, 1, CellData::from_value("Title").with_style(1))
            .unwrap();
        wb.write_cell("Template", 2, 2, CellData::from_formula("=A1&$A$1"))
            .unwrap();
        wb.set_value("Cards", 12, 1, LiteralValue::from("stale")).unwrap();
        wb.set_value("Cards", 13, 1, LiteralValue::from("stale")).unwrap();

        let source = RangeAddress::parse_a1("Template", "A1:B2").unwrap();
        let dest = RangeAddress::parse_a1("Cards", "A12:B13").unwrap();
        wb.copy_range(&source, &dest).unwrap();

        let title = wb.read_cell("Cards", 12, 1).unwrap().unwrap();
        assert_eq!(title.value, Some(LiteralValue::from("Title")));
        assert_eq!(title.style, Some(1));
        assert_eq!(wb.get_value("Cards", 13, 1), None);
        assert_eq!(
            wb.get_formula("Cards", 13, 2).as_deref(),
            Some("=A12&$A$1")
        );
    }

    #[test]
    fn copy_range_rejects_shape_mismatch() {
        let mut wb = workbook();
        let source = RangeAddress::parse_a1("Template", "A1:B2").unwrap();
        let dest = RangeAddress::parse_a1("Cards", "A1:C2").unwrap();
        assert!(matches!(
            wb.copy_range(&source, &dest),
            Err(IoError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn insert_sheet_clamps_index() {
        let mut wb = workbook();
        wb.create_sheet("Backlog", 0).unwrap();
        wb.create_sheet("Extra", 99).unwrap();
        assert_eq!(
            wb.sheet_names(),
            vec!["Backlog", "Template", "Cards", "Extra"]
        );
        assert!(matches!(
            wb.create_sheet("Cards", 1),
            Err(IoError::SheetExists(_))
        ));
    }
}

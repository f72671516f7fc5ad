//! Backlog rows as name-to-value records.

use crate::error::CardError;
use std::collections::BTreeMap;
use storycard_common::{LiteralValue, RangeAddress};
use storycard_workbook::SheetReader;
use tracing::debug;

/// First row that holds data; row 1 is the header row.
pub const FIRST_DATA_ROW: u32 = 2;

/// One backlog row keyed by header text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    row: u32,
    fields: BTreeMap<String, LiteralValue>,
}

impl Record {
    /// Zip a header row with a data row. Later duplicates of a header win.
    pub fn from_row(row: u32, headers: &[LiteralValue], values: &[LiteralValue]) -> Self {
        let mut fields = BTreeMap::new();
        for (idx, header) in headers.iter().enumerate() {
            let value = values.get(idx).cloned().unwrap_or_default();
            fields.insert(header.to_string(), value);
        }
        Self { row, fields }
    }

    /// Source row this record was read from.
    pub fn row(&self) -> u32 {
        self.row
    }

    pub fn get(&self, field: &str) -> Option<&LiteralValue> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LiteralValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K: Into<String>, V: Into<LiteralValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            row: 0,
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Which backlog rows to turn into records.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowSelection {
    /// Every row from the first data row through the last populated row.
    All,
    /// The rows covered by a user selection, header excluded.
    Selected { start_row: u32, row_count: u32 },
}

/// Keep a selection off the header row.
///
/// A selection starting above the first data row is moved down to it and
/// loses one row, unless it only had one row to begin with.
pub fn clamp_selection(start_row: u32, row_count: u32) -> (u32, u32) {
    if start_row < FIRST_DATA_ROW {
        let rows = if row_count > 1 { row_count - 1 } else { row_count };
        (FIRST_DATA_ROW, rows)
    } else {
        (start_row, row_count)
    }
}

/// Read records from `sheet`.
///
/// Headers come from row 1 across every populated column. An empty sheet
/// yields no records whatever the selection.
pub fn extract_records<H>(
    host: &H,
    sheet: &str,
    selection: RowSelection,
) -> Result<Vec<Record>, CardError>
where
    H: SheetReader + ?Sized,
{
    let Some((last_row, last_col)) = host.sheet_bounds(sheet).map_err(CardError::host)? else {
        debug!(sheet, "backlog is empty");
        return Ok(Vec::new());
    };

    let (start_row, row_count) = match selection {
        RowSelection::All => (FIRST_DATA_ROW, last_row.saturating_sub(1)),
        RowSelection::Selected {
            start_row,
            row_count,
        } => clamp_selection(start_row, row_count),
    };
    if row_count == 0 {
        return Ok(Vec::new());
    }

    let header_range = RangeAddress::new(sheet, 1, 1, 1, last_col).map_err(CardError::host)?;
    let headers = host
        .read_values(&header_range)
        .map_err(CardError::host)?
        .into_iter()
        .next()
        .unwrap_or_default();

    let end_row = start_row.saturating_add(row_count - 1);
    let rows_range =
        RangeAddress::new(sheet, start_row, 1, end_row, last_col).map_err(CardError::host)?;
    let rows = host.read_values(&rows_range).map_err(CardError::host)?;

    debug!(sheet, start_row, row_count, columns = last_col, "extracted backlog rows");
    Ok(rows
        .iter()
        .zip(start_row..)
        .map(|(values, row)| Record::from_row(row, &headers, values))
        .collect())
}

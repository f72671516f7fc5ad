use crate::IoError;
use crate::backends::SaveDestination;
use crate::traits::CellData;
use crate::workbook::{Sheet, Workbook, WorkbookConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use storycard_common::LiteralValue;

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
struct JsonWorkbook {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default)]
    sheets: Vec<JsonSheet>,
}

fn default_version() -> u32 {
    1
}

#[derive(Serialize, Deserialize, Debug, Default, Clone)]
struct JsonSheet {
    name: String,
    /// (rows, columns); omitted means the workbook defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dimensions: Option<(u32, u32)>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    column_widths: BTreeMap<u32, f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    row_heights: BTreeMap<u32, f64>,
    #[serde(default)]
    cells: Vec<JsonCell>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct JsonCell {
    row: u32,
    col: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    style: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "value")]
enum JsonValue {
    Int(i64),
    Number(f64),
    Text(String),
    Boolean(bool),
    Empty,
    Date(String),
    DateTime(String),
}

/// Whole-workbook JSON document: sheet order, cells, and sheet geometry.
pub struct JsonAdapter {
    data: JsonWorkbook,
    path: Option<PathBuf>,
}

impl Default for JsonAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonAdapter {
    pub fn new() -> Self {
        Self {
            data: JsonWorkbook {
                version: default_version(),
                sheets: Vec::new(),
            },
            path: None,
        }
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, IoError> {
        let file = File::open(path.as_ref())?;
        let data: JsonWorkbook = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self {
            data,
            path: Some(path.as_ref().to_path_buf()),
        })
    }

    pub fn open_reader(reader: impl Read) -> Result<Self, IoError> {
        let data: JsonWorkbook = serde_json::from_reader(reader)?;
        Ok(Self { data, path: None })
    }

    pub fn open_bytes(bytes: &[u8]) -> Result<Self, IoError> {
        let data: JsonWorkbook = serde_json::from_slice(bytes)?;
        Ok(Self { data, path: None })
    }

    /// Snapshot a workbook into its JSON form.
    pub fn from_workbook(workbook: &Workbook) -> Self {
        let sheets = workbook
            .sheets()
            .iter()
            .map(|sheet| JsonSheet {
                name: sheet.name().to_string(),
                dimensions: Some((sheet.max_rows(), sheet.max_cols())),
                column_widths: sheet.column_widths().clone(),
                row_heights: sheet.row_heights().clone(),
                cells: sheet
                    .cells()
                    .iter()
                    .map(|(&(row, col), cell)| JsonCell {
                        row,
                        col,
                        value: cell.value.as_ref().map(literal_to_json),
                        formula: cell.formula.clone(),
                        style: cell.style,
                    })
                    .collect(),
            })
            .collect();
        Self {
            data: JsonWorkbook {
                version: default_version(),
                sheets,
            },
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn workbook(&self) -> Result<Workbook, IoError> {
        self.workbook_with_config(WorkbookConfig::default())
    }

    pub fn workbook_with_config(&self, config: WorkbookConfig) -> Result<Workbook, IoError> {
        let mut wb = Workbook::new_with_config(config.clone());
        for js in &self.data.sheets {
            if wb.sheet(&js.name).is_some() {
                return Err(IoError::SheetExists(js.name.clone()));
            }
            let mut sheet = Sheet::new(js.name.clone(), &config);
            if let Some((rows, cols)) = js.dimensions {
                sheet.set_dimensions(rows, cols);
            }
            sheet.column_widths = js.column_widths.clone();
            sheet.row_heights = js.row_heights.clone();
            for c in &js.cells {
                if c.row == 0 || c.col == 0 {
                    return Err(IoError::Backend {
                        backend: "json".to_string(),
                        message: format!("sheet {}: cell coordinates are 1-based", js.name),
                    });
                }
                let value = c.value.as_ref().map(json_to_literal).transpose()?;
                sheet.put(
                    c.row,
                    c.col,
                    CellData {
                        value,
                        formula: c.formula.clone(),
                        style: c.style,
                    },
                );
            }
            // Content written outside the declared dimensions grows the sheet.
            if let Some((rows, cols)) = sheet.cells().keys().fold(None, |acc, &(r, c)| match acc {
                None => Some((r, c)),
                Some((mr, mc)) => Some((r.max(mr), c.max(mc))),
            }) {
                let (max_rows, max_cols) = (sheet.max_rows(), sheet.max_cols());
                sheet.set_dimensions(max_rows.max(rows), max_cols.max(cols));
            }
            wb.put_sheet(sheet);
        }
        Ok(wb)
    }

    pub fn to_json_string(&self) -> Result<String, IoError> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }

    pub fn save(&mut self) -> Result<(), IoError> {
        self.save_to(SaveDestination::InPlace).map(|_| ())
    }

    pub fn save_to(&mut self, dest: SaveDestination<'_>) -> Result<Option<Vec<u8>>, IoError> {
        match dest {
            SaveDestination::InPlace => {
                let Some(path) = self.path.as_ref() else {
                    return Err(IoError::Backend {
                        backend: "json".to_string(),
                        message: "no known path for in-place save".to_string(),
                    });
                };
                let mut file = File::create(path)?;
                file.write_all(self.to_json_string()?.as_bytes())?;
                Ok(None)
            }
            SaveDestination::Path(path) => {
                let mut file = File::create(path)?;
                file.write_all(self.to_json_string()?.as_bytes())?;
                self.path = Some(path.to_path_buf());
                Ok(None)
            }
            SaveDestination::Writer(writer) => {
                writer.write_all(self.to_json_string()?.as_bytes())?;
                Ok(None)
            }
            SaveDestination::Bytes => Ok(Some(serde_json::to_vec_pretty(&self.data)?)),
        }
    }
}

fn literal_to_json(v: &LiteralValue) -> JsonValue {
    match v {
        LiteralValue::Int(i) => JsonValue::Int(*i),
        LiteralValue::Number(n) => JsonValue::Number(*n),
        LiteralValue::Text(s) => JsonValue::Text(s.clone()),
        LiteralValue::Boolean(b) => JsonValue::Boolean(*b),
        LiteralValue::Empty => JsonValue::Empty,
        LiteralValue::Date(d) => JsonValue::Date(d.format("%Y-%m-%d").to_string()),
        LiteralValue::DateTime(dt) => {
            JsonValue::DateTime(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
    }
}

fn json_to_literal(v: &JsonValue) -> Result<LiteralValue, IoError> {
    let bad_date = |s: &str| IoError::Backend {
        backend: "json".to_string(),
        message: format!("invalid date `{s}`"),
    };
    Ok(match v {
        JsonValue::Int(i) => LiteralValue::Int(*i),
        JsonValue::Number(n) => LiteralValue::Number(*n),
        JsonValue::Text(s) => LiteralValue::Text(s.clone()),
        JsonValue::Boolean(b) => LiteralValue::Boolean(*b),
        JsonValue::Empty => LiteralValue::Empty,
        JsonValue::Date(s) => LiteralValue::Date(
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| bad_date(s))?,
        ),
        JsonValue::DateTime(s) => LiteralValue::DateTime(
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                .map_err(|_| bad_date(s))?,
        ),
    })
}

//! Field bindings: which record field lands in which cell of a card.

use crate::error::BindingError;
use crate::record::Record;
use crate::template::TemplateBlock;
use serde::{Deserialize, Serialize};
use storycard_common::LiteralValue;

/// Default title length before truncation.
pub const NAME_MAX_CHARS: usize = 19;
pub const ELLIPSIS: &str = "...";

fn default_marker() -> String {
    ELLIPSIS.to_string()
}

/// How a field value is rewritten before it is written into a card.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldTransform {
    #[default]
    Verbatim,
    /// Text longer than `max_chars` characters keeps its first `max_chars`
    /// characters followed by `marker`.
    Truncate {
        max_chars: usize,
        #[serde(default = "default_marker")]
        marker: String,
    },
}

impl FieldTransform {
    pub fn truncate(max_chars: usize) -> Self {
        FieldTransform::Truncate {
            max_chars,
            marker: default_marker(),
        }
    }

    pub fn apply(&self, value: LiteralValue) -> LiteralValue {
        match (self, value) {
            (FieldTransform::Truncate { max_chars, marker }, LiteralValue::Text(text))
                if text.chars().count() > *max_chars =>
            {
                let mut out: String = text.chars().take(*max_chars).collect();
                out.push_str(marker);
                LiteralValue::Text(out)
            }
            (_, value) => value,
        }
    }
}

/// A record field written at a 1-based (row, col) offset from a card's
/// top-left cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldBinding {
    pub field: String,
    pub row: u32,
    pub col: u32,
    #[serde(default)]
    pub transform: FieldTransform,
}

impl FieldBinding {
    pub fn new(field: impl Into<String>, row: u32, col: u32) -> Self {
        Self {
            field: field.into(),
            row,
            col,
            transform: FieldTransform::Verbatim,
        }
    }

    pub fn with_transform(mut self, transform: FieldTransform) -> Self {
        self.transform = transform;
        self
    }

    /// The value this binding writes for `record`; absent fields are empty.
    pub fn render(&self, record: &Record) -> LiteralValue {
        let value = record.get(&self.field).cloned().unwrap_or_default();
        self.transform.apply(value)
    }
}

/// The stock card layout for a ten-row, six-column template.
pub fn default_bindings() -> Vec<FieldBinding> {
    vec![
        FieldBinding::new("Id", 2, 3),
        FieldBinding::new("Name", 3, 3).with_transform(FieldTransform::truncate(NAME_MAX_CHARS)),
        FieldBinding::new("User story", 5, 3),
        FieldBinding::new("Importance", 5, 5),
        FieldBinding::new("How to test", 8, 3),
        FieldBinding::new("Estimate", 8, 5),
    ]
}

/// One absolute cell write produced by a binding.
#[derive(Clone, Debug, PartialEq)]
pub struct CellWrite {
    pub field: String,
    pub row: u32,
    pub col: u32,
    pub value: LiteralValue,
}

/// Bindings checked against a template block, kept in application order.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingTable {
    bindings: Vec<FieldBinding>,
}

impl BindingTable {
    pub fn new(bindings: Vec<FieldBinding>, block: &TemplateBlock) -> Result<Self, BindingError> {
        let (rows, cols) = (block.row_count(), block.column_count());
        for (index, binding) in bindings.iter().enumerate() {
            if binding.field.is_empty() {
                return Err(BindingError::EmptyField { index });
            }
            if binding.row == 0 || binding.col == 0 {
                return Err(BindingError::ZeroOffset {
                    field: binding.field.clone(),
                    row: binding.row,
                    col: binding.col,
                });
            }
            if binding.row > rows || binding.col > cols {
                return Err(BindingError::OutsideTemplate {
                    field: binding.field.clone(),
                    row: binding.row,
                    col: binding.col,
                    rows,
                    cols,
                });
            }
            if matches!(binding.transform, FieldTransform::Truncate { max_chars: 0, .. }) {
                return Err(BindingError::ZeroTruncation {
                    field: binding.field.clone(),
                });
            }
        }
        Ok(Self { bindings })
    }

    pub fn bindings(&self) -> &[FieldBinding] {
        &self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Absolute writes for a card whose top-left cell is (`top`, `left`).
    pub fn resolve(&self, record: &Record, top: u32, left: u32) -> Vec<CellWrite> {
        self.bindings
            .iter()
            .map(|binding| CellWrite {
                field: binding.field.clone(),
                row: top + binding.row - 1,
                col: left + binding.col - 1,
                value: binding.render(record),
            })
            .collect()
    }
}

use crate::command::Notice;
use storycard_common::RangeError;
use thiserror::Error;

/// The configured template area could not be turned into a block.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template area `{area}` is invalid: {source}")]
    Area {
        area: String,
        #[source]
        source: RangeError,
    },
}

/// A field binding does not fit the template block it is applied to.
#[derive(Debug, Error, PartialEq)]
pub enum BindingError {
    #[error("binding #{index} has an empty field name")]
    EmptyField { index: usize },

    #[error("binding `{field}` uses a zero offset ({row}, {col}); offsets are 1-based")]
    ZeroOffset { field: String, row: u32, col: u32 },

    #[error(
        "binding `{field}` at ({row}, {col}) lies outside the {rows}x{cols} template block"
    )]
    OutsideTemplate {
        field: String,
        row: u32,
        col: u32,
        rows: u32,
        cols: u32,
    },

    #[error("binding `{field}` truncates to zero characters")]
    ZeroTruncation { field: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("`{key}` must name a sheet")]
    EmptySheetName { key: &'static str },

    #[error("`{key}` cannot reuse sheet `{sheet}`")]
    SheetClash { key: &'static str, sheet: String },
}

/// Everything a card command can fail with.
///
/// `MissingDestination` and `WrongContext` are recoverable: the caller shows
/// the matching [`Notice`] and the user tries again. Every other variant is
/// fatal for the invocation.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("destination sheet `{sheet}` was missing and has been created")]
    MissingDestination { sheet: String },

    #[error("`{expected}` must be the active sheet (active: `{active}`)")]
    WrongContext { expected: String, active: String },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Binding(#[from] BindingError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("host: {0}")]
    Host(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl CardError {
    /// Wrap a host failure.
    pub fn host<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CardError::Host(Box::new(err))
    }

    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CardError::MissingDestination { .. } | CardError::WrongContext { .. }
        )
    }

    /// The user-facing notice for a recoverable error.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            CardError::MissingDestination { sheet } => Some(Notice::SheetCreated {
                sheet: sheet.clone(),
            }),
            CardError::WrongContext { expected, .. } => Some(Notice::WrongActiveSheet {
                expected: expected.clone(),
            }),
            _ => None,
        }
    }
}

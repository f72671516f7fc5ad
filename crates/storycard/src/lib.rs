//! Story Cards engine.
//!
//! Reads backlog rows from a host spreadsheet and stacks one copy of a
//! template block per row on a cards sheet, writing each row's fields into
//! fixed cells of its copy. The host is anything implementing
//! [`storycard_workbook::SheetHost`]; [`storycard_workbook::Workbook`] is
//! the in-memory one.
//!
//! Work is split into pure plans ([`PreparePlan`], [`CardPlan`]) and their
//! application against a host, so layouts can be checked without a sheet.

mod binding;
mod command;
mod compose;
mod config;
mod error;
mod prepare;
mod record;
mod template;

pub use binding::{
    BindingTable, CellWrite, ELLIPSIS, FieldBinding, FieldTransform, NAME_MAX_CHARS,
    default_bindings,
};
pub use command::{
    CardEngine, Command, InvocationContext, Notice, SelectedRows, Severity,
};
pub use compose::{CardCompositor, CardPlacement, CardPlan, CardReport};
pub use config::{
    CardConfig, DEFAULT_BACKLOG_SHEET, DEFAULT_CARDS_SHEET, DEFAULT_CARDS_SHEET_INDEX,
    DEFAULT_TEMPLATE_AREA, DEFAULT_TEMPLATE_SHEET,
};
pub use error::{BindingError, CardError, ConfigError, TemplateError};
pub use prepare::{PreparePlan, prepare_output};
pub use record::{FIRST_DATA_ROW, Record, RowSelection, clamp_selection, extract_records};
pub use template::{TemplateBlock, TemplateGeometry};

//! The two card commands and the engine that runs them against a host.

use crate::compose::{CardCompositor, CardReport};
use crate::config::CardConfig;
use crate::error::CardError;
use crate::record::{RowSelection, extract_records};
use std::fmt;
use storycard_workbook::SheetHost;
use tracing::{info, info_span, warn};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// One card per backlog row.
    CreateFromBacklog,
    /// One card per selected backlog row; the backlog must be active.
    CreateFromSelection,
}

/// A block of selected rows, as a host reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectedRows {
    pub start_row: u32,
    pub row_count: u32,
}

impl Default for SelectedRows {
    /// The cursor of a freshly opened sheet: `A1`.
    fn default() -> Self {
        Self {
            start_row: 1,
            row_count: 1,
        }
    }
}

/// What the host knows about the user's focus when a command is invoked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InvocationContext {
    pub active_sheet: Option<String>,
    pub selection: Option<SelectedRows>,
}

impl InvocationContext {
    pub fn new(active_sheet: impl Into<String>, selection: SelectedRows) -> Self {
        Self {
            active_sheet: Some(active_sheet.into()),
            selection: Some(selection),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
}

/// The message a command leaves for the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    SheetCreated { sheet: String },
    WrongActiveSheet { expected: String },
    Done,
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Notice::Done => Severity::Info,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::SheetCreated { sheet } => write!(
                f,
                "The '{sheet}' sheet was missing and has now been added. Please try again."
            ),
            Notice::WrongActiveSheet { expected } => write!(
                f,
                "The {expected} sheet needs to be active when creating cards from selected rows. Please try again."
            ),
            Notice::Done => f.write_str("Done!"),
        }
    }
}

/// A validated configuration ready to run commands.
#[derive(Clone, Debug)]
pub struct CardEngine {
    config: CardConfig,
    compositor: CardCompositor,
}

impl CardEngine {
    /// Fails on a malformed template area or a binding outside the block.
    pub fn new(config: CardConfig) -> Result<Self, CardError> {
        let (block, bindings) = config.resolve()?;
        let compositor = CardCompositor::new(
            config.template_sheet.clone(),
            config.cards_sheet.clone(),
            block,
            bindings,
        );
        Ok(Self { config, compositor })
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn compositor(&self) -> &CardCompositor {
        &self.compositor
    }

    /// Run `command`, reporting both guard failures as errors.
    pub fn run<H>(
        &self,
        host: &mut H,
        command: Command,
        context: &InvocationContext,
    ) -> Result<Notice, CardError>
    where
        H: SheetHost + ?Sized,
    {
        self.execute(host, command, context).map(|_| Notice::Done)
    }

    /// Like [`run`](Self::run), with recoverable errors turned into notices.
    pub fn invoke<H>(
        &self,
        host: &mut H,
        command: Command,
        context: &InvocationContext,
    ) -> Result<Notice, CardError>
    where
        H: SheetHost + ?Sized,
    {
        match self.run(host, command, context) {
            Ok(notice) => Ok(notice),
            Err(err) => match err.notice() {
                Some(notice) => {
                    warn!(%err, "command aborted");
                    Ok(notice)
                }
                None => Err(err),
            },
        }
    }

    /// Run `command` and return what was written.
    pub fn execute<H>(
        &self,
        host: &mut H,
        command: Command,
        context: &InvocationContext,
    ) -> Result<CardReport, CardError>
    where
        H: SheetHost + ?Sized,
    {
        let span = info_span!("cards", ?command);
        let _guard = span.enter();

        self.ensure_destination(host)?;

        let selection = match command {
            Command::CreateFromBacklog => RowSelection::All,
            Command::CreateFromSelection => {
                let backlog = &self.config.backlog_sheet;
                if context.active_sheet.as_deref() != Some(backlog.as_str()) {
                    return Err(CardError::WrongContext {
                        expected: backlog.clone(),
                        active: context.active_sheet.clone().unwrap_or_default(),
                    });
                }
                let rows = context.selection.unwrap_or_default();
                RowSelection::Selected {
                    start_row: rows.start_row,
                    row_count: rows.row_count,
                }
            }
        };

        let records = extract_records(&*host, &self.config.backlog_sheet, selection)?;
        let report = self.compositor.compose(host, &records)?;
        info!(
            cards = report.cards,
            rows = report.rows_written,
            sheet = %self.config.cards_sheet,
            "cards created"
        );
        Ok(report)
    }

    fn ensure_destination<H>(&self, host: &mut H) -> Result<(), CardError>
    where
        H: SheetHost + ?Sized,
    {
        let sheet = &self.config.cards_sheet;
        if host.has_sheet(sheet) {
            return Ok(());
        }
        let index = self.config.cards_sheet_index.min(host.sheet_names().len());
        host.create_sheet(sheet, index).map_err(CardError::host)?;
        Err(CardError::MissingDestination {
            sheet: sheet.clone(),
        })
    }
}

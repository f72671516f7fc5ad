use crate::binding::{BindingTable, FieldBinding, default_bindings};
use crate::error::{CardError, ConfigError};
use crate::template::TemplateBlock;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BACKLOG_SHEET: &str = "Backlog";
pub const DEFAULT_TEMPLATE_SHEET: &str = "Template";
pub const DEFAULT_CARDS_SHEET: &str = "Cards";
pub const DEFAULT_CARDS_SHEET_INDEX: usize = 2;
pub const DEFAULT_TEMPLATE_AREA: &str = "A1:F10";

/// Sheet names, template area and field layout of a card workbook.
///
/// Every key is optional in YAML; missing keys take the stock values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CardConfig {
    pub backlog_sheet: String,
    pub template_sheet: String,
    pub cards_sheet: String,
    /// Tab position used when the cards sheet has to be created.
    pub cards_sheet_index: usize,
    pub template_area: String,
    pub bindings: Vec<FieldBinding>,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            backlog_sheet: DEFAULT_BACKLOG_SHEET.to_string(),
            template_sheet: DEFAULT_TEMPLATE_SHEET.to_string(),
            cards_sheet: DEFAULT_CARDS_SHEET.to_string(),
            cards_sheet_index: DEFAULT_CARDS_SHEET_INDEX,
            template_area: DEFAULT_TEMPLATE_AREA.to_string(),
            bindings: default_bindings(),
        }
    }
}

impl CardConfig {
    pub fn from_yaml_reader<R: std::io::Read>(reader: R) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_reader(reader)?)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check sheet names, the template area and every binding.
    pub fn validate(&self) -> Result<(), CardError> {
        self.resolve().map(|_| ())
    }

    /// The parsed template block and checked binding table.
    pub(crate) fn resolve(&self) -> Result<(TemplateBlock, BindingTable), CardError> {
        let sheets = [
            ("backlog_sheet", &self.backlog_sheet),
            ("template_sheet", &self.template_sheet),
            ("cards_sheet", &self.cards_sheet),
        ];
        for (key, name) in sheets {
            if name.trim().is_empty() {
                return Err(ConfigError::EmptySheetName { key }.into());
            }
        }
        // The cards sheet is cleared on every run.
        for (key, name) in &sheets[..2] {
            if *name == &self.cards_sheet {
                return Err(ConfigError::SheetClash {
                    key: *key,
                    sheet: self.cards_sheet.clone(),
                }
                .into());
            }
        }

        let block = TemplateBlock::parse(&self.template_area)?;
        let bindings = BindingTable::new(self.bindings.clone(), &block)?;
        Ok((block, bindings))
    }
}

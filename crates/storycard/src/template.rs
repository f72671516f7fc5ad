//! The template block: the rectangle on the template sheet that one card is
//! cloned from.

use crate::error::{CardError, TemplateError};
use storycard_common::{RangeAddress, column_to_letters};
use storycard_workbook::SheetReader;

/// Inclusive, 1-based bounds of the template block.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateBlock {
    start_col: u32,
    start_row: u32,
    end_col: u32,
    end_row: u32,
}

/// Bounds of the template block plus, when read from a host, the sheet
/// geometry the output preparer replicates.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateGeometry {
    pub start_col: u32,
    pub start_row: u32,
    pub end_col: u32,
    pub end_row: u32,
    pub row_count: u32,
    /// Widths of template columns `1..=end_col + 1`.
    pub column_widths: Vec<f64>,
    /// Heights of template rows `start_row..=end_row`.
    pub row_heights: Vec<f64>,
}

impl TemplateBlock {
    /// Parse an area such as `A1:F10` or `B3:AD120`.
    pub fn parse(area: &str) -> Result<Self, TemplateError> {
        let range = RangeAddress::parse_a1("", area).map_err(|source| TemplateError::Area {
            area: area.to_string(),
            source,
        })?;
        Ok(Self {
            start_col: range.start_col,
            start_row: range.start_row,
            end_col: range.end_col,
            end_row: range.end_row,
        })
    }

    pub fn start_col(&self) -> u32 {
        self.start_col
    }

    pub fn start_row(&self) -> u32 {
        self.start_row
    }

    pub fn end_col(&self) -> u32 {
        self.end_col
    }

    pub fn end_row(&self) -> u32 {
        self.end_row
    }

    /// Rows per card.
    pub fn row_count(&self) -> u32 {
        self.end_row - self.start_row + 1
    }

    pub fn column_count(&self) -> u32 {
        self.end_col - self.start_col + 1
    }

    /// The block as a range on `sheet`.
    pub fn range_on(&self, sheet: &str) -> RangeAddress {
        RangeAddress {
            sheet: sheet.to_string(),
            start_row: self.start_row,
            start_col: self.start_col,
            end_row: self.end_row,
            end_col: self.end_col,
        }
    }

    /// Range of the `index`-th stacked card on `sheet`.
    pub fn card_range(&self, sheet: &str, index: u32) -> RangeAddress {
        let shift = index.saturating_mul(self.row_count());
        RangeAddress {
            sheet: sheet.to_string(),
            start_row: self.start_row.saturating_add(shift),
            start_col: self.start_col,
            end_row: self.end_row.saturating_add(shift),
            end_col: self.end_col,
        }
    }

    pub fn describe(&self) -> TemplateGeometry {
        TemplateGeometry {
            start_col: self.start_col,
            start_row: self.start_row,
            end_col: self.end_col,
            end_row: self.end_row,
            row_count: self.row_count(),
            column_widths: Vec::new(),
            row_heights: Vec::new(),
        }
    }

    /// [`describe`](Self::describe) plus the column widths and row heights of
    /// `template_sheet`.
    pub fn describe_geometry<H>(
        &self,
        host: &H,
        template_sheet: &str,
    ) -> Result<TemplateGeometry, CardError>
    where
        H: SheetReader + ?Sized,
    {
        let mut geometry = self.describe();
        geometry.column_widths = (1..=self.end_col + 1)
            .map(|col| host.column_width(template_sheet, col))
            .collect::<Result<_, _>>()
            .map_err(CardError::host)?;
        geometry.row_heights = (self.start_row..=self.end_row)
            .map(|row| host.row_height(template_sheet, row))
            .collect::<Result<_, _>>()
            .map_err(CardError::host)?;
        Ok(geometry)
    }
}

impl std::fmt::Display for TemplateBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{}:{}{}",
            column_to_letters(self.start_col),
            self.start_row,
            column_to_letters(self.end_col),
            self.end_row
        )
    }
}

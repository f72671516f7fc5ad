//! Sizing the destination sheet before any card is copied into it.

use crate::error::CardError;
use crate::template::{TemplateBlock, TemplateGeometry};
use storycard_workbook::SheetHost;
use tracing::debug;

/// Geometry changes that make a destination ready for `item_count` cards.
///
/// Built from a [`TemplateGeometry`] without touching a host, then replayed
/// by [`apply`](PreparePlan::apply). Applying the same plan twice leaves the
/// same widths and heights behind.
#[derive(Clone, Debug, PartialEq)]
pub struct PreparePlan {
    pub destination: String,
    pub item_count: usize,
    /// (column, width) for columns `1..=end_col + 1`.
    pub column_widths: Vec<(u32, f64)>,
    /// Minimum row count of the destination after preparation.
    pub required_rows: u32,
    /// (row, height) for every row of every stacked card.
    pub row_heights: Vec<(u32, f64)>,
}

impl PreparePlan {
    pub fn new(destination: &str, geometry: &TemplateGeometry, item_count: usize) -> Self {
        let rows_per_block = geometry.row_count;
        let lead = geometry.start_row - 1;
        let items = u32::try_from(item_count).unwrap_or(u32::MAX);

        let column_widths = (1u32..).zip(geometry.column_widths.iter().copied()).collect();
        let row_heights = (0..items)
            .flat_map(|i| {
                let top = lead.saturating_add(i.saturating_mul(rows_per_block));
                (1u32..)
                    .zip(geometry.row_heights.iter().copied())
                    .map(move |(j, height)| (top.saturating_add(j), height))
            })
            .collect();

        Self {
            destination: destination.to_string(),
            item_count,
            column_widths,
            required_rows: lead.saturating_add(items.saturating_mul(rows_per_block)),
            row_heights,
        }
    }

    /// Clear the destination, then widen, grow and resize it.
    ///
    /// Missing rows are inserted above row 1; rows are never removed.
    pub fn apply<H>(&self, host: &mut H) -> Result<(), CardError>
    where
        H: SheetHost + ?Sized,
    {
        let sheet = self.destination.as_str();
        host.clear_sheet(sheet).map_err(CardError::host)?;

        for &(col, width) in &self.column_widths {
            host.set_column_width(sheet, col, width)
                .map_err(CardError::host)?;
        }

        let rows = host.max_rows(sheet).map_err(CardError::host)?;
        if rows < self.required_rows {
            let deficit = self.required_rows - rows;
            debug!(sheet, rows, deficit, "growing destination");
            host.insert_rows(sheet, 1, deficit).map_err(CardError::host)?;
        }

        for &(row, height) in &self.row_heights {
            host.set_row_height(sheet, row, height)
                .map_err(CardError::host)?;
        }
        Ok(())
    }
}

/// Read the template geometry, plan, and apply in one step.
pub fn prepare_output<H>(
    host: &mut H,
    destination: &str,
    template_sheet: &str,
    block: &TemplateBlock,
    item_count: usize,
) -> Result<PreparePlan, CardError>
where
    H: SheetHost + ?Sized,
{
    let geometry = block.describe_geometry(&*host, template_sheet)?;
    let plan = PreparePlan::new(destination, &geometry, item_count);
    plan.apply(host)?;
    Ok(plan)
}

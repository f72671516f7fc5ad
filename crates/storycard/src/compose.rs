//! Stacking populated template copies into the destination sheet.

use crate::binding::{BindingTable, CellWrite};
use crate::error::CardError;
use crate::prepare::prepare_output;
use crate::record::Record;
use crate::template::TemplateBlock;
use storycard_common::RangeAddress;
use storycard_workbook::SheetHost;
use tracing::{debug, trace};

/// One card: where the template is copied to and what is written on top.
#[derive(Clone, Debug, PartialEq)]
pub struct CardPlacement {
    pub index: usize,
    pub source: RangeAddress,
    pub dest: RangeAddress,
    pub writes: Vec<CellWrite>,
}

/// Every card of one run, in record order.
#[derive(Clone, Debug, PartialEq)]
pub struct CardPlan {
    pub rows_per_block: u32,
    pub cards: Vec<CardPlacement>,
}

impl CardPlan {
    pub fn rows_written(&self) -> u32 {
        u32::try_from(self.cards.len())
            .unwrap_or(u32::MAX)
            .saturating_mul(self.rows_per_block)
    }

    /// Copy and fill each card in turn. A host failure stops the run and
    /// leaves the cards written so far in place.
    pub fn apply<H>(&self, host: &mut H) -> Result<CardReport, CardError>
    where
        H: SheetHost + ?Sized,
    {
        for card in &self.cards {
            debug!(card = card.index, dest = %card.dest, "placing card");
            host.copy_range(&card.source, &card.dest)
                .map_err(CardError::host)?;
            for write in &card.writes {
                trace!(field = %write.field, row = write.row, col = write.col, "binding");
                host.set_value(&card.dest.sheet, write.row, write.col, write.value.clone())
                    .map_err(CardError::host)?;
            }
        }
        Ok(CardReport {
            cards: self.cards.len(),
            rows_written: self.rows_written(),
        })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CardReport {
    pub cards: usize,
    pub rows_written: u32,
}

/// Turns records into cards on the destination sheet.
#[derive(Clone, Debug)]
pub struct CardCompositor {
    template_sheet: String,
    destination: String,
    block: TemplateBlock,
    bindings: BindingTable,
}

impl CardCompositor {
    pub fn new(
        template_sheet: impl Into<String>,
        destination: impl Into<String>,
        block: TemplateBlock,
        bindings: BindingTable,
    ) -> Self {
        Self {
            template_sheet: template_sheet.into(),
            destination: destination.into(),
            block,
            bindings,
        }
    }

    pub fn template_sheet(&self) -> &str {
        &self.template_sheet
    }

    pub fn destination(&self) -> &str {
        &self.destination
    }

    pub fn block(&self) -> &TemplateBlock {
        &self.block
    }

    pub fn bindings(&self) -> &BindingTable {
        &self.bindings
    }

    /// Card `i` covers the template's columns and its rows moved down by
    /// `i * rows_per_block`.
    pub fn plan(&self, records: &[Record]) -> CardPlan {
        let source = self.block.range_on(&self.template_sheet);
        let cards = records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let dest = self
                    .block
                    .card_range(&self.destination, u32::try_from(index).unwrap_or(u32::MAX));
                let writes = self.bindings.resolve(record, dest.start_row, dest.start_col);
                CardPlacement {
                    index,
                    source: source.clone(),
                    dest,
                    writes,
                }
            })
            .collect();
        CardPlan {
            rows_per_block: self.block.row_count(),
            cards,
        }
    }

    /// Prepare the destination for `records.len()` cards, then place them.
    pub fn compose<H>(&self, host: &mut H, records: &[Record]) -> Result<CardReport, CardError>
    where
        H: SheetHost + ?Sized,
    {
        prepare_output(
            host,
            &self.destination,
            &self.template_sheet,
            &self.block,
            records.len(),
        )?;
        self.plan(records).apply(host)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{FieldBinding, default_bindings};
    use storycard_common::LiteralValue;
    use storycard_workbook::{CellData, SheetReader, SheetWriter, Workbook};

    fn compositor(area: &str, bindings: Vec<FieldBinding>) -> CardCompositor {
        let block = TemplateBlock::parse(area).unwrap();
        let table = BindingTable::new(bindings, &block).unwrap();
        CardCompositor::new("Template", "Cards", block, table)
    }

    #[test]
    fn plan_is_pure_and_ordered() {
        let c = compositor("A1:F10", default_bindings());
        let records: Vec<Record> = (1..=3)
            .map(|i| [("Id", LiteralValue::Int(i))].into_iter().collect())
            .collect();
        let plan = c.plan(&records);
        assert_eq!(plan.cards.len(), 3);
        assert_eq!(plan.rows_written(), 30);
        assert_eq!(plan.cards[1].dest.to_a1(), "A11:F20");
        assert_eq!(plan.cards[1].source.to_a1(), "A1:F10");
        assert_eq!(plan.cards[2].writes[0].row, 22);
        assert_eq!(plan.cards[2].writes[0].value, LiteralValue::Int(3));
    }

    #[test]
    fn writes_stay_inside_their_card() {
        let c = compositor("A1:F10", default_bindings());
        let records: Vec<Record> = (0..5)
            .map(|i| [("Name", format!("card {i}"))].into_iter().collect())
            .collect();
        for card in c.plan(&records).cards {
            assert!(card.writes.iter().all(|w| card.dest.contains(w.row, w.col)));
        }
    }

    #[test]
    fn compose_copies_template_and_fills_bindings() {
        let mut wb = Workbook::new();
        wb.add_sheet("Template").unwrap();
        wb.add_sheet("Cards").unwrap();
        wb.write_cell("Template", 1, 1, CellData::from_value("Story").with_style(9))
            .unwrap();
        wb.write_cell("Template", 2, 2, CellData::from_value("").with_style(3))
            .unwrap();

        let c = compositor("A1:B2", vec![FieldBinding::new("Id", 2, 2)]);
        let records: Vec<Record> = ["a", "b"]
            .into_iter()
            .map(|id| [("Id", id)].into_iter().collect())
            .collect();
        let report = c.compose(&mut wb, &records).unwrap();

        assert_eq!(report, CardReport { cards: 2, rows_written: 4 });
        assert_eq!(wb.get_value("Cards", 3, 1), Some(LiteralValue::from("Story")));
        assert_eq!(wb.read_cell("Cards", 3, 1).unwrap().unwrap().style, Some(9));
        let filled = wb.read_cell("Cards", 4, 2).unwrap().unwrap();
        assert_eq!(filled.value, Some(LiteralValue::from("b")));
        assert_eq!(filled.style, Some(3));
        assert_eq!(wb.sheet_bounds("Cards").unwrap(), Some((4, 2)));
    }

    #[test]
    fn compose_without_records_clears() {
        let mut wb = Workbook::new();
        wb.add_sheet("Template").unwrap();
        wb.add_sheet("Cards").unwrap();
        wb.set_value("Cards", 5, 5, LiteralValue::Int(1)).unwrap();
        let c = compositor("A1:B2", vec![]);
        let report = c.compose(&mut wb, &[]).unwrap();
        assert_eq!(report.cards, 0);
        assert_eq!(wb.sheet_bounds("Cards").unwrap(), None);
    }
}

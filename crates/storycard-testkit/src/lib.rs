//! Workbook fixtures shared by the Story Cards test suites.

use std::path::{Path, PathBuf};
use storycard_workbook::{
    CellData, JsonAdapter, LiteralValue, SaveDestination, SheetWriter, Workbook,
};

pub const BACKLOG_HEADERS: [&str; 6] = [
    "Id",
    "Name",
    "User story",
    "Importance",
    "How to test",
    "Estimate",
];

/// Style ids used by the fixture template.
pub const TITLE_STYLE: u32 = 1;
pub const LABEL_STYLE: u32 = 2;
pub const FIELD_STYLE: u32 = 3;

/// `Backlog` (headers only), `Template` (a filled `A1:F10` card) and `Cards`.
pub fn card_workbook() -> Workbook {
    let mut wb = Workbook::new();
    for name in ["Backlog", "Template", "Cards"] {
        wb.add_sheet(name).expect("fresh sheet");
    }
    write_headers(&mut wb, "Backlog");
    write_template(&mut wb, "Template");
    wb
}

/// [`card_workbook`] without the `Cards` sheet.
pub fn workbook_without_cards() -> Workbook {
    let mut wb = card_workbook();
    wb.delete_sheet("Cards");
    wb
}

pub fn write_headers(wb: &mut Workbook, sheet: &str) {
    let headers: Vec<LiteralValue> = BACKLOG_HEADERS.iter().map(|h| (*h).into()).collect();
    wb.set_values(sheet, 1, 1, &[headers]).expect("headers");
}

/// A ten-row, six-column card with labels, styled field cells, custom
/// geometry and a relative formula.
pub fn write_template(wb: &mut Workbook, sheet: &str) {
    let labels = [
        (1, 1, "Story card", TITLE_STYLE),
        (2, 2, "Id", LABEL_STYLE),
        (3, 2, "Name", LABEL_STYLE),
        (5, 2, "User story", LABEL_STYLE),
        (5, 4, "Importance", LABEL_STYLE),
        (8, 2, "How to test", LABEL_STYLE),
        (8, 4, "Estimate", LABEL_STYLE),
    ];
    for (row, col, text, style) in labels {
        wb.write_cell(sheet, row, col, CellData::from_value(text).with_style(style))
            .expect("label");
    }
    for (row, col) in [(2, 3), (3, 3), (5, 3), (5, 5), (8, 3), (8, 5)] {
        wb.write_cell(sheet, row, col, CellData::default().with_style(FIELD_STYLE))
            .expect("field");
    }
    wb.write_cell(sheet, 10, 6, CellData::from_formula("=C2&\"-\"&$A$1"))
        .expect("formula");

    wb.set_column_width(sheet, 3, 220.0).expect("width");
    wb.set_column_width(sheet, 7, 30.0).expect("width");
    wb.set_row_height(sheet, 1, 34.0).expect("height");
    wb.set_row_height(sheet, 5, 80.0).expect("height");
    wb.set_row_height(sheet, 8, 60.0).expect("height");
}

/// One backlog row in header order.
pub fn backlog_row(
    id: i64,
    name: &str,
    story: &str,
    importance: &str,
    how_to_test: &str,
    estimate: i64,
) -> Vec<LiteralValue> {
    vec![
        LiteralValue::Int(id),
        name.into(),
        story.into(),
        importance.into(),
        how_to_test.into(),
        LiteralValue::Int(estimate),
    ]
}

/// Append `count` generated rows below the backlog headers.
pub fn add_backlog_rows(wb: &mut Workbook, count: usize) {
    let rows: Vec<Vec<LiteralValue>> = (1..=count as i64)
        .map(|i| {
            backlog_row(
                i,
                &format!("Story {i}"),
                &format!("As a user I want feature {i}"),
                "High",
                &format!("Check feature {i}"),
                i,
            )
        })
        .collect();
    wb.set_values("Backlog", 2, 1, &rows).expect("rows");
}

/// Write `wb` as a JSON document inside `dir`.
pub fn save_json(wb: &Workbook, dir: &Path, file: &str) -> PathBuf {
    let path = dir.join(file);
    JsonAdapter::from_workbook(wb)
        .save_to(SaveDestination::Path(&path))
        .expect("save workbook");
    path
}

/// A temporary directory holding `book.json` built from `wb`.
pub fn json_fixture(wb: &Workbook) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = save_json(wb, dir.path(), "book.json");
    (dir, path)
}

pub fn load_json(path: &Path) -> Workbook {
    JsonAdapter::open_path(path)
        .expect("open workbook")
        .workbook()
        .expect("decode workbook")
}

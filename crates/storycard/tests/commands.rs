use storycard::{
    CardConfig, CardEngine, CardError, Command, InvocationContext, Notice, SelectedRows,
};
use storycard_testkit::{FIELD_STYLE, LABEL_STYLE, backlog_row, card_workbook, workbook_without_cards};
use storycard_workbook::{IoError, LiteralValue, SheetHost, SheetReader, SheetWriter, Workbook};

fn engine() -> CardEngine {
    CardEngine::new(CardConfig::default()).unwrap()
}

fn with_rows(rows: Vec<Vec<LiteralValue>>) -> Workbook {
    let mut wb = card_workbook();
    wb.set_values("Backlog", 2, 1, &rows).unwrap();
    wb
}

fn backlog_context(start_row: u32, row_count: u32) -> InvocationContext {
    InvocationContext::new(
        "Backlog",
        SelectedRows {
            start_row,
            row_count,
        },
    )
}

#[test]
fn single_record_fills_one_card() {
    let mut wb = with_rows(vec![backlog_row(
        1,
        "Short",
        "As a user...",
        "High",
        "Click button",
        3,
    )]);
    let notice = engine()
        .run(&mut wb, Command::CreateFromBacklog, &InvocationContext::default())
        .unwrap();
    assert_eq!(notice, Notice::Done);

    assert_eq!(wb.sheet_bounds("Cards").unwrap().map(|(rows, _)| rows), Some(10));
    assert_eq!(wb.get_value("Cards", 2, 3), Some(LiteralValue::Int(1)));
    assert_eq!(wb.get_value("Cards", 3, 3), Some(LiteralValue::from("Short")));
    assert_eq!(wb.get_value("Cards", 5, 3), Some(LiteralValue::from("As a user...")));
    assert_eq!(wb.get_value("Cards", 5, 5), Some(LiteralValue::from("High")));
    assert_eq!(wb.get_value("Cards", 8, 3), Some(LiteralValue::from("Click button")));
    assert_eq!(wb.get_value("Cards", 8, 5), Some(LiteralValue::Int(3)));

    // Template labels and styles come along with the copy.
    let label = wb.read_cell("Cards", 3, 2).unwrap().unwrap();
    assert_eq!(label.value, Some(LiteralValue::from("Name")));
    assert_eq!(label.style, Some(LABEL_STYLE));
    assert_eq!(wb.read_cell("Cards", 3, 3).unwrap().unwrap().style, Some(FIELD_STYLE));
}

#[test]
fn long_names_are_truncated_to_22_characters() {
    let mut wb = with_rows(vec![backlog_row(
        7,
        "This is definitely over nineteen chars",
        "",
        "",
        "",
        1,
    )]);
    engine()
        .run(&mut wb, Command::CreateFromBacklog, &InvocationContext::default())
        .unwrap();
    let name = wb.get_value("Cards", 3, 3).unwrap();
    assert_eq!(name, LiteralValue::from("This is definitely ..."));
    assert_eq!(name.as_text().unwrap().chars().count(), 22);
}

#[test]
fn empty_name_leaves_the_field_blank() {
    let mut wb = with_rows(vec![backlog_row(2, "", "Story", "", "", 1)]);
    engine()
        .run(&mut wb, Command::CreateFromBacklog, &InvocationContext::default())
        .unwrap();
    let name = wb.get_value("Cards", 3, 3).unwrap_or(LiteralValue::Empty);
    assert!(name.is_blank());
    assert_eq!(wb.get_value("Cards", 5, 3), Some(LiteralValue::from("Story")));
}

#[test]
fn missing_destination_is_created_at_index_two_without_cards() {
    let mut wb = workbook_without_cards();
    storycard_testkit::add_backlog_rows(&mut wb, 2);

    let err = engine()
        .run(&mut wb, Command::CreateFromBacklog, &InvocationContext::default())
        .unwrap_err();
    assert!(matches!(err, CardError::MissingDestination { ref sheet } if sheet == "Cards"));
    assert_eq!(wb.sheet_names(), vec!["Backlog", "Template", "Cards"]);
    assert_eq!(wb.sheet_bounds("Cards").unwrap(), None);

    let mut again = workbook_without_cards();
    let notice = engine()
        .invoke(&mut again, Command::CreateFromSelection, &backlog_context(2, 1))
        .unwrap();
    assert_eq!(
        notice.to_string(),
        "The 'Cards' sheet was missing and has now been added. Please try again."
    );
}

#[test]
fn destination_index_is_clamped_to_the_sheet_count() {
    let mut wb = Workbook::new();
    wb.add_sheet("Backlog").unwrap();
    let notice = engine()
        .invoke(&mut wb, Command::CreateFromBacklog, &InvocationContext::default())
        .unwrap();
    assert!(matches!(notice, Notice::SheetCreated { .. }));
    assert_eq!(wb.sheet_names(), vec!["Backlog", "Cards"]);
}

#[test]
fn selection_requires_the_backlog_to_be_active() {
    let mut wb = card_workbook();
    storycard_testkit::add_backlog_rows(&mut wb, 3);
    wb.set_value("Cards", 1, 1, LiteralValue::from("keep me")).unwrap();

    let context = InvocationContext::new("Template", SelectedRows::default());
    let err = engine()
        .run(&mut wb, Command::CreateFromSelection, &context)
        .unwrap_err();
    assert!(matches!(
        err,
        CardError::WrongContext { ref expected, ref active } if expected == "Backlog" && active == "Template"
    ));
    assert_eq!(wb.get_value("Cards", 1, 1), Some(LiteralValue::from("keep me")));

    let notice = engine()
        .invoke(&mut wb, Command::CreateFromSelection, &InvocationContext::default())
        .unwrap();
    assert_eq!(
        notice.to_string(),
        "The Backlog sheet needs to be active when creating cards from selected rows. Please try again."
    );
}

#[test]
fn all_rows_ignores_the_active_sheet() {
    let mut wb = card_workbook();
    storycard_testkit::add_backlog_rows(&mut wb, 2);
    let context = InvocationContext::new("Template", SelectedRows::default());
    let notice = engine()
        .run(&mut wb, Command::CreateFromBacklog, &context)
        .unwrap();
    assert_eq!(notice, Notice::Done);
    assert_eq!(wb.get_value("Cards", 12, 3), Some(LiteralValue::Int(2)));
}

#[test]
fn selected_rows_become_cards_in_order() {
    let mut wb = card_workbook();
    storycard_testkit::add_backlog_rows(&mut wb, 5);

    let report = engine()
        .execute(&mut wb, Command::CreateFromSelection, &backlog_context(3, 2))
        .unwrap();
    assert_eq!(report.cards, 2);
    assert_eq!(report.rows_written, 20);
    assert_eq!(wb.get_value("Cards", 2, 3), Some(LiteralValue::Int(2)));
    assert_eq!(wb.get_value("Cards", 12, 3), Some(LiteralValue::Int(3)));
    assert_eq!(wb.get_value("Cards", 22, 3), None);
}

#[test]
fn selection_starting_on_the_header_drops_a_row() {
    let mut wb = card_workbook();
    storycard_testkit::add_backlog_rows(&mut wb, 5);

    let report = engine()
        .execute(&mut wb, Command::CreateFromSelection, &backlog_context(1, 3))
        .unwrap();
    assert_eq!(report.cards, 2);
    assert_eq!(wb.get_value("Cards", 2, 3), Some(LiteralValue::Int(1)));
    assert_eq!(wb.get_value("Cards", 12, 3), Some(LiteralValue::Int(2)));

    // The cursor parked on A1 still yields the first data row.
    let report = engine()
        .execute(
            &mut wb,
            Command::CreateFromSelection,
            &InvocationContext {
                active_sheet: Some("Backlog".into()),
                selection: None,
            },
        )
        .unwrap();
    assert_eq!(report.cards, 1);
}

#[test]
fn template_formulas_follow_their_card() {
    let mut wb = card_workbook();
    storycard_testkit::add_backlog_rows(&mut wb, 3);
    engine()
        .run(&mut wb, Command::CreateFromBacklog, &InvocationContext::default())
        .unwrap();
    assert_eq!(
        wb.get_formula("Cards", 10, 6).as_deref(),
        Some("=C2&\"-\"&$A$1")
    );
    assert_eq!(
        wb.get_formula("Cards", 30, 6).as_deref(),
        Some("=C22&\"-\"&$A$1")
    );
}

#[test]
fn geometry_is_copied_per_card() {
    let mut wb = card_workbook();
    storycard_testkit::add_backlog_rows(&mut wb, 2);
    engine()
        .run(&mut wb, Command::CreateFromBacklog, &InvocationContext::default())
        .unwrap();
    assert_eq!(wb.column_width("Cards", 3).unwrap(), 220.0);
    assert_eq!(wb.column_width("Cards", 7).unwrap(), 30.0);
    assert_eq!(wb.column_width("Cards", 8).unwrap(), 100.0);
    for row in [5, 15] {
        assert_eq!(wb.row_height("Cards", row).unwrap(), 80.0);
    }
    assert_eq!(wb.row_height("Cards", 11).unwrap(), 34.0);
}

#[test]
fn short_destinations_grow() {
    let mut wb = card_workbook();
    storycard_testkit::add_backlog_rows(&mut wb, 150);
    engine()
        .run(&mut wb, Command::CreateFromBacklog, &InvocationContext::default())
        .unwrap();
    assert_eq!(wb.max_rows("Cards").unwrap(), 1500);
    assert_eq!(wb.get_value("Cards", 1492, 3), Some(LiteralValue::Int(150)));
}

#[test]
fn missing_template_sheet_is_fatal() {
    let mut wb = card_workbook();
    wb.delete_sheet("Template");
    let err = engine()
        .invoke(&mut wb, Command::CreateFromBacklog, &InvocationContext::default())
        .unwrap_err();
    assert!(!err.is_recoverable());
}

#[test]
fn custom_configuration() {
    let yaml = r#"
backlog_sheet: Stories
cards_sheet: Print
cards_sheet_index: 0
template_area: B2:D4
bindings:
  - field: Title
    row: 1
    col: 2
    transform:
      kind: truncate
      max_chars: 4
      marker: "~"
"#;
    let engine = CardEngine::new(CardConfig::from_yaml_str(yaml).unwrap()).unwrap();
    let mut wb = Workbook::new();
    wb.add_sheet("Stories").unwrap();
    wb.add_sheet("Template").unwrap();
    wb.set_values(
        "Stories",
        1,
        1,
        &[
            vec!["Title".into()],
            vec!["Checkout".into()],
            vec!["Cart".into()],
        ],
    )
    .unwrap();
    wb.set_value("Template", 2, 2, LiteralValue::from("card")).unwrap();

    assert!(matches!(
        engine.invoke(&mut wb, Command::CreateFromBacklog, &InvocationContext::default()),
        Ok(Notice::SheetCreated { .. })
    ));
    assert_eq!(wb.sheet_names(), vec!["Print", "Stories", "Template"]);

    engine
        .run(&mut wb, Command::CreateFromBacklog, &InvocationContext::default())
        .unwrap();
    // Row 1 stays free above the first card; cards start at B2 and B5.
    assert_eq!(wb.get_value("Print", 2, 2), Some(LiteralValue::from("card")));
    assert_eq!(wb.get_value("Print", 2, 3), Some(LiteralValue::from("Chec~")));
    assert_eq!(wb.get_value("Print", 5, 3), Some(LiteralValue::from("Cart")));
    assert_eq!(wb.sheet_bounds("Print").unwrap(), Some((5, 3)));
}

#[test]
fn runs_against_a_dynamic_host() {
    let mut wb = with_rows(vec![backlog_row(4, "Boxed", "", "", "", 2)]);
    let host: &mut dyn SheetHost<Error = IoError> = &mut wb;
    let report = engine()
        .execute(host, Command::CreateFromBacklog, &InvocationContext::default())
        .unwrap();
    assert_eq!(report.cards, 1);
    assert_eq!(wb.get_value("Cards", 3, 3), Some(LiteralValue::from("Boxed")));
}

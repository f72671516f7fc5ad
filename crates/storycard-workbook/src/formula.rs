//! Relative reference shifting for copied formulas.
//!
//! When a template block is copied to a new place, `=C2&" pts"` written in the
//! template must point at the copy's own cells, while `$A$1` keeps pointing at
//! the same place. Text inside string literals and quoted sheet names is left
//! untouched. References that would move off the sheet become `#REF!`.

use once_cell::sync::Lazy;
use regex::Regex;
use storycard_common::CellRef;

static A1_REFERENCE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$?[A-Za-z]{1,3}\$?[0-9]+").expect("A1 reference regex must compile")
});

/// Shift every relative A1 reference in `formula` by (`drow`, `dcol`).
///
/// Non-formulas (text not starting with `=`) are returned unchanged.
pub fn shift_formula(formula: &str, drow: i64, dcol: i64) -> String {
    if !formula.starts_with('=') || (drow == 0 && dcol == 0) {
        return formula.to_string();
    }

    let mut out = String::with_capacity(formula.len() + 8);
    let mut run = String::new();
    let mut quote: Option<char> = None;

    for ch in formula.chars() {
        match quote {
            Some(q) => {
                out.push(ch);
                if ch == q {
                    quote = None;
                }
            }
            None if ch == '"' || ch == '\'' => {
                out.push_str(&shift_run(&run, drow, dcol));
                run.clear();
                out.push(ch);
                quote = Some(ch);
            }
            None => run.push(ch),
        }
    }
    out.push_str(&shift_run(&run, drow, dcol));
    out
}

fn shift_run(run: &str, drow: i64, dcol: i64) -> String {
    let mut out = String::with_capacity(run.len());
    let mut last = 0;
    for m in A1_REFERENCE.find_iter(run) {
        let before = run[..m.start()].chars().next_back();
        let after = run[m.end()..].chars().next();
        // Part of a longer identifier (`LOG10(`, `ABCD1`, `Sheet1.x`): not a reference.
        let embedded = before.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
            || after.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_' || c == '(');
        out.push_str(&run[last..m.start()]);
        if embedded {
            out.push_str(m.as_str());
        } else {
            match CellRef::try_from_a1(m.as_str()).and_then(|r| {
                r.rebase(drow, dcol)
                    .map_err(storycard_common::A1ParseError::from)
            }) {
                Ok(moved) => out.push_str(&moved.to_string()),
                Err(_) => out.push_str("#REF!"),
            }
        }
        last = m.end();
    }
    out.push_str(&run[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_references_follow_the_copy() {
        assert_eq!(shift_formula("=C2", 10, 0), "=C12");
        assert_eq!(shift_formula("=SUM(A1:B3)*2", 10, 1), "=SUM(B11:C13)*2");
    }

    #[test]
    fn anchors_stay_put() {
        assert_eq!(shift_formula("=$A$1+A$1+$A1", 5, 2), "=$A$1+C$1+$A6");
    }

    #[test]
    fn literals_and_functions_untouched() {
        assert_eq!(
            shift_formula("=LOG10(A1)&\"B2\"", 1, 0),
            "=LOG10(A2)&\"B2\""
        );
        assert_eq!(shift_formula("='Q1 2024'!A1", 1, 0), "='Q1 2024'!A2");
        assert_eq!(shift_formula("plain B2 text", 3, 0), "plain B2 text");
    }

    #[test]
    fn references_off_sheet_become_ref_errors() {
        assert_eq!(shift_formula("=A1", -1, 0), "=#REF!");
    }
}

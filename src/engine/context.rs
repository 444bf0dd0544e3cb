// src/engine/context.rs
//
// ContextResolver: recovers the program heading a table belongs to when that
// heading is not a table column. Tables of this report family are visually
// preceded by a heading naming their program group; when a table starts a
// new page, that heading may sit at the bottom of the previous page.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default vertical offset below which a table plausibly continues from the
/// previous page.
pub const TOP_OF_PAGE_THRESHOLD: f64 = 150.0;

pub const UNKNOWN_PROGRAM: &str = "Unknown Program";

static PROGRAM_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(UG \[\d+ Years? Program\(s\)\]|PG \[\d+ Years? Program\(s\)\])")
        .expect("Failed to compile PROGRAM_LABEL_RE")
});

static PROGRAM_SHORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(UG|PG) \[(\d+)").expect("Failed to compile PROGRAM_SHORT_RE"));

fn last_label(text: &str) -> Option<String> {
    // The last match is the one closest to the table.
    PROGRAM_LABEL_RE
        .find_iter(text)
        .last()
        .map(|m| m.as_str().to_string())
}

/// Resolves the context label for a table occurrence.
///
/// `text_above` is the page text strictly above the table's vertical
/// position; `previous_page_text` is the full text of the preceding page
/// (empty for the first page). Never fails: returns "Unknown Program" when
/// no label is found.
pub fn resolve_context(
    text_above: &str,
    table_top: f64,
    previous_page_text: &str,
    top_threshold: f64,
) -> String {
    if let Some(label) = last_label(text_above) {
        return label;
    }
    if table_top < top_threshold {
        if let Some(label) = last_label(previous_page_text) {
            return label;
        }
    }
    UNKNOWN_PROGRAM.to_string()
}

/// Approximates the page text strictly above the table's vertical position
/// when the collaborator did not supply an exact `text_above` crop. Line
/// offsets are unknown in the flat page text, so the split is proportional
/// to the table's position on the page.
pub fn text_above_table(page_text: &str, table_top: f64, page_height: f64) -> String {
    if page_text.is_empty() || page_height <= 0.0 {
        return String::new();
    }
    let fraction = (table_top / page_height).clamp(0.0, 1.0);
    let lines: Vec<&str> = page_text.lines().collect();
    let keep = ((lines.len() as f64) * fraction).floor() as usize;
    lines[..keep.min(lines.len())].join("\n")
}

/// Condenses a full program label to its short classifier form, e.g.
/// "UG [4 Years Program(s)]" -> "UG-4". Returns None for labels outside the
/// family (including "Unknown Program").
pub fn condense_program(label: &str) -> Option<String> {
    PROGRAM_SHORT_RE
        .captures(label)
        .map(|c| format!("{}-{}", &c[1], &c[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_above_table_is_returned() {
        let above = "Some intro\nUG [4 Years Program(s)]\nPlacement details follow";
        let ctx = resolve_context(above, 400.0, "", TOP_OF_PAGE_THRESHOLD);
        assert_eq!(ctx, "UG [4 Years Program(s)]");
    }

    #[test]
    fn test_last_label_wins_when_several_above() {
        let above = "UG [4 Years Program(s)]\n...table...\nPG [2 Years Program(s)]";
        let ctx = resolve_context(above, 500.0, "", TOP_OF_PAGE_THRESHOLD);
        assert_eq!(ctx, "PG [2 Years Program(s)]");
    }

    #[test]
    fn test_label_below_table_yields_unknown() {
        // Nothing above the table; the label exists only below it, so the
        // cropped text handed to the resolver is empty.
        let ctx = resolve_context("", 400.0, "", TOP_OF_PAGE_THRESHOLD);
        assert_eq!(ctx, UNKNOWN_PROGRAM);
    }

    #[test]
    fn test_previous_page_fallback_near_page_top() {
        let prev = "...end of previous page\nPG [2 Years Program(s)]";
        let ctx = resolve_context("", 100.0, prev, TOP_OF_PAGE_THRESHOLD);
        assert_eq!(ctx, "PG [2 Years Program(s)]");
    }

    #[test]
    fn test_no_previous_page_fallback_when_table_is_low() {
        let prev = "PG [2 Years Program(s)]";
        let ctx = resolve_context("", 400.0, prev, TOP_OF_PAGE_THRESHOLD);
        assert_eq!(ctx, UNKNOWN_PROGRAM);
    }

    #[test]
    fn test_condense_program() {
        assert_eq!(
            condense_program("UG [4 Years Program(s)]").as_deref(),
            Some("UG-4")
        );
        assert_eq!(
            condense_program("PG [2 Years Program(s)]").as_deref(),
            Some("PG-2")
        );
        assert_eq!(condense_program(UNKNOWN_PROGRAM), None);
    }

    #[test]
    fn test_text_above_table_is_proportional() {
        let text = "line1\nline2\nline3\nline4";
        assert_eq!(text_above_table(text, 400.0, 800.0), "line1\nline2");
        assert_eq!(text_above_table(text, 0.0, 800.0), "");
        assert_eq!(text_above_table(text, 800.0, 800.0), text);
    }
}

//! Diff rendering and lexical function extraction.
//!
//! The renderer is a deliberately simple line-aligned walk, not an LCS
//! diff: it pairs lines by index and marks mismatches as a removal
//! followed by an addition. It makes no attempt at alignment or move
//! detection, so an inserted line near the top shows every following
//! line as changed. Good enough for a quick at-a-glance view of small
//! edits; anything needing a minimal diff should go through git.

use std::sync::LazyLock;

use regex::Regex;

/// `def name(` at any indentation.
static FUNCTION_DEF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*def\s+([a-zA-Z_][a-zA-Z0-9_]*)\s*\(").expect("valid regex literal")
});

/// Render a line-aligned, unified-diff-style view of two text blobs.
///
/// Header is a fixed two-line marker plus one fixed hunk header. For each
/// index present in both inputs an equal line becomes context; a differing
/// one becomes `-old` then `+new`. Indices present on only one side emit
/// only that side's marker.
pub fn render(old: &str, new: &str) -> String {
    let old_lines: Vec<&str> = old.split('\n').collect();
    let new_lines: Vec<&str> = new.split('\n').collect();

    let mut out = String::from("--- a/file\n+++ b/file\n@@ -1,1 +1,1 @@\n");
    for i in 0..old_lines.len().max(new_lines.len()) {
        match (old_lines.get(i), new_lines.get(i)) {
            (Some(old_line), Some(new_line)) if old_line == new_line => {
                out.push_str(&format!(" {old_line}\n"));
            }
            (Some(old_line), Some(new_line)) => {
                out.push_str(&format!("-{old_line}\n+{new_line}\n"));
            }
            (Some(old_line), None) => {
                out.push_str(&format!("-{old_line}\n"));
            }
            (None, Some(new_line)) => {
                out.push_str(&format!("+{new_line}\n"));
            }
            (None, None) => {}
        }
    }
    out
}

/// Scan for top-level `def` lines and return function names in source
/// order, without de-duplication.
pub fn extract_function_names(code: &str) -> Vec<String> {
    FUNCTION_DEF
        .captures_iter(code)
        .map(|cap| cap[1].to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const HEADER_LINES: usize = 3;

    #[test]
    fn identical_inputs_render_only_context() {
        let text = "line one\nline two\nline three";
        let rendered = render(text, text);

        let body: Vec<&str> = rendered.lines().skip(HEADER_LINES).collect();
        assert_eq!(body.len(), 3);
        for line in &body {
            assert!(line.starts_with(' '), "expected context line, got: {line}");
        }
    }

    #[test]
    fn differing_line_emits_removal_then_addition() {
        let rendered = render("a\nb\nc", "a\nB\nc");
        let body: Vec<&str> = rendered.lines().skip(HEADER_LINES).collect();
        assert_eq!(body, vec![" a", "-b", "+B", " c"]);
    }

    #[test]
    fn trailing_lines_on_one_side_only() {
        let rendered = render("a", "a\nb\nc");
        let body: Vec<&str> = rendered.lines().skip(HEADER_LINES).collect();
        assert_eq!(body, vec![" a", "+b", "+c"]);

        let rendered = render("a\nb", "a");
        let body: Vec<&str> = rendered.lines().skip(HEADER_LINES).collect();
        assert_eq!(body, vec![" a", "-b"]);
    }

    #[test]
    fn header_is_fixed() {
        let rendered = render("x", "y");
        assert!(rendered.starts_with("--- a/file\n+++ b/file\n@@ -1,1 +1,1 @@\n"));
    }

    #[test]
    fn extracts_functions_in_source_order_without_dedup() {
        let code = "def alpha():\n    pass\n\nclass C:\n    def beta(self, x):\n        pass\n\ndef alpha(y):\n    pass\n";
        assert_eq!(extract_function_names(code), vec!["alpha", "beta", "alpha"]);
    }

    #[test]
    fn ignores_non_def_lines() {
        let code = "x = defer()\n# def commented(x):\nprint('def fake(')\n";
        assert!(extract_function_names(code).is_empty());
    }
}

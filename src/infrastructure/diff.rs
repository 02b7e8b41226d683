use similar::{ChangeTag, TextDiff};

/// Unified diff of two versions of `name`, for display only.
pub fn unified_diff(old: &str, new: &str, name: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(&format!("a/{}", name), &format!("b/{}", name))
        .to_string()
}

/// Counts of (inserted, deleted) lines.
pub fn line_stats(old: &str, new: &str) -> (usize, usize) {
    let diff = TextDiff::from_lines(old, new);
    diff.iter_all_changes()
        .fold((0, 0), |(ins, del), change| match change.tag() {
            ChangeTag::Insert => (ins + 1, del),
            ChangeTag::Delete => (ins, del + 1),
            ChangeTag::Equal => (ins, del),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_diff_marks_changed_lines() {
        let old = "A: PROC;\n CALL X;\nEND;\n";
        let new = "A: PROC;\n CALL Y;\nEND;\n";
        let diff = unified_diff(old, new, "a.pli");
        assert!(diff.contains("--- a/a.pli"));
        assert!(diff.contains("+++ b/a.pli"));
        assert!(diff.contains("- CALL X;"));
        assert!(diff.contains("+ CALL Y;"));
    }

    #[test]
    fn test_identical_text_has_empty_diff() {
        assert!(unified_diff("same\n", "same\n", "x.pli").is_empty());
        assert_eq!(line_stats("same\n", "same\n"), (0, 0));
    }

    #[test]
    fn test_line_stats() {
        assert_eq!(line_stats("a\nb\n", "a\nc\nd\n"), (2, 1));
    }
}

//! Display snippet extraction.
//!
//! A snippet is the first line containing the query (case-insensitive)
//! plus `context_lines` lines on either side. A `...` line marks each end
//! where the chunk was cut. When no line matches, the first five lines are
//! returned followed by `...`.

/// Default number of lines shown on each side of the match.
pub const DEFAULT_CONTEXT_LINES: usize = 2;

/// Lines returned when the query does not occur in the chunk.
const FALLBACK_LINES: usize = 5;

const ELLIPSIS: &str = "...";

pub fn extract_snippet(content: &str, query: &str, context_lines: usize) -> String {
    let query = query.to_lowercase();
    let lines: Vec<&str> = content.split('\n').collect();

    let matched = if query.is_empty() {
        None
    } else {
        lines
            .iter()
            .position(|line| line.to_lowercase().contains(&query))
    };

    let Some(idx) = matched else {
        let head = lines[..lines.len().min(FALLBACK_LINES)].join("\n");
        return format!("{}{}", head, ELLIPSIS);
    };

    let start = idx.saturating_sub(context_lines);
    let end = (idx + context_lines + 1).min(lines.len());

    let mut out: Vec<&str> = Vec::with_capacity(end - start + 2);
    if start > 0 {
        out.push(ELLIPSIS);
    }
    out.extend_from_slice(&lines[start..end]);
    if end < lines.len() {
        out.push(ELLIPSIS);
    }
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_in_middle_gets_both_ellipses() {
        let content = "l0\nl1\nl2\nl3 target\nl4\nl5\nl6";
        let s = extract_snippet(content, "TARGET", 2);
        assert_eq!(s, "...\nl1\nl2\nl3 target\nl4\nl5\n...");
    }

    #[test]
    fn test_match_at_start_no_leading_ellipsis() {
        let content = "## Setup\n\nRun `install.sh` to begin setup.\n";
        let s = extract_snippet(content, "setup", 2);
        assert!(s.starts_with("## Setup"));
        assert!(s.contains("install.sh"));
        assert!(s.ends_with("..."));
    }

    #[test]
    fn test_whole_chunk_no_ellipsis() {
        let s = extract_snippet("a\nb match\nc", "match", 2);
        assert_eq!(s, "a\nb match\nc");
    }

    #[test]
    fn test_no_match_falls_back_to_head() {
        let content = "1\n2\n3\n4\n5\n6\n7";
        assert_eq!(extract_snippet(content, "absent", 2), "1\n2\n3\n4\n5...");
        assert_eq!(extract_snippet("only", "absent", 2), "only...");
    }

    #[test]
    fn test_zero_context_lines() {
        let s = extract_snippet("a\nhit\nb", "hit", 0);
        assert_eq!(s, "...\nhit\n...");
    }
}

//! Heuristic keyword relevance scoring.
//!
//! The score is additive and case-insensitive:
//!
//! | Signal | Contribution |
//! |--------|--------------|
//! | Whole query appears in the header path | `+2.0` |
//! | Otherwise, each query word longer than 3 chars found in the header path | `+1.0` each |
//! | Each occurrence of the whole query in the content | `+0.1` |
//! | Chunk starts within the first 1000 bytes of its document | `+0.5` |
//!
//! The result is a ranking heuristic with no fixed upper bound, not a
//! probability.

use crate::models::Chunk;

pub const HEADER_PHRASE_BONUS: f64 = 2.0;
pub const HEADER_KEYWORD_BONUS: f64 = 1.0;
pub const OCCURRENCE_WEIGHT: f64 = 0.1;
pub const EARLY_POSITION_BONUS: f64 = 0.5;

/// Chunks starting before this byte offset get [`EARLY_POSITION_BONUS`].
pub const EARLY_POSITION_LIMIT: usize = 1000;

/// Header keywords must be longer than this many characters to count.
const MIN_KEYWORD_LEN: usize = 3;

/// Score `chunk` against `query`. Always non-negative and deterministic.
pub fn score(chunk: &Chunk, query: &str) -> f64 {
    let query = query.to_lowercase();
    let header = chunk.header_path.to_lowercase();
    let mut score = 0.0;

    if header.contains(&query) {
        score += HEADER_PHRASE_BONUS;
    } else {
        let hits = query
            .split_whitespace()
            .filter(|word| word.chars().count() > MIN_KEYWORD_LEN && header.contains(word))
            .count();
        score += hits as f64 * HEADER_KEYWORD_BONUS;
    }

    score += count_occurrences(&chunk.content.to_lowercase(), &query) as f64 * OCCURRENCE_WEIGHT;

    if chunk.start_char < EARLY_POSITION_LIMIT {
        score += EARLY_POSITION_BONUS;
    }

    score
}

/// True if `content` contains `query`, ignoring case.
pub fn contains_ignore_case(content: &str, query: &str) -> bool {
    content.to_lowercase().contains(&query.to_lowercase())
}

/// Count non-overlapping occurrences of `needle` in `haystack`.
///
/// An empty needle never matches.
fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(header: &str, content: &str, start: usize) -> Chunk {
        Chunk {
            content: content.to_string(),
            header_path: header.to_string(),
            start_char: start,
            end_char: start + content.len(),
            source_id: "doc.md".to_string(),
        }
    }

    #[test]
    fn test_header_phrase_match() {
        let c = chunk("Intro > Setup", "nothing relevant", 5000);
        assert!((score(&c, "setup") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_header_keyword_fallback() {
        let c = chunk("Environment Variables", "unrelated", 5000);
        // "variables" and "environment" hit; "use" is too short to count.
        let s = score(&c, "use environment variables here");
        assert!((s - 2.0).abs() < 1e-9, "got {}", s);
    }

    #[test]
    fn test_keyword_fallback_skipped_after_phrase_match() {
        let c = chunk("Deploy Guide", "", 5000);
        assert!((score(&c, "deploy guide") - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_words_ignored() {
        let c = chunk("How to run", "", 5000);
        assert_eq!(score(&c, "run it now please"), 0.0);
    }

    #[test]
    fn test_content_occurrences_case_insensitive() {
        let c = chunk("Other", "Cargo builds. cargo tests. CARGO runs.", 5000);
        assert!((score(&c, "cargo") - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_position_bonus() {
        let early = chunk("X", "text", 999);
        let late = chunk("X", "text", 1000);
        assert!((score(&early, "zzz") - 0.5).abs() < 1e-9);
        assert_eq!(score(&late, "zzz"), 0.0);
    }

    #[test]
    fn test_monotonic_in_occurrences() {
        let mut prev = -1.0;
        for n in 0..10 {
            let c = chunk("Section", &"needle hay ".repeat(n), 200);
            let s = score(&c, "needle");
            assert!(s >= prev, "score decreased at n={}", n);
            prev = s;
        }
    }

    #[test]
    fn test_deterministic_and_non_negative() {
        let c = chunk("A > B", "some content about b", 10);
        let a = score(&c, "b");
        assert_eq!(a, score(&c, "b"));
        assert!(a >= 0.0);
        assert!(score(&c, "") >= 0.0);
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Run Install.SH now", "install.sh"));
        assert!(!contains_ignore_case("nothing", "install"));
    }
}

//! Structure-aware Markdown chunker.
//!
//! Splits a document into [`Chunk`]s along header boundaries first, then
//! along paragraph boundaries for sections that exceed `max_chunk_size`.
//! Every chunk records the chain of enclosing headers (its *header path*)
//! and the byte range it occupies in the source text.
//!
//! # Algorithm
//!
//! 1. Scan lines. A line of 1–6 `#` characters followed by whitespace and a
//!    title opens a new section. Open headers live on a stack; entries whose
//!    level is `>=` the new header's level are popped before it is pushed, so
//!    siblings replace each other and deeper headers extend the path.
//! 2. Each section spans its header line through the line before the next
//!    header. Whitespace-only sections are dropped.
//! 3. A section of at most `max_chunk_size` characters becomes one chunk.
//! 4. Larger sections are split on blank lines (`\n\n`) and consecutive
//!    paragraphs are packed greedily. A single paragraph larger than the
//!    ceiling is emitted whole; the ceiling never truncates a paragraph.
//!
//! Chunk content is always an exact slice of the source:
//! `&text[chunk.start_char..chunk.end_char] == chunk.content`.
//!
//! # Example
//!
//! ```rust
//! use md_harness::chunk::chunk_document;
//!
//! let text = "# Intro\n\nWelcome.\n\n## Setup\n\nRun the installer.\n";
//! let chunks = chunk_document(text, 500, "guide.md");
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].header_path, "Intro > Setup");
//! ```

use crate::models::Chunk;

/// Separator placed between titles in a header path.
pub const HEADER_SEPARATOR: &str = " > ";

/// Header path of text that precedes the first header.
pub const ROOT_HEADER: &str = "(root)";

/// Default chunk size ceiling, in characters.
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 1000;

/// A header-delimited region of the document, as absolute byte offsets.
struct Section {
    header_path: String,
    start: usize,
    end: usize,
}

/// Split `text` into chunks, preserving section hierarchy.
///
/// Chunks are returned in document order. An empty (or whitespace-only)
/// document yields no chunks. Arbitrary input never panics: anything that
/// does not parse as a header is body text.
pub fn chunk_document(text: &str, max_chunk_size: usize, source_id: &str) -> Vec<Chunk> {
    let mut chunks = Vec::new();

    for section in split_sections(text) {
        let body = &text[section.start..section.end];
        if char_len(body) <= max_chunk_size {
            chunks.push(Chunk {
                content: body.to_string(),
                header_path: section.header_path,
                start_char: section.start,
                end_char: section.end,
                source_id: source_id.to_string(),
            });
        } else {
            pack_paragraphs(text, &section, max_chunk_size, source_id, &mut chunks);
        }
    }

    chunks
}

/// Parse a Markdown ATX header line into `(level, title)`.
///
/// Leading and trailing whitespace on the line is ignored. Returns `None`
/// for lines with more than six markers, no whitespace after the markers,
/// or an empty title.
pub fn parse_header(line: &str) -> Option<(usize, &str)> {
    let line = line.trim();
    let level = line.bytes().take_while(|&b| b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }

    let rest = &line[level..];
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let title = rest.trim();
    if title.is_empty() {
        return None;
    }
    Some((level, title))
}

fn split_sections(text: &str) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut stack: Vec<(usize, String)> = Vec::new();
    let mut current = Section {
        header_path: ROOT_HEADER.to_string(),
        start: 0,
        end: 0,
    };
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        if let Some((level, title)) = parse_header(line) {
            current.end = offset;
            push_section(text, current, &mut sections);

            while stack.last().is_some_and(|(open, _)| *open >= level) {
                stack.pop();
            }
            stack.push((level, title.to_string()));

            current = Section {
                header_path: header_path(&stack),
                start: offset,
                end: offset,
            };
        }
        offset += line.len();
    }

    current.end = offset;
    push_section(text, current, &mut sections);
    sections
}

fn push_section(text: &str, section: Section, sections: &mut Vec<Section>) {
    if !text[section.start..section.end].trim().is_empty() {
        sections.push(section);
    }
}

fn header_path(stack: &[(usize, String)]) -> String {
    stack
        .iter()
        .map(|(_, title)| title.as_str())
        .collect::<Vec<_>>()
        .join(HEADER_SEPARATOR)
}

/// Greedily pack the paragraphs of an oversized section into chunks.
fn pack_paragraphs(
    text: &str,
    section: &Section,
    max_chunk_size: usize,
    source_id: &str,
    chunks: &mut Vec<Chunk>,
) {
    let body = &text[section.start..section.end];
    let mut buf: Option<(usize, usize)> = None;

    for (para_start, para_end) in paragraph_spans(body) {
        let (para_start, para_end) = (section.start + para_start, section.start + para_end);
        if text[para_start..para_end].trim().is_empty() {
            continue;
        }

        buf = match buf {
            Some((buf_start, buf_end)) => {
                if char_len(text[buf_start..para_end].trim()) > max_chunk_size {
                    push_trimmed(text, buf_start, buf_end, &section.header_path, source_id, chunks);
                    Some((para_start, para_end))
                } else {
                    Some((buf_start, para_end))
                }
            }
            None => Some((para_start, para_end)),
        };
    }

    if let Some((buf_start, buf_end)) = buf {
        push_trimmed(text, buf_start, buf_end, &section.header_path, source_id, chunks);
    }
}

/// Byte spans of `\n\n`-delimited paragraphs, relative to `body`.
fn paragraph_spans(body: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = 0;
    for (idx, sep) in body.match_indices("\n\n") {
        spans.push((start, idx));
        start = idx + sep.len();
    }
    spans.push((start, body.len()));
    spans
}

/// Emit `text[start..end]` with surrounding whitespace removed, keeping
/// the offsets aligned with the trimmed content.
fn push_trimmed(
    text: &str,
    start: usize,
    end: usize,
    header_path: &str,
    source_id: &str,
    chunks: &mut Vec<Chunk>,
) {
    let raw = &text[start..end];
    let lead = raw.len() - raw.trim_start().len();
    let trail = raw.len() - raw.trim_end().len();
    let (start, end) = (start + lead, end - trail);
    if start >= end {
        return;
    }

    chunks.push(Chunk {
        content: text[start..end].to_string(),
        header_path: header_path.to_string(),
        start_char: start,
        end_char: end,
        source_id: source_id.to_string(),
    });
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

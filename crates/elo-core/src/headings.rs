//! ATX heading extraction and block id annotation.

use crate::blocks::{extract_block_id, HeadingRef};
use crate::frontmatter;

/// Headings of a document, in order.
///
/// Only ATX headings (`#` to `######` followed by a space or end of line)
/// are recognised. Lines inside the leading metadata block and inside
/// fenced code (```` ``` ```` or `~~~`) are skipped. Line numbers refer to
/// the full document.
pub fn extract_headings(content: &str) -> Vec<HeadingRef> {
    let body = frontmatter::split(content).body;
    let offset = content[..content.len() - body.len()].matches('\n').count();

    let mut headings = Vec::new();
    let mut fence: Option<&str> = None;

    for (idx, line) in body.lines().enumerate() {
        let trimmed = line.trim_start();

        if let Some(marker) = fence {
            if trimmed.starts_with(marker) {
                fence = None;
            }
            continue;
        }
        if trimmed.starts_with("```") {
            fence = Some("```");
            continue;
        }
        if trimmed.starts_with("~~~") {
            fence = Some("~~~");
            continue;
        }

        if let Some(text) = heading_text(line) {
            headings.push(HeadingRef::new(text, offset + idx));
        }
    }

    headings
}

/// Text of an ATX heading line, without markers or closing hashes.
fn heading_text(line: &str) -> Option<&str> {
    // Up to three spaces of indentation.
    let indent = line.len() - line.trim_start_matches(' ').len();
    if indent > 3 {
        return None;
    }
    let rest = &line[indent..];
    let level = rest.len() - rest.trim_start_matches('#').len();
    if level == 0 || level > 6 {
        return None;
    }
    let after = &rest[level..];
    if !after.is_empty() && !after.starts_with([' ', '\t']) {
        return None;
    }

    let text = after.trim();
    let text = text.trim_end_matches('#');
    // `## Title ##`: closing run only counts when preceded by whitespace.
    let text = if text.len() < after.trim().len() && !text.is_empty() && !text.ends_with([' ', '\t']) {
        after.trim()
    } else {
        text.trim_end()
    };
    Some(text)
}

/// Append ` ^block_id` to heading line `line_index` unless it already has an id.
///
/// Returns the new content, or `None` when nothing changed.
pub fn annotate_heading_line(content: &str, line_index: usize, block_id: &str) -> Option<String> {
    let mut changed = false;
    let mut out = String::with_capacity(content.len() + block_id.len() + 2);

    for (idx, line) in content.split_inclusive('\n').enumerate() {
        if idx == line_index {
            let (text, ending) = split_line_ending(line);
            if extract_block_id(text).is_none() {
                out.push_str(text.trim_end());
                out.push_str(" ^");
                out.push_str(block_id);
                out.push_str(ending);
                changed = true;
                continue;
            }
        }
        out.push_str(line);
    }

    changed.then_some(out)
}

fn split_line_ending(line: &str) -> (&str, &str) {
    if let Some(text) = line.strip_suffix("\r\n") {
        (text, "\r\n")
    } else if let Some(text) = line.strip_suffix('\n') {
        (text, "\n")
    } else {
        (line, "")
    }
}

use std::ops::Range;

use crate::api::Id;

use super::*;

/// A piece of one rendered source line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment<'a> {
    Plain(&'a str),
    Highlight {
        /// The comment whose anchor covers this text, for linking the
        /// highlight to its card.
        comment: Id,
        text: &'a str,
        /// Whether this is the currently selected comment.
        active: bool,
    },
}

/// The highlight ranges kept on line `index`, in character offsets.
///
/// Candidate ranges are sorted by start. A range is kept only if it starts at
/// or after the end of the previously kept one; overlapping ranges are thrown
/// away whole, never trimmed.
pub fn accepted_ranges(index: usize, line_len: usize, threads: &[Thread]) -> Vec<(Id, Range<usize>)> {
    let mut candidates: Vec<(Id, Range<usize>)> = threads
        .iter()
        .filter_map(|t| {
            let range = t.comment.anchor.range_on(index, line_len)?;
            Some((t.id(), range))
        })
        .collect();
    candidates.sort_by_key(|(_, range)| range.start);

    let mut accepted = Vec::with_capacity(candidates.len());
    let mut last_end: Option<usize> = None;
    for (id, range) in candidates {
        if last_end.is_some_and(|end| range.start < end) {
            continue;
        }
        last_end = Some(range.end);
        accepted.push((id, range));
    }
    accepted
}

/// Splits `line` into plain and highlighted segments.
pub fn line_segments<'a>(
    line: &'a str,
    index: usize,
    threads: &[Thread],
    active: Option<Id>,
) -> Vec<Segment<'a>> {
    let line_len = line.chars().count();
    let ranges = accepted_ranges(index, line_len, threads);

    let mut segments = Vec::with_capacity(2 * ranges.len() + 1);
    let mut cursor = 0;
    for (comment, range) in ranges {
        if cursor < range.start {
            segments.push(Segment::Plain(char_slice(line, cursor..range.start)));
        }
        segments.push(Segment::Highlight {
            comment,
            text: char_slice(line, range.clone()),
            active: active == Some(comment),
        });
        cursor = range.end;
    }
    if cursor < line_len {
        segments.push(Segment::Plain(char_slice(line, cursor..line_len)));
    }
    segments
}

/// Slices `text` by character offsets.
pub(crate) fn char_slice(text: &str, range: Range<usize>) -> &str {
    let byte = |offset: usize| {
        text.char_indices()
            .nth(offset)
            .map(|(i, _)| i)
            .unwrap_or(text.len())
    };
    &text[byte(range.start)..byte(range.end)]
}

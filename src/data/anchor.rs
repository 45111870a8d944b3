use std::ops::Range;

use serde::{Deserialize, Serialize};

/// The span of source text a comment refers to. Offsets count characters
/// within the raw text of their own line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Anchor {
    pub start_line: usize,
    pub end_line: usize,
    pub start_offset: usize,
    pub end_offset: usize,
}

impl Anchor {
    /// Replies are not attached to text and carry this anchor.
    pub const ZERO: Anchor = Anchor {
        start_line: 0,
        end_line: 0,
        start_offset: 0,
        end_offset: 0,
    };

    pub fn new(start_line: usize, end_line: usize, start_offset: usize, end_offset: usize) -> Self {
        Anchor {
            start_line,
            end_line,
            start_offset,
            end_offset,
        }
    }

    pub fn is_single_line(&self) -> bool {
        self.start_line == self.end_line
    }

    pub fn covers(&self, line: usize) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    /// The part of this span that falls on `line`, a line of `line_len`
    /// characters. Offsets past the end of the line are clamped, and empty
    /// ranges are dropped.
    pub fn range_on(&self, line: usize, line_len: usize) -> Option<Range<usize>> {
        if !self.covers(line) {
            return None;
        }

        let (start, end) = if self.is_single_line() {
            (self.start_offset, self.end_offset)
        } else {
            let start = if line == self.start_line {
                self.start_offset
            } else {
                0
            };
            let end = if line == self.end_line {
                self.end_offset
            } else {
                line_len
            };
            (start, end)
        };

        let (start, end) = (start.min(line_len), end.min(line_len));
        (start < end).then_some(start..end)
    }
}

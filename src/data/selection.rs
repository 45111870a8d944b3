use serde::{Deserialize, Serialize};

use super::highlight::char_slice;
use super::*;

/// A cursor position inside the code block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Point {
    pub line: usize,
    pub offset: usize,
}

/// One end of a browser selection, already resolved by the page script to the
/// line it falls on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Code(Point),
    /// The node is not inside a numbered source line.
    Outside,
}

impl Endpoint {
    fn point(self) -> Option<Point> {
        match self {
            Endpoint::Code(point) => Some(point),
            Endpoint::Outside => None,
        }
    }
}

/// A bounding rectangle in page pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// What the page script reports when the mouse is released.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSelection {
    /// Where the selection was started by the user.
    pub anchor: Endpoint,
    /// The earlier end in document order.
    pub start: Endpoint,
    /// The later end in document order.
    pub end: Endpoint,
    /// Bounding rectangle of the selected text.
    pub rect: Rect,
    /// Bounding rectangle of the code block.
    pub block: Rect,
}

/// Where the "add comment" control goes, relative to the code block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ButtonPosition {
    pub x: f64,
    pub y: f64,
}

impl ButtonPosition {
    fn from_rects(rect: &Rect, block: &Rect) -> Self {
        ButtonPosition {
            x: rect.right - block.left,
            y: rect.top - block.top - 30.0,
        }
    }

    /// The comment box opens just below the control.
    pub fn box_top(&self) -> f64 {
        self.y + 20.0
    }
}

/// A selection turned into something a comment can be anchored to.
#[derive(Clone, Debug, PartialEq)]
pub struct Capture {
    pub anchor: Anchor,
    pub text: String,
    pub button: ButtonPosition,
}

/// The rendered source, addressed by line and character offset.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CodeBuffer {
    lines: Vec<String>,
}

impl CodeBuffer {
    pub fn new(source: &str) -> Self {
        CodeBuffer {
            lines: source.split('\n').map(str::to_owned).collect(),
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Moves a point onto the buffer: the offset is clamped to its line.
    /// Points below the last line do not exist.
    fn clamp(&self, point: Point) -> Option<Point> {
        let len = self.line(point.line)?.chars().count();
        Some(Point {
            line: point.line,
            offset: point.offset.min(len),
        })
    }

    /// The text between two points, lines joined with `\n`.
    pub fn text_between(&self, start: Point, end: Point) -> String {
        if start.line == end.line {
            let line = self.line(start.line).unwrap_or_default();
            return char_slice(line, start.offset..end.offset).to_owned();
        }

        let mut parts = Vec::with_capacity(end.line - start.line + 1);
        for index in start.line..=end.line {
            let line = self.line(index).unwrap_or_default();
            let len = line.chars().count();
            let range = match index {
                i if i == start.line => start.offset..len,
                i if i == end.line => 0..end.offset,
                _ => 0..len,
            };
            parts.push(char_slice(line, range));
        }
        parts.join("\n")
    }

    /// Turns a reported selection into an anchor and control position.
    ///
    /// Returns `None`, hiding the control, when the selection started outside
    /// the code block, when either end does not resolve to a line, or when the
    /// selection is empty.
    pub fn capture(&self, selection: &RawSelection) -> Option<Capture> {
        selection.anchor.point()?;
        let start = self.clamp(selection.start.point()?)?;
        let end = self.clamp(selection.end.point()?)?;
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        if start == end {
            return None;
        }

        let text = self.text_between(start, end);
        if text.is_empty() {
            return None;
        }

        Some(Capture {
            anchor: Anchor::new(start.line, end.line, start.offset, end.offset),
            text,
            button: ButtonPosition::from_rects(&selection.rect, &selection.block),
        })
    }
}

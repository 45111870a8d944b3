//! The annotation engine.
//!
//! Everything here is synchronous and free of I/O except [`session`], which
//! talks to the collaborator through [`crate::api::ReviewStore`].

pub use access::{Access, Role};
pub use anchor::Anchor;
pub use comments::{build_threads, Comment, Thread};
pub use highlight::{line_segments, Segment};
pub use layout::{CardLayout, PlacedCard};
pub use selection::{ButtonPosition, Capture, CodeBuffer, Endpoint, Point, RawSelection, Rect};
pub use session::{fetch_view, load, CodeState, LoadTicket, LoadedView, ReviewSession, SessionRegistry, ViewTarget};
pub use stats::AssignmentStats;

/// Who may comment, edit and delete, and which deadline applies.
pub mod access;

/// Line and offset spans that comments are attached to.
pub mod anchor;

/// Comments and their two-level threads.
pub mod comments;

/// Splitting a source line into plain and highlighted segments.
pub mod highlight;

/// Vertical placement of comment cards beside the code.
pub mod layout;

/// Turning a browser selection into an anchor.
pub mod selection;

/// Per-user review state and the comment actions that mutate it.
pub mod session;

/// Submission and comment counts for instructors.
pub mod stats;

/// Height of one rendered source line, in pixels.
pub const LINE_HEIGHT: u32 = 24;

/// Text left behind when a comment with replies is deleted.
pub const REMOVED_TEXT: &str = "[removed]";

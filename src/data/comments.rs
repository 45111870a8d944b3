use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use crate::api::{CommentRecord, Id};

use super::*;

/// A comment on a submission file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    /// The collaborator's identifier for this comment.
    pub id: Id,

    /// The submission file the comment belongs to.
    pub file: Option<Id>,

    /// The user who wrote the comment.
    pub user: Id,

    /// The current body. Edits replace it; no history is kept.
    pub text: String,

    /// The text span the comment refers to. Zeroed for replies.
    pub anchor: Anchor,

    /// The root comment this one replies to.
    pub parent: Option<Id>,

    /// When the collaborator stored the comment.
    pub created_at: Option<DateTime<Utc>>,

    /// Vertical pixel position of the anchored text, supplied by the
    /// collaborator or derived from the start line.
    pub top_offset: u32,
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        let anchor = Anchor::new(
            record.start_line,
            record.end_line,
            record.start_offset,
            record.end_offset,
        );
        let top_offset = record
            .top_offset
            .unwrap_or_else(|| natural_top(anchor.start_line));
        Comment {
            id: record.id,
            file: record.submission_file,
            user: record.user,
            text: record.comment,
            anchor,
            parent: record.parent,
            created_at: record.created_at,
            top_offset,
        }
    }
}

fn natural_top(line: usize) -> u32 {
    u32::try_from(line)
        .unwrap_or(u32::MAX)
        .saturating_mul(LINE_HEIGHT)
}

/// A root comment and its replies in arrival order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Thread {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

impl Thread {
    pub fn new(comment: Comment) -> Self {
        Thread {
            comment,
            replies: Vec::new(),
        }
    }

    pub fn id(&self) -> Id {
        self.comment.id
    }

    pub fn has_replies(&self) -> bool {
        !self.replies.is_empty()
    }

    pub fn reply(&self, id: Id) -> Option<&Comment> {
        self.replies.iter().find(|r| r.id == id)
    }
}

/// Builds the threaded view of one file from the collaborator's flat list.
///
/// Roots keep their arrival order. A reply is attached only when its parent is
/// a root of the same file; any other reply is dropped.
pub fn build_threads(records: impl IntoIterator<Item = CommentRecord>, file: Id) -> Vec<Thread> {
    let mut roots: IndexMap<Id, Thread> = IndexMap::new();
    let mut replies = Vec::new();

    for record in records {
        if record.submission_file != Some(file) {
            continue;
        }
        let comment = Comment::from(record);
        match comment.parent {
            None => {
                roots.insert(comment.id, Thread::new(comment));
            }
            Some(_) => replies.push(comment),
        }
    }

    let mut dropped = 0;
    for reply in replies {
        let parent = reply.parent.and_then(|p| roots.get_mut(&p));
        match parent {
            Some(thread) => thread.replies.push(reply),
            None => dropped += 1,
        }
    }
    if dropped > 0 {
        tracing::debug!(file, dropped, "Dropped replies with unresolved parents");
    }

    roots.into_values().collect()
}

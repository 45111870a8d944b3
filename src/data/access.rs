use chrono::{DateTime, Utc};

use crate::api::{Assignment, Extension, Id, User};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Instructor,
    Student,
}

impl From<&User> for Role {
    fn from(user: &User) -> Self {
        if user.is_teacher {
            Role::Instructor
        } else {
            Role::Student
        }
    }
}

/// What one viewer may do with comments on one assignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Access {
    pub viewer: Id,
    pub role: Role,
    pub commenting_deadline: Option<DateTime<Utc>>,
}

impl Access {
    pub fn new(viewer: Id, role: Role, commenting_deadline: Option<DateTime<Utc>>) -> Self {
        Access {
            viewer,
            role,
            commenting_deadline,
        }
    }

    pub fn is_instructor(&self) -> bool {
        self.role == Role::Instructor
    }

    /// Instructors may always comment. Students may until the commenting
    /// deadline, and not at all if none is known.
    pub fn can_comment(&self, now: DateTime<Utc>) -> bool {
        self.is_instructor() || self.commenting_deadline.is_some_and(|d| now < d)
    }

    pub fn can_reply(&self, now: DateTime<Utc>) -> bool {
        self.can_comment(now)
    }

    /// Only authors edit, and only while commenting is open to them.
    pub fn can_edit(&self, author: Id, now: DateTime<Utc>) -> bool {
        author == self.viewer && self.can_comment(now)
    }

    pub fn can_delete(&self, author: Id, now: DateTime<Utc>) -> bool {
        self.is_instructor() || (author == self.viewer && self.can_comment(now))
    }
}

/// The submission deadline that applies to `user`: a personal extension wins
/// over a class-wide one, which wins over the assignment's own deadline.
pub fn effective_deadline(assignment: &Assignment, extensions: &[Extension], user: Option<Id>) -> DateTime<Utc> {
    let personal = user.and_then(|u| extensions.iter().find(|e| e.user == Some(u)));
    let class_wide = extensions.iter().find(|e| e.user.is_none());
    personal
        .or(class_wide)
        .map(|e| e.extended_submission_deadline)
        .unwrap_or(assignment.submission_deadline)
}

/// An extension must end after the assignment's own submission deadline.
pub fn validate_extension(assignment: &Assignment, extended: DateTime<Utc>) -> Result<(), &'static str> {
    if extended <= assignment.submission_deadline {
        return Err("Extended deadline must be after the original submission deadline");
    }
    Ok(())
}

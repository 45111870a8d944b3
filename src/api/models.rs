use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Identifier assigned by the collaborator to every resource.
pub type Id = u64;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub is_teacher: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: Id,
    pub code: String,
    pub name: String,
    pub term: String,
    pub year: u16,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub teacher: Id,
    #[serde(default)]
    pub students: Vec<Id>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewClass {
    pub code: String,
    pub name: String,
    pub term: String,
    pub year: u16,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub teacher: Id,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Id,
    pub course: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub release_date: DateTime<Utc>,
    pub submission_deadline: DateTime<Utc>,
    pub commenting_deadline: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewAssignment {
    pub course: Id,
    pub name: String,
    pub description: String,
    pub release_date: DateTime<Utc>,
    pub submission_deadline: DateTime<Utc>,
    pub commenting_deadline: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: Id,
    pub assignment: Id,
    #[serde(default)]
    pub users: Vec<User>,
}

/// A deadline extension. `user` is `None` for a class-wide extension.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extension {
    pub id: Id,
    pub assignment: Id,
    pub user: Option<Id>,
    pub extended_submission_deadline: DateTime<Utc>,
}

/// Body for creating extensions, either class-wide or for listed students.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExtensionRequest {
    pub extended_deadline: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub all: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub students: Vec<Id>,
}

/// Body for removing extensions.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExtensionRemoval {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub all: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub students: Vec<Id>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: Id,
    pub assignment: Id,
    pub user: Id,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub comments: Vec<CommentRecord>,
    #[serde(default)]
    pub files: Vec<SubmissionFile>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewSubmission {
    pub assignment: Id,
    pub user: Id,
    pub is_current: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionFile {
    pub id: Id,
    pub name: String,
    pub submission: Id,
    #[serde(default)]
    pub content: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewFile {
    pub name: String,
    pub submission: Id,
    pub content: String,
}

/// A comment exactly as the collaborator stores it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: Id,
    pub submission: Id,
    pub submission_file: Option<Id>,
    pub user: Id,
    pub comment: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    #[serde(default)]
    pub parent: Option<Id>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub top_offset: Option<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewComment {
    pub submission: Id,
    pub submission_file: Id,
    pub user: Id,
    pub comment: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_offset: usize,
    pub end_offset: usize,
    pub parent: Option<Id>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CommentPatch {
    pub comment: String,
}

/// Filters for an assignment's submission list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubmissionQuery {
    pub student: Option<Id>,
    pub current: bool,
    pub requester: Option<Id>,
}

impl SubmissionQuery {
    pub(super) fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(student) = self.student {
            pairs.push(("student", student.to_string()));
        }
        if self.current {
            pairs.push(("current", "true".to_owned()));
        }
        if let Some(requester) = self.requester {
            pairs.push(("requester", requester.to_string()));
        }
        pairs
    }
}

/// Result of a roster change. A bulk add that skips unknown addresses reports
/// them in `not_found` and returns no roster.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RosterOutcome {
    pub students: Option<Vec<User>>,
    pub not_found: Vec<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
pub(super) enum RosterResponse {
    Students(Vec<User>),
    Partial { not_found: Vec<String> },
}

impl From<RosterResponse> for RosterOutcome {
    fn from(response: RosterResponse) -> Self {
        match response {
            RosterResponse::Students(students) => RosterOutcome {
                students: Some(students),
                not_found: Vec::new(),
            },
            RosterResponse::Partial { not_found } => RosterOutcome {
                students: None,
                not_found,
            },
        }
    }
}

#[derive(Serialize)]
#[serde(untagged)]
pub(super) enum RosterChange<'a> {
    Add { student: &'a str },
    AddMany { students: &'a [String] },
    Remove { student: &'a str, action: &'static str },
}

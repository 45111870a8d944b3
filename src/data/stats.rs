use indexmap::IndexSet;

use crate::api::{Id, Submission};

/// Activity on one assignment, as instructors see it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AssignmentStats {
    /// Every submission returned for the assignment, current or not.
    pub submissions: usize,

    /// Distinct authors across all comments and replies.
    pub commenters: usize,

    pub comments: usize,
}

impl AssignmentStats {
    pub fn from_submissions(submissions: &[Submission]) -> Self {
        let comments = submissions.iter().flat_map(|s| &s.comments);
        let commenters: IndexSet<Id> = comments.clone().map(|c| c.user).collect();
        AssignmentStats {
            submissions: submissions.len(),
            commenters: commenters.len(),
            comments: comments.count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::api::CommentRecord;

    use super::*;

    fn submission(id: Id, user: Id, commenters: &[Id]) -> Submission {
        Submission {
            id,
            assignment: 3,
            user,
            submitted_at: None,
            is_current: true,
            comments: commenters
                .iter()
                .enumerate()
                .map(|(n, &author)| CommentRecord {
                    id: id * 100 + n as Id,
                    submission: id,
                    submission_file: Some(id),
                    user: author,
                    comment: "looks good".to_owned(),
                    start_line: 0,
                    end_line: 0,
                    start_offset: 0,
                    end_offset: 1,
                    parent: None,
                    created_at: None,
                    top_offset: None,
                })
                .collect(),
            files: Vec::new(),
        }
    }

    #[test]
    fn counts_submissions_commenters_and_comments() {
        let submissions = [
            submission(1, 20, &[21, 22, 21]),
            submission(2, 21, &[20, 22]),
            submission(3, 22, &[]),
        ];
        let stats = AssignmentStats::from_submissions(&submissions);
        assert_eq!(
            stats,
            AssignmentStats {
                submissions: 3,
                commenters: 3,
                comments: 5,
            }
        );
    }

    #[test]
    fn empty_assignment_has_no_activity() {
        assert_eq!(AssignmentStats::from_submissions(&[]), AssignmentStats::default());
    }
}

use super::components::review::panel;
use super::*;

pub fn review(user: &User, assignment: Option<&Assignment>, session: &ReviewSession, now: DateTime<Utc>) -> Markup {
    let body = html! {
        @if let Some(assignment) = assignment {
            h2 {
                a href={"/assignments/" (assignment.id)} { (assignment.name) }
            }
            p.deadline { "Commenting closes " (timestamp(&assignment.commenting_deadline)) }
        }
        (panel(session, now))
    };
    wrappers::universal(wrappers::standard(body, user), Some("review"), "Code review")
}

/// A comment in a student's history, with the owner of the submission it was
/// left on.
pub struct HistoryEntry {
    pub comment: CommentRecord,
    pub owner: Id,
}

pub struct HistoryPage<'a> {
    pub student: &'a str,
    pub student_id: Id,
    pub assignment: &'a Assignment,
    pub entries: &'a [HistoryEntry],
    pub page: usize,
    pub pages: usize,
    pub total: usize,
    pub first: usize,
}

pub fn comments(user: &User, history: &HistoryPage) -> Markup {
    let assignment = history.assignment;
    let link = |page: usize| {
        format!(
            "/students/{}/comments?assignment={}&page={page}",
            history.student_id, assignment.id
        )
    };

    let body = html! {
        h2 { "Comments by " (history.student) }
        p.context { (assignment.name) }
        @if history.total == 0 {
            p.empty { "No comments." }
        } @else {
            .pagination {
                span {
                    "Showing " (history.first + 1) "–" (history.first + history.entries.len())
                    " of " (history.total)
                }
                @if history.page > 1 {
                    a href=(link(history.page - 1)) { "Prev" }
                }
                @for page in 1..=history.pages {
                    a.current[page == history.page] href=(link(page)) { (page) }
                }
                @if history.page < history.pages {
                    a href=(link(history.page + 1)) { "Next" }
                }
            }
            ul.history {
                @for entry in history.entries {
                    @let comment = &entry.comment;
                    li {
                        a href=(review_link(assignment.id, entry)) {
                            .meta {
                                span { (line_span(&Anchor::new(comment.start_line, comment.end_line, 0, 0))) }
                                @if let Some(at) = &comment.created_at {
                                    span { (timestamp(at)) }
                                }
                            }
                            p { (comment.comment) }
                        }
                    }
                }
            }
        }
        a href={"/assignments/" (assignment.id)} { "Back to the assignment" }
    };
    wrappers::universal(wrappers::standard(body, user), None, "Comment history")
}

fn review_link(assignment: Id, entry: &HistoryEntry) -> String {
    let comment = &entry.comment;
    let mut link = format!(
        "/review?assignment={assignment}&student={}&submission={}",
        entry.owner, comment.submission
    );
    if let Some(file) = comment.submission_file {
        link.push_str(&format!("&file={file}"));
    }
    link.push_str(&format!("&comment={}", comment.id));
    link
}

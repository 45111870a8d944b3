use std::ops::Range;

use indexmap::IndexSet;

use crate::data::access::effective_deadline;
use crate::data::AssignmentStats;
use crate::html::pages::assignment::{AssignmentView, GroupStatus, MemberStatus, MemberSubmission};
use crate::html::pages::home::ClassSummary;
use crate::html::pages::review::{HistoryEntry, HistoryPage};

use super::*;

/// Comments per page of a student's comment history.
pub const HISTORY_PAGE_SIZE: usize = 10;

/// Turns a failed page load into an error page.
pub(super) fn failure(user: &User, title: &str, err: ApiError) -> Markup {
    let message = match err {
        ApiError::NotFound => "This page does not exist.",
        ApiError::Restricted => html::components::RESTRICTED_TEXT,
        err => {
            tracing::error!("Failed to load {title}: {err}");
            "This page could not be loaded. Try again later."
        }
    };
    html::pages::error(user, title, message)
}

/// Students only see assignments once they are released.
fn visible(user: &User, assignments: Vec<Assignment>) -> Vec<Assignment> {
    if user.is_teacher {
        return assignments;
    }
    let now = Utc::now();
    assignments
        .into_iter()
        .filter(|a| a.release_date <= now)
        .collect()
}

pub async fn home(headers: HeaderMap, State(state): State<AppState>) -> Result<Markup, Markup> {
    let user = auth::get_user(&headers, &state).await?;
    render_home(&state, &user, None).await
}

pub(super) async fn render_home(state: &AppState, user: &User, notice: Option<&str>) -> Result<Markup, Markup> {
    let classes = state
        .api
        .classes_for(user)
        .await
        .map_err(|err| failure(user, "Your classes", err))?;

    let mut summaries = Vec::with_capacity(classes.len());
    for class in classes {
        let assignments = match state.api.class_assignments(class.id).await {
            Ok(assignments) => visible(user, assignments),
            Err(err) => {
                tracing::error!("Failed to load assignments of class {}: {err}", class.id);
                Vec::new()
            }
        };
        summaries.push(ClassSummary { class, assignments });
    }

    Ok(html::pages::home::home(user, &summaries, notice))
}

pub async fn class(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
) -> Result<Markup, Markup> {
    let user = auth::get_user(&headers, &state).await?;
    render_class(&state, &user, id, None).await
}

pub(super) async fn render_class(
    state: &AppState,
    user: &User,
    id: Id,
    notice: Option<&str>,
) -> Result<Markup, Markup> {
    let class = state
        .api
        .class(id)
        .await
        .map_err(|err| failure(user, "Class", err))?;

    let member = if user.is_teacher {
        class.teacher == user.id
    } else {
        class.students.contains(&user.id)
    };
    if !member {
        return Err(html::pages::error(user, &class.name, "You are not part of this class."));
    }

    let assignments = state
        .api
        .class_assignments(id)
        .await
        .map_err(|err| failure(user, &class.name, err))?;
    let roster = if user.is_teacher {
        state
            .api
            .roster(id)
            .await
            .map_err(|err| failure(user, &class.name, err))?
    } else {
        Vec::new()
    };

    Ok(html::pages::class::class(
        user,
        &class,
        &roster,
        &visible(user, assignments),
        notice,
    ))
}

pub async fn assignment(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
) -> Result<Markup, Markup> {
    let user = auth::get_user(&headers, &state).await?;
    render_assignment(&state, &user, id, None).await
}

pub(super) async fn render_assignment(
    state: &AppState,
    user: &User,
    id: Id,
    notice: Option<&str>,
) -> Result<Markup, Markup> {
    let assignment = state
        .api
        .assignment(id)
        .await
        .map_err(|err| failure(user, "Assignment", err))?;
    let extensions = extensions_or_empty(state, id).await;
    let deadline = effective_deadline(&assignment, &extensions, Some(user.id));

    let mut roster = Vec::new();
    let mut groups = Vec::new();
    let mut my_group = None;
    let mut stats = None;

    if user.is_teacher {
        roster = match state.api.roster(assignment.course).await {
            Ok(roster) => roster,
            Err(err) => {
                tracing::error!("Failed to load roster of class {}: {err}", assignment.course);
                Vec::new()
            }
        };
        let all_groups = state
            .api
            .groups(id, None)
            .await
            .map_err(|err| failure(user, &assignment.name, err))?;

        let query = SubmissionQuery {
            requester: Some(user.id),
            ..SubmissionQuery::default()
        };
        let submissions = match state.api.submissions(id, &query).await {
            Ok(submissions) => submissions,
            Err(err) => {
                tracing::error!("Failed to load submissions of assignment {id}: {err}");
                Vec::new()
            }
        };
        stats = Some(AssignmentStats::from_submissions(&submissions));

        groups = all_groups
            .into_iter()
            .map(|group| GroupStatus {
                group: group.id,
                members: group
                    .users
                    .into_iter()
                    .map(|member| MemberStatus {
                        submission: submissions
                            .iter()
                            .find(|s| s.user == member.id && s.is_current)
                            .cloned(),
                        user: member,
                    })
                    .collect(),
            })
            .collect();
    } else {
        my_group = match state.api.groups(id, Some(user.id)).await {
            Ok(groups) => groups.first().map(|g| g.id),
            Err(err) => {
                tracing::error!("Failed to load group of user {}: {err}", user.id);
                None
            }
        };
    }

    let view = AssignmentView {
        assignment: &assignment,
        deadline,
        extensions: &extensions,
        roster: &roster,
        groups: &groups,
        my_group,
        stats,
        notice,
    };
    Ok(html::pages::assignment::assignment(user, &view, Utc::now()))
}

async fn extensions_or_empty(state: &AppState, assignment: Id) -> Vec<Extension> {
    match state.api.extensions(assignment).await {
        Ok(extensions) => extensions,
        Err(err) => {
            tracing::error!("Failed to load extensions of assignment {assignment}: {err}");
            Vec::new()
        }
    }
}

async fn current_submission(state: &AppState, assignment: Id, user: &User) -> Option<Submission> {
    let query = SubmissionQuery {
        student: Some(user.id),
        current: true,
        requester: Some(user.id),
    };
    match state.api.submissions(assignment, &query).await {
        Ok(submissions) => submissions.into_iter().next(),
        Err(err) => {
            tracing::error!("Failed to load current submission of user {}: {err}", user.id);
            None
        }
    }
}

pub async fn upload_page(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
) -> Result<Markup, Markup> {
    let user = auth::get_user(&headers, &state).await?;
    render_upload(&state, &user, id, None).await
}

async fn render_upload(state: &AppState, user: &User, id: Id, notice: Option<&str>) -> Result<Markup, Markup> {
    let assignment = state
        .api
        .assignment(id)
        .await
        .map_err(|err| failure(user, "Submit", err))?;
    let extensions = extensions_or_empty(state, id).await;
    let deadline = effective_deadline(&assignment, &extensions, Some(user.id));
    let current = current_submission(state, id, user).await;
    let existing = current.as_ref().and_then(|s| s.files.first());

    Ok(html::pages::assignment::upload(
        user,
        &assignment,
        deadline,
        existing,
        notice,
    ))
}

#[derive(Deserialize)]
pub struct Upload {
    name: String,
    content: String,
}

/// Stores the uploaded file as the user's current submission, replacing the
/// file already there.
pub async fn upload(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
    Form(upload): Form<Upload>,
) -> Result<Markup, Markup> {
    let user = auth::get_user(&headers, &state).await?;
    let notice = store_upload(&state, &user, id, upload).await;
    render_upload(&state, &user, id, Some(notice)).await
}

async fn store_upload(state: &AppState, user: &User, id: Id, upload: Upload) -> &'static str {
    let name = upload.name.trim();
    if name.is_empty() {
        return "Give the file a name.";
    }

    let assignment = match state.api.assignment(id).await {
        Ok(assignment) => assignment,
        Err(err) => {
            tracing::error!("Failed to load assignment {id}: {err}");
            return "Upload failed. Try again later.";
        }
    };
    let extensions = extensions_or_empty(state, id).await;
    if Utc::now() >= effective_deadline(&assignment, &extensions, Some(user.id)) {
        return "The submission deadline has passed.";
    }

    let submission = match current_submission(state, id, user).await {
        Some(submission) => submission,
        None => {
            let new = NewSubmission {
                assignment: id,
                user: user.id,
                is_current: true,
            };
            match state.api.create_submission(&new).await {
                Ok(submission) => submission,
                Err(err) => {
                    tracing::error!("Failed to create submission: {err}");
                    return "Upload failed. Try again later.";
                }
            }
        }
    };

    let file = NewFile {
        name: name.to_owned(),
        submission: submission.id,
        content: upload.content,
    };
    let result = match submission.files.first() {
        Some(existing) => state.api.update_file(existing.id, &file).await,
        None => state.api.create_file(&file).await,
    };
    match result {
        Ok(file) => {
            tracing::info!(user = user.id, file = file.id, "Submission uploaded");
            "Submitted."
        }
        Err(err) => {
            tracing::error!("Failed to store file: {err}");
            "Upload failed. Try again later."
        }
    }
}

#[derive(Deserialize)]
pub struct GroupQuery {
    group: Option<Id>,
}

/// A group's members and their current submissions. Students always see
/// their own group.
pub async fn group(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
    Query(query): Query<GroupQuery>,
) -> Result<Markup, Markup> {
    let user = auth::get_user(&headers, &state).await?;
    let assignment = state
        .api
        .assignment(id)
        .await
        .map_err(|err| failure(&user, "Group", err))?;

    let group_id = if user.is_teacher {
        query.group
    } else {
        state
            .api
            .groups(id, Some(user.id))
            .await
            .map_err(|err| failure(&user, "Group", err))?
            .first()
            .map(|g| g.id)
    };
    let Some(group_id) = group_id else {
        let message = if user.is_teacher {
            "Choose a group from the assignment page."
        } else {
            "You have not been placed in a group yet."
        };
        return Err(html::pages::error(&user, "Group", message));
    };

    let group = state
        .api
        .group(group_id)
        .await
        .map_err(|err| failure(&user, "Group", err))?;
    let query = SubmissionQuery {
        requester: Some(user.id),
        ..SubmissionQuery::default()
    };
    let submissions = state
        .api
        .submissions(id, &query)
        .await
        .map_err(|err| failure(&user, "Group", err))?;
    let names = names(&state).await;

    let entries: Vec<MemberSubmission> = group
        .users
        .iter()
        .filter_map(|member| {
            let submission = submissions
                .iter()
                .find(|s| s.user == member.id && s.is_current)?
                .clone();
            let commenters: IndexSet<Id> = submission.comments.iter().map(|c| c.user).collect();
            let commenters = commenters
                .into_iter()
                .map(|id| display_name(&names, id))
                .collect();
            Some(MemberSubmission {
                author: member.clone(),
                submission,
                commenters,
            })
        })
        .collect();

    Ok(html::pages::assignment::group(
        &user,
        &assignment,
        &group.users,
        &entries,
    ))
}

/// Display names of every user, for labelling comment authors.
pub(super) async fn names(state: &AppState) -> std::collections::HashMap<Id, String> {
    match state.api.users().await {
        Ok(users) => users.into_iter().map(|u| (u.id, u.name)).collect(),
        Err(err) => {
            tracing::error!("Failed to load user names: {err}");
            std::collections::HashMap::new()
        }
    }
}

fn display_name(names: &std::collections::HashMap<Id, String>, id: Id) -> String {
    names.get(&id).cloned().unwrap_or_else(|| format!("User {id}"))
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    assignment: Id,
    page: Option<usize>,
}

/// Every comment a student left on an assignment, newest first.
pub async fn comments(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(student): ReqPath<Id>,
    Query(query): Query<HistoryQuery>,
) -> Result<Markup, Markup> {
    let user = auth::get_user(&headers, &state).await?;
    let assignment = state
        .api
        .assignment(query.assignment)
        .await
        .map_err(|err| failure(&user, "Comment history", err))?;
    let submissions = state
        .api
        .submissions(
            query.assignment,
            &SubmissionQuery {
                requester: Some(user.id),
                ..SubmissionQuery::default()
            },
        )
        .await
        .map_err(|err| failure(&user, "Comment history", err))?;
    let name = match state.api.user(student).await {
        Ok(student) => student.name,
        Err(err) => {
            tracing::warn!("Failed to load student {student}: {err}");
            "Student".to_owned()
        }
    };

    let mut entries: Vec<HistoryEntry> = submissions
        .into_iter()
        .flat_map(|submission| {
            let owner = submission.user;
            submission
                .comments
                .into_iter()
                .filter(|c| c.user == student)
                .map(move |comment| HistoryEntry { comment, owner })
        })
        .collect();
    entries.sort_by(|a, b| b.comment.created_at.cmp(&a.comment.created_at));

    let (page, pages, range) = page_bounds(entries.len(), query.page.unwrap_or(1), HISTORY_PAGE_SIZE);
    let history = HistoryPage {
        student: &name,
        student_id: student,
        assignment: &assignment,
        entries: &entries[range.clone()],
        page,
        pages,
        total: entries.len(),
        first: range.start,
    };
    Ok(html::pages::review::comments(&user, &history))
}

/// Clamps `requested` to the available pages and returns it, the page count
/// and the slice of items it covers.
pub fn page_bounds(total: usize, requested: usize, size: usize) -> (usize, usize, Range<usize>) {
    let pages = total.div_ceil(size).max(1);
    let page = requested.clamp(1, pages);
    let start = ((page - 1) * size).min(total);
    let end = (start + size).min(total);
    (page, pages, start..end)
}

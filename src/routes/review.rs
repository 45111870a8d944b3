//! The code review page and the panel actions posted by `review.js`.
//!
//! Every rendered page gets its own review session. The page script names it
//! in the [`VIEW_HEADER`] of each action, and every action answers with the
//! re-rendered `#review` panel. Actions that are not allowed, or that the
//! collaborator rejects, leave the panel as it was.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::data::{self, RawSelection, ReviewSession, ViewTarget};
use crate::html::components::review::panel;

use super::pages::{failure, names};
use super::*;

/// Header naming the code view an action applies to.
pub const VIEW_HEADER: &str = "x-review-view";

#[derive(Deserialize)]
pub struct ReviewQuery {
    assignment: Option<Id>,
    student: Option<Id>,
    submission: Option<Id>,
    file: Option<Id>,
    comment: Option<Id>,
}

pub async fn page(
    headers: HeaderMap,
    State(state): State<AppState>,
    Query(query): Query<ReviewQuery>,
) -> Result<Markup, Markup> {
    let user = auth::get_user(&headers, &state).await?;

    let assignment = match query.assignment {
        Some(id) => Some(
            state
                .api
                .assignment(id)
                .await
                .map_err(|err| failure(&user, "Code review", err))?,
        ),
        None => None,
    };
    // Students land on their own code unless told otherwise.
    let student = match query.student {
        Some(student) => Some(student),
        None if !user.is_teacher => Some(user.id),
        None => None,
    };

    let peers = peers(&state, &user, query.assignment, student).await;
    let names = names(&state).await;
    let session = state.sessions.open(&user).await;
    {
        let mut session = session.lock().await;
        session.set_commenting_deadline(assignment.as_ref().map(|a| a.commenting_deadline));
        session.set_people(peers, names);
    }

    let target = ViewTarget {
        assignment: query.assignment,
        student,
        submission: query.submission,
        file: query.file,
    };
    data::load(&session, state.api.as_ref(), target).await;

    let mut session = session.lock().await;
    session.set_active(query.comment);
    Ok(html::pages::review::review(
        &user,
        assignment.as_ref(),
        &session,
        Utc::now(),
    ))
}

/// The members of the group whose code is being reviewed.
async fn peers(state: &AppState, user: &User, assignment: Option<Id>, student: Option<Id>) -> Vec<User> {
    let member = if user.is_teacher { student } else { Some(user.id) };
    let (Some(assignment), Some(member)) = (assignment, member) else {
        return Vec::new();
    };

    let group = match state.api.groups(assignment, Some(member)).await {
        Ok(groups) => groups.into_iter().next(),
        Err(err) => {
            tracing::error!("Failed to load group of user {member}: {err}");
            None
        }
    };
    let Some(group) = group else {
        return Vec::new();
    };
    if !group.users.is_empty() {
        return group.users;
    }
    match state.api.group(group.id).await {
        Ok(group) => group.users,
        Err(err) => {
            tracing::error!("Failed to load members of group {}: {err}", group.id);
            Vec::new()
        }
    }
}

/// The session of the view named in the request. An expired or foreign view
/// answers `410 Gone` so the page script reloads.
async fn review_session(headers: &HeaderMap, state: &AppState) -> Result<Arc<Mutex<ReviewSession>>, StatusCode> {
    let user = auth::get_user(headers, state)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let view = headers
        .get(VIEW_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .ok_or(StatusCode::BAD_REQUEST)?;
    state
        .sessions
        .session(user.id, view)
        .await
        .ok_or(StatusCode::GONE)
}

fn render(session: &ReviewSession) -> Markup {
    panel(session, Utc::now())
}

#[derive(Deserialize)]
pub struct TextForm {
    #[serde(default)]
    text: String,
}

/// Switches the panel to another group member's current submission.
pub async fn peer(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(student): ReqPath<Id>,
) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;

    let target = {
        let session = session.lock().await;
        let known = session.peers().iter().any(|p| p.id == student);
        if !known && !session.access().is_instructor() {
            return Ok(render(&session));
        }
        ViewTarget {
            assignment: session.target().assignment,
            student: Some(student),
            ..ViewTarget::default()
        }
    };
    data::load(&session, state.api.as_ref(), target).await;

    let session = session.lock().await;
    Ok(render(&session))
}

pub async fn selection(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(raw): Json<RawSelection>,
) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session.capture_selection(&raw, Utc::now());
    Ok(render(&session))
}

pub async fn compose(headers: HeaderMap, State(state): State<AppState>) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session.open_comment_box();
    Ok(render(&session))
}

pub async fn cancel(headers: HeaderMap, State(state): State<AppState>) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session.cancel_comment();
    Ok(render(&session))
}

pub async fn comment(
    headers: HeaderMap,
    State(state): State<AppState>,
    Form(form): Form<TextForm>,
) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session
        .submit_comment(state.api.as_ref(), &form.text, Utc::now())
        .await;
    Ok(render(&session))
}

pub async fn open_reply(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session.open_reply(id, Utc::now());
    Ok(render(&session))
}

pub async fn reply(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
    Form(form): Form<TextForm>,
) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session
        .submit_reply(state.api.as_ref(), id, &form.text, Utc::now())
        .await;
    Ok(render(&session))
}

pub async fn cancel_reply(headers: HeaderMap, State(state): State<AppState>) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session.cancel_reply();
    Ok(render(&session))
}

pub async fn open_edit(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session.open_edit(id, Utc::now());
    Ok(render(&session))
}

pub async fn edit(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
    Form(form): Form<TextForm>,
) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session
        .submit_edit(state.api.as_ref(), id, &form.text, Utc::now())
        .await;
    Ok(render(&session))
}

pub async fn cancel_edit(headers: HeaderMap, State(state): State<AppState>) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session.cancel_edit();
    Ok(render(&session))
}

pub async fn remove(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session.delete(state.api.as_ref(), id, Utc::now()).await;
    Ok(render(&session))
}

/// Selects a comment, highlighting its text and card.
pub async fn activate(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session.set_active(Some(id));
    Ok(render(&session))
}

/// Card heights measured by the browser, keyed by comment id.
pub async fn heights(
    headers: HeaderMap,
    State(state): State<AppState>,
    Json(heights): Json<HashMap<Id, u32>>,
) -> Result<Markup, StatusCode> {
    let session = review_session(&headers, &state).await?;
    let mut session = session.lock().await;
    session.record_heights(heights);
    Ok(render(&session))
}

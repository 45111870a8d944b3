//! Form handlers for instructor actions. Each re-renders the page the form
//! came from with a notice describing the outcome.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::data::access::validate_extension;

use super::pages::{failure, render_assignment, render_class, render_home};
use super::*;

/// The signed-in user, if they are an instructor.
async fn instructor(headers: &HeaderMap, state: &AppState) -> Result<User, Markup> {
    let user = auth::get_user(headers, state).await?;
    if !user.is_teacher {
        return Err(html::pages::error(&user, "Not allowed", "Only instructors can do that."));
    }
    Ok(user)
}

/// Fails unless `user` teaches class `class`.
async fn check_teaches(state: &AppState, user: &User, class: Id) -> Result<Class, Markup> {
    let class = state
        .api
        .class(class)
        .await
        .map_err(|err| failure(user, "Class", err))?;
    if class.teacher != user.id {
        return Err(html::pages::error(user, &class.name, "You do not teach this class."));
    }
    Ok(class)
}

/// Fails unless `user` teaches the class of assignment `id`.
async fn check_owns_assignment(state: &AppState, user: &User, id: Id) -> Result<Assignment, Markup> {
    let assignment = state
        .api
        .assignment(id)
        .await
        .map_err(|err| failure(user, "Assignment", err))?;
    check_teaches(state, user, assignment.course).await?;
    Ok(assignment)
}

/// Reads a `datetime-local` value as UTC.
pub fn parse_local(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|at| at.and_utc())
}

// Classes.

#[derive(Deserialize)]
pub struct ClassForm {
    code: String,
    name: String,
    term: String,
    year: u16,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

pub async fn create_class(
    headers: HeaderMap,
    State(state): State<AppState>,
    Form(form): Form<ClassForm>,
) -> Result<Markup, Markup> {
    let user = instructor(&headers, &state).await?;

    let notice = if form.code.trim().is_empty() || form.name.trim().is_empty() {
        "A class needs a code and a name.".to_owned()
    } else if form.end_date < form.start_date {
        "A class cannot end before it starts.".to_owned()
    } else {
        let class = NewClass {
            code: form.code.trim().to_owned(),
            name: form.name.trim().to_owned(),
            term: form.term.trim().to_owned(),
            year: form.year,
            start_date: form.start_date,
            end_date: form.end_date,
            teacher: user.id,
        };
        match state.api.create_class(&class).await {
            Ok(class) => {
                tracing::info!(class = class.id, "Class created");
                format!("Created {}.", class.name)
            }
            Err(err) => {
                tracing::error!("Failed to create class: {err}");
                "The class could not be created.".to_owned()
            }
        }
    };

    render_home(&state, &user, Some(&notice)).await
}

pub async fn delete_class(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
) -> Result<Markup, Markup> {
    let user = instructor(&headers, &state).await?;
    let class = check_teaches(&state, &user, id).await?;

    let notice = match state.api.delete_class(id).await {
        Ok(()) => {
            tracing::info!(class = id, "Class deleted");
            format!("Deleted {}.", class.name)
        }
        Err(err) => {
            tracing::error!("Failed to delete class {id}: {err}");
            format!("{} could not be deleted.", class.name)
        }
    };
    render_home(&state, &user, Some(&notice)).await
}

#[derive(Deserialize)]
pub struct RosterForm {
    students: String,
}

/// Adds one or many students by address. Unknown or malformed addresses are
/// reported back rather than failing the whole request.
pub async fn roster_add(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
    Form(form): Form<RosterForm>,
) -> Result<Markup, Markup> {
    let user = instructor(&headers, &state).await?;
    check_teaches(&state, &user, id).await?;

    let (emails, invalid) = parse_emails(&form.students);
    if emails.is_empty() && invalid.is_empty() {
        return render_class(&state, &user, id, Some("List at least one student address.")).await;
    }
    let result = match emails.as_slice() {
        [] => Ok(RosterOutcome::default()),
        [email] => state.api.roster_add(id, email).await,
        emails => state.api.roster_add_many(id, emails).await,
    };

    let mut problems = invalid;
    let notice = match result {
        Ok(outcome) => {
            problems.extend(outcome.not_found);
            if problems.is_empty() {
                format!("Added {} student(s).", emails.len())
            } else {
                format!("Not added: {}", problems.join(", "))
            }
        }
        Err(ApiError::NotFound) => {
            problems.extend(emails);
            format!("Not added: {}", problems.join(", "))
        }
        Err(err) => {
            tracing::error!("Failed to update roster of class {id}: {err}");
            "The roster could not be updated.".to_owned()
        }
    };

    render_class(&state, &user, id, Some(&notice)).await
}

#[derive(Deserialize)]
pub struct RemoveForm {
    email: String,
}

pub async fn roster_remove(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
    Form(form): Form<RemoveForm>,
) -> Result<Markup, Markup> {
    let user = instructor(&headers, &state).await?;
    check_teaches(&state, &user, id).await?;

    let notice = match state.api.roster_remove(id, form.email.trim()).await {
        Ok(_) => format!("Removed {}.", form.email.trim()),
        Err(err) => {
            tracing::error!("Failed to remove {} from class {id}: {err}", form.email);
            "The student could not be removed.".to_owned()
        }
    };
    render_class(&state, &user, id, Some(&notice)).await
}

// Assignments.

#[derive(Deserialize)]
pub struct AssignmentForm {
    course: Id,
    name: String,
    #[serde(default)]
    description: String,
    release_date: String,
    submission_deadline: String,
    commenting_deadline: String,
}

impl AssignmentForm {
    fn validate(&self) -> Result<NewAssignment, &'static str> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("An assignment needs a name.");
        }
        let (Some(release), Some(submission), Some(commenting)) = (
            parse_local(&self.release_date),
            parse_local(&self.submission_deadline),
            parse_local(&self.commenting_deadline),
        ) else {
            return Err("Enter every date and time.");
        };
        if submission <= release {
            return Err("Submissions must close after the assignment is released.");
        }
        if commenting < submission {
            return Err("Commenting cannot close before submissions do.");
        }
        Ok(NewAssignment {
            course: self.course,
            name: name.to_owned(),
            description: self.description.trim().to_owned(),
            release_date: release,
            submission_deadline: submission,
            commenting_deadline: commenting,
        })
    }
}

pub async fn create_assignment(
    headers: HeaderMap,
    State(state): State<AppState>,
    Form(form): Form<AssignmentForm>,
) -> Result<Markup, Markup> {
    let user = instructor(&headers, &state).await?;
    check_teaches(&state, &user, form.course).await?;

    let notice = match form.validate() {
        Err(problem) => problem.to_owned(),
        Ok(assignment) => match state.api.create_assignment(&assignment).await {
            Ok(assignment) => {
                tracing::info!(assignment = assignment.id, "Assignment created");
                format!("Created {}.", assignment.name)
            }
            Err(err) => {
                tracing::error!("Failed to create assignment: {err}");
                "The assignment could not be created.".to_owned()
            }
        },
    };
    render_home(&state, &user, Some(&notice)).await
}

pub async fn delete_assignment(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
) -> Result<Markup, Markup> {
    let user = instructor(&headers, &state).await?;
    let assignment = check_owns_assignment(&state, &user, id).await?;

    let notice = match state.api.delete_assignment(id).await {
        Ok(()) => {
            tracing::info!(assignment = id, "Assignment deleted");
            format!("Deleted {}.", assignment.name)
        }
        Err(err) => {
            tracing::error!("Failed to delete assignment {id}: {err}");
            format!("{} could not be deleted.", assignment.name)
        }
    };
    render_home(&state, &user, Some(&notice)).await
}

#[derive(Deserialize)]
pub struct GroupForm {
    students: String,
}

/// Creates a group from student addresses. The collaborator skips addresses
/// of students outside the class.
pub async fn create_group(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
    Form(form): Form<GroupForm>,
) -> Result<Markup, Markup> {
    let user = instructor(&headers, &state).await?;
    check_owns_assignment(&state, &user, id).await?;

    let (emails, invalid) = parse_emails(&form.students);
    let notice = if emails.is_empty() {
        "List at least one student address.".to_owned()
    } else {
        match state.api.create_group(id, &emails).await {
            Ok(groups) => {
                let placed = groups.last().map_or(0, |g| g.users.len());
                tracing::info!(assignment = id, placed, "Group created");
                if invalid.is_empty() {
                    format!("Group created with {placed} student(s).")
                } else {
                    format!("Group created with {placed} student(s). Skipped: {}", invalid.join(", "))
                }
            }
            Err(err) => {
                tracing::error!("Failed to create group for assignment {id}: {err}");
                "The group could not be created.".to_owned()
            }
        }
    };
    render_assignment(&state, &user, id, Some(&notice)).await
}

#[derive(Deserialize)]
pub struct ExtendForm {
    extended_deadline: String,
    all: Option<String>,
    #[serde(default)]
    students: String,
}

#[derive(Deserialize)]
pub struct RemoveExtensionsForm {
    all: Option<String>,
    #[serde(default)]
    students: String,
}

/// Resolves student addresses to ids using the class roster. Returns the ids
/// and the addresses that matched nobody.
async fn resolve_students(state: &AppState, class: Id, text: &str) -> Result<(Vec<Id>, Vec<String>), ApiError> {
    let (emails, mut unknown) = parse_emails(text);
    if emails.is_empty() {
        return Ok((Vec::new(), unknown));
    }
    let roster = state.api.roster(class).await?;
    let mut ids = Vec::with_capacity(emails.len());
    for email in emails {
        match roster.iter().find(|u| u.email.eq_ignore_ascii_case(&email)) {
            Some(student) => ids.push(student.id),
            None => unknown.push(email),
        }
    }
    Ok((ids, unknown))
}

pub async fn extend(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
    Form(form): Form<ExtendForm>,
) -> Result<Markup, Markup> {
    let user = instructor(&headers, &state).await?;
    let assignment = check_owns_assignment(&state, &user, id).await?;

    let notice = match add_extension(&state, &assignment, form).await {
        Ok(notice) | Err(notice) => notice,
    };
    render_assignment(&state, &user, id, Some(&notice)).await
}

async fn add_extension(state: &AppState, assignment: &Assignment, form: ExtendForm) -> Result<String, String> {
    let extended = parse_local(&form.extended_deadline).ok_or("Enter the new deadline.")?;
    validate_extension(assignment, extended)?;

    let all = form.all.is_some();
    let (students, unknown) = resolve_students(state, assignment.course, &form.students)
        .await
        .map_err(|err| {
            tracing::error!("Failed to resolve students: {err}");
            "The extension could not be saved.".to_owned()
        })?;
    if !all && students.is_empty() {
        return Err(unknown_students("Choose the whole class or list students.", &unknown));
    }

    let request = ExtensionRequest {
        extended_deadline: extended,
        all,
        students,
    };
    let created = state
        .api
        .create_extension(assignment.id, &request)
        .await
        .map_err(|err| {
            tracing::error!("Failed to extend assignment {}: {err}", assignment.id);
            "The extension could not be saved.".to_owned()
        })?;

    tracing::info!(assignment = assignment.id, count = created.len(), "Extensions saved");
    Ok(unknown_students(&format!("Saved {} extension(s).", created.len()), &unknown))
}

pub async fn remove_extensions(
    headers: HeaderMap,
    State(state): State<AppState>,
    ReqPath(id): ReqPath<Id>,
    Form(form): Form<RemoveExtensionsForm>,
) -> Result<Markup, Markup> {
    let user = instructor(&headers, &state).await?;
    let assignment = check_owns_assignment(&state, &user, id).await?;

    let notice = match resolve_students(&state, assignment.course, &form.students).await {
        Err(err) => {
            tracing::error!("Failed to resolve students: {err}");
            "The extensions could not be removed.".to_owned()
        }
        Ok((students, unknown)) => {
            let removal = ExtensionRemoval {
                all: form.all.is_some(),
                students,
            };
            if !removal.all && removal.students.is_empty() {
                unknown_students("Choose the whole class or list students.", &unknown)
            } else {
                match state.api.delete_extensions(id, &removal).await {
                    Ok(()) => unknown_students("Extensions removed.", &unknown),
                    Err(err) => {
                        tracing::error!("Failed to remove extensions of assignment {id}: {err}");
                        "The extensions could not be removed.".to_owned()
                    }
                }
            }
        }
    };
    render_assignment(&state, &user, id, Some(&notice)).await
}

fn unknown_students(message: &str, unknown: &[String]) -> String {
    if unknown.is_empty() {
        message.to_owned()
    } else {
        format!("{message} Not in the class: {}", unknown.join(", "))
    }
}

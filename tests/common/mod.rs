//! An in-memory stand-in for the REST collaborator, served on a random local
//! port.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tokio::net::TcpListener;

use peer_review::api::*;

pub const TEACHER: Id = 1;
pub const AUTHOR: Id = 2;
pub const PEER: Id = 3;
pub const CLASS: Id = 10;
pub const ASSIGNMENT: Id = 20;
pub const GROUP: Id = 30;
pub const SUBMISSION: Id = 40;
pub const FILE: Id = 50;

pub const SOURCE: &str = "fn main() {\n    println!(\"hi\");\n}\n";

pub fn at(year: i32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, 1, 1, 12, 0, 0).unwrap()
}

pub struct World {
    pub users: Vec<User>,
    pub classes: Vec<Class>,
    pub assignments: Vec<Assignment>,
    pub groups: Vec<Group>,
    pub extensions: Vec<Extension>,
    pub submissions: Vec<Submission>,
    pub files: Vec<SubmissionFile>,
    pub comments: Vec<CommentRecord>,
    /// Requesters whose submission queries answer 403.
    pub restricted: HashSet<Id>,
    pub next_id: Id,
}

fn user(id: Id, name: &str, email: &str, is_teacher: bool) -> User {
    User {
        id,
        name: name.to_owned(),
        email: email.to_owned(),
        is_teacher,
    }
}

impl World {
    /// A class with one teacher and two students in one group. Only the
    /// first student has submitted.
    pub fn seeded() -> Self {
        let users = vec![
            user(TEACHER, "Ada Teacher", "ada@union.edu", true),
            user(AUTHOR, "Ben Author", "ben@union.edu", false),
            user(PEER, "Cy Peer", "cy@union.edu", false),
        ];
        let file = SubmissionFile {
            id: FILE,
            name: "main.rs".to_owned(),
            submission: SUBMISSION,
            content: SOURCE.to_owned(),
        };
        World {
            classes: vec![Class {
                id: CLASS,
                code: "CSC-120".to_owned(),
                name: "Intro to Programming".to_owned(),
                term: "Fall".to_owned(),
                year: 2025,
                start_date: NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
                end_date: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
                teacher: TEACHER,
                students: vec![AUTHOR, PEER],
            }],
            assignments: vec![Assignment {
                id: ASSIGNMENT,
                course: CLASS,
                name: "Loops".to_owned(),
                description: "Print things.".to_owned(),
                release_date: at(2020),
                submission_deadline: at(2098),
                commenting_deadline: at(2099),
            }],
            groups: vec![Group {
                id: GROUP,
                assignment: ASSIGNMENT,
                users: vec![users[1].clone(), users[2].clone()],
            }],
            extensions: Vec::new(),
            submissions: vec![Submission {
                id: SUBMISSION,
                assignment: ASSIGNMENT,
                user: AUTHOR,
                submitted_at: Some(at(2021)),
                is_current: true,
                comments: Vec::new(),
                files: vec![file.clone()],
            }],
            files: vec![file],
            comments: Vec::new(),
            restricted: HashSet::new(),
            users,
            next_id: 100,
        }
    }

    fn id(&mut self) -> Id {
        self.next_id += 1;
        self.next_id
    }

    /// A submission as the collaborator serves it, comments nested.
    fn with_comments(&self, submission: &Submission) -> Submission {
        Submission {
            comments: self
                .comments
                .iter()
                .filter(|c| c.submission == submission.id)
                .cloned()
                .collect(),
            ..submission.clone()
        }
    }
}

type Shared = Arc<Mutex<World>>;
type Params = Query<HashMap<String, String>>;

fn found<T: serde::Serialize>(item: Option<T>) -> Response {
    match item {
        Some(item) => Json(item).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn param(params: &HashMap<String, String>, key: &str) -> Option<Id> {
    params.get(key).and_then(|value| value.parse().ok())
}

async fn users(State(world): State<Shared>, Query(params): Params) -> Response {
    let world = world.lock().unwrap();
    match params.get("email") {
        Some(email) => found(world.users.iter().find(|u| &u.email == email).cloned()),
        None => Json(world.users.clone()).into_response(),
    }
}

async fn user_by_id(State(world): State<Shared>, Path(id): Path<Id>) -> Response {
    let world = world.lock().unwrap();
    found(world.users.iter().find(|u| u.id == id).cloned())
}

async fn classes(State(world): State<Shared>, Query(params): Params) -> Response {
    let world = world.lock().unwrap();
    let classes: Vec<Class> = world
        .classes
        .iter()
        .filter(|c| {
            param(&params, "teacher").map_or(true, |t| c.teacher == t)
                && param(&params, "student").map_or(true, |s| c.students.contains(&s))
        })
        .cloned()
        .collect();
    Json(classes).into_response()
}

async fn class(State(world): State<Shared>, Path(id): Path<Id>) -> Response {
    let world = world.lock().unwrap();
    found(world.classes.iter().find(|c| c.id == id).cloned())
}

async fn class_assignments(State(world): State<Shared>, Path(id): Path<Id>) -> Response {
    let world = world.lock().unwrap();
    let assignments: Vec<Assignment> = world
        .assignments
        .iter()
        .filter(|a| a.course == id)
        .cloned()
        .collect();
    Json(assignments).into_response()
}

async fn roster(State(world): State<Shared>, Path(id): Path<Id>) -> Response {
    let world = world.lock().unwrap();
    let Some(class) = world.classes.iter().find(|c| c.id == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let students: Vec<User> = world
        .users
        .iter()
        .filter(|u| class.students.contains(&u.id))
        .cloned()
        .collect();
    Json(students).into_response()
}

async fn assignment(State(world): State<Shared>, Path(id): Path<Id>) -> Response {
    let world = world.lock().unwrap();
    found(world.assignments.iter().find(|a| a.id == id).cloned())
}

async fn groups(State(world): State<Shared>, Path(id): Path<Id>, Query(params): Params) -> Response {
    let world = world.lock().unwrap();
    let student = param(&params, "student");
    let groups: Vec<Group> = world
        .groups
        .iter()
        .filter(|g| g.assignment == id)
        .filter(|g| student.map_or(true, |s| g.users.iter().any(|u| u.id == s)))
        .cloned()
        .collect();
    Json(groups).into_response()
}

async fn group(State(world): State<Shared>, Path(id): Path<Id>) -> Response {
    let world = world.lock().unwrap();
    found(world.groups.iter().find(|g| g.id == id).cloned())
}

async fn extensions(State(world): State<Shared>, Path(id): Path<Id>) -> Response {
    let world = world.lock().unwrap();
    let extensions: Vec<Extension> = world
        .extensions
        .iter()
        .filter(|e| e.assignment == id)
        .cloned()
        .collect();
    Json(extensions).into_response()
}

async fn submissions(State(world): State<Shared>, Path(id): Path<Id>, Query(params): Params) -> Response {
    let world = world.lock().unwrap();
    if param(&params, "requester").is_some_and(|r| world.restricted.contains(&r)) {
        return StatusCode::FORBIDDEN.into_response();
    }
    let student = param(&params, "student");
    let current = params.get("current").is_some_and(|c| c == "true");
    let submissions: Vec<Submission> = world
        .submissions
        .iter()
        .filter(|s| s.assignment == id)
        .filter(|s| student.map_or(true, |student| s.user == student))
        .filter(|s| !current || s.is_current)
        .map(|s| world.with_comments(s))
        .collect();
    Json(submissions).into_response()
}

async fn submission(State(world): State<Shared>, Path(id): Path<Id>) -> Response {
    let world = world.lock().unwrap();
    let submission = world.submissions.iter().find(|s| s.id == id).map(|s| world.with_comments(s));
    found(submission)
}

async fn file(State(world): State<Shared>, Path(id): Path<Id>) -> Response {
    let world = world.lock().unwrap();
    found(world.files.iter().find(|f| f.id == id).cloned())
}

async fn add_comment(State(world): State<Shared>, Json(new): Json<NewComment>) -> Response {
    let mut world = world.lock().unwrap();
    let record = CommentRecord {
        id: world.id(),
        submission: new.submission,
        submission_file: Some(new.submission_file),
        user: new.user,
        comment: new.comment,
        start_line: new.start_line,
        end_line: new.end_line,
        start_offset: new.start_offset,
        end_offset: new.end_offset,
        parent: new.parent,
        created_at: Some(Utc::now()),
        top_offset: None,
    };
    world.comments.push(record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn update_comment(
    State(world): State<Shared>,
    Path(id): Path<Id>,
    Json(patch): Json<CommentPatch>,
) -> Response {
    let mut world = world.lock().unwrap();
    let comment = world.comments.iter_mut().find(|c| c.id == id).map(|c| {
        c.comment = patch.comment;
        c.clone()
    });
    found(comment)
}

async fn delete_comment(State(world): State<Shared>, Path(id): Path<Id>) -> StatusCode {
    let mut world = world.lock().unwrap();
    let before = world.comments.len();
    world.comments.retain(|c| c.id != id);
    if world.comments.len() < before {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// A running collaborator and the world behind it.
pub struct Collaborator {
    pub base: String,
    pub world: Shared,
}

impl Collaborator {
    pub async fn start() -> Self {
        let world = Arc::new(Mutex::new(World::seeded()));
        let app = Router::new()
            .route("/api/users/", get(users))
            .route("/api/users/:id/", get(user_by_id))
            .route("/api/classes/", get(classes))
            .route("/api/classes/:id/", get(class))
            .route("/api/classes/:id/assignments/", get(class_assignments))
            .route("/api/classes/:id/roster/", get(roster))
            .route("/api/assignments/:id/", get(assignment))
            .route("/api/assignments/:id/groups/", get(groups))
            .route("/api/assignments/:id/extensions/", get(extensions))
            .route("/api/assignments/:id/submissions/", get(submissions))
            .route("/api/groups/:id/", get(group))
            .route("/api/submit/:id/", get(submission))
            .route("/api/addfile/:id/", get(file))
            .route("/api/addcomment/", axum::routing::post(add_comment))
            .route("/api/addcomment/:id/", patch(update_comment).delete(delete_comment))
            .with_state(world.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Collaborator {
            base: format!("http://{addr}/api"),
            world,
        }
    }

    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.base, Duration::from_secs(5)).unwrap()
    }

    pub fn comments(&self) -> Vec<CommentRecord> {
        self.world.lock().unwrap().comments.clone()
    }
}

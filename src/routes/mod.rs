use axum::extract::{Form, Path as ReqPath, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use chrono::Utc;
use maud::Markup;
use serde::Deserialize;

use crate::api::*;
use crate::html;
use crate::AppState;

pub mod auth;
pub mod files;
pub mod instructor;
pub mod pages;
pub mod review;

/// Cookie holding the signed-in user's id.
pub const USER_COOKIE: &str = "review_user";

pub fn get_cookie<'a>(headers: &'a HeaderMap, key: &str) -> Option<&'a str> {
    let cookie = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == key)
        .map(|(_, value)| value)
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(auth::login_page))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/home", get(pages::home))
        .route("/classes", post(instructor::create_class))
        .route("/classes/:id", get(pages::class))
        .route("/classes/:id/roster", post(instructor::roster_add))
        .route("/classes/:id/roster/remove", post(instructor::roster_remove))
        .route("/classes/:id/delete", post(instructor::delete_class))
        .route("/assignments", post(instructor::create_assignment))
        .route("/assignments/:id", get(pages::assignment))
        .route("/assignments/:id/groups", post(instructor::create_group))
        .route("/assignments/:id/extensions", post(instructor::extend))
        .route(
            "/assignments/:id/extensions/remove",
            post(instructor::remove_extensions),
        )
        .route("/assignments/:id/delete", post(instructor::delete_assignment))
        .route(
            "/assignments/:id/submit",
            get(pages::upload_page).post(pages::upload),
        )
        .route("/assignments/:id/group", get(pages::group))
        .route("/review", get(review::page))
        .route("/review/peer/:student", post(review::peer))
        .route("/review/selection", post(review::selection))
        .route("/review/compose", post(review::compose))
        .route("/review/cancel", post(review::cancel))
        .route("/review/comment", post(review::comment))
        .route("/review/comment/:id", delete(review::remove))
        .route("/review/reply/:id/open", post(review::open_reply))
        .route("/review/reply/:id", post(review::reply))
        .route("/review/reply/cancel", post(review::cancel_reply))
        .route("/review/edit/:id/open", post(review::open_edit))
        .route("/review/edit/:id", post(review::edit))
        .route("/review/edit/cancel", post(review::cancel_edit))
        .route("/review/active/:id", post(review::activate))
        .route("/review/heights", post(review::heights))
        .route("/students/:id/comments", get(pages::comments))
        .route("/script/:file", get(files::script))
        .route("/style/:file", get(files::style))
        .with_state(state)
}

/// Splits pasted text into addresses, one per line or separated by commas.
/// Returns the well-formed addresses and the rejected entries.
pub fn parse_emails(text: &str) -> (Vec<String>, Vec<String>) {
    use std::sync::LazyLock;

    use regex::Regex;

    static EMAIL: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[^@\s,;]+@[^@\s,;]+\.[^@\s,;]+$").unwrap());

    let mut valid = Vec::new();
    let mut invalid = Vec::new();
    for entry in text.split(|c| c == '\n' || c == ',' || c == ';') {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if EMAIL.is_match(entry) {
            let email = entry.to_lowercase();
            if !valid.contains(&email) {
                valid.push(email);
            }
        } else {
            invalid.push(entry.to_owned());
        }
    }
    (valid, invalid)
}

//! Server-rendered front end for a peer code-review teaching platform.
//!
//! All persistence lives behind a REST collaborator ([`api`]). The annotation
//! engine in [`data`] turns that collaborator's flat comment lists into threads,
//! line highlights and positioned comment cards, and [`routes`] drives it through
//! one review session per signed-in user.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod data;
pub mod html;
pub mod routes;

#[derive(Clone)]
pub struct AppState {
    pub api: Arc<api::ApiClient>,
    pub sessions: Arc<data::session::SessionRegistry>,
    pub static_dir: Arc<std::path::PathBuf>,
}

impl AppState {
    pub fn new(api: api::ApiClient, static_dir: impl Into<std::path::PathBuf>) -> Self {
        AppState {
            api: Arc::new(api),
            sessions: Arc::new(data::session::SessionRegistry::default()),
            static_dir: Arc::new(static_dir.into()),
        }
    }
}

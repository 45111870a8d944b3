//! The REST collaborator that owns all persistence.

use async_trait::async_trait;
use thiserror::Error;

pub use client::ApiClient;
pub use models::*;

/// The reqwest-backed client.
pub mod client;

/// Wire types exchanged with the collaborator.
pub mod models;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to collaborator failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("collaborator answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed collaborator response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A 403 on a submission query: the viewer is locked out by an active
    /// deadline extension.
    #[error("access restricted by an active deadline extension")]
    Restricted,

    #[error("resource not found")]
    NotFound,
}

impl ApiError {
    pub(crate) fn from_status(status: reqwest::StatusCode, body: &[u8]) -> Self {
        match status {
            reqwest::StatusCode::FORBIDDEN => ApiError::Restricted,
            reqwest::StatusCode::NOT_FOUND => ApiError::NotFound,
            status => ApiError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(body).into_owned(),
            },
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The part of the collaborator the review session talks to: loading a
/// submission file with its comments, and mutating comments.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    async fn submissions(&self, assignment: Id, query: &SubmissionQuery)
        -> ApiResult<Vec<Submission>>;

    async fn submission(&self, id: Id) -> ApiResult<Submission>;

    async fn file(&self, id: Id) -> ApiResult<SubmissionFile>;

    async fn create_comment(&self, comment: &NewComment) -> ApiResult<CommentRecord>;

    async fn update_comment(&self, id: Id, text: &str) -> ApiResult<CommentRecord>;

    async fn delete_comment(&self, id: Id) -> ApiResult<()>;
}

use std::path::Path;

use super::*;

pub async fn script(State(state): State<AppState>, ReqPath(file_name): ReqPath<String>) -> Response {
    static_file(&state.static_dir.join("scripts"), &file_name, "text/javascript").await
}

pub async fn style(State(state): State<AppState>, ReqPath(file_name): ReqPath<String>) -> Response {
    static_file(&state.static_dir.join("styles"), &file_name, "text/css").await
}

async fn static_file(dir: &Path, file_name: &str, content_type: &'static str) -> Response {
    // Only plain names inside the directory are served.
    if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
        return StatusCode::NOT_FOUND.into_response();
    }

    match tokio::fs::read_to_string(dir.join(file_name)).await {
        Ok(content) => (
            [
                (header::CONTENT_TYPE, content_type.to_owned()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("inline; filename=\"{file_name}\""),
                ),
            ],
            content,
        )
            .into_response(),
        Err(err) => {
            tracing::debug!("Static file {file_name} unavailable: {err}");
            StatusCode::NOT_FOUND.into_response()
        }
    }
}

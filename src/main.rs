use std::time::Instant;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use peer_review::{api::ApiClient, config::Config, routes, AppState};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = Config::parse();
    init_tracing(config.log_json);

    let start = Instant::now();
    let api = match ApiClient::new(&config.api_url, config.api_timeout()) {
        Ok(api) => api,
        Err(err) => {
            tracing::error!("Failed to build collaborator client: {err}");
            std::process::exit(1);
        }
    };
    let state = AppState::new(api, config.static_dir.clone());
    tracing::info!(api = %config.api_url, "Client ready in {:?}", start.elapsed());

    let app = routes::router(state);

    let listener = match TcpListener::bind(config.listen).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("Failed to bind {}: {err}", config.listen);
            std::process::exit(1);
        }
    };
    tracing::info!("Listening on {}", config.listen);

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("Server stopped: {err}");
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("peer_review=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

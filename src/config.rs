use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Runtime configuration, read from the command line with environment fallbacks.
#[derive(Parser, Debug, Clone)]
#[command(name = "peer-review")]
#[command(version, about = "Peer code review front end")]
pub struct Config {
    /// Address the web server listens on.
    #[arg(long, env = "REVIEW_LISTEN", default_value = "0.0.0.0:3000")]
    pub listen: SocketAddr,

    /// Base URL of the REST collaborator, without a trailing slash.
    #[arg(long, env = "REVIEW_API_URL", default_value = "http://127.0.0.1:8000/api")]
    pub api_url: String,

    /// Per-request timeout for collaborator calls, in seconds.
    #[arg(long, env = "REVIEW_API_TIMEOUT", default_value = "10")]
    pub api_timeout_secs: u64,

    /// Directory holding the `scripts/` and `styles/` served to the browser.
    #[arg(long, env = "REVIEW_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,

    /// Emit logs as JSON lines.
    #[arg(long, env = "REVIEW_LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

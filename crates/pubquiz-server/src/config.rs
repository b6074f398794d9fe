//! Configuration from the environment (ports, CORS origin, sweep cadence).

use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_CLIENT_URL: &str = "http://localhost:5173";

const CLEANUP_INTERVAL_SECS: u64 = 30 * 60;

/// TCP port to bind, from the `PORT` env var.
pub fn port() -> u16 {
    env::var("PORT")
        .ok()
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT)
}

/// Origin allowed to reach the transport and the REST surface, from the
/// `CLIENT_URL` env var.
pub fn client_url() -> String {
    env::var("CLIENT_URL").unwrap_or_else(|_| DEFAULT_CLIENT_URL.to_string())
}

/// Cadence of the janitor sweep.
pub fn cleanup_interval() -> Duration {
    Duration::from_secs(CLEANUP_INTERVAL_SECS)
}

//! Live endpoint URL derivation.

use clinic_core::constants::LIVE_PATH;
use url::Url;

use crate::errors::{LiveError, Result};

/// WebSocket URL for a page origin: `http` becomes `ws`, `https` becomes
/// `wss`, and the path is the live endpoint path. Any path, query, or
/// fragment on the origin is dropped.
pub fn live_url_from_origin(origin: &str) -> Result<Url> {
    let origin = Url::parse(origin)?;
    let scheme = match origin.scheme() {
        "http" => "ws",
        "https" => "wss",
        other => return Err(LiveError::UnsupportedScheme(other.to_string())),
    };
    let host = origin
        .host_str()
        .ok_or_else(|| LiveError::UnsupportedScheme(format!("{} (no host)", origin.scheme())))?;
    let authority = match origin.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    Ok(Url::parse(&format!("{scheme}://{authority}{LIVE_PATH}"))?)
}

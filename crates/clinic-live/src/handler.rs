//! Applies inbound live messages to the shared cache.

use clinic_cache::{QueryCache, QueryKey};
use tracing::{error, info, warn};

use crate::protocol::ServerMessage;

/// What a message did to the cache.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageOutcome {
    /// All five collections were replaced.
    Snapshot,
    /// One slot was marked stale.
    Invalidated(QueryKey),
    /// Unknown type; nothing changed.
    Ignored(String),
    /// Undecodable frame; nothing changed.
    Malformed(String),
}

/// Decode `text` and apply it to `cache`. Never fails: bad frames are logged
/// and reported as [`MessageOutcome::Malformed`].
pub fn apply_message(cache: &QueryCache, text: &str) -> MessageOutcome {
    match ServerMessage::parse(text) {
        Ok(ServerMessage::InitialData(snapshot)) => {
            cache.apply_snapshot(*snapshot);
            MessageOutcome::Snapshot
        }
        Ok(ServerMessage::NewPatient) => {
            info!("new patient announced; patients marked stale");
            cache.invalidate(QueryKey::Patients);
            MessageOutcome::Invalidated(QueryKey::Patients)
        }
        Ok(ServerMessage::Unknown(kind)) => {
            warn!(kind = %kind, "unknown live message type");
            MessageOutcome::Ignored(kind)
        }
        Err(e) => {
            error!(error = %e, "malformed live message");
            MessageOutcome::Malformed(e.to_string())
        }
    }
}

//! # clinic-live
//!
//! Live-update channel for the clinic client.
//!
//! A single persistent WebSocket to the backend's push endpoint. On open it
//! requests a full snapshot; afterwards the server pushes snapshots and
//! change signals that are applied to the shared [`QueryCache`]. Drops are
//! followed by exactly one reconnect after the policy's delay, forever, until
//! [`LiveUpdateChannel::shutdown`].
//!
//! [`QueryCache`]: clinic_cache::QueryCache

#![deny(unsafe_code)]

pub mod channel;
pub mod endpoint;
pub mod errors;
pub mod handler;
pub mod protocol;
pub mod reconnect;
pub mod transport;

pub use channel::{ConnectionPhase, ConnectionStatus, LiveConfig, LiveUpdateChannel};
pub use endpoint::live_url_from_origin;
pub use errors::{LiveError, ProtocolError, Result};
pub use handler::{MessageOutcome, apply_message};
pub use protocol::{ClientMessage, ServerMessage};
pub use reconnect::ReconnectPolicy;
pub use transport::{Connector, LiveConnection, WsConnector};

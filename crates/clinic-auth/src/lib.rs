//! # clinic-auth
//!
//! Session lifecycle for the clinic client.
//!
//! - [`SessionManager`]: current session (cached, probed, or refreshed in the
//!   background), login, logout, registration, and user-ID recovery
//! - [`AuthBackend`]: the backend seam, with [`HttpAuthBackend`] over the
//!   real endpoints
//! - [`RegisterForm`] / [`FindIdForm`]: request bodies with local validation
//! - [`AuthError`]: rejection, connectivity, in-flight, and validation failures

#![deny(unsafe_code)]

pub mod backend;
pub mod errors;
pub mod forms;
pub mod session;

pub use backend::{AuthBackend, HttpAuthBackend};
pub use errors::{AuthError, Result, UNREACHABLE_MESSAGE};
pub use forms::{FindIdForm, LoginRequest, RegisterForm};
pub use session::SessionManager;

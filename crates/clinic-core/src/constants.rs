//! Backend endpoint paths and protocol constants.
//!
//! The collection paths double as cache slot keys, so a slot and the request
//! that refills it always agree on the name.

/// Session probe (`GET`). Returns the current user or 401.
pub const AUTH_USER_PATH: &str = "/api/auth/user";
/// Credential exchange (`POST`).
pub const AUTH_LOGIN_PATH: &str = "/api/auth/login";
/// Session teardown (`POST`).
pub const AUTH_LOGOUT_PATH: &str = "/api/auth/logout";
/// Account creation (`POST`).
pub const AUTH_REGISTER_PATH: &str = "/api/auth/register";
/// User-ID recovery by email (`POST`).
pub const AUTH_FIND_ID_PATH: &str = "/api/auth/find-id";

/// Patients collection.
pub const PATIENTS_PATH: &str = "/api/patients";
/// Treatments collection.
pub const TREATMENTS_PATH: &str = "/api/treatments";
/// Appointments collection.
pub const APPOINTMENTS_PATH: &str = "/api/appointments";
/// Patient visits collection.
pub const PATIENT_VISITS_PATH: &str = "/api/patient-visits";
/// Treatment outcomes collection.
pub const TREATMENT_OUTCOMES_PATH: &str = "/api/treatment-outcomes";

/// Chat assistant (`POST`).
pub const CHAT_PATH: &str = "/api/chat";

/// Live-update WebSocket path, relative to the page origin.
pub const LIVE_PATH: &str = "/ws";

/// Number of prior chat messages sent along with a new one.
pub const CHAT_HISTORY_WINDOW: usize = 5;

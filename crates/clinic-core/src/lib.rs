//! # clinic-core
//!
//! Foundation types and utilities for the clinic dashboard client.
//!
//! This crate provides the shared vocabulary that all other clinic crates depend on:
//!
//! - **Domain records**: `User`, `Patient`, `Treatment`, `Appointment`,
//!   `PatientVisit`, `TreatmentOutcome` in the server's camelCase wire format
//! - **Session state**: the two-node `Anonymous` / `Authenticated` machine
//! - **Notifications**: `Toast` and the fire-and-forget `Notifier` surface
//! - **Retry math**: `RetryConfig` and exponential backoff helpers
//! - **Logging**: `tracing` subscriber initialization
//! - **Endpoints**: REST paths shared by the HTTP client and the cache keys

#![deny(unsafe_code)]

pub mod constants;
pub mod logging;
pub mod models;
pub mod notify;
pub mod retry;

pub use models::{
    Appointment, CollectionsSnapshot, Patient, PatientVisit, Role, SessionState, Treatment,
    TreatmentOutcome, User,
};
pub use notify::{ChannelNotifier, Notifier, Toast, ToastVariant, TracingNotifier};
pub use retry::RetryConfig;

//! # clinic-api
//!
//! HTTP access to the clinic dashboard backend.
//!
//! - [`ApiClient`]: JSON requests against one origin with a cookie store
//! - [`CollectionFetcher`]: cache-backed reads of the five domain collections
//! - [`ChatSession`]: the chat assistant with a rolling history window
//! - [`ApiError`]: network, status, and decode failures with classification

#![deny(unsafe_code)]

pub mod chat;
pub mod client;
pub mod collections;
pub mod errors;

pub use chat::{CHAT_FAILURE_TEXT, ChatMessage, ChatRole, ChatSession};
pub use client::ApiClient;
pub use collections::CollectionFetcher;
pub use errors::{ApiError, ErrorBody, MessageField, Result};

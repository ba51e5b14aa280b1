//! # clinic-cache
//!
//! The shared client-side cache of named, typed slots.
//!
//! - [`Slot`]: one independently replaceable value with a staleness mark,
//!   an optional age window, a change subscription, and single-flight refill
//! - [`QueryCache`]: the current-user slot plus the five domain collections
//! - [`QueryKey`]: stable slot names (the REST path that refills each slot)

#![deny(unsafe_code)]

pub mod cache;
pub mod key;
pub mod slot;

pub use cache::{DEFAULT_SESSION_FRESHNESS, QueryCache};
pub use key::QueryKey;
pub use slot::Slot;

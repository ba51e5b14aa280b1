//! # clinic-settings
//!
//! Configuration management with layered sources for the clinic client.
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults**: [`ClinicSettings::default()`]
//! 2. **User file**: `~/.clinic/settings.json` (deep-merged over defaults)
//! 3. **Environment variables**: `CLINIC_*` overrides (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! let settings = clinic_settings::load_settings().unwrap_or_default();
//! println!("Backend origin: {}", settings.server.origin);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

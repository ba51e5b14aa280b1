//! Reading `settings.json` and `CLINIC_*` variables into [`ClinicSettings`].
//!
//! The defaults are serialized to JSON, the user file is merged over them,
//! the result is deserialized, env variables are applied on top, and the
//! whole thing is validated before it is handed out.

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::{ClinicSettings, ReconnectMode};

/// Resolve the path to the settings file (`~/.clinic/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".clinic").join("settings.json")
}

/// [`load_settings_from_path`] at [`settings_path`].
pub fn load_settings() -> Result<ClinicSettings> {
    load_settings_from_path(&settings_path())
}

/// Defaults, then the file at `path` (if any), then `CLINIC_*` variables.
///
/// A missing file is not an error. Unreadable files, malformed JSON and
/// settings that fail [`ClinicSettings::validate`] are.
pub fn load_settings_from_path(path: &Path) -> Result<ClinicSettings> {
    let defaults = serde_json::to_value(ClinicSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    let mut settings: ClinicSettings = serde_json::from_value(merged)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Merge `source` into `target`.
///
/// Objects merge key by key. A `null` in `source` leaves the target value
/// alone; any other non-object value (arrays included) replaces it.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Overlay `CLINIC_*` process variables.
///
/// Numbers outside their range and unrecognized booleans are logged and
/// skipped, so the file or default value stays in effect.
pub fn apply_env_overrides(settings: &mut ClinicSettings) {
    apply_overrides(settings, |name| std::env::var(name).ok());
}

/// Apply overrides from an arbitrary variable source.
///
/// Split out from [`apply_env_overrides`] so tests can supply a map instead
/// of mutating the process environment.
pub fn apply_overrides<F>(settings: &mut ClinicSettings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let read = Reader { lookup };

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read.string("CLINIC_ORIGIN") {
        settings.server.origin = v;
    }
    if let Some(v) = read.u64("CLINIC_REQUEST_TIMEOUT_MS", 100, 600_000) {
        settings.server.request_timeout_ms = v;
    }

    // ── Session ─────────────────────────────────────────────────────
    if let Some(v) = read.u64("CLINIC_SESSION_FRESHNESS_MS", 0, 86_400_000) {
        settings.session.freshness_ms = v;
    }
    if let Some(v) = read
        .u64("CLINIC_PROBE_MAX_RETRIES", 0, 10)
        .and_then(|v| u32::try_from(v).ok())
    {
        settings.session.probe_retry.max_retries = v;
    }

    // ── Live channel ────────────────────────────────────────────────
    if let Some(v) = read.bool("CLINIC_LIVE_ENABLED") {
        settings.live.enabled = v;
    }
    if let Some(v) = read.string("CLINIC_LIVE_URL") {
        settings.live.url = Some(v);
    }
    if let Some(v) = read.bool("CLINIC_LIVE_REQUIRE_SESSION") {
        settings.live.require_session = v;
    }
    if let Some(v) = read.string("CLINIC_RECONNECT_MODE") {
        match serde_json::from_value::<ReconnectMode>(Value::String(v.to_lowercase())) {
            Ok(mode) => settings.live.reconnect.mode = mode,
            Err(_) => {
                tracing::warn!(key = "CLINIC_RECONNECT_MODE", value = %v, "invalid reconnect mode, ignoring");
            }
        }
    }
    if let Some(v) = read.u64("CLINIC_RECONNECT_DELAY_MS", 100, 600_000) {
        settings.live.reconnect.delay_ms = v;
    }
    if let Some(v) = read.u64("CLINIC_RECONNECT_MAX_DELAY_MS", 100, 3_600_000) {
        settings.live.reconnect.max_delay_ms = v;
    }

    // ── Cache ───────────────────────────────────────────────────────
    if let Some(v) = read.u64("CLINIC_COLLECTION_STALE_MS", 0, 86_400_000) {
        settings.cache.collection_stale_ms = Some(v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read.string("CLINIC_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read.string("CLINIC_LOG_FORMAT") {
        settings.logging.format = v;
    }
}

// ── Pure parsing functions (testable without env vars) ──────────────────────

/// Parse a string as a boolean.
///
/// Accepts (case-insensitive): `true`/`1`/`yes`/`on` or `false`/`0`/`no`/`off`.
pub fn parse_bool(val: &str) -> Option<bool> {
    match val.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parse a string as a `u64` within a range.
pub fn parse_u64_range(val: &str, min: u64, max: u64) -> Option<u64> {
    let n: u64 = val.parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

// ── Variable readers (thin wrappers) ────────────────────────────────────────

struct Reader<F> {
    lookup: F,
}

impl<F> Reader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|v| !v.is_empty())
    }

    fn bool(&self, name: &str) -> Option<bool> {
        let val = (self.lookup)(name)?;
        let result = parse_bool(&val);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid boolean env var, ignoring");
        }
        result
    }

    fn u64(&self, name: &str, min: u64, max: u64) -> Option<u64> {
        let val = (self.lookup)(name)?;
        let result = parse_u64_range(&val, min, max);
        if result.is_none() {
            tracing::warn!(key = name, value = %val, "invalid u64 env var, ignoring");
        }
        result
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::errors::SettingsError;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    // ── deep_merge ──────────────────────────────────────────────────

    #[test]
    fn merge_nested_override() {
        let target = serde_json::json!({
            "server": {"origin": "http://a", "requestTimeoutMs": 1000}
        });
        let source = serde_json::json!({
            "server": {"origin": "http://b"}
        });
        let merged = deep_merge(target, source);
        assert_eq!(merged["server"]["origin"], "http://b");
        assert_eq!(merged["server"]["requestTimeoutMs"], 1000);
    }

    #[test]
    fn merge_array_replace() {
        let target = serde_json::json!({"items": [1, 2, 3]});
        let source = serde_json::json!({"items": [4, 5]});
        let merged = deep_merge(target, source);
        assert_eq!(merged["items"], serde_json::json!([4, 5]));
    }

    #[test]
    fn merge_null_preserves_target() {
        let target = serde_json::json!({"a": 1, "b": 2});
        let source = serde_json::json!({"a": null});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 1);
        assert_eq!(merged["b"], 2);
    }

    #[test]
    fn merge_primitive_replaces_object() {
        let target = serde_json::json!({"a": {"nested": true}});
        let source = serde_json::json!({"a": 42});
        let merged = deep_merge(target, source);
        assert_eq!(merged["a"], 42);
    }

    // ── load_settings_from_path ─────────────────────────────────────

    #[test]
    fn load_missing_file_returns_defaults() {
        let path = Path::new("/nonexistent/settings.json");
        let settings = load_settings_from_path(path).unwrap();
        let defaults = ClinicSettings::default();
        assert_eq!(settings.version, defaults.version);
        assert_eq!(
            settings.live.reconnect.delay_ms,
            defaults.live.reconnect.delay_ms
        );
    }

    #[test]
    fn load_partial_json_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"live": {"reconnect": {"mode": "exponential", "delayMs": 500}}, "session": {"probeRetry": {"maxRetries": 1}}}"#,
        )
        .unwrap();

        let settings = load_settings_from_path(&path).unwrap();
        assert_eq!(settings.live.reconnect.mode, ReconnectMode::Exponential);
        assert_eq!(settings.live.reconnect.delay_ms, 500);
        assert_eq!(settings.live.reconnect.max_delay_ms, 30_000);
        assert_eq!(settings.session.probe_retry.max_retries, 1);
        assert_eq!(settings.session.probe_retry.base_delay_ms, 1000);
        assert!(settings.live.enabled);
    }

    #[test]
    fn load_invalid_json_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "not valid json").unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(result.unwrap_err(), SettingsError::Json(_)));
    }

    #[test]
    fn load_invalid_value_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"server": {"origin": "localhost:5000"}}"#).unwrap();

        let result = load_settings_from_path(&path);
        assert!(matches!(
            result.unwrap_err(),
            SettingsError::InvalidValue(_)
        ));
    }

    // ── apply_overrides ─────────────────────────────────────────────

    #[test]
    fn overrides_apply_valid_values() {
        let env = vars(&[
            ("CLINIC_ORIGIN", "https://clinic.example"),
            ("CLINIC_LIVE_REQUIRE_SESSION", "yes"),
            ("CLINIC_RECONNECT_MODE", "Exponential"),
            ("CLINIC_RECONNECT_DELAY_MS", "1500"),
            ("CLINIC_COLLECTION_STALE_MS", "60000"),
            ("CLINIC_PROBE_MAX_RETRIES", "0"),
        ]);
        let mut settings = ClinicSettings::default();
        apply_overrides(&mut settings, |k| env.get(k).cloned());

        assert_eq!(settings.server.origin, "https://clinic.example");
        assert!(settings.live.require_session);
        assert_eq!(settings.live.reconnect.mode, ReconnectMode::Exponential);
        assert_eq!(settings.live.reconnect.delay_ms, 1500);
        assert_eq!(settings.cache.collection_stale_ms, Some(60_000));
        assert_eq!(settings.session.probe_retry.max_retries, 0);
    }

    #[test]
    fn overrides_ignore_invalid_values() {
        let env = vars(&[
            ("CLINIC_LIVE_ENABLED", "maybe"),
            ("CLINIC_RECONNECT_MODE", "linear"),
            ("CLINIC_RECONNECT_DELAY_MS", "5"),
            ("CLINIC_REQUEST_TIMEOUT_MS", "abc"),
            ("CLINIC_ORIGIN", ""),
        ]);
        let mut settings = ClinicSettings::default();
        apply_overrides(&mut settings, |k| env.get(k).cloned());

        let defaults = ClinicSettings::default();
        assert_eq!(settings.live.enabled, defaults.live.enabled);
        assert_eq!(settings.live.reconnect.mode, ReconnectMode::Fixed);
        assert_eq!(settings.live.reconnect.delay_ms, 3000);
        assert_eq!(settings.server.request_timeout_ms, 30_000);
        assert_eq!(settings.server.origin, defaults.server.origin);
    }

    #[test]
    fn probe_retry_override_respects_range() {
        let mut settings = ClinicSettings::default();
        let env = vars(&[("CLINIC_PROBE_MAX_RETRIES", "7")]);
        apply_overrides(&mut settings, |k| env.get(k).cloned());
        assert_eq!(settings.session.probe_retry.max_retries, 7);

        let env = vars(&[("CLINIC_PROBE_MAX_RETRIES", "11")]);
        apply_overrides(&mut settings, |k| env.get(k).cloned());
        assert_eq!(settings.session.probe_retry.max_retries, 7);
    }

    // ── parse helpers ───────────────────────────────────────────────

    #[test]
    fn parse_bool_variants() {
        for val in &["true", "1", "yes", "on", "TRUE", "On"] {
            assert_eq!(parse_bool(val), Some(true), "failed for {val}");
        }
        for val in &["false", "0", "no", "off", "No"] {
            assert_eq!(parse_bool(val), Some(false), "failed for {val}");
        }
        assert_eq!(parse_bool("maybe"), None);
        assert_eq!(parse_bool(""), None);
    }

    #[test]
    fn parse_u64_bounds() {
        assert_eq!(parse_u64_range("3000", 100, 600_000), Some(3000));
        assert_eq!(parse_u64_range("100", 100, 600_000), Some(100));
        assert_eq!(parse_u64_range("99", 100, 600_000), None);
        assert_eq!(parse_u64_range("700000", 100, 600_000), None);
        assert_eq!(parse_u64_range("-1", 0, 10), None);
    }
}

//! Environment-driven settings

use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_CASE_STORE: &str = "saved_cases.json";
pub const DEFAULT_NARRATIVE_MODEL: &str = "pcg-narrative";
pub const DEFAULT_NARRATIVE_TIMEOUT_MS: u64 = 60_000;
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5_000;

/// Connection settings for the HTTP narrative service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NarrativeSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for NarrativeSettings {
    fn default() -> Self {
        Self {
            url: None,
            api_key: None,
            model: DEFAULT_NARRATIVE_MODEL.to_string(),
            timeout_ms: DEFAULT_NARRATIVE_TIMEOUT_MS,
        }
    }
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub case_store: PathBuf,
    pub extended_features: bool,
    pub narrative: NarrativeSettings,
    pub store_lock_timeout_ms: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            case_store: PathBuf::from(DEFAULT_CASE_STORE),
            extended_features: false,
            narrative: NarrativeSettings::default(),
            store_lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

impl AppConfig {
    /// Read `PCG_*` variables, falling back to defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            case_store: non_empty("PCG_CASE_STORE")
                .map(PathBuf::from)
                .unwrap_or(defaults.case_store),
            extended_features: non_empty("PCG_EXTENDED_FEATURES")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.extended_features),
            narrative: NarrativeSettings {
                url: non_empty("PCG_NARRATIVE_URL"),
                api_key: non_empty("PCG_NARRATIVE_API_KEY"),
                model: non_empty("PCG_NARRATIVE_MODEL").unwrap_or(defaults.narrative.model),
                timeout_ms: non_empty("PCG_NARRATIVE_TIMEOUT_MS")
                    .and_then(|s| s.trim().parse().ok())
                    .unwrap_or(defaults.narrative.timeout_ms),
            },
            store_lock_timeout_ms: non_empty("PCG_STORE_LOCK_TIMEOUT_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.store_lock_timeout_ms),
        }
    }

    pub fn store_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.store_lock_timeout_ms)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.case_store, PathBuf::from("saved_cases.json"));
        assert_eq!(config.store_lock_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PCG_CASE_STORE", "/tmp/cases.json"),
            ("PCG_EXTENDED_FEATURES", "Yes"),
            ("PCG_NARRATIVE_URL", "http://localhost:9000/v1/narrate"),
            ("PCG_NARRATIVE_TIMEOUT_MS", "1500"),
            ("PCG_STORE_LOCK_TIMEOUT_MS", "250"),
        ]));
        assert_eq!(config.case_store, PathBuf::from("/tmp/cases.json"));
        assert!(config.extended_features);
        assert_eq!(
            config.narrative.url.as_deref(),
            Some("http://localhost:9000/v1/narrate")
        );
        assert_eq!(config.narrative.timeout_ms, 1500);
        assert_eq!(config.narrative.model, "pcg-narrative");
        assert_eq!(config.store_lock_timeout_ms, 250);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PCG_NARRATIVE_TIMEOUT_MS", "soon"),
            ("PCG_EXTENDED_FEATURES", "nope"),
            ("PCG_NARRATIVE_API_KEY", "  "),
        ]));
        assert_eq!(config.narrative.timeout_ms, DEFAULT_NARRATIVE_TIMEOUT_MS);
        assert!(!config.extended_features);
        assert!(config.narrative.api_key.is_none());
    }
}

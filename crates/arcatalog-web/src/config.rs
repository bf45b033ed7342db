//! Viewer configuration from URL query parameters
//!
//! Supported parameters:
//! - `catalog` - catalog document URL (default `catalog.json`)
//! - `assets` - base path for relative model references
//! - `marker` - marker preset (`hiro`, `kanji`) or custom pattern URL
//! - `log` - log level (`trace` .. `error`, default `warn`)

use arcatalog_core::MarkerPreset;
use bevy::prelude::*;

#[derive(Debug, Clone, Resource)]
pub struct ViewerConfig {
    pub catalog_url: String,
    pub asset_base: String,
    pub marker: MarkerPreset,
    pub log_level: tracing::Level,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            catalog_url: "catalog.json".to_string(),
            asset_base: String::new(),
            marker: MarkerPreset::Hiro,
            log_level: tracing::Level::WARN,
        }
    }
}

impl ViewerConfig {
    /// Build the config from a parameter lookup
    pub fn from_query(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let log_level = match get("log").as_deref().map(str::to_lowercase).as_deref() {
            Some("trace") => tracing::Level::TRACE,
            Some("debug") => tracing::Level::DEBUG,
            Some("info") => tracing::Level::INFO,
            Some("error") => tracing::Level::ERROR,
            _ => defaults.log_level,
        };

        Self {
            catalog_url: get("catalog")
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.catalog_url),
            asset_base: get("assets").unwrap_or(defaults.asset_base),
            marker: get("marker")
                .map(|m| MarkerPreset::from_id(&m))
                .unwrap_or(defaults.marker),
            log_level,
        }
    }

    /// Read the config from the page URL, falling back to defaults
    pub fn from_browser() -> Self {
        let params = web_sys::window()
            .and_then(|w| w.location().href().ok())
            .and_then(|href| web_sys::Url::new(&href).ok())
            .map(|url| url.search_params());

        match params {
            Some(params) => Self::from_query(|key| params.get(key)),
            None => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn query(pairs: &[(&str, &str)]) -> ViewerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ViewerConfig::from_query(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = query(&[]);
        assert_eq!(config.catalog_url, "catalog.json");
        assert_eq!(config.marker, MarkerPreset::Hiro);
        assert_eq!(config.log_level, tracing::Level::WARN);
    }

    #[test]
    fn test_overrides() {
        let config = query(&[
            ("catalog", "https://menu.example.com/catalog.json"),
            ("assets", "static"),
            ("marker", "kanji"),
            ("log", "DEBUG"),
        ]);
        assert_eq!(config.catalog_url, "https://menu.example.com/catalog.json");
        assert_eq!(config.asset_base, "static");
        assert_eq!(config.marker, MarkerPreset::Kanji);
        assert_eq!(config.log_level, tracing::Level::DEBUG);
    }

    #[test]
    fn test_empty_catalog_param_falls_back() {
        assert_eq!(query(&[("catalog", "")]).catalog_url, "catalog.json");
    }
}

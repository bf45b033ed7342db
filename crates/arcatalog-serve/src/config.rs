//! Configuration loading

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for web server
    #[serde(default = "default_bind")]
    pub bind: String,
    /// TLS configuration; browsers only grant camera access on HTTPS or localhost
    #[serde(default)]
    pub tls: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            tls: None,
        }
    }
}

/// TLS/HTTPS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM format)
    pub cert: String,
    /// Path to private key file (PEM format)
    pub key: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

/// Asset base paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Built WASM front end (index.html, .wasm, .js)
    #[serde(default = "default_web_path")]
    pub web: PathBuf,
    /// glTF/GLB models, served under /models
    #[serde(default = "default_models_path")]
    pub models: PathBuf,
    /// Entry images, served under /images
    #[serde(default = "default_images_path")]
    pub images: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            web: default_web_path(),
            models: default_models_path(),
            images: default_images_path(),
        }
    }
}

fn default_web_path() -> PathBuf {
    PathBuf::from("web")
}

fn default_models_path() -> PathBuf {
    PathBuf::from("./assets/models")
}

fn default_images_path() -> PathBuf {
    PathBuf::from("./assets/images")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Catalog document (.toml or .json)
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

fn default_catalog_path() -> PathBuf {
    PathBuf::from("./catalog.toml")
}

/// Load configuration from file, falling back to defaults when it is missing
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let config = load_config(&dir.path().join("arcatalog.toml")).unwrap();

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert!(config.server.tls.is_none());
        assert_eq!(config.catalog.path, PathBuf::from("./catalog.toml"));
    }

    #[test]
    fn test_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arcatalog.toml");
        std::fs::write(
            &path,
            r#"
[server]
bind = "127.0.0.1:9000"

[server.tls]
cert = "cert.pem"
key = "key.pem"

[assets]
models = "/srv/models"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        assert_eq!(config.server.tls.unwrap().cert, "cert.pem");
        assert_eq!(config.assets.models, PathBuf::from("/srv/models"));
        assert_eq!(config.assets.web, PathBuf::from("web"));
    }

    #[test]
    fn test_default_config_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("arcatalog.toml");

        save_default_config(&path).unwrap();
        let config = load_config(&path).unwrap();

        assert_eq!(config.server.bind, default_bind());
        assert_eq!(config.assets.images, default_images_path());
    }
}

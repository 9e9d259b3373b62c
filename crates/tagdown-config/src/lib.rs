use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// Explicit configuration value, constructed once and passed by reference
/// through the converter and the live server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub html: Html,
    pub ids: Ids,
    pub assets: AssetSources,
    pub templates: Templates,
    pub favicons: Favicons,
    pub server: Server,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct General {
    pub debug: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Html {
    /// Tags the converter is allowed to process; anything else scanned
    /// from the source is left as raw passthrough.
    pub allowed_tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Ids {
    /// Prefix for generated heading anchor ids (`section1`, `section2`, ...).
    pub title_prefix: String,
}

/// Source directories the assets are copied and served from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSources {
    pub css: PathBuf,
    pub js: PathBuf,
    pub images: PathBuf,
}

/// Optional page chrome fragments. A configured path that does not exist
/// on disk is a construction-time error in the renderer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Templates {
    pub header: Option<PathBuf>,
    pub footer: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Favicons {
    /// File names expected under the images asset directory.
    pub required_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Server {
    pub port: u16,
}

impl Default for General {
    fn default() -> Self {
        Self { debug: false }
    }
}

impl Default for Html {
    fn default() -> Self {
        Self {
            allowed_tags: [
                "h1", "h2", "h3", "h4", "h5", "h6", "p", "ul", "ol", "code", "table",
            ]
            .iter()
            .map(|tag| tag.to_string())
            .collect(),
        }
    }
}

impl Default for Ids {
    fn default() -> Self {
        Self {
            title_prefix: "section".to_string(),
        }
    }
}

impl Default for AssetSources {
    fn default() -> Self {
        Self {
            css: PathBuf::from("templates/assets/css"),
            js: PathBuf::from("templates/assets/js"),
            images: PathBuf::from("templates/assets/images"),
        }
    }
}

impl Default for Favicons {
    fn default() -> Self {
        Self {
            required_files: [
                "favicon.ico",
                "favicon-16x16.png",
                "favicon-32x32.png",
                "apple-touch-icon.png",
            ]
            .iter()
            .map(|name| name.to_string())
            .collect(),
        }
    }
}

impl Default for Server {
    fn default() -> Self {
        Self { port: 5000 }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: General::default(),
            html: Html::default(),
            ids: Ids::default(),
            assets: AssetSources::default(),
            templates: Templates::default(),
            favicons: Favicons::default(),
            server: Server::default(),
        }
    }
}

impl Config {
    /// Load configuration from an explicit path. A missing file is an error
    /// here: a caller that names a config file expects it to exist.
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Self, ConfigError> {
        let config_path = config_path.as_ref();

        let content =
            std::fs::read_to_string(config_path).map_err(|source| ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded paths
        config.assets.css = Self::expand_path(&config.assets.css).unwrap_or(config.assets.css);
        config.assets.js = Self::expand_path(&config.assets.js).unwrap_or(config.assets.js);
        config.assets.images =
            Self::expand_path(&config.assets.images).unwrap_or(config.assets.images);
        config.templates.header = config
            .templates
            .header
            .map(|path| Self::expand_path(&path).unwrap_or(path));
        config.templates.footer = config
            .templates
            .footer
            .map(|path| Self::expand_path(&path).unwrap_or(path));

        Ok(config)
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert_eq!(config.ids.title_prefix, "section");
        assert_eq!(config.server.port, 5000);
        assert!(!config.general.debug);
        assert_eq!(config.html.allowed_tags.len(), 11);
        assert!(config.templates.header.is_none());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let original = Config::default();

        let toml_str = toml::to_string(&original).unwrap();
        let deserialized: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(deserialized.ids.title_prefix, original.ids.title_prefix);
        assert_eq!(deserialized.assets.css, original.assets.css);
        assert_eq!(deserialized.server.port, original.server.port);
    }

    #[test]
    fn test_partial_config_fills_in_defaults() {
        let config: Config = toml::from_str(
            r#"
[server]
port = 8080

[ids]
title_prefix = "part"
"#,
        )
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.ids.title_prefix, "part");
        assert_eq!(config.assets.js, PathBuf::from("templates/assets/js"));
    }

    #[test]
    fn test_load_missing_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.toml");

        let result = Config::load_from_path(&missing);

        assert!(matches!(result, Err(ConfigError::ConfigReadError { .. })));
    }

    #[test]
    fn test_load_invalid_toml_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        std::fs::write(&config_file, "this is { not toml").unwrap();

        let result = Config::load_from_path(&config_file);

        assert!(matches!(result, Err(ConfigError::ConfigParseError { .. })));
    }

    #[test]
    fn test_save_and_load_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        let mut test_config = Config::default();
        test_config.server.port = 9999;

        test_config.save_to_path(&config_file).unwrap();
        let loaded = Config::load_from_path(&config_file).unwrap();

        assert_eq!(loaded.server.port, 9999);
    }

    #[test]
    fn test_load_expands_env_vars_in_asset_paths() {
        let temp_dir = TempDir::new().unwrap();
        let config_file = temp_dir.path().join("config.toml");
        unsafe {
            std::env::set_var("TAGDOWN_TEST_ASSETS", "/test/env/assets");
        }
        std::fs::write(
            &config_file,
            r#"
[assets]
css = "$TAGDOWN_TEST_ASSETS/css"
"#,
        )
        .unwrap();

        let config = Config::load_from_path(&config_file).unwrap();

        assert_eq!(config.assets.css, PathBuf::from("/test/env/assets/css"));

        unsafe {
            std::env::remove_var("TAGDOWN_TEST_ASSETS");
        }
    }
}

use crate::library::models::SmartAlbum;
use crate::library::FetchOptions;
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_MAX_RESULTS: usize = 100;
pub const DEFAULT_THUMBNAIL_SIZE: u32 = 80;

/// Which collections a scan walks.
///
/// `Albums` is the normal full-library mode. A smart album only covers a
/// subset of the library, which keeps iteration fast while debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    #[default]
    Albums,
    SmartAlbum(SmartAlbum),
}

/// How video assets are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoExportMode {
    /// Ask the host for a destination; unsupported when the host can't ask.
    #[default]
    Prompt,
    /// Write into `export_dir` under a generated name.
    Directory,
    /// Every video export fails.
    Unsupported,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub library_root: String,
    pub export_dir: String,
    pub max_results: usize,
    pub traversal: TraversalMode,
    pub include_hidden: bool,
    pub include_bursts: bool,
    pub ignore_patterns: Vec<String>,
    pub thumbnail_size: u32,
    pub video_export: VideoExportMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            library_root: ".".to_string(),
            export_dir: "./exported".to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            traversal: TraversalMode::default(),
            include_hidden: true,
            include_bursts: true,
            ignore_patterns: Vec::new(),
            thumbnail_size: DEFAULT_THUMBNAIL_SIZE,
            video_export: VideoExportMode::default(),
        }
    }
}

impl AppConfig {
    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            include_hidden: self.include_hidden,
            include_bursts: self.include_bursts,
        }
    }
}

/// Settings the scan pipeline needs, split out of [`AppConfig`].
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub traversal: TraversalMode,
    pub fetch_options: FetchOptions,
    pub max_results: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            traversal: TraversalMode::Albums,
            fetch_options: FetchOptions::default(),
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl From<&AppConfig> for ScanConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            traversal: config.traversal,
            fetch_options: config.fetch_options(),
            max_results: config.max_results,
        }
    }
}

/// Load `Config.toml` from the working directory if present, then
/// `MEDIA_SWEEP__*` environment overrides.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(Environment::with_prefix("MEDIA_SWEEP").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

pub fn load_configuration_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::from(path).required(true))
        .add_source(Environment::with_prefix("MEDIA_SWEEP").separator("__"))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn parse(toml: &str) -> AppConfig {
        Config::builder()
            .add_source(ConfigFile::from_str(toml, FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("");
        assert_eq!(config.max_results, 100);
        assert_eq!(config.traversal, TraversalMode::Albums);
        assert_eq!(config.video_export, VideoExportMode::Prompt);
        assert_eq!(config.thumbnail_size, 80);
        assert!(config.include_hidden);
        assert!(config.include_bursts);
    }

    #[test]
    fn test_smart_album_traversal() {
        let config = parse(
            r#"
            library_root = "/photos"
            max_results = 5
            traversal = { smart_album = "live_photos" }
            video_export = "directory"
            include_bursts = false
            "#,
        );
        assert_eq!(config.library_root, "/photos");
        assert_eq!(config.max_results, 5);
        assert_eq!(
            config.traversal,
            TraversalMode::SmartAlbum(SmartAlbum::LivePhotos)
        );
        assert_eq!(config.video_export, VideoExportMode::Directory);

        let scan = ScanConfig::from(&config);
        assert_eq!(scan.max_results, 5);
        assert!(!scan.fetch_options.include_bursts);
        assert!(scan.fetch_options.include_hidden);
    }
}

//! Configuration loading from pixbench.toml
//!
//! PixBench configuration can be specified in a `pixbench.toml` file in the project root.
//! The configuration is automatically discovered by walking up from the current directory.
//! CLI flags are layered on top and the result is validated into a [`BenchmarkConfig`].

use pixbench_core::{BackendRegistry, DEFAULT_QUALITY, DEFAULT_TARGET_SIZE, UnknownBackend};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the configuration file looked up by [`PixConfig::discover`]
pub const CONFIG_FILE_NAME: &str = "pixbench.toml";

/// PixBench configuration file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct PixConfig {
    /// Directory configuration
    #[serde(default)]
    pub paths: PathsConfig,
    /// Encoder configuration
    #[serde(default)]
    pub encode: EncodeConfig,
    /// Runner configuration
    #[serde(default)]
    pub runner: RunnerConfig,
}

/// Input, output and report directories
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    /// Directory scanned for input images
    #[serde(default = "default_input")]
    pub input: PathBuf,
    /// Directory compressed images are written to
    #[serde(default = "default_output")]
    pub output: PathBuf,
    /// Directory the TSV report is written to
    #[serde(default = "default_reports")]
    pub reports: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            input: default_input(),
            output: default_output(),
            reports: default_reports(),
        }
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("images")
}
fn default_output() -> PathBuf {
    PathBuf::from("target/pixbench/compressed")
}
fn default_reports() -> PathBuf {
    PathBuf::from("target/pixbench")
}

/// Encoder settings shared by every backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncodeConfig {
    /// Longest-edge bounds in pixels
    #[serde(default = "default_sizes")]
    pub sizes: Vec<u32>,
    /// Encode quality (1..=100)
    #[serde(default = "default_quality")]
    pub quality: u8,
    /// Enabled backend identifiers (empty = all built-in backends)
    #[serde(default)]
    pub backends: Vec<String>,
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            sizes: default_sizes(),
            quality: default_quality(),
            backends: Vec::new(),
        }
    }
}

fn default_sizes() -> Vec<u32> {
    vec![DEFAULT_TARGET_SIZE]
}
fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

/// Runner configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunnerConfig {
    /// Number of worker threads (None = available parallelism)
    #[serde(default)]
    pub jobs: Option<usize>,
    /// Regex on input file names
    #[serde(default)]
    pub filter: Option<String>,
    /// Show a progress bar while running
    #[serde(default = "default_progress")]
    pub progress: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            jobs: None,
            filter: None,
            progress: default_progress(),
        }
    }
}

fn default_progress() -> bool {
    true
}

/// Errors loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
    /// Configuration file is not valid TOML for [`PixConfig`]
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },
    /// No target sizes configured
    #[error("at least one target size is required")]
    NoSizes,
    /// A target size of zero
    #[error("target sizes must be positive")]
    ZeroSize,
    /// Quality outside 1..=100
    #[error("quality must be between 1 and 100, got {0}")]
    Quality(u8),
    /// Worker count of zero
    #[error("jobs must be at least 1")]
    ZeroJobs,
    /// Unregistered backend identifier
    #[error(transparent)]
    Backend(#[from] UnknownBackend),
    /// Filter is not a valid regex
    #[error("invalid filter pattern: {0}")]
    Filter(#[from] regex::Error),
    /// Output directory is the input directory
    #[error("output directory {} is the input directory", .0.display())]
    OutputIsInput(PathBuf),
}

impl PixConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Try to discover and load configuration by walking up from the current directory
    pub fn discover() -> Option<Self> {
        let dir = std::env::current_dir().ok()?;
        Self::discover_from(&dir)
    }

    /// Walk up from `start` looking for `pixbench.toml`
    pub fn discover_from(start: &Path) -> Option<Self> {
        let mut dir = start.to_path_buf();
        loop {
            let config_path = dir.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return match Self::load(&config_path) {
                    Ok(config) => Some(config),
                    Err(e) => {
                        tracing::warn!("ignoring {}: {}", config_path.display(), e);
                        None
                    }
                };
            }
            if !dir.pop() {
                break;
            }
        }
        None
    }

    /// Generate a default configuration as TOML string
    pub fn default_toml() -> String {
        r#"# PixBench Configuration

[paths]
# Directory scanned for .jpg, .jpeg, .png, .bmp and .webp files
input = "images"
# Directory compressed images are written to
output = "target/pixbench/compressed"
# Directory compression_report_<timestamp>.tsv is written to
reports = "target/pixbench"

[encode]
# Longest-edge bounds in pixels; every image is compressed once per size
sizes = [1024]
# Encode quality (1-100)
quality = 75
# Enabled backends (empty = all of imageops, thumbnail, libwebp)
backends = []

[runner]
# Number of worker threads (uncomment to override available parallelism)
# jobs = 4
# Only benchmark files whose name matches this regex (uncomment to enable)
# filter = "^photo"
# Show a progress bar
progress = true
"#
        .to_string()
    }
}

/// Validated settings for one benchmark invocation
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Directory scanned for input images
    pub input_dir: PathBuf,
    /// Directory compressed images are written to
    pub output_dir: PathBuf,
    /// Directory the TSV report is written to
    pub report_dir: PathBuf,
    /// Longest-edge bounds, deduplicated and ascending
    pub target_sizes: Vec<u32>,
    /// Encode quality (1..=100)
    pub quality: u8,
    /// Backends taking part, in selection order
    pub registry: BackendRegistry,
    /// Worker count
    pub jobs: usize,
    /// File-name filter
    pub filter: Option<Regex>,
    /// Show a progress bar
    pub progress: bool,
}

impl BenchmarkConfig {
    /// Validate a configuration file's settings
    pub fn from_config(config: &PixConfig) -> Result<Self, ConfigError> {
        if config.encode.sizes.is_empty() {
            return Err(ConfigError::NoSizes);
        }
        if config.encode.sizes.contains(&0) {
            return Err(ConfigError::ZeroSize);
        }
        if !(1..=100).contains(&config.encode.quality) {
            return Err(ConfigError::Quality(config.encode.quality));
        }
        if config.runner.jobs == Some(0) {
            return Err(ConfigError::ZeroJobs);
        }
        // Compressed images written beside the inputs would be picked up as
        // new inputs on the next run
        if same_directory(&config.paths.input, &config.paths.output) {
            return Err(ConfigError::OutputIsInput(config.paths.output.clone()));
        }

        let mut target_sizes = config.encode.sizes.clone();
        target_sizes.sort_unstable();
        target_sizes.dedup();

        let builtin = BackendRegistry::builtin();
        let registry = if config.encode.backends.is_empty() {
            builtin
        } else {
            builtin.select(&config.encode.backends)?
        };

        let filter = config.runner.filter.as_deref().map(Regex::new).transpose()?;

        Ok(Self {
            input_dir: config.paths.input.clone(),
            output_dir: config.paths.output.clone(),
            report_dir: config.paths.reports.clone(),
            target_sizes,
            quality: config.encode.quality,
            registry,
            jobs: config.runner.jobs.unwrap_or_else(default_jobs),
            filter,
            progress: config.runner.progress,
        })
    }

    /// Backend identifiers taking part
    pub fn backend_ids(&self) -> Vec<&str> {
        self.registry.ids()
    }
}

/// Whether two paths name the same directory
///
/// Canonical paths are compared when both exist; otherwise the paths are
/// compared component-wise, which ignores `.` segments and trailing slashes.
fn same_directory(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a.components().eq(b.components()),
    }
}

/// Available parallelism, or 1 when it cannot be determined
pub fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PixConfig::default();
        assert_eq!(config.paths.input, PathBuf::from("images"));
        assert_eq!(config.encode.sizes, vec![DEFAULT_TARGET_SIZE]);
        assert_eq!(config.encode.quality, DEFAULT_QUALITY);
        assert!(config.encode.backends.is_empty());
        assert!(config.runner.progress);
    }

    #[test]
    fn test_parse_toml() {
        let toml_str = r#"
            [encode]
            sizes = [256, 1024]
            backends = ["libwebp"]

            [runner]
            jobs = 2
        "#;

        let config: PixConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.encode.sizes, vec![256, 1024]);
        assert_eq!(config.encode.backends, vec!["libwebp"]);
        assert_eq!(config.runner.jobs, Some(2));
        // Defaults should still apply
        assert_eq!(config.encode.quality, DEFAULT_QUALITY);
        assert_eq!(config.paths.reports, PathBuf::from("target/pixbench"));
    }

    #[test]
    fn test_default_toml_parses() {
        let config: PixConfig = toml::from_str(&PixConfig::default_toml()).unwrap();
        assert_eq!(config, PixConfig::default());
    }

    #[test]
    fn test_validate_defaults() {
        let bench = BenchmarkConfig::from_config(&PixConfig::default()).unwrap();
        assert_eq!(bench.backend_ids(), vec!["imageops", "thumbnail", "libwebp"]);
        assert!(bench.jobs >= 1);
        assert!(bench.filter.is_none());
    }

    #[test]
    fn test_validate_sorts_and_dedups_sizes() {
        let mut config = PixConfig::default();
        config.encode.sizes = vec![512, 128, 512];
        let bench = BenchmarkConfig::from_config(&config).unwrap();
        assert_eq!(bench.target_sizes, vec![128, 512]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = PixConfig::default();
        config.encode.sizes.clear();
        assert!(matches!(
            BenchmarkConfig::from_config(&config),
            Err(ConfigError::NoSizes)
        ));

        let mut config = PixConfig::default();
        config.encode.sizes = vec![0];
        assert!(matches!(
            BenchmarkConfig::from_config(&config),
            Err(ConfigError::ZeroSize)
        ));

        let mut config = PixConfig::default();
        config.encode.quality = 0;
        assert!(matches!(
            BenchmarkConfig::from_config(&config),
            Err(ConfigError::Quality(0))
        ));

        let mut config = PixConfig::default();
        config.encode.backends = vec!["gdi".into()];
        assert!(matches!(
            BenchmarkConfig::from_config(&config),
            Err(ConfigError::Backend(_))
        ));

        let mut config = PixConfig::default();
        config.runner.filter = Some("(".into());
        assert!(matches!(
            BenchmarkConfig::from_config(&config),
            Err(ConfigError::Filter(_))
        ));

        let mut config = PixConfig::default();
        config.runner.jobs = Some(0);
        assert!(matches!(
            BenchmarkConfig::from_config(&config),
            Err(ConfigError::ZeroJobs)
        ));
    }

    #[test]
    fn test_validate_rejects_output_in_input() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = PixConfig::default();
        config.paths.input = dir.path().to_path_buf();
        config.paths.output = dir.path().join(".");
        assert!(matches!(
            BenchmarkConfig::from_config(&config),
            Err(ConfigError::OutputIsInput(_))
        ));

        // Not created yet, same spelling
        let mut config = PixConfig::default();
        config.paths.output = PathBuf::from("images/");
        assert!(matches!(
            BenchmarkConfig::from_config(&config),
            Err(ConfigError::OutputIsInput(_))
        ));

        let mut config = PixConfig::default();
        config.paths.input = dir.path().to_path_buf();
        config.paths.output = dir.path().join("out");
        assert!(BenchmarkConfig::from_config(&config).is_ok());
    }

    #[test]
    fn test_discover_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[encode]\nquality = 40\n",
        )
        .unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let config = PixConfig::discover_from(&nested).unwrap();
        assert_eq!(config.encode.quality, 40);
    }

    #[test]
    fn test_load_reports_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "[encode\n").unwrap();
        assert!(matches!(
            PixConfig::load(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}

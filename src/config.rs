//! Layered application configuration.
//!
//! Settings are merged with `figment`, later layers winning:
//!
//! 1. built-in defaults
//! 2. a TOML file (the platform config dir, or `--config FILE`)
//! 3. `DUPEHUNT_*` environment variables
//! 4. command-line flags, applied by [`Config::apply_scan_args`]
//!
//! A file that cannot be parsed is reported with a warning and the
//! remaining layers are used as if it did not exist.
//!
//! ```toml
//! io_threads = 2
//! algorithm = "blake3"
//! labels = "sequential"
//! retry_reads = true
//! output = "json"
//! progress = false
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{LabelStyle, OutputFormat, ScanArgs};
use crate::duplicates::FinderConfig;
use crate::scanner::HashAlgorithm;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "DUPEHUNT_";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Threads used for hashing.
    pub io_threads: usize,
    /// Digest for prefix and full hashes.
    pub algorithm: HashAlgorithm,
    /// Retry transient read failures once.
    pub retry_reads: bool,
    /// Group label style.
    pub labels: LabelStyle,
    /// Report format.
    pub output: OutputFormat,
    /// Show progress bars on stderr.
    pub progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            io_threads: 4,
            algorithm: HashAlgorithm::Sha256,
            retry_reads: false,
            labels: LabelStyle::Hash,
            output: OutputFormat::Text,
            progress: true,
        }
    }
}

impl Config {
    /// Load configuration from the default platform-specific file and the
    /// environment.
    #[must_use]
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from_path(&path),
            None => Self::load_layers(None),
        }
    }

    /// Load configuration from an explicit TOML file and the environment.
    ///
    /// A missing file is not an error.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        Self::load_layers(Some(path))
    }

    fn load_layers(path: Option<&Path>) -> Self {
        let base = Figment::from(Serialized::defaults(Config::default()));
        let env = Env::prefixed(ENV_PREFIX).split("__");

        if let Some(path) = path {
            let with_file = base.clone().merge(Toml::file(path)).merge(env.clone());
            match with_file.extract() {
                Ok(config) => {
                    log::debug!("Loaded configuration from {}", path.display());
                    return Self::sanitized(config);
                }
                Err(e) => {
                    log::warn!(
                        "Ignoring invalid config file {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        match base.clone().merge(env).extract() {
            Ok(config) => Self::sanitized(config),
            Err(e) => {
                log::warn!("Ignoring invalid {}* environment settings: {}", ENV_PREFIX, e);
                Self::default()
            }
        }
    }

    fn sanitized(mut config: Self) -> Self {
        if config.io_threads == 0 {
            log::warn!("io_threads must be at least 1, using 1");
            config.io_threads = 1;
        }
        config
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupehunt").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Override settings with the flags given on the command line.
    pub fn apply_scan_args(&mut self, args: &ScanArgs) {
        if let Some(threads) = args.io_threads {
            self.io_threads = usize::from(threads);
        }
        if let Some(algorithm) = args.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(labels) = args.labels {
            self.labels = labels;
        }
        if let Some(output) = args.output {
            self.output = output;
        }
        if args.retry_reads {
            self.retry_reads = true;
        }
        if args.no_progress {
            self.progress = false;
        }
    }

    /// Engine settings derived from this configuration.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::default()
            .with_io_threads(self.io_threads)
            .with_algorithm(self.algorithm)
            .with_retry_reads(self.retry_reads)
    }
}

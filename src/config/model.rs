// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// max_hierarchies = 8
/// cycle = "10s"
///
/// [watch]
/// roots = ["src", "tests"]
/// keep = [".cache"]
/// ```
///
/// This is the unvalidated form; convert it with `ConfigFile::try_from`.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    /// Global behaviour config from `[config]`.
    #[serde(default)]
    pub config: ConfigSection,

    /// Hierarchies to watch and locations to keep, from `[watch]`.
    #[serde(default)]
    pub watch: WatchSection,
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of hierarchies kept under native watch across work
    /// cycles. Keep locations do not count against this.
    #[serde(default = "default_max_hierarchies")]
    pub max_hierarchies: usize,

    /// Length of one work cycle (e.g. `"10s"`). At the end of each cycle the
    /// binary prunes the snapshot and reports statistics.
    #[serde(default = "default_cycle")]
    pub cycle: String,
}

fn default_max_hierarchies() -> usize {
    8
}

fn default_cycle() -> String {
    "10s".to_string()
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            max_hierarchies: default_max_hierarchies(),
            cycle: default_cycle(),
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchSection {
    /// Directories to register as watchable hierarchies. Relative paths are
    /// resolved against the directory containing the config file.
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    /// Locations whose snapshot state is kept across work cycles without a
    /// native watch (e.g. immutable cache directories).
    #[serde(default)]
    pub keep: Vec<PathBuf>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub watch: WatchSection,
    cycle: Duration,
}

impl ConfigFile {
    /// Construct without running validation. Only the validator should call
    /// this; `cycle` must be the parsed form of `config.cycle`.
    pub(crate) fn new_unchecked(config: ConfigSection, watch: WatchSection, cycle: Duration) -> Self {
        Self {
            config,
            watch,
            cycle,
        }
    }

    pub fn max_hierarchies(&self) -> usize {
        self.config.max_hierarchies
    }

    pub fn cycle(&self) -> Duration {
        self.cycle
    }

    /// Watch roots resolved against `base`.
    pub fn resolved_roots(&self, base: &Path) -> Vec<PathBuf> {
        self.watch.roots.iter().map(|p| base.join(p)).collect()
    }

    /// Keep locations resolved against `base`.
    pub fn resolved_keep(&self, base: &Path) -> Vec<PathBuf> {
        self.watch.keep.iter().map(|p| base.join(p)).collect()
    }
}

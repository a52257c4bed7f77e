//! Application configuration management.
//!
//! Settings are layered with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML file (`--config FILE`, or `config.toml` in the platform config dir)
//! 3. `DUPCRAWL_*` environment variables
//! 4. Command-line flags
//!
//! ```toml
//! excludes = [".git", "node_modules"]
//! max_depth = 0
//! follow_symlinks = false
//! parallel = true
//! sample = true
//! chunk_size = 262144
//! algorithm = "sha1"
//! strict = false
//! cpu_multiplier = 8
//! ```

use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::scanner::{HashAlgorithm, WalkOptions, CPU_MULTIPLIER, DEFAULT_CHUNK_SIZE};

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "DUPCRAWL_";

/// Walk configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path suffixes to skip.
    pub excludes: Vec<String>,
    /// Maximum walk depth (0 = unlimited).
    pub max_depth: usize,
    /// Follow symbolic links.
    pub follow_symlinks: bool,
    /// Walk with multiple threads.
    pub parallel: bool,
    /// Sample files larger than one chunk.
    pub sample: bool,
    /// Read chunk size in bytes.
    pub chunk_size: usize,
    /// Chain hash.
    pub algorithm: HashAlgorithm,
    /// Abort on the first failing entry.
    pub strict: bool,
    /// Concurrent hash tasks per CPU.
    pub cpu_multiplier: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            excludes: Vec::new(),
            max_depth: 0,
            follow_symlinks: false,
            parallel: true,
            sample: true,
            chunk_size: DEFAULT_CHUNK_SIZE,
            algorithm: HashAlgorithm::default(),
            strict: false,
            cpu_multiplier: CPU_MULTIPLIER,
        }
    }
}

impl Config {
    /// Load the file and environment layers.
    ///
    /// With `path` given the file must exist; otherwise the platform default
    /// is used if present.
    ///
    /// # Errors
    ///
    /// Fails on unreadable or malformed layers and on invalid values.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));

        match path {
            Some(path) => {
                if !path.is_file() {
                    bail!("Config file not found: {}", path.display());
                }
                log::debug!("Loading config from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(default) = Self::config_path().filter(|p| p.is_file()) {
                    log::debug!("Loading config from {}", default.display());
                    figment = figment.merge(Toml::file(default));
                }
            }
        }

        let config: Config = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay the flags given on the command line.
    pub fn apply_cli(&mut self, cli: &Cli) -> Result<()> {
        if !cli.excludes.is_empty() {
            self.excludes.clone_from(&cli.excludes);
        }
        if let Some(depth) = cli.depth {
            self.max_depth = depth;
        }
        if cli.symlinks {
            self.follow_symlinks = true;
        }
        if cli.no_parallel {
            self.parallel = false;
        }
        if cli.no_sample {
            self.sample = false;
        }
        if let Some(size) = cli.chunk_size {
            self.chunk_size = usize::try_from(size)
                .with_context(|| format!("Chunk size too large: {size}"))?;
        }
        if let Some(algorithm) = cli.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(multiplier) = cli.cpu_multiplier {
            self.cpu_multiplier = multiplier;
        }
        if cli.strict {
            self.strict = true;
        }
        self.validate()
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Fails if `chunk_size` or `cpu_multiplier` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            bail!("chunk_size must be greater than zero");
        }
        if self.cpu_multiplier == 0 {
            bail!("cpu_multiplier must be greater than zero");
        }
        Ok(())
    }

    /// Walk options described by this configuration.
    #[must_use]
    pub fn walk_options(&self) -> WalkOptions {
        WalkOptions::default()
            .with_excludes(self.excludes.clone())
            .with_max_depth(self.max_depth)
            .with_follow_symlinks(self.follow_symlinks)
            .with_parallel(self.parallel)
            .with_sample(self.sample)
            .with_chunk_size(self.chunk_size)
            .with_algorithm(self.algorithm)
            .with_strict(self.strict)
            .with_cpu_multiplier(self.cpu_multiplier)
    }

    /// Get the default platform-specific configuration path.
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "dupcrawl").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

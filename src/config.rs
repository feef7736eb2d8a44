//! Configuration for clauseguard.
//!
//! Configuration sources (highest priority first):
//! 1. Command-line flags (applied by the CLI on top of the resolved config)
//! 2. Environment variables (CLAUSEGUARD_HOME, CLAUSEGUARD_OUTPUT)
//! 3. Config file (.clauseguard/config.yaml)
//! 4. Defaults (~/.clauseguard, reports next to the input file)
//!
//! Config file discovery:
//! - Searches current directory and parents for .clauseguard/config.yaml
//! - `paths.home` is relative to the .clauseguard/ directory,
//!   `paths.output` to the project root (its parent)

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::evidence::VerifierConfig;
use crate::segment::SegmenterConfig;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const CONFIG_DIR: &str = ".clauseguard";
const CONFIG_FILE: &str = "config.yaml";
const RUN_LOG_FILE: &str = "verifications.jsonl";

/// Invalid segmenter or verifier parameters
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    #[error("target_chunk_size must be positive")]
    ZeroChunkSize,

    #[error("overlap_size ({overlap}) must be smaller than target_chunk_size ({target})")]
    OverlapTooLarge { overlap: usize, target: usize },

    #[error(
        "thresholds must satisfy 0 < partial_threshold < fuzzy_threshold <= 1 (got partial {partial}, fuzzy {fuzzy})"
    )]
    InvalidThresholds { partial: f64, fuzzy: f64 },

    #[error("max_key_phrases must be positive")]
    ZeroKeyPhraseLimit,
}

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub segmenter: SegmenterConfig,
    #[serde(default)]
    pub verifier: VerifierConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory holding the run log (relative to .clauseguard/)
    pub home: Option<String>,
    /// Report output directory (relative to the project root)
    pub output: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedConfig {
    /// Absolute path to clauseguard home (run log)
    pub home: PathBuf,
    /// Report directory; `None` writes reports next to the input file
    pub output: Option<PathBuf>,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub segmenter: SegmenterConfig,
    pub verifier: VerifierConfig,
}

impl ResolvedConfig {
    /// Path of the append-only verification run log
    pub fn run_log_path(&self) -> PathBuf {
        self.home.join(RUN_LOG_FILE)
    }

    /// Default report path for an input document: `<stem>_verification.json`
    pub fn report_path(&self, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let file_name = format!("{}_verification.json", stem);

        match &self.output {
            Some(dir) => dir.join(file_name),
            None => input.with_file_name(file_name),
        }
    }

    /// Check the segmenter and verifier sections
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.segmenter.validate()?;
        self.verifier.validate()
    }
}

/// Find config file by searching `start` and its parents
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Load configuration, discovering the config file from `start`
fn load_config_from(start: &Path) -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let config_file = find_config_file(start);

    let resolved = if let Some(ref config_path) = config_file {
        let config = load_config_file(config_path)?;

        // .clauseguard/ and the project root above it
        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        let base_dir = config_dir.parent().unwrap_or(Path::new("."));

        let home = env_path("CLAUSEGUARD_HOME")
            .or_else(|| config.paths.home.as_deref().map(|h| resolve_path(config_dir, h)))
            .unwrap_or_else(|| default_home.clone());

        let output = env_path("CLAUSEGUARD_OUTPUT")
            .or_else(|| config.paths.output.as_deref().map(|o| resolve_path(base_dir, o)));

        ResolvedConfig {
            home,
            output,
            config_file: config_file.clone(),
            segmenter: config.segmenter,
            verifier: config.verifier,
        }
    } else {
        ResolvedConfig {
            home: env_path("CLAUSEGUARD_HOME").unwrap_or(default_home),
            output: env_path("CLAUSEGUARD_OUTPUT"),
            config_file: None,
            segmenter: SegmenterConfig::default(),
            verifier: VerifierConfig::default(),
        }
    };

    resolved.validate().with_context(|| match &resolved.config_file {
        Some(path) => format!("Invalid settings in {}", path.display()),
        None => "Invalid default settings".to_string(),
    })?;

    Ok(resolved)
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    load_config_from(&cwd)
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| format!("{:#}", e)));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

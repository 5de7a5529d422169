//! Unified precedence resolution for configuration.
//!
//! ## Precedence (highest to lowest)
//!
//! 1. CLI flags (passed at runtime)
//! 2. Environment variables (`TODODS_DATA_FILE` for the data file)
//! 3. config.kdl
//! 4. Built-in defaults

use crate::Result;
use crate::config::{OutputFormat, TodoConfig, expand_home};
use crate::storage::default_data_file;
use std::path::{Path, PathBuf};

/// Environment variable overriding the data file location.
pub const DATA_FILE_ENV: &str = "TODODS_DATA_FILE";

/// Default number of tasks in the quick view.
pub const DEFAULT_QUICK_VIEW_LIMIT: usize = 8;

/// Tracks where a resolved value came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSource {
    /// Value from CLI flag
    CliFlag,
    /// Value from environment variable
    EnvVar(String),
    /// Value from config.kdl at the given path
    Config(PathBuf),
    /// Built-in default value
    Default,
}

impl std::fmt::Display for ValueSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueSource::CliFlag => write!(f, "cli"),
            ValueSource::EnvVar(name) => write!(f, "env:{}", name),
            ValueSource::Config(path) => write!(f, "config:{}", path.display()),
            ValueSource::Default => write!(f, "default"),
        }
    }
}

/// A resolved value with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    /// The resolved value
    pub value: T,
    /// Where the value came from
    pub source: ValueSource,
}

impl<T> Resolved<T> {
    /// Create a new resolved value.
    pub fn new(value: T, source: ValueSource) -> Self {
        Self { value, source }
    }
}

/// Fully resolved configuration with source tracking.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Location of the to-do file
    pub data_file: Resolved<PathBuf>,
    /// Output format preference
    pub output_format: Resolved<OutputFormat>,
    /// Whether list views include completed tasks
    pub show_completed: Resolved<bool>,
    /// Number of tasks in the quick view
    pub quick_view_limit: Resolved<usize>,
}

impl ResolvedConfig {
    /// Get the data file path.
    pub fn data_file(&self) -> &Path {
        &self.data_file.value
    }

    /// Get the output format value.
    pub fn output_format(&self) -> OutputFormat {
        self.output_format.value
    }

    /// Whether list views include completed tasks.
    pub fn show_completed(&self) -> bool {
        self.show_completed.value
    }

    /// Get the quick view limit.
    pub fn quick_view_limit(&self) -> usize {
        self.quick_view_limit.value
    }
}

/// CLI overrides for configuration resolution.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// Data file override from CLI flag
    pub data_file: Option<PathBuf>,
    /// Output format override from CLI flag
    pub output_format: Option<OutputFormat>,
}

impl ConfigOverrides {
    /// Create empty overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set data file override.
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }

    /// Set output format override.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = Some(format);
        self
    }
}

/// Resolve configuration with full precedence chain.
///
/// `config_path` is where `config` was read from; it is only used to label
/// value sources.
pub fn resolve_config(
    config: &TodoConfig,
    config_path: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<ResolvedConfig> {
    let from_config = || {
        ValueSource::Config(
            config_path
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from("config.kdl")),
        )
    };

    let env_data_file = std::env::var_os(DATA_FILE_ENV).filter(|v| !v.is_empty());
    let data_file = if let Some(ref path) = overrides.data_file {
        Resolved::new(path.clone(), ValueSource::CliFlag)
    } else if let Some(path) = env_data_file {
        Resolved::new(
            PathBuf::from(path),
            ValueSource::EnvVar(DATA_FILE_ENV.to_string()),
        )
    } else if let Some(ref path) = config.data_file {
        Resolved::new(expand_home(path), from_config())
    } else {
        Resolved::new(default_data_file()?, ValueSource::Default)
    };

    let output_format = if let Some(format) = overrides.output_format {
        Resolved::new(format, ValueSource::CliFlag)
    } else if let Some(format) = config.output_format {
        Resolved::new(format, from_config())
    } else {
        Resolved::new(OutputFormat::default(), ValueSource::Default)
    };

    let show_completed = match config.show_completed {
        Some(show) => Resolved::new(show, from_config()),
        None => Resolved::new(true, ValueSource::Default),
    };

    let quick_view_limit = match config.quick_view_limit {
        Some(limit) => Resolved::new(limit, from_config()),
        None => Resolved::new(DEFAULT_QUICK_VIEW_LIMIT, ValueSource::Default),
    };

    Ok(ResolvedConfig {
        data_file,
        output_format,
        show_completed,
        quick_view_limit,
    })
}

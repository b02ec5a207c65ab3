//! Invocation configuration
//!
//! Resolved once at startup from CLI options and the environment, then carried
//! inside the `ServicingContext`.

use std::env;
use std::path::PathBuf;

/// Overrides the scratch directory holding simulated state files.
pub const ENV_HOME: &str = "DISMV2_HOME";
/// Overrides the native tool executable name.
pub const ENV_TOOL: &str = "DISMV2_TOOL";
/// Forces delegation on (`1`) or off (`0`) regardless of host platform.
pub const ENV_NATIVE: &str = "DISMV2_NATIVE";

const DEFAULT_TOOL: &str = "dism";

/// Verbosity selected with `/LogLevel:<1-4>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Errors,
    Warnings,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    pub fn from_dism(level: u8) -> Option<Self> {
        match level {
            1 => Some(LogLevel::Errors),
            2 => Some(LogLevel::Warnings),
            3 => Some(LogLevel::Info),
            4 => Some(LogLevel::Debug),
            _ => None,
        }
    }

    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Errors => "error",
            LogLevel::Warnings => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding one JSON file per state key.
    pub state_dir: PathBuf,
    /// Executable invoked by the process delegate.
    pub tool: String,
    /// Whether the host is expected to have the native tool at all.
    pub native_platform: bool,
    pub log_level: LogLevel,
}

impl Config {
    /// Resolve configuration. An explicit scratch directory beats the environment.
    pub fn resolve(scratch_dir: Option<PathBuf>, log_level: Option<LogLevel>) -> Self {
        let state_dir = scratch_dir
            .or_else(|| env::var_os(ENV_HOME).map(PathBuf::from))
            .unwrap_or_else(default_state_dir);

        let tool = env::var(ENV_TOOL)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOOL.to_string());

        let native_platform = env::var(ENV_NATIVE)
            .ok()
            .and_then(|v| parse_switch(&v))
            .unwrap_or(cfg!(windows));

        Self {
            state_dir,
            tool,
            native_platform,
            log_level: log_level.unwrap_or_default(),
        }
    }

    /// Configuration for a host without the native tool, rooted at `state_dir`.
    pub fn simulated(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            tool: DEFAULT_TOOL.to_string(),
            native_platform: false,
            log_level: LogLevel::default(),
        }
    }

    /// Configuration that always attempts delegation to `tool` first.
    pub fn native(state_dir: impl Into<PathBuf>, tool: impl Into<String>) -> Self {
        Self {
            state_dir: state_dir.into(),
            tool: tool.into(),
            native_platform: true,
            log_level: LogLevel::default(),
        }
    }
}

fn default_state_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(env::temp_dir)
        .join(".dismv2")
        .join("scratch")
}

fn parse_switch(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

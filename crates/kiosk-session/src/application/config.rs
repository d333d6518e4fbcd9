//! Session configuration.
//!
//! The session has no configuration file.  Everything comes from the command
//! line (or the matching environment variables) and is validated once, before
//! any resource is created.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use kiosk_core::KeyboardRepeat;
use thiserror::Error;

/// Default mode for the headless output.
pub const DEFAULT_OUTPUT_MODE: &str = "1920x1080";

/// Error type for configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An output mode was not of the form `WIDTHxHEIGHT`.
    #[error("invalid output mode {0:?}: expected WIDTHxHEIGHT, e.g. 1920x1080")]
    InvalidMode(String),

    /// No outputs were requested.
    #[error("at least one output mode is required")]
    NoOutputs,

    /// Key repeat rate of zero.
    #[error("keyboard repeat rate must be greater than zero")]
    ZeroRepeatRate,
}

/// Size of one headless output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputMode {
    pub width: u32,
    pub height: u32,
}

impl FromStr for OutputMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidMode(s.to_string());
        let (w, h) = s.trim().split_once(['x', 'X']).ok_or_else(invalid)?;
        let width: u32 = w.parse().map_err(|_| invalid())?;
        let height: u32 = h.parse().map_err(|_| invalid())?;
        if width == 0 || height == 0 {
            return Err(invalid());
        }
        Ok(Self { width, height })
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Everything a session needs to know before it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Directory for the display socket; normally `$XDG_RUNTIME_DIR`.
    pub runtime_dir: Option<PathBuf>,
    /// Outputs the headless engine creates, in attach order.
    pub outputs: Vec<OutputMode>,
    pub repeat: KeyboardRepeat,
}

impl SessionConfig {
    /// Checks values that the argument parser cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.outputs.is_empty() {
            return Err(ConfigError::NoOutputs);
        }
        if self.repeat.rate == 0 {
            return Err(ConfigError::ZeroRepeatRate);
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            runtime_dir: None,
            outputs: vec![OutputMode {
                width: 1920,
                height: 1080,
            }],
            repeat: KeyboardRepeat::default(),
        }
    }
}

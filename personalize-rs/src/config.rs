//! Engine settings file parser.
//!
//! A settings file is a list of `name = value` lines:
//!
//! | Setting | Values | Default |
//! |---------|--------|---------|
//! | `block_mode` | `nested`, `legacy` | `nested` |
//! | `log` | a `tracing` filter directive, e.g. `debug` or `personalize=trace` | `warn` |
//!
//! Lines starting with `;` or `#` are comments.  Values may be wrapped in
//! double quotes.  Bad lines are reported as [`ConfigError`]s and skipped;
//! the rest of the file still loads.
//!
//! Environment variables `PERSONALIZE_BLOCK_MODE` and `PERSONALIZE_LOG`
//! override the file (see [`EngineConfig::apply_env`]).

use std::path::Path;

use thiserror::Error;

use crate::template::blocks::BlockMode;

pub const ENV_BLOCK_MODE: &str = "PERSONALIZE_BLOCK_MODE";
pub const ENV_LOG: &str = "PERSONALIZE_LOG";

/// A non-fatal error encountered while loading settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    /// 1-based line number; 0 for environment overrides.
    pub line: usize,
    pub message: String,
}

/// Engine settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub block_mode: BlockMode,
    /// `tracing` filter used by the preview binary.
    pub log: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            block_mode: BlockMode::default(),
            log: "warn".to_owned(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a settings string.  Returns the config and any errors on
    /// individual lines.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = EngineConfig::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            let Some((name, value)) = line.split_once('=') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected `name = value`, got `{line}`"),
                });
                continue;
            };

            if let Err(message) = config.set(name.trim(), unquote(value.trim())) {
                errors.push(ConfigError {
                    line: lineno,
                    message,
                });
            }
        }

        (config, errors)
    }

    /// Read and parse a settings file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// Apply one setting.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), String> {
        match name {
            "block_mode" => self.block_mode = value.parse()?,
            "log" => {
                if value.is_empty() {
                    return Err("log: filter cannot be empty".into());
                }
                self.log = value.to_owned();
            }
            "" => return Err("setting name cannot be empty".into()),
            other => return Err(format!("unknown setting `{other}`")),
        }
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Vec<ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup` (the environment in production).
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        for (var, setting) in [(ENV_BLOCK_MODE, "block_mode"), (ENV_LOG, "log")] {
            let Some(value) = lookup(var) else { continue };
            if let Err(msg) = self.set(setting, value.trim()) {
                errors.push(ConfigError {
                    line: 0,
                    message: format!("{var}: {msg}"),
                });
            }
        }
        errors
    }
}

fn unquote(s: &str) -> &str {
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

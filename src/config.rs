//! TOML configuration. Every field has a default, so an empty or missing
//! file is a valid configuration.

use crate::adapters::BackendKind;
use crate::error::{Error, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub batch: BatchConfig,
    /// Backend names to run. Empty means all of them.
    pub backends: Vec<String>,
    /// A device-detector `regexes/` checkout used instead of the bundled
    /// rules.
    pub regexes_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| Error::Config(format!("invalid listen address {}:{}: {e}", self.host, self.port)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatchConfig {
    pub input: Option<PathBuf>,
    pub output: PathBuf,
    pub inline: Vec<String>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            input: Some(PathBuf::from("uas.txt")),
            output: PathBuf::from("ua-dump.txt"),
            inline: Vec::new(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.backend_kinds()?;
        Ok(config)
    }

    /// Load `path`, falling back to defaults when the file does not exist.
    /// A file that exists but does not parse is still an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// The configured backends, in no particular order; all of them when
    /// none are listed.
    pub fn backend_kinds(&self) -> Result<Vec<BackendKind>> {
        if self.backends.is_empty() {
            return Ok(BackendKind::ALL.to_vec());
        }
        self.backends
            .iter()
            .map(|name| {
                BackendKind::from_name(name)
                    .ok_or_else(|| Error::Config(format!("unknown backend {name:?}")))
            })
            .collect()
    }
}

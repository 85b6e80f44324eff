use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Cli;
use crate::energy::DEFAULT_MAX_ENERGY;
use crate::error::ConfigError;
use crate::shell::{Settings, DEFAULT_FINAL_TEXT, DEFAULT_GREETING};

const CONFIG_FILE: &str = "giftbox.toml";
const LOG_FILE: &str = "giftbox.log";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub seed: Option<u64>,
    pub tick_ms: u64,
    pub audio: bool,
    pub log_path: Option<PathBuf>,
    pub energy_max: u32,
    pub greeting: String,
    pub final_text: String,
    pub typewriter_ms: u64,
    pub message_dwell_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            tick_ms: 16,
            audio: true,
            log_path: None,
            energy_max: DEFAULT_MAX_ENERGY,
            greeting: DEFAULT_GREETING.to_string(),
            final_text: DEFAULT_FINAL_TEXT.to_string(),
            typewriter_ms: 80,
            message_dwell_ms: 12_000,
        }
    }
}

impl Config {
    /// Read `path`; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read { path: path.to_path_buf(), source });
            }
        };
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Command line flags win over the file.
    pub fn with_cli(mut self, cli: &Cli) -> Self {
        if let Some(seed) = cli.seed {
            self.seed = Some(seed);
        }
        if cli.no_audio {
            self.audio = false;
        }
        if let Some(log) = &cli.log {
            self.log_path = Some(log.clone());
        }
        self.tick_ms = self.tick_ms.clamp(5, 100);
        self
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_path.clone().unwrap_or_else(|| beside_exe(LOG_FILE))
    }

    pub fn settings(&self) -> Settings {
        Settings {
            greeting: self.greeting.clone(),
            final_text: self.final_text.clone(),
            typewriter_ms: self.typewriter_ms.max(1),
            message_dwell_ms: self.message_dwell_ms,
            energy_max: self.energy_max,
        }
    }
}

pub fn default_config_path() -> PathBuf {
    beside_exe(CONFIG_FILE)
}

fn beside_exe(name: &str) -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(dir) = exe.parent() {
            return dir.join(name);
        }
    }
    PathBuf::from(name)
}

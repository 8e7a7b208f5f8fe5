use std::collections::HashSet;
use std::env;
use std::time::Duration;

use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BLIND_NAME: &str = "My Smart Blind";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Polling {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl Polling {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Http {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Http {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for Http {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// One configured blind. Both fields end up immutable on the cover.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Blind {
    pub host: String,
    #[serde(default = "default_blind_name")]
    pub name: String,
}

impl Blind {
    pub fn new(host: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    #[serde(default)]
    pub polling: Polling,
    #[serde(default)]
    pub http: Http,
    #[serde(default)]
    pub blinds: Vec<Blind>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        Self::load(
            Config::builder()
                .add_source(File::with_name("configs/default"))
                .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
                .add_source(Environment::with_prefix("SMARTBLINDS").separator("__")),
        )
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        Self::load(Config::builder().add_source(File::from_str(source, FileFormat::Toml)))
    }

    fn load(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.polling.interval_secs == 0 {
            return Err(ConfigError::Message("polling.interval_secs must be positive".into()));
        }
        if self.http.timeout_secs == 0 || self.http.connect_timeout_secs == 0 {
            return Err(ConfigError::Message("http timeouts must be positive".into()));
        }

        let mut hosts = HashSet::new();
        for blind in &self.blinds {
            // The cover id is hashed from this exact string.
            if blind.host.trim().is_empty() {
                return Err(ConfigError::Message("blind host must not be empty".into()));
            }
            if blind.host.trim() != blind.host {
                return Err(ConfigError::Message(format!(
                    "blind host {:?} has surrounding whitespace",
                    blind.host
                )));
            }
            if blind.name.trim().is_empty() {
                return Err(ConfigError::Message(format!(
                    "blind name must not be empty (host {})",
                    blind.host
                )));
            }
            if !hosts.insert(blind.host.as_str()) {
                return Err(ConfigError::Message(format!(
                    "blind host {} is configured twice",
                    blind.host
                )));
            }
        }

        Ok(())
    }
}

fn default_interval_secs() -> u64 {
    60
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_blind_name() -> String {
    DEFAULT_BLIND_NAME.to_string()
}

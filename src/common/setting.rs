//! setting config file
//! loaded once at startup from `CONFIG_FILE` or `config_{ENV}.toml`,
//! every key can be overridden by `TUYAPROXY__SECTION__KEY` env variables

use std::collections::HashMap;
use std::env;
use config::{Config, Environment, File};
use serde::Deserialize;
use super::error::{ErrorCode, ProxyError};

const ENV_PREFIX: &str = "TUYAPROXY";

#[derive(Debug, Deserialize)]
pub struct Env {
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Env {
    fn default() -> Self {
        Env { debug: false, log_level: default_log_level() }
    }
}

#[derive(Debug, Deserialize)]
pub struct Device {
    pub device_id: String,
    pub ip_address: String,
    pub local_key: String,
    pub version: String,
    #[serde(default = "default_device_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Web {
    #[serde(default = "default_web_hosts")]
    pub hosts: Vec<String>,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

impl Default for Web {
    fn default() -> Self {
        Web { hosts: default_web_hosts(), port: default_web_port() }
    }
}

/// timing of the connection supervisor
#[derive(Debug, Deserialize)]
pub struct Supervisor {
    // pause before a new connect cycle
    #[serde(default = "default_backoff_secs")]
    pub backoff_secs: u64,
    // silence after which a heartbeat is sent
    #[serde(default = "default_heartbeat_secs")]
    pub heartbeat_secs: u64,
    // how long one receive call waits before reporting no data
    #[serde(default = "default_poll_millis")]
    pub poll_millis: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for Supervisor {
    fn default() -> Self {
        Supervisor {
            backoff_secs: default_backoff_secs(),
            heartbeat_secs: default_heartbeat_secs(),
            poll_millis: default_poll_millis(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

/// overrides of the built-in field mapping
#[derive(Debug, Default, Deserialize)]
pub struct Mapping {
    #[serde(default)]
    pub names: HashMap<String, String>,
    #[serde(default)]
    pub scales: HashMap<String, f64>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub env: Env,
    pub device: Device,
    #[serde(default)]
    pub web: Web,
    #[serde(default)]
    pub supervisor: Supervisor,
    #[serde(default)]
    pub mapping: Mapping,
}

impl Settings {
    /// load settings from the config file, file format is detected by extension
    pub fn load() -> Result<Self, ProxyError> {
        let file_path = match env::var("CONFIG_FILE") {
            Ok(path) => path,
            Err(_) => {
                let env = env::var("ENV").unwrap_or_else(|_| String::from("dev"));
                format!("config_{}.toml", env)
            }
        };
        Self::from_source(File::with_name(file_path.as_str()))
    }

    pub fn from_source<S>(source: S) -> Result<Self, ProxyError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        Config::builder()
            .add_source(source)
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .and_then(|cfg| cfg.try_deserialize::<Settings>())
            .map_err(|e| ProxyError::new(ErrorCode::ConfigError, format!("cannot load config: {}", e)))
    }
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_device_port() -> u16 {
    6668
}

fn default_web_hosts() -> Vec<String> {
    vec![String::from("::1"), String::from("127.0.0.1")]
}

fn default_web_port() -> u16 {
    8009
}

fn default_backoff_secs() -> u64 {
    10
}

fn default_heartbeat_secs() -> u64 {
    10
}

fn default_poll_millis() -> u64 {
    5000
}

fn default_connect_timeout_secs() -> u64 {
    5
}

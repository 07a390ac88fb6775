use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use reel_core::{ReelConfig, ReelConfigSnapshot};

pub const ENV_PREFIX: &str = "REEL__";

const DEFAULTS: &[(&str, &str)] = &[
    ("http.host", "127.0.0.1"),
    ("http.port", "3030"),
    ("http.public_prefix", ""),
    ("storage.backend", "fs"),
    ("storage.root", "./data/blobs"),
    ("storage.chunk_size", "261120"),
    ("storage.checksum", "true"),
    ("upload.max_mb", "200"),
];

/// Environment overrides on top of the built-in defaults
pub fn load() -> ReelConfig {
    let mut config = ReelConfig::new();
    config.load_env(ENV_PREFIX);
    apply_defaults(&mut config);
    config
}

pub fn apply_defaults(config: &mut ReelConfig) {
    for (key, value) in DEFAULTS {
        config.set_default(*key, *value);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Fs,
    Memory,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub public_prefix: String,
    pub backend: StorageBackend,
    pub root: PathBuf,
    pub chunk_size: u64,
    pub checksum: bool,
    pub max_upload_mb: u64,
}

impl ServerSettings {
    pub fn from_config(config: &ReelConfigSnapshot) -> Result<Self> {
        let backend = match required(config, "storage.backend")?.to_ascii_lowercase().as_str() {
            "fs" => StorageBackend::Fs,
            "memory" => StorageBackend::Memory,
            other => bail!("storage.backend must be `fs` or `memory`, got `{other}`"),
        };

        let port = number(config, "http.port")?;
        let port = u16::try_from(port).with_context(|| format!("http.port {port} is out of range"))?;

        let chunk_size = number(config, "storage.chunk_size")?;
        if chunk_size == 0 {
            bail!("storage.chunk_size must be positive");
        }

        let checksum = config
            .get_bool("storage.checksum")
            .context("storage.checksum must be `true` or `false`")?;

        Ok(Self {
            host: required(config, "http.host")?,
            port,
            public_prefix: config.get_string("http.public_prefix").unwrap_or_default(),
            backend,
            root: PathBuf::from(required(config, "storage.root")?),
            chunk_size,
            checksum,
            max_upload_mb: number(config, "upload.max_mb")?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(config: &ReelConfigSnapshot, key: &str) -> Result<String> {
    config
        .get_string(key)
        .with_context(|| format!("missing configuration key {key}"))
}

fn number(config: &ReelConfigSnapshot, key: &str) -> Result<u64> {
    config.get_u64(key).with_context(|| {
        format!(
            "{key} must be an unsigned integer, got {:?}",
            config.get(key).unwrap_or_default()
        )
    })
}

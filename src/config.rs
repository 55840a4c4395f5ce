use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{error, info};

/// Environment variables checked, in order, for an explicit backend URL.
/// The last two are the names older frontend builds read.
pub const BASE_URL_VARS: [&str; 3] = [
    "SLACKWATCH_API_BASE_URL",
    "NEXT_PUBLIC_API_BASE_URL",
    "VITE_API_BASE_URL",
];

pub const ENV_NAME_VAR: &str = "SLACKWATCH_ENV";
pub const PORT_VAR: &str = "PORT";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Selects an entry of `environments` when no URL is set explicitly.
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default = "default_environments")]
    pub environments: BTreeMap<String, EnvironmentDef>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnvironmentDef {
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_title() -> String {
    "Slackwatch".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_listen_port() -> u16 {
    3000
}

fn default_static_dir() -> String {
    "static".to_string()
}

fn default_environments() -> BTreeMap<String, EnvironmentDef> {
    let mut m = BTreeMap::new();
    m.insert(
        "development".to_string(),
        EnvironmentDef {
            base_url: Some("http://localhost:8080".to_string()),
        },
    );
    m.insert("production".to_string(), EnvironmentDef { base_url: None });
    m
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: default_title(),
            version: default_version(),
            listen_port: default_listen_port(),
            static_dir: default_static_dir(),
            environment: None,
            environments: default_environments(),
        }
    }
}

impl Config {
    /// Load the YAML config at `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            info!("no config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&data)
    }

    pub fn parse(data: &str) -> Result<Self, ConfigError> {
        let mut cfg: Config = serde_yaml::from_str(data)?;
        // A partial `environments` map keeps the built-in entries it does not override.
        for (name, def) in default_environments() {
            cfg.environments.entry(name).or_insert(def);
        }
        Ok(cfg)
    }

    /// Apply process-level overrides. `lookup` is `std::env::var` in
    /// production and a map in tests.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(port) = lookup(PORT_VAR).and_then(|p| p.trim().parse().ok()) {
            self.listen_port = port;
        }
        if let Some(name) = lookup(ENV_NAME_VAR).filter(|n| !n.trim().is_empty()) {
            self.environment = Some(name.trim().to_string());
        }
    }

    /// Resolve the backend base URL. Explicit URL variables win; otherwise
    /// the environment name picks an entry from `environments`. An unknown
    /// environment is reported and leaves the URL unresolved.
    pub fn resolve_base_url(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        for var in BASE_URL_VARS {
            if let Some(url) = lookup(var).filter(|u| !u.trim().is_empty()) {
                return Some(normalize_url(&url));
            }
        }

        let name = self.environment.as_deref().unwrap_or("production");
        match self.environments.get(name) {
            Some(def) => def
                .base_url
                .as_deref()
                .filter(|u| !u.trim().is_empty())
                .map(normalize_url),
            None => {
                error!("unknown environment {:?}, backend base URL is unset", name);
                None
            }
        }
    }

    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.listen_port)
    }
}

fn normalize_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

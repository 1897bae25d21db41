//! Process configuration, read from the environment (and `.env` if present).

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use backoffice_auth::{DEFAULT_LOOKUP_TIMEOUT, HierarchyConfig, HierarchyError, TokenError, TokenIssuer, TokenVerifier};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "id_rsa_priv.pem";
pub const DEFAULT_PUBLIC_KEY_PATH: &str = "id_rsa_pub.pem";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}: invalid value '{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("signing keys: {0}")]
    Keys(#[from] TokenError),

    #[error("role hierarchy: {0}")]
    Hierarchy(#[from] HierarchyError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    /// JSON role hierarchy; the built-in table is used when unset.
    pub hierarchy_path: Option<PathBuf>,
    pub lookup_timeout: Duration,
}

impl ApiConfig {
    /// Read the process environment. The binary loads `.env` beforehand.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let bind_raw = var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.trim().parse().map_err(|e: std::net::AddrParseError| {
            ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value: bind_raw.clone(),
                reason: e.to_string(),
            }
        })?;

        let lookup_timeout = match var("AUTHZ_LOOKUP_TIMEOUT_MS") {
            None => DEFAULT_LOOKUP_TIMEOUT,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => Duration::from_millis(ms),
                Ok(_) => {
                    return Err(ConfigError::InvalidValue {
                        key: "AUTHZ_LOOKUP_TIMEOUT_MS",
                        value: raw,
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::InvalidValue {
                        key: "AUTHZ_LOOKUP_TIMEOUT_MS",
                        value: raw,
                        reason: e.to_string(),
                    });
                }
            },
        };

        Ok(Self {
            bind_addr,
            private_key_path: var("TOKEN_PRIVATE_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PRIVATE_KEY_PATH)),
            public_key_path: var("TOKEN_PUBLIC_KEY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_PUBLIC_KEY_PATH)),
            hierarchy_path: var("HIERARCHY_CONFIG_PATH").map(PathBuf::from),
            lookup_timeout,
        })
    }

    pub fn load_issuer(&self) -> Result<TokenIssuer, ConfigError> {
        Ok(TokenIssuer::from_rsa_pem(&read(&self.private_key_path)?)?)
    }

    pub fn load_verifier(&self) -> Result<TokenVerifier, ConfigError> {
        Ok(TokenVerifier::from_rsa_pem(&read(&self.public_key_path)?)?)
    }

    pub fn load_hierarchy(&self) -> Result<HierarchyConfig, ConfigError> {
        match &self.hierarchy_path {
            None => Ok(HierarchyConfig::standard()),
            Some(path) => {
                let bytes = read(path)?;
                let json = String::from_utf8_lossy(&bytes);
                Ok(HierarchyConfig::from_json(&json)?)
            }
        }
    }
}

fn read(path: &Path) -> Result<Vec<u8>, ConfigError> {
    std::fs::read(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

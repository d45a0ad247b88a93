//! Configuration module
//!
//! `ClientConfig` is the single explicit value every client component is built
//! from. The backend base URL is injected here rather than held in process-wide
//! state. `from_env` reads `RALLY_*` variables (after loading `.env`);
//! `from_lookup` takes any key lookup so parsing can be tested without touching
//! the real environment.

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_LOCAL_STORE_PATH, DEFAULT_METADATA_TIMEOUT_MS,
    DEFAULT_TRANSFER_TIMEOUT_MS,
};
use crate::validation::UploadPolicy;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where profile media references are read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataMode {
    /// Backend only.
    #[default]
    Remote,
    /// Backend first; local file when the backend cannot be reached.
    RemoteWithLocalFallback,
    /// Local file only (development).
    Local,
}

impl FromStr for DataMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "remote" => Ok(DataMode::Remote),
            "remote-with-local-fallback" | "fallback" => Ok(DataMode::RemoteWithLocalFallback),
            "local" => Ok(DataMode::Local),
            _ => Err(format!("Invalid data mode: {}", s)),
        }
    }
}

impl Display for DataMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            DataMode::Remote => write!(f, "remote"),
            DataMode::RemoteWithLocalFallback => write!(f, "remote-with-local-fallback"),
            DataMode::Local => write!(f, "local"),
        }
    }
}

/// Client configuration
#[derive(Clone)]
pub struct ClientConfig {
    pub backend_base_url: String,
    /// Bearer token for profile and multipart calls. Direct uploads take theirs per call.
    pub access_token: Option<String>,
    pub transfer_timeout: Duration,
    pub metadata_timeout: Duration,
    pub data_mode: DataMode,
    pub local_store_path: PathBuf,
    pub policy: UploadPolicy,
}

// The access token is a credential; only its presence is printed.
impl Debug for ClientConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ClientConfig")
            .field("backend_base_url", &self.backend_base_url)
            .field("authenticated", &self.access_token.is_some())
            .field("transfer_timeout", &self.transfer_timeout)
            .field("metadata_timeout", &self.metadata_timeout)
            .field("data_mode", &self.data_mode)
            .field("local_store_path", &self.local_store_path)
            .field("policy", &self.policy)
            .finish()
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_base_url: DEFAULT_API_URL.to_string(),
            access_token: None,
            transfer_timeout: Duration::from_millis(DEFAULT_TRANSFER_TIMEOUT_MS),
            metadata_timeout: Duration::from_millis(DEFAULT_METADATA_TIMEOUT_MS),
            data_mode: DataMode::default(),
            local_store_path: PathBuf::from(DEFAULT_LOCAL_STORE_PATH),
            policy: UploadPolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(backend_base_url: impl Into<String>) -> Self {
        Self {
            backend_base_url: backend_base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let backend_base_url = get("RALLY_API_URL")
            .or_else(|| get("API_URL"))
            .unwrap_or(defaults.backend_base_url);

        let transfer_timeout = match get("RALLY_UPLOAD_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(parse_u64("RALLY_UPLOAD_TIMEOUT_MS", &v)?),
            None => defaults.transfer_timeout,
        };
        let metadata_timeout = match get("RALLY_METADATA_TIMEOUT_MS") {
            Some(v) => Duration::from_millis(parse_u64("RALLY_METADATA_TIMEOUT_MS", &v)?),
            None => defaults.metadata_timeout,
        };

        let data_mode = match get("RALLY_DATA_MODE") {
            Some(v) => v.parse::<DataMode>().map_err(|reason| ConfigError::InvalidValue {
                key: "RALLY_DATA_MODE",
                value: v.clone(),
                reason,
            })?,
            None => defaults.data_mode,
        };

        let mut policy = defaults.policy;
        if let Some(v) = get("RALLY_AVATAR_MAX_BYTES") {
            policy.avatar_max_bytes = parse_u64("RALLY_AVATAR_MAX_BYTES", &v)?;
        }
        if let Some(v) = get("RALLY_BANNER_MAX_BYTES") {
            policy.banner_max_bytes = parse_u64("RALLY_BANNER_MAX_BYTES", &v)?;
        }

        let config = Self {
            backend_base_url,
            access_token: get("RALLY_ACCESS_TOKEN"),
            transfer_timeout,
            metadata_timeout,
            data_mode,
            local_store_path: get("RALLY_LOCAL_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.local_store_path),
            policy,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.backend_base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                key: "RALLY_API_URL",
                value: self.backend_base_url.clone(),
                reason: "must start with http:// or https://".to_string(),
            });
        }

        for (key, timeout) in [
            ("RALLY_UPLOAD_TIMEOUT_MS", self.transfer_timeout),
            ("RALLY_METADATA_TIMEOUT_MS", self.metadata_timeout),
        ] {
            if timeout.is_zero() {
                return Err(ConfigError::InvalidValue {
                    key,
                    value: "0".to_string(),
                    reason: "timeout must be greater than zero".to_string(),
                });
            }
        }

        if self.policy.avatar_max_bytes < self.policy.min_image_bytes
            || self.policy.banner_max_bytes < self.policy.min_image_bytes
        {
            return Err(ConfigError::InvalidValue {
                key: "RALLY_AVATAR_MAX_BYTES",
                value: self.policy.avatar_max_bytes.min(self.policy.banner_max_bytes).to_string(),
                reason: format!(
                    "size limits must be at least {} bytes",
                    self.policy.min_image_bytes
                ),
            });
        }

        Ok(())
    }
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: e.to_string(),
        })
}

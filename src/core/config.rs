//! Configuration model, loading, environment overrides, and validation.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, VgwError};

/// Path consulted when neither `--config` nor `VGW_CONFIG_PATH` is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/vgw-manager.toml";

/// Full manager configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub gateway: GatewayConfig,
    pub storage: StorageConfig,
    pub ui: UiConfig,
    pub logging: LoggingConfig,
    /// Where this config was read from (not serialized back).
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Admin API endpoint and credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GatewayConfig {
    pub admin_access: String,
    pub admin_secret: String,
    pub endpoint_url: String,
    pub region: String,
    pub request_timeout_secs: u64,
}

/// Dataset pool layout and the account registry location.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    pub users_json_path: PathBuf,
    pub pool_base: String,
    pub mount_base: String,
    pub zfs_binary: String,
}

/// Interactive session tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UiConfig {
    pub page_size: usize,
}

/// Audit trail and diagnostic log destinations.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub audit_log: PathBuf,
    pub audit_max_bytes: u64,
    pub diagnostic_log: Option<PathBuf>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            admin_access: "changeme-access".to_string(),
            admin_secret: "changeme-secret".to_string(),
            endpoint_url: "http://localhost:7070".to_string(),
            region: "local".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            users_json_path: PathBuf::from("/tank/s3/accounts/users.json"),
            pool_base: "tank/s3/buckets".to_string(),
            mount_base: "/tank/s3/buckets".to_string(),
            zfs_binary: "zfs".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { page_size: 20 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
        let data = home_dir.join(".local").join("share").join("vgw-manager");
        Self {
            audit_log: data.join("audit.jsonl"),
            audit_max_bytes: 10 * 1024 * 1024,
            diagnostic_log: None,
        }
    }
}

impl GatewayConfig {
    /// Bounded per-request timeout for admin calls.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Config {
    /// Resolve which file to read: explicit flag, then `VGW_CONFIG_PATH`, then the default.
    ///
    /// The boolean reports whether the operator named the file (a missing named file is fatal).
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> (PathBuf, bool) {
        if let Some(path) = explicit {
            return (path.to_path_buf(), true);
        }
        if let Some(raw) = env_var("VGW_CONFIG_PATH") {
            return (PathBuf::from(raw), true);
        }
        (PathBuf::from(DEFAULT_CONFIG_PATH), false)
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path; defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path_buf, is_explicit_path) = Self::resolve_path(path);

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| VgwError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let mut parsed: Self = toml::from_str(&raw)?;
            parsed.source = Some(path_buf);
            parsed
        } else if is_explicit_path {
            return Err(VgwError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides()?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        set_env_string("VGW_ADMIN_ACCESS", &mut self.gateway.admin_access);
        set_env_string("VGW_ADMIN_SECRET", &mut self.gateway.admin_secret);
        set_env_string("VGW_ENDPOINT_URL", &mut self.gateway.endpoint_url);
        set_env_string("VGW_REGION", &mut self.gateway.region);
        set_env_u64(
            "VGW_REQUEST_TIMEOUT_SECS",
            &mut self.gateway.request_timeout_secs,
        )?;

        if let Some(raw) = env_var("VGW_USERS_JSON_PATH") {
            self.storage.users_json_path = PathBuf::from(raw);
        }
        set_env_string("VGW_ZFS_POOL_BASE", &mut self.storage.pool_base);
        set_env_string("VGW_MOUNT_BASE", &mut self.storage.mount_base);

        set_env_usize("VGW_PAGE_SIZE", &mut self.ui.page_size)?;

        if let Some(raw) = env_var("VGW_AUDIT_LOG") {
            self.logging.audit_log = PathBuf::from(raw);
        }
        Ok(())
    }

    fn normalize(&mut self) {
        let trimmed = self.gateway.endpoint_url.trim().trim_end_matches('/');
        self.gateway.endpoint_url = trimmed.to_string();
        let pool = self.storage.pool_base.trim().trim_end_matches('/');
        self.storage.pool_base = pool.to_string();
        if self.storage.mount_base.len() > 1 {
            let mount = self.storage.mount_base.trim_end_matches('/');
            self.storage.mount_base = mount.to_string();
        }
    }

    /// Reject configurations that would make every call fail.
    pub fn validate(&self) -> Result<()> {
        let gw = &self.gateway;
        if gw.endpoint_url.is_empty() {
            return invalid("gateway.endpoint_url is required");
        }
        let url = reqwest::Url::parse(&gw.endpoint_url).map_err(|error| {
            VgwError::InvalidConfig {
                details: format!("invalid gateway.endpoint_url {:?}: {error}", gw.endpoint_url),
            }
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return invalid(&format!(
                "gateway.endpoint_url must be an http(s) URL with a host, got {:?}",
                gw.endpoint_url
            ));
        }

        for (name, value) in [
            ("gateway.admin_access", gw.admin_access.as_str()),
            ("gateway.admin_secret", gw.admin_secret.as_str()),
            ("gateway.region", gw.region.as_str()),
            ("storage.pool_base", self.storage.pool_base.as_str()),
            ("storage.mount_base", self.storage.mount_base.as_str()),
            ("storage.zfs_binary", self.storage.zfs_binary.as_str()),
        ] {
            if value.trim().is_empty() {
                return invalid(&format!("{name} is required"));
            }
        }
        if self.storage.users_json_path.as_os_str().is_empty() {
            return invalid("storage.users_json_path is required");
        }
        if gw.request_timeout_secs == 0 {
            return invalid("gateway.request_timeout_secs must be >= 1");
        }
        if self.ui.page_size == 0 {
            return invalid("ui.page_size must be >= 1");
        }
        Ok(())
    }
}

fn invalid(details: &str) -> Result<()> {
    Err(VgwError::InvalidConfig {
        details: details.to_string(),
    })
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|raw| !raw.trim().is_empty())
}

fn set_env_string(name: &str, slot: &mut String) {
    if let Some(raw) = env_var(name) {
        *slot = raw;
    }
}

fn set_env_u64(name: &str, slot: &mut u64) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw.parse::<u64>().map_err(|error| VgwError::ConfigParse {
            context: "env",
            details: format!("{name}={raw:?}: {error}"),
        })?;
    }
    Ok(())
}

fn set_env_usize(name: &str, slot: &mut usize) -> Result<()> {
    if let Some(raw) = env_var(name) {
        *slot = raw
            .parse::<usize>()
            .map_err(|error| VgwError::ConfigParse {
                context: "env",
                details: format!("{name}={raw:?}: {error}"),
            })?;
    }
    Ok(())
}

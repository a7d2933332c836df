//! # Reconciler Configuration
//!
//! Settings for a single reconciliation run, loaded from environment variables.

use crate::config::validation::{validate_namespace, validate_resource_name, ValidationError};
use crate::constants::{
    DEFAULT_CONFIG_MAP_NAME, DEFAULT_LOG_FORMAT, DEFAULT_LOG_LEVEL,
    DEFAULT_NAMESPACE, DEFAULT_PRIVATE_KEY_FILE, DEFAULT_PUBLIC_KEY_FILE, DEFAULT_SECRET_NAME, FALLBACK_KEY_DIR,
};
use crate::keys::KeyPair;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected 'text' or 'json')")),
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Json => f.write_str("json"),
        }
    }
}

/// Target namespace and object names
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub namespace: String,
    pub secret_name: String,
    pub config_map_name: String,
}

impl ResourceNames {
    pub fn new(
        namespace: impl Into<String>,
        secret_name: impl Into<String>,
        config_map_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            secret_name: secret_name.into(),
            config_map_name: config_map_name.into(),
        }
    }

    /// Check every name against the API server's naming rules
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_namespace(&self.namespace)?;
        validate_resource_name(&self.secret_name, "secret name")?;
        validate_resource_name(&self.config_map_name, "config map name")?;
        Ok(())
    }
}

impl Default for ResourceNames {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE, DEFAULT_SECRET_NAME, DEFAULT_CONFIG_MAP_NAME)
    }
}

/// Reconciliation run configuration
///
/// All settings have defaults matching the SSHFS reverse-mount deployment and can be
/// overridden via environment variables or command-line flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Namespace the Secret and ConfigMap live in
    /// Created if it does not exist
    pub namespace: String,
    /// Name of the Secret holding `id_rsa` and `id_rsa.pub`
    pub secret_name: String,
    /// Name of the ConfigMap holding `id_rsa.pub`
    pub config_map_name: String,
    /// Directory the key files are read from
    /// Defaults to the directory containing the executable
    pub key_dir: PathBuf,
    /// Private key file name, relative to `key_dir`
    pub private_key_file: String,
    /// Public key file name, relative to `key_dir`
    pub public_key_file: String,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: LogFormat,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            secret_name: DEFAULT_SECRET_NAME.to_string(),
            config_map_name: DEFAULT_CONFIG_MAP_NAME.to_string(),
            key_dir: default_key_dir(),
            private_key_file: DEFAULT_PRIVATE_KEY_FILE.to_string(),
            public_key_file: DEFAULT_PUBLIC_KEY_FILE.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            log_format: LogFormat::default(),
        }
    }
}

impl ReconcilerConfig {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source with defaults
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let string_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Self {
            namespace: string_or("K8S_NAMESPACE", DEFAULT_NAMESPACE),
            secret_name: string_or("SSH_KEY_SECRET_NAME", DEFAULT_SECRET_NAME),
            config_map_name: string_or("SSH_PUBLIC_KEY_CONFIGMAP_NAME", DEFAULT_CONFIG_MAP_NAME),
            key_dir: lookup("SSH_KEY_DIR").map_or_else(default_key_dir, PathBuf::from),
            private_key_file: string_or("SSH_PRIVATE_KEY_FILE", DEFAULT_PRIVATE_KEY_FILE),
            public_key_file: string_or("SSH_PUBLIC_KEY_FILE", DEFAULT_PUBLIC_KEY_FILE),
            log_level: string_or("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            log_format: parsed_or(lookup("LOG_FORMAT"), DEFAULT_LOG_FORMAT),
        }
    }

    /// Target namespace and object names
    pub fn resource_names(&self) -> ResourceNames {
        ResourceNames::new(&self.namespace, &self.secret_name, &self.config_map_name)
    }

    /// Key file locations
    pub fn key_pair(&self) -> KeyPair {
        KeyPair::new(
            self.key_dir.join(&self.private_key_file),
            self.key_dir.join(&self.public_key_file),
        )
    }
}

/// Directory containing the running executable, so keys kept next to the tool are found
/// regardless of the working directory
pub fn default_key_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from(FALLBACK_KEY_DIR))
}

/// Parse a value or fall back to the parsed default
fn parsed_or<T>(value: Option<String>, default: &str) -> T
where
    T: FromStr + Default,
{
    value
        .and_then(|v| v.parse().ok())
        .or_else(|| default.parse().ok())
        .unwrap_or_default()
}

//! # Platform
//!
//! The orchestration API seam.
//!
//! The reconciler only needs a handful of calls (namespace get/create, create-or-replace
//! and get for Secrets and ConfigMaps). They are collected in the [`Platform`] trait so
//! the reconciler can run against the real cluster ([`KubePlatform`]) or an in-memory fake
//! in tests.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub mod kubernetes;

pub use self::kubernetes::KubePlatform;

/// Kind of object written by the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Secret,
    ConfigMap,
}

impl ResourceKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Secret => "Secret",
            ResourceKind::ConfigMap => "ConfigMap",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors returned by the orchestration API
#[derive(Debug, Clone, Error)]
pub enum PlatformError {
    /// The API server answered with an error status
    #[error("API request rejected ({code} {reason}): {message}")]
    Rejected {
        code: u16,
        reason: String,
        message: String,
    },
    /// The request never got an answer (connection, TLS, serialization, auth plugin)
    #[error("API request failed: {0}")]
    Transport(String),
    /// The object handed to the platform is missing a required field
    #[error("invalid object: {0}")]
    InvalidObject(String),
}

impl PlatformError {
    /// `409 AlreadyExists`
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, PlatformError::Rejected { code: 409, reason, .. } if reason == "AlreadyExists")
    }

    /// Build a rejection with the API server's conventional reason strings
    pub fn rejected(code: u16, message: impl Into<String>) -> Self {
        let reason = match code {
            400 => "BadRequest",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "NotFound",
            409 => "AlreadyExists",
            422 => "Invalid",
            _ => "InternalError",
        };
        PlatformError::Rejected {
            code,
            reason: reason.to_string(),
            message: message.into(),
        }
    }
}

/// An object as read back from the platform
///
/// Secret `data` and ConfigMap `data`/`binaryData` are flattened into one byte map so
/// callers can compare against local files without caring where the bytes were stored.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StoredResource {
    pub name: String,
    pub namespace: String,
    pub data: BTreeMap<String, Vec<u8>>,
    /// RFC 3339 creation timestamp assigned by the API server
    pub creation_timestamp: Option<String>,
}

/// Orchestration API calls needed to reconcile the key resources
///
/// Every method is a single synchronous round trip from the caller's point of view;
/// implementations must not retry.
#[async_trait]
pub trait Platform: Send + Sync {
    /// Whether the namespace exists
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, PlatformError>;

    /// Create the namespace
    /// Returns a `409 AlreadyExists` rejection if it already exists
    async fn create_namespace(&self, namespace: &str) -> Result<(), PlatformError>;

    /// Create the Secret, or replace it in full if it already exists
    async fn apply_secret(&self, secret: &Secret) -> Result<(), PlatformError>;

    /// Create the ConfigMap, or replace it in full if it already exists
    async fn apply_config_map(&self, config_map: &ConfigMap) -> Result<(), PlatformError>;

    /// Read a Secret, `None` if it does not exist
    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StoredResource>, PlatformError>;

    /// Read a ConfigMap, `None` if it does not exist
    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StoredResource>, PlatformError>;
}

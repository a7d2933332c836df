//! # Types
//!
//! Report and error types for the reconciler.

use crate::config::validation::ValidationError;
use crate::keys::KeyError;
use crate::platform::{PlatformError, ResourceKind};
use chrono::{DateTime, Utc};
use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A resource written during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedResource {
    pub kind: ResourceKind,
    pub namespace: String,
    pub name: String,
}

impl AppliedResource {
    pub fn new(kind: ResourceKind, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for AppliedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

/// Outcome of a successful reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub namespace: String,
    /// Whether this run created the namespace
    pub namespace_created: bool,
    pub secret_name: String,
    pub secret_creation_timestamp: Option<String>,
    pub config_map_name: String,
    pub config_map_creation_timestamp: Option<String>,
    /// OpenSSH fingerprint of the reconciled public key
    pub public_key_fingerprint: Option<String>,
    pub reconciled_at: DateTime<Utc>,
}

/// Reconciliation failures
///
/// Every variant is fatal to the run. Variants raised after the first write carry the
/// resources that were already applied, so a partial run is never reported as a bare failure.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ValidationError),

    #[error("private key not found or unreadable at '{}': {source}", .path.display())]
    MissingPrivateKey {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("public key not found or unreadable at '{}': {source}", .path.display())]
    MissingPublicKey {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to ensure namespace '{namespace}': {source}")]
    NamespaceCreationFailed {
        namespace: String,
        #[source]
        source: PlatformError,
    },

    #[error("failed to apply {kind} '{name}'{}: {source}", applied_suffix(.applied))]
    ResourceApplyFailed {
        kind: ResourceKind,
        name: String,
        applied: Vec<AppliedResource>,
        #[source]
        source: PlatformError,
    },

    #[error("{kind} '{name}' not found after apply{}{}", applied_suffix(.applied), cause_suffix(.source.as_ref()))]
    VerificationFailed {
        kind: ResourceKind,
        name: String,
        applied: Vec<AppliedResource>,
        /// Read-back error, `None` when the read succeeded but found nothing
        source: Option<PlatformError>,
    },
}

impl ReconcileError {
    /// Resources applied before the failure
    #[must_use]
    pub fn applied(&self) -> &[AppliedResource] {
        match self {
            ReconcileError::ResourceApplyFailed { applied, .. }
            | ReconcileError::VerificationFailed { applied, .. } => applied,
            _ => &[],
        }
    }

    /// Whether the cluster may have been modified by the failed run
    #[must_use]
    pub fn is_partial(&self) -> bool {
        !self.applied().is_empty()
    }
}

impl From<KeyError> for ReconcileError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::MissingPrivateKey { path, source } => {
                ReconcileError::MissingPrivateKey { path, source }
            }
            KeyError::MissingPublicKey { path, source } => {
                ReconcileError::MissingPublicKey { path, source }
            }
        }
    }
}

fn applied_suffix(applied: &[AppliedResource]) -> String {
    if applied.is_empty() {
        return String::new();
    }
    let list: Vec<String> = applied.iter().map(ToString::to_string).collect();
    format!(" (already applied: {})", list.join(", "))
}

fn cause_suffix(source: Option<&PlatformError>) -> String {
    source.map(|e| format!(": {e}")).unwrap_or_default()
}

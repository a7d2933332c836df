//! # Kubernetes Name Validation
//!
//! Validates namespace and resource names per RFC 1123 before any API call is made,
//! so a typo in an override fails fast instead of surfacing as a 422 from the API server.

use crate::constants::{MAX_NAMESPACE_LEN, MAX_RESOURCE_NAME_LEN};
use regex::Regex;
use thiserror::Error;

/// A configuration value that the API server would reject
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field} '{value}': {reason}")]
pub struct ValidationError {
    /// Configuration field that failed validation
    pub field: &'static str,
    /// Offending value
    pub value: String,
    /// Why the value was rejected
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self {
            field,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Validate a namespace (RFC 1123 label)
/// Format: lowercase alphanumeric, hyphens
/// Length: 1-63 characters
/// Cannot start or end with hyphen
pub fn validate_namespace(namespace: &str) -> Result<(), ValidationError> {
    const FIELD: &str = "namespace";

    if namespace.is_empty() {
        return Err(ValidationError::new(FIELD, namespace, "cannot be empty"));
    }

    if namespace.len() > MAX_NAMESPACE_LEN {
        return Err(ValidationError::new(
            FIELD,
            namespace,
            format!(
                "exceeds maximum length of {MAX_NAMESPACE_LEN} characters (got {})",
                namespace.len()
            ),
        ));
    }

    // RFC 1123 label: [a-z0-9]([-a-z0-9]*[a-z0-9])?
    let namespace_regex = Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$")
        .map_err(|e| ValidationError::new(FIELD, namespace, format!("regex error: {e}")))?;

    if !namespace_regex.is_match(namespace) {
        return Err(ValidationError::new(
            FIELD,
            namespace,
            "must be lowercase alphanumeric or hyphens, and cannot start or end with a hyphen",
        ));
    }

    Ok(())
}

/// Validate a Secret or ConfigMap name (RFC 1123 subdomain)
/// Format: lowercase alphanumeric, hyphens, dots
/// Length: 1-253 characters
/// Cannot start or end with hyphen or dot
pub fn validate_resource_name(name: &str, field: &'static str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::new(field, name, "cannot be empty"));
    }

    if name.len() > MAX_RESOURCE_NAME_LEN {
        return Err(ValidationError::new(
            field,
            name,
            format!(
                "exceeds maximum length of {MAX_RESOURCE_NAME_LEN} characters (got {})",
                name.len()
            ),
        ));
    }

    // RFC 1123 subdomain: [a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*
    let name_regex =
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
            .map_err(|e| ValidationError::new(field, name, format!("regex error: {e}")))?;

    if !name_regex.is_match(name) {
        return Err(ValidationError::new(
            field,
            name,
            "must be lowercase alphanumeric, hyphens or dots, and cannot start or end with a hyphen or dot",
        ));
    }

    Ok(())
}

//! # Inspect
//!
//! Read-only view of what the cluster holds, optionally compared against local key files.

use crate::config::ResourceNames;
use crate::constants::{PRIVATE_KEY_DATA_KEY, PUBLIC_KEY_DATA_KEY};
use crate::keys::KeyMaterial;
use crate::platform::{Platform, PlatformError, ResourceKind, StoredResource};
use std::fmt;
use tracing::debug;

/// Comparison of one stored key against the local file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMatch {
    /// Stored bytes equal the local file
    Matches,
    /// Stored bytes differ from the local file
    Differs,
    /// The key is absent from the object
    Missing,
    /// No local key material was supplied
    NotChecked,
}

impl fmt::Display for KeyMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            KeyMatch::Matches => "matches local file",
            KeyMatch::Differs => "differs from local file",
            KeyMatch::Missing => "missing",
            KeyMatch::NotChecked => "not checked",
        })
    }
}

/// State of one object in the cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceStatus {
    pub kind: ResourceKind,
    pub name: String,
    pub exists: bool,
    pub creation_timestamp: Option<String>,
    /// Per data key comparison, in a fixed order
    pub keys: Vec<(String, KeyMatch)>,
}

impl ResourceStatus {
    /// Exists and every key was compared and matches
    ///
    /// A key that was not compared does not count as in sync.
    #[must_use]
    pub fn is_in_sync(&self) -> bool {
        self.exists && self.keys.iter().all(|(_, m)| *m == KeyMatch::Matches)
    }

    /// Whether any key was left uncompared
    #[must_use]
    pub fn has_unchecked_keys(&self) -> bool {
        self.keys.iter().any(|(_, m)| *m == KeyMatch::NotChecked)
    }
}

/// Result of [`inspect`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectReport {
    pub namespace: String,
    pub namespace_exists: bool,
    pub secret: ResourceStatus,
    pub config_map: ResourceStatus,
}

impl InspectReport {
    /// Both objects exist and hold the local key material
    #[must_use]
    pub fn is_in_sync(&self) -> bool {
        self.namespace_exists && self.secret.is_in_sync() && self.config_map.is_in_sync()
    }

    /// Contents were not compared because no local key material was supplied
    #[must_use]
    pub fn is_existence_only(&self) -> bool {
        self.secret.has_unchecked_keys() || self.config_map.has_unchecked_keys()
    }
}

fn compare(stored: Option<&StoredResource>, key: &str, local: Option<&[u8]>) -> KeyMatch {
    let Some(stored) = stored else {
        return KeyMatch::Missing;
    };
    match (stored.data.get(key), local) {
        (None, _) => KeyMatch::Missing,
        (Some(_), None) => KeyMatch::NotChecked,
        (Some(bytes), Some(local)) if bytes.as_slice() == local => KeyMatch::Matches,
        (Some(_), Some(_)) => KeyMatch::Differs,
    }
}

fn status(
    kind: ResourceKind,
    name: &str,
    stored: Option<&StoredResource>,
    keys: Vec<(String, KeyMatch)>,
) -> ResourceStatus {
    ResourceStatus {
        kind,
        name: name.to_string(),
        exists: stored.is_some(),
        creation_timestamp: stored.and_then(|s| s.creation_timestamp.clone()),
        keys,
    }
}

/// Read the namespace, Secret and ConfigMap without writing anything
///
/// When `local` is given, each stored key is compared byte-for-byte with the local file.
/// A missing namespace skips the object reads.
pub async fn inspect<P>(
    platform: &P,
    names: &ResourceNames,
    local: Option<&KeyMaterial>,
) -> Result<InspectReport, PlatformError>
where
    P: Platform + ?Sized,
{
    let namespace_exists = platform.namespace_exists(&names.namespace).await?;

    let (secret, config_map) = if namespace_exists {
        (
            platform.get_secret(&names.namespace, &names.secret_name).await?,
            platform
                .get_config_map(&names.namespace, &names.config_map_name)
                .await?,
        )
    } else {
        debug!("Namespace '{}' does not exist, skipping object reads", names.namespace);
        (None, None)
    };

    let local_private = local.map(|k| k.private_key.as_slice());
    let local_public = local.map(|k| k.public_key.as_slice());

    let secret_keys = vec![
        (
            PRIVATE_KEY_DATA_KEY.to_string(),
            compare(secret.as_ref(), PRIVATE_KEY_DATA_KEY, local_private),
        ),
        (
            PUBLIC_KEY_DATA_KEY.to_string(),
            compare(secret.as_ref(), PUBLIC_KEY_DATA_KEY, local_public),
        ),
    ];
    let config_map_keys = vec![(
        PUBLIC_KEY_DATA_KEY.to_string(),
        compare(config_map.as_ref(), PUBLIC_KEY_DATA_KEY, local_public),
    )];

    Ok(InspectReport {
        namespace: names.namespace.clone(),
        namespace_exists,
        secret: status(
            ResourceKind::Secret,
            &names.secret_name,
            secret.as_ref(),
            secret_keys,
        ),
        config_map: status(
            ResourceKind::ConfigMap,
            &names.config_map_name,
            config_map.as_ref(),
            config_map_keys,
        ),
    })
}

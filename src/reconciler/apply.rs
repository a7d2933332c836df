//! # Apply
//!
//! Side-effecting half of the reconciler: namespace, create-or-replace, read-back.

use crate::config::ResourceNames;
use crate::platform::{Platform, ResourceKind, StoredResource};
use crate::reconciler::render::DesiredState;
use crate::reconciler::types::{AppliedResource, ReconcileError};
use std::collections::BTreeMap;
use tracing::{error, info, warn};

/// Make sure the namespace exists
///
/// Returns `true` when this call created it. Losing a creation race to another client
/// (`409 AlreadyExists`) counts as success.
pub async fn ensure_namespace<P>(platform: &P, namespace: &str) -> Result<bool, ReconcileError>
where
    P: Platform + ?Sized,
{
    let failed = |source| ReconcileError::NamespaceCreationFailed {
        namespace: namespace.to_string(),
        source,
    };

    if platform.namespace_exists(namespace).await.map_err(failed)? {
        info!("✅ Namespace '{}' exists", namespace);
        return Ok(false);
    }

    match platform.create_namespace(namespace).await {
        Ok(()) => {
            info!("✅ Namespace '{}' created", namespace);
            Ok(true)
        }
        Err(e) if e.is_already_exists() => {
            info!("✅ Namespace '{}' was created concurrently", namespace);
            Ok(false)
        }
        Err(e) => {
            error!("❌ Failed to create namespace '{}': {}", namespace, e);
            Err(failed(e))
        }
    }
}

/// Submit the rendered Secret, then the rendered ConfigMap
///
/// Stops at the first failure. The error lists what was applied before it.
pub async fn apply_desired_state<P>(
    platform: &P,
    desired: &DesiredState,
) -> Result<Vec<AppliedResource>, ReconcileError>
where
    P: Platform + ?Sized,
{
    let mut applied = Vec::with_capacity(2);

    let secret_meta = &desired.secret.metadata;
    let secret_name = secret_meta.name.clone().unwrap_or_default();
    let namespace = secret_meta.namespace.clone().unwrap_or_default();
    if let Err(source) = platform.apply_secret(&desired.secret).await {
        error!("❌ Failed to apply Secret '{}/{}': {}", namespace, secret_name, source);
        return Err(ReconcileError::ResourceApplyFailed {
            kind: ResourceKind::Secret,
            name: secret_name,
            applied,
            source,
        });
    }
    info!("✅ Secret '{}/{}' applied", namespace, secret_name);
    applied.push(AppliedResource::new(ResourceKind::Secret, &namespace, secret_name));

    let config_map_meta = &desired.config_map.metadata;
    let config_map_name = config_map_meta.name.clone().unwrap_or_default();
    let namespace = config_map_meta.namespace.clone().unwrap_or_default();
    if let Err(source) = platform.apply_config_map(&desired.config_map).await {
        error!(
            "❌ Failed to apply ConfigMap '{}/{}': {} (Secret was already applied)",
            namespace, config_map_name, source
        );
        return Err(ReconcileError::ResourceApplyFailed {
            kind: ResourceKind::ConfigMap,
            name: config_map_name,
            applied,
            source,
        });
    }
    info!("✅ ConfigMap '{}/{}' applied", namespace, config_map_name);
    applied.push(AppliedResource::new(
        ResourceKind::ConfigMap,
        &namespace,
        config_map_name,
    ));

    Ok(applied)
}

/// Read both objects back
///
/// Missing objects fail verification. Content that differs from the rendered state means
/// another writer got in between; that is logged and tolerated (last writer wins).
pub async fn verify<P>(
    platform: &P,
    names: &ResourceNames,
    desired: &DesiredState,
    applied: &[AppliedResource],
) -> Result<(StoredResource, StoredResource), ReconcileError>
where
    P: Platform + ?Sized,
{
    let secret = read_back(platform, ResourceKind::Secret, names, applied).await?;
    let expected_secret = desired
        .secret
        .data
        .iter()
        .flatten()
        .map(|(k, v)| (k.clone(), v.0.clone()))
        .collect();
    warn_on_drift(ResourceKind::Secret, &secret, &expected_secret);

    let config_map = read_back(platform, ResourceKind::ConfigMap, names, applied).await?;
    let mut expected_config_map: BTreeMap<String, Vec<u8>> = desired
        .config_map
        .data
        .iter()
        .flatten()
        .map(|(k, v)| (k.clone(), v.clone().into_bytes()))
        .collect();
    expected_config_map.extend(
        desired
            .config_map
            .binary_data
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.0.clone())),
    );
    warn_on_drift(ResourceKind::ConfigMap, &config_map, &expected_config_map);

    Ok((secret, config_map))
}

async fn read_back<P>(
    platform: &P,
    kind: ResourceKind,
    names: &ResourceNames,
    applied: &[AppliedResource],
) -> Result<StoredResource, ReconcileError>
where
    P: Platform + ?Sized,
{
    let name = match kind {
        ResourceKind::Secret => &names.secret_name,
        ResourceKind::ConfigMap => &names.config_map_name,
    };
    let result = match kind {
        ResourceKind::Secret => platform.get_secret(&names.namespace, name).await,
        ResourceKind::ConfigMap => platform.get_config_map(&names.namespace, name).await,
    };

    match result {
        Ok(Some(stored)) => {
            info!(
                "✅ {} '{}/{}' verified (created {})",
                kind,
                names.namespace,
                name,
                stored.creation_timestamp.as_deref().unwrap_or("unknown")
            );
            Ok(stored)
        }
        Ok(None) => {
            error!("❌ {} '{}/{}' not found after apply", kind, names.namespace, name);
            Err(ReconcileError::VerificationFailed {
                kind,
                name: name.clone(),
                applied: applied.to_vec(),
                source: None,
            })
        }
        Err(e) => {
            error!("❌ Failed to read back {} '{}/{}': {}", kind, names.namespace, name, e);
            Err(ReconcileError::VerificationFailed {
                kind,
                name: name.clone(),
                applied: applied.to_vec(),
                source: Some(e),
            })
        }
    }
}

fn warn_on_drift(
    kind: ResourceKind,
    stored: &StoredResource,
    expected: &BTreeMap<String, Vec<u8>>,
) {
    if &stored.data != expected {
        let keys: Vec<&str> = stored.data.keys().map(String::as_str).collect();
        warn!(
            "⚠️  {} '{}/{}' differs from the rendered state after apply (stored keys: {:?}); another writer may have replaced it",
            kind, stored.namespace, stored.name, keys
        );
    }
}

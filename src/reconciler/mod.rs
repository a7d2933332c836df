//! # Reconciler
//!
//! Ensures the SSH key Secret and public-key ConfigMap exist in the target namespace
//! and hold exactly the local key pair.
//!
//! ## Flow
//!
//! 1. Read both key files and validate names (no API calls before this succeeds)
//! 2. Ensure the namespace exists
//! 3. Render the desired Secret and ConfigMap
//! 4. Create-or-replace the Secret, then the ConfigMap
//! 5. Read both back and record their creation timestamps
//!
//! Every step is idempotent, so a failed run is recovered by running it again.
//! Nothing is retried and nothing is rolled back.

pub mod apply;
pub mod inspect;
pub mod render;
pub mod types;

pub use apply::{apply_desired_state, ensure_namespace, verify};
pub use inspect::{inspect, InspectReport, KeyMatch, ResourceStatus};
pub use render::{render_desired_state, DesiredState};
pub use types::{AppliedResource, ReconcileError, ReconcileReport};

use crate::config::ResourceNames;
use crate::keys::{KeyMaterial, KeyPair};
use crate::platform::Platform;
use tracing::{info, warn};

/// Reconcile the key pair into the namespace
///
/// Reads both key files first; a missing key makes no API calls.
pub async fn reconcile<P>(
    platform: &P,
    key_pair: &KeyPair,
    names: &ResourceNames,
) -> Result<ReconcileReport, ReconcileError>
where
    P: Platform + ?Sized,
{
    let keys = key_pair.load()?;
    reconcile_key_material(platform, &keys, names).await
}

/// Reconcile already loaded key material into the namespace
///
/// Names are validated before the first API call.
pub async fn reconcile_key_material<P>(
    platform: &P,
    keys: &KeyMaterial,
    names: &ResourceNames,
) -> Result<ReconcileReport, ReconcileError>
where
    P: Platform + ?Sized,
{
    names.validate()?;

    let fingerprint = keys.public_key_fingerprint();
    match &fingerprint {
        Some(fp) => info!("🔑 Public key fingerprint: {}", fp),
        None => warn!("⚠️  Public key is not an OpenSSH public key line; reconciling its bytes as-is"),
    }

    let namespace_created = ensure_namespace(platform, &names.namespace).await?;

    let desired = render_desired_state(keys, names);
    let applied = apply_desired_state(platform, &desired).await?;
    let (secret, config_map) = verify(platform, names, &desired, &applied).await?;

    info!(
        "✅ Reconciled Secret '{}' and ConfigMap '{}' in namespace '{}'",
        names.secret_name, names.config_map_name, names.namespace
    );

    Ok(ReconcileReport {
        namespace: names.namespace.clone(),
        namespace_created,
        secret_name: names.secret_name.clone(),
        secret_creation_timestamp: secret.creation_timestamp,
        config_map_name: names.config_map_name.clone(),
        config_map_creation_timestamp: config_map.creation_timestamp,
        public_key_fingerprint: fingerprint,
        reconciled_at: chrono::Utc::now(),
    })
}

//! # Render
//!
//! Builds the desired Secret and ConfigMap in memory.
//!
//! Rendering is pure: no API calls, no file access. The rendered objects are exactly what
//! gets submitted, so what `render` prints is what `apply` writes.

use crate::config::ResourceNames;
use crate::constants::{
    MANAGED_BY_LABEL, MANAGED_BY_VALUE, PRIVATE_KEY_DATA_KEY, PUBLIC_KEY_DATA_KEY,
    SECRET_TYPE_OPAQUE,
};
use crate::keys::KeyMaterial;
use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

/// Rendered objects for one reconciliation
#[derive(Clone, PartialEq)]
pub struct DesiredState {
    pub secret: Secret,
    pub config_map: ConfigMap,
}

impl std::fmt::Debug for DesiredState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Secret data holds the private key
        f.debug_struct("DesiredState")
            .field("secret", &self.secret.metadata.name)
            .field("config_map", &self.config_map.metadata.name)
            .finish_non_exhaustive()
    }
}

impl DesiredState {
    /// Both objects as a multi-document YAML stream, Secret first
    pub fn to_yaml(&self) -> Result<String> {
        let secret = serde_yaml::to_string(&self.secret).context("Failed to serialize Secret")?;
        let config_map =
            serde_yaml::to_string(&self.config_map).context("Failed to serialize ConfigMap")?;
        Ok(format!("---\n{secret}---\n{config_map}"))
    }
}

fn metadata(name: &str, namespace: &str) -> ObjectMeta {
    ObjectMeta {
        name: Some(name.to_string()),
        namespace: Some(namespace.to_string()),
        labels: Some(BTreeMap::from([(
            MANAGED_BY_LABEL.to_string(),
            MANAGED_BY_VALUE.to_string(),
        )])),
        ..ObjectMeta::default()
    }
}

/// Render the Secret (`id_rsa`, `id_rsa.pub`) and ConfigMap (`id_rsa.pub`)
///
/// ConfigMap `data` only holds UTF-8, so a public key that is not valid UTF-8 is placed in
/// `binaryData` instead; the bytes round-trip either way.
pub fn render_desired_state(keys: &KeyMaterial, names: &ResourceNames) -> DesiredState {
    let secret = Secret {
        metadata: metadata(&names.secret_name, &names.namespace),
        type_: Some(SECRET_TYPE_OPAQUE.to_string()),
        data: Some(BTreeMap::from([
            (
                PRIVATE_KEY_DATA_KEY.to_string(),
                ByteString(keys.private_key.to_vec()),
            ),
            (
                PUBLIC_KEY_DATA_KEY.to_string(),
                ByteString(keys.public_key.clone()),
            ),
        ])),
        ..Secret::default()
    };

    let mut config_map = ConfigMap {
        metadata: metadata(&names.config_map_name, &names.namespace),
        ..ConfigMap::default()
    };
    match String::from_utf8(keys.public_key.clone()) {
        Ok(text) => {
            config_map.data = Some(BTreeMap::from([(PUBLIC_KEY_DATA_KEY.to_string(), text)]));
        }
        Err(err) => {
            config_map.binary_data = Some(BTreeMap::from([(
                PUBLIC_KEY_DATA_KEY.to_string(),
                ByteString(err.into_bytes()),
            )]));
        }
    }

    DesiredState { secret, config_map }
}

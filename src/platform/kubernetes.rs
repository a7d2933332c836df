//! # Kubernetes Platform
//!
//! [`Platform`] over a `kube::Client`.
//!
//! Create-or-replace is POST first, then on `409 AlreadyExists` a GET for the current
//! `resourceVersion` followed by a PUT of the full rendered object. A PUT replaces the
//! whole object, so keys added by other writers are dropped and the stored object ends up
//! exactly as rendered. Server-side apply would keep fields owned by other managers.

use crate::constants::FIELD_MANAGER;
use crate::platform::{Platform, PlatformError, ResourceKind, StoredResource};
use anyhow::Context;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use kube::api::{Api, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config, Resource};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Debug;
use tracing::debug;

impl From<kube::Error> for PlatformError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(api_err) => PlatformError::Rejected {
                code: api_err.code,
                reason: api_err.reason.clone(),
                message: api_err.message.clone(),
            },
            other => PlatformError::Transport(other.to_string()),
        }
    }
}

/// Kubernetes API client
#[derive(Clone)]
pub struct KubePlatform {
    client: Client,
}

impl Debug for KubePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubePlatform")
            .field("default_namespace", &self.client.default_namespace())
            .finish_non_exhaustive()
    }
}

impl KubePlatform {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the default inference chain (in-cluster config, then kubeconfig),
    /// or a named kubeconfig context when one is given
    pub async fn connect(context: Option<&str>) -> anyhow::Result<Self> {
        let client = match context {
            None => Client::try_default()
                .await
                .context("Failed to create Kubernetes client. Ensure kubeconfig is configured.")?,
            Some(context) => {
                let kubeconfig = Kubeconfig::read()
                    .context("Failed to read kubeconfig")?;
                let options = KubeConfigOptions {
                    context: Some(context.to_string()),
                    ..KubeConfigOptions::default()
                };
                let config = Config::from_custom_kubeconfig(kubeconfig, &options)
                    .await
                    .with_context(|| format!("Failed to load kubeconfig context '{context}'"))?;
                Client::try_from(config).context("Failed to create Kubernetes client")?
            }
        };
        Ok(Self::new(client))
    }

    fn post_params() -> PostParams {
        PostParams {
            dry_run: false,
            field_manager: Some(FIELD_MANAGER.to_string()),
        }
    }
}

/// POST the object; on `AlreadyExists` PUT it over the current version
async fn create_or_replace<K>(api: &Api<K>, kind: ResourceKind, desired: &K) -> Result<(), PlatformError>
where
    K: Resource + Clone + Debug + Serialize + DeserializeOwned,
{
    let name = desired
        .meta()
        .name
        .clone()
        .ok_or_else(|| PlatformError::InvalidObject(format!("{kind} has no metadata.name")))?;
    let params = KubePlatform::post_params();

    debug!("Creating {} '{}'", kind, name);
    match api.create(&params, desired).await {
        Ok(_) => return Ok(()),
        Err(err) => {
            let err = PlatformError::from(err);
            if !err.is_already_exists() {
                return Err(err);
            }
        }
    }

    debug!("{} '{}' already exists, replacing", kind, name);
    let current = api.get(&name).await?;
    let mut replacement = desired.clone();
    replacement.meta_mut().resource_version = current.meta().resource_version.clone();
    api.replace(&name, &params, &replacement).await?;
    Ok(())
}

/// Creation timestamp as the API server serializes it (RFC 3339)
fn creation_timestamp(meta: &ObjectMeta) -> Option<String> {
    meta.creation_timestamp
        .as_ref()
        .and_then(|t: &Time| serde_json::to_value(t).ok())
        .and_then(|v| v.as_str().map(str::to_owned))
}

fn stored(meta: &ObjectMeta, data: BTreeMap<String, Vec<u8>>) -> StoredResource {
    StoredResource {
        name: meta.name.clone().unwrap_or_default(),
        namespace: meta.namespace.clone().unwrap_or_default(),
        data,
        creation_timestamp: creation_timestamp(meta),
    }
}

fn namespace_of(meta: &ObjectMeta, kind: ResourceKind) -> Result<String, PlatformError> {
    meta.namespace
        .clone()
        .ok_or_else(|| PlatformError::InvalidObject(format!("{kind} has no metadata.namespace")))
}

#[async_trait]
impl Platform for KubePlatform {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, PlatformError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        Ok(api.get_opt(namespace).await?.is_some())
    }

    async fn create_namespace(&self, namespace: &str) -> Result<(), PlatformError> {
        let api: Api<Namespace> = Api::all(self.client.clone());
        let ns = Namespace {
            metadata: ObjectMeta {
                name: Some(namespace.to_string()),
                ..ObjectMeta::default()
            },
            ..Namespace::default()
        };
        api.create(&Self::post_params(), &ns).await?;
        Ok(())
    }

    async fn apply_secret(&self, secret: &Secret) -> Result<(), PlatformError> {
        let namespace = namespace_of(&secret.metadata, ResourceKind::Secret)?;
        let api: Api<Secret> = Api::namespaced(self.client.clone(), &namespace);
        create_or_replace(&api, ResourceKind::Secret, secret).await
    }

    async fn apply_config_map(&self, config_map: &ConfigMap) -> Result<(), PlatformError> {
        let namespace = namespace_of(&config_map.metadata, ResourceKind::ConfigMap)?;
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), &namespace);
        create_or_replace(&api, ResourceKind::ConfigMap, config_map).await
    }

    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StoredResource>, PlatformError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let Some(secret) = api.get_opt(name).await? else {
            return Ok(None);
        };

        let data = secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.0))
            .collect();
        Ok(Some(stored(&secret.metadata, data)))
    }

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StoredResource>, PlatformError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        let Some(config_map) = api.get_opt(name).await? else {
            return Ok(None);
        };

        let mut data: BTreeMap<String, Vec<u8>> = config_map
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.into_bytes()))
            .collect();
        data.extend(
            config_map
                .binary_data
                .unwrap_or_default()
                .into_iter()
                .map(|(k, v)| (k, v.0)),
        );
        Ok(Some(stored(&config_map.metadata, data)))
    }
}

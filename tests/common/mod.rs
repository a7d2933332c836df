//! Common test utilities
//!
//! Provides an in-memory [`Platform`] with failure injection, key file helpers, and the
//! rustls setup needed by tests that talk to a real cluster.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Secret};
use sshfs_keysync::keys::KeyPair;
use sshfs_keysync::platform::{Platform, PlatformError, StoredResource};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{Mutex, Once};

static RUSTLS_INIT: Once = Once::new();

/// Initialize rustls crypto provider for tests that build a real client
pub fn init_rustls() {
    RUSTLS_INIT.call_once(|| {
        rustls::crypto::ring::default_provider()
            .install_default()
            .expect("Failed to install rustls crypto provider");
    });
}

/// Write a key pair into `dir` under the default file names
pub fn write_key_pair(dir: &Path, private_key: &[u8], public_key: &[u8]) -> KeyPair {
    let private_path = dir.join("backend_ssh_key");
    let public_path = dir.join("backend_ssh_key.pub");
    std::fs::write(&private_path, private_key).expect("write private key");
    std::fs::write(&public_path, public_key).expect("write public key");
    KeyPair::new(private_path, public_path)
}

type ObjectKey = (String, String);

#[derive(Default)]
struct State {
    namespaces: HashSet<String>,
    secrets: HashMap<ObjectKey, StoredResource>,
    config_maps: HashMap<ObjectKey, StoredResource>,
    calls: Vec<&'static str>,
}

/// Failures the fake injects
#[derive(Default, Clone)]
pub struct Failures {
    /// Status code returned by `create_namespace`
    pub create_namespace: Option<u16>,
    /// `namespace_exists` answers false even though the namespace exists
    pub namespace_race: bool,
    /// Status code returned by `apply_secret`
    pub apply_secret: Option<u16>,
    /// Status code returned by `apply_config_map`
    pub apply_config_map: Option<u16>,
    /// Reads return nothing, as if another client deleted the objects
    pub hide_on_read: bool,
}

/// In-memory orchestration API
#[derive(Default)]
pub struct FakePlatform {
    state: Mutex<State>,
    failures: Failures,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failures(failures: Failures) -> Self {
        Self {
            state: Mutex::default(),
            failures,
        }
    }

    pub fn with_namespace(self, namespace: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .namespaces
            .insert(namespace.to_string());
        self
    }

    /// Seed a Secret as another writer would have left it
    pub fn with_secret(self, namespace: &str, name: &str, data: &[(&str, &[u8])]) -> Self {
        let stored = StoredResource {
            name: name.to_string(),
            namespace: namespace.to_string(),
            data: data
                .iter()
                .map(|(k, v)| ((*k).to_string(), v.to_vec()))
                .collect(),
            creation_timestamp: Some("2026-01-01T00:00:00Z".to_string()),
        };
        self.state
            .lock()
            .unwrap()
            .secrets
            .insert((namespace.to_string(), name.to_string()), stored);
        self
    }

    /// Platform calls made so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn has_namespace(&self, namespace: &str) -> bool {
        self.state.lock().unwrap().namespaces.contains(namespace)
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<StoredResource> {
        let key = (namespace.to_string(), name.to_string());
        self.state.lock().unwrap().secrets.get(&key).cloned()
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<StoredResource> {
        let key = (namespace.to_string(), name.to_string());
        self.state.lock().unwrap().config_maps.get(&key).cloned()
    }

    fn record(&self, call: &'static str) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn store(
        &self,
        select: fn(&mut State) -> &mut HashMap<ObjectKey, StoredResource>,
        namespace: Option<&String>,
        name: Option<&String>,
        data: BTreeMap<String, Vec<u8>>,
    ) -> Result<(), PlatformError> {
        let namespace = namespace
            .cloned()
            .ok_or_else(|| PlatformError::InvalidObject("missing namespace".to_string()))?;
        let name = name
            .cloned()
            .ok_or_else(|| PlatformError::InvalidObject("missing name".to_string()))?;

        let mut state = self.state.lock().unwrap();
        if !state.namespaces.contains(&namespace) {
            return Err(PlatformError::rejected(
                404,
                format!("namespaces \"{namespace}\" not found"),
            ));
        }

        let objects = select(&mut state);
        let key = (namespace.clone(), name.clone());
        // Replace keeps the original creation timestamp, like the API server
        let creation_timestamp = objects
            .get(&key)
            .and_then(|existing| existing.creation_timestamp.clone())
            .unwrap_or_else(|| chrono::Utc::now().to_rfc3339());
        objects.insert(
            key,
            StoredResource {
                name,
                namespace,
                data,
                creation_timestamp: Some(creation_timestamp),
            },
        );
        Ok(())
    }

    fn read(
        &self,
        select: fn(&mut State) -> &mut HashMap<ObjectKey, StoredResource>,
        namespace: &str,
        name: &str,
    ) -> Option<StoredResource> {
        if self.failures.hide_on_read {
            return None;
        }
        let mut state = self.state.lock().unwrap();
        select(&mut state)
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }
}

fn secrets(state: &mut State) -> &mut HashMap<ObjectKey, StoredResource> {
    &mut state.secrets
}

fn config_maps(state: &mut State) -> &mut HashMap<ObjectKey, StoredResource> {
    &mut state.config_maps
}

#[async_trait]
impl Platform for FakePlatform {
    async fn namespace_exists(&self, namespace: &str) -> Result<bool, PlatformError> {
        self.record("namespace_exists");
        if self.failures.namespace_race {
            return Ok(false);
        }
        Ok(self.has_namespace(namespace))
    }

    async fn create_namespace(&self, namespace: &str) -> Result<(), PlatformError> {
        self.record("create_namespace");
        if let Some(code) = self.failures.create_namespace {
            return Err(PlatformError::rejected(code, "injected failure"));
        }
        let mut state = self.state.lock().unwrap();
        if !state.namespaces.insert(namespace.to_string()) {
            return Err(PlatformError::rejected(
                409,
                format!("namespaces \"{namespace}\" already exists"),
            ));
        }
        Ok(())
    }

    async fn apply_secret(&self, secret: &Secret) -> Result<(), PlatformError> {
        self.record("apply_secret");
        if let Some(code) = self.failures.apply_secret {
            return Err(PlatformError::rejected(code, "injected failure"));
        }
        let data = secret
            .data
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.0.clone()))
            .collect();
        self.store(
            secrets,
            secret.metadata.namespace.as_ref(),
            secret.metadata.name.as_ref(),
            data,
        )
    }

    async fn apply_config_map(&self, config_map: &ConfigMap) -> Result<(), PlatformError> {
        self.record("apply_config_map");
        if let Some(code) = self.failures.apply_config_map {
            return Err(PlatformError::rejected(code, "injected failure"));
        }
        let mut data: BTreeMap<String, Vec<u8>> = config_map
            .data
            .iter()
            .flatten()
            .map(|(k, v)| (k.clone(), v.clone().into_bytes()))
            .collect();
        data.extend(
            config_map
                .binary_data
                .iter()
                .flatten()
                .map(|(k, v)| (k.clone(), v.0.clone())),
        );
        self.store(
            config_maps,
            config_map.metadata.namespace.as_ref(),
            config_map.metadata.name.as_ref(),
            data,
        )
    }

    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StoredResource>, PlatformError> {
        self.record("get_secret");
        Ok(self.read(secrets, namespace, name))
    }

    async fn get_config_map(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<StoredResource>, PlatformError> {
        self.record("get_config_map");
        Ok(self.read(config_maps, namespace, name))
    }
}

//! SSHFS Key Sync Library
//!
//! Reconciles the SSH key material used for SSHFS reverse mounts between pods into
//! Kubernetes: a Secret with the key pair (`id_rsa`, `id_rsa.pub`) for the pod that
//! mounts, and a ConfigMap with the public key (`id_rsa.pub`) for the pod being mounted.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sshfs_keysync::prelude::*;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = ReconcilerConfig::from_env();
//! let platform = KubePlatform::connect(None).await?;
//! let report = reconcile(&platform, &config.key_pair(), &config.resource_names()).await?;
//! println!("Secret created at {:?}", report.secret_creation_timestamp);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod constants;
pub mod keys;
pub mod observability;
pub mod platform;
pub mod prelude;
pub mod reconciler;

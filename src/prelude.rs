//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use sshfs_keysync::prelude::*;
//! ```

pub use crate::config::{LogFormat, ReconcilerConfig, ResourceNames};
pub use crate::keys::{KeyMaterial, KeyPair};
pub use crate::platform::{KubePlatform, Platform, PlatformError, ResourceKind, StoredResource};
pub use crate::reconciler::{
    inspect, reconcile, reconcile_key_material, render_desired_state, AppliedResource,
    DesiredState, InspectReport, ReconcileError, ReconcileReport,
};

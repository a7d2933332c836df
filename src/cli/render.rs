//! # Render Command
//!
//! Prints the objects `apply` would submit. Reads the key files, never the cluster.

use anyhow::Result;
use sshfs_keysync::config::ReconcilerConfig;
use sshfs_keysync::reconciler::{render_desired_state, ReconcileError};

pub fn render_command(config: &ReconcilerConfig) -> Result<()> {
    let names = config.resource_names();
    names.validate().map_err(ReconcileError::from)?;
    let keys = config.key_pair().load().map_err(ReconcileError::from)?;

    let desired = render_desired_state(&keys, &names);
    print!("{}", desired.to_yaml()?);
    Ok(())
}

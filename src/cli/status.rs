//! # Status Command
//!
//! Shows what the cluster holds for the key resources, compared against the local files.

use anyhow::Result;
use sshfs_keysync::config::ReconcilerConfig;
use sshfs_keysync::platform::KubePlatform;
use sshfs_keysync::reconciler::{inspect, InspectReport, ResourceStatus};
use tracing::warn;

/// Print the cluster state; fails when an object is missing or differs from the local files
pub async fn status_command(config: &ReconcilerConfig, context: Option<&str>) -> Result<()> {
    let names = config.resource_names();
    names.validate()?;

    // Without local keys the objects are only checked for existence, which is not "in sync"
    let local = match config.key_pair().load() {
        Ok(keys) => Some(keys),
        Err(e) => {
            warn!("⚠️  {}; skipping content comparison", e);
            None
        }
    };

    let platform = KubePlatform::connect(context).await?;
    let report = inspect(&platform, &names, local.as_ref()).await?;

    print_report(&report);

    if report.is_existence_only() {
        return Err(anyhow::anyhow!(
            "Local key files not found; could not compare the cluster contents in namespace '{}'",
            report.namespace
        ));
    }
    if !report.is_in_sync() {
        return Err(anyhow::anyhow!(
            "SSH key resources in namespace '{}' are missing or out of date. Run 'sshfs-keysync apply' to fix.",
            report.namespace
        ));
    }
    Ok(())
}

fn print_report(report: &InspectReport) {
    if report.namespace_exists {
        println!("✅ Namespace '{}'", report.namespace);
    } else {
        println!("✗ Namespace '{}' does not exist", report.namespace);
    }
    print_resource(&report.secret);
    print_resource(&report.config_map);
    println!();
    if report.is_in_sync() {
        println!("✅ In sync");
    } else if report.is_existence_only() {
        println!("⚠️  Existence only: local key files not found, contents not compared");
    } else {
        println!("✗ Out of sync");
    }
}

fn print_resource(status: &ResourceStatus) {
    if !status.exists {
        println!("✗ {} '{}' not found", status.kind, status.name);
        return;
    }
    let marker = if status.is_in_sync() {
        "✅"
    } else if status.has_unchecked_keys() {
        "⚠️ "
    } else {
        "✗"
    };
    println!(
        "{} {} '{}' (created {})",
        marker,
        status.kind,
        status.name,
        status.creation_timestamp.as_deref().unwrap_or("unknown")
    );
    for (key, state) in &status.keys {
        println!("   {key}: {state}");
    }
}

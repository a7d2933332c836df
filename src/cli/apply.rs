//! # Apply Command
//!
//! Creates or replaces the key Secret and public-key ConfigMap.

use anyhow::Result;
use sshfs_keysync::config::ReconcilerConfig;
use sshfs_keysync::platform::KubePlatform;
use sshfs_keysync::reconciler::{self, ReconcileError, ReconcileReport};

/// Reconcile the local key pair into the cluster and print a summary
pub async fn apply_command(config: &ReconcilerConfig, context: Option<&str>) -> Result<()> {
    let names = config.resource_names();
    let key_pair = config.key_pair();

    // Keys and names are checked before a client is built, so bad input never needs a cluster
    names.validate().map_err(ReconcileError::from)?;
    let keys = key_pair.load().map_err(ReconcileError::from)?;

    let platform = KubePlatform::connect(context).await?;

    println!(
        "🔄 Reconciling SSH keys into namespace '{}'...",
        names.namespace
    );

    match reconciler::reconcile_key_material(&platform, &keys, &names).await {
        Ok(report) => {
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            print_failure(&e);
            Err(e.into())
        }
    }
}

fn print_report(report: &ReconcileReport) {
    println!();
    if report.namespace_created {
        println!("✅ Namespace '{}' created", report.namespace);
    } else {
        println!("✅ Namespace '{}' exists", report.namespace);
    }
    println!(
        "✅ Secret '{}/{}' (created {})",
        report.namespace,
        report.secret_name,
        report.secret_creation_timestamp.as_deref().unwrap_or("unknown")
    );
    println!(
        "✅ ConfigMap '{}/{}' (created {})",
        report.namespace,
        report.config_map_name,
        report
            .config_map_creation_timestamp
            .as_deref()
            .unwrap_or("unknown")
    );
    if let Some(fingerprint) = &report.public_key_fingerprint {
        println!("   Public key: {fingerprint}");
    }
    println!();
    println!("Pods in '{}' can now mount:", report.namespace);
    println!(
        "   Secret '{}' (id_rsa, id_rsa.pub) for the SSH client",
        report.secret_name
    );
    println!(
        "   ConfigMap '{}' (id_rsa.pub) for authorized_keys",
        report.config_map_name
    );
}

fn print_failure(err: &ReconcileError) {
    println!();
    println!("✗ Reconciliation failed");
    if err.is_partial() {
        println!("   Already applied:");
        for resource in err.applied() {
            println!("   ✅ {resource}");
        }
        println!("   Re-run the command to finish; every step is idempotent.");
    }
}

//! # sshfs-keysync CLI
//!
//! Puts the SSH key pair for SSHFS reverse mounts into the cluster.
//!
//! ## Usage
//!
//! ```bash
//! # Create or update the Secret and ConfigMap from ./backend_ssh_key{,.pub}
//! sshfs-keysync
//!
//! # Same, explicitly, against another namespace
//! sshfs-keysync apply --namespace sshfs-test
//!
//! # Print the objects that would be applied
//! sshfs-keysync render
//!
//! # Compare what the cluster holds with the local key files
//! sshfs-keysync status
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use sshfs_keysync::config::{LogFormat, ReconcilerConfig};
use sshfs_keysync::observability;
use std::path::PathBuf;

mod apply;
mod render;
mod status;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BUILD_GIT_HASH"),
    ", built ",
    env!("BUILD_DATETIME"),
    ")"
);

/// Reconcile the SSHFS key Secret and public-key ConfigMap
#[derive(Parser)]
#[command(name = "sshfs-keysync", version, long_version = LONG_VERSION)]
#[command(
    about = "Reconcile the SSHFS key Secret and public-key ConfigMap",
    long_about = None,
    after_help = "\
Defaults can also be set through the environment:
  K8S_NAMESPACE, SSH_KEY_SECRET_NAME, SSH_PUBLIC_KEY_CONFIGMAP_NAME,
  SSH_KEY_DIR, SSH_PRIVATE_KEY_FILE, SSH_PUBLIC_KEY_FILE, LOG_LEVEL, LOG_FORMAT

Examples:
  sshfs-keysync
  sshfs-keysync render > keys.yaml
  sshfs-keysync status --namespace swlabpods
"
)]
struct Cli {
    /// Command to run (defaults to `apply`)
    #[command(subcommand)]
    command: Option<Commands>,

    /// Target namespace (default: swlabpods)
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Kubernetes context to use (defaults to the current context)
    #[arg(long, global = true)]
    context: Option<String>,

    /// Directory containing the key files (default: directory of this executable)
    #[arg(long, global = true, value_name = "DIR")]
    key_dir: Option<PathBuf>,

    /// Secret name (default: backend-ssh-key)
    #[arg(long, global = true)]
    secret_name: Option<String>,

    /// ConfigMap name (default: backend-public-key)
    #[arg(long = "configmap-name", global = true)]
    config_map_name: Option<String>,

    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log format: text or json
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Create or replace the Secret and ConfigMap from the local key files
    Apply,
    /// Print the Secret and ConfigMap that `apply` would submit, as YAML
    Render,
    /// Show what the cluster holds and whether it matches the local key files
    Status,
}

impl Cli {
    /// Environment and defaults, then flags on top
    fn config(&self) -> Result<ReconcilerConfig> {
        let mut config = ReconcilerConfig::from_env();
        if let Some(namespace) = &self.namespace {
            config.namespace.clone_from(namespace);
        }
        if let Some(key_dir) = &self.key_dir {
            config.key_dir.clone_from(key_dir);
        }
        if let Some(secret_name) = &self.secret_name {
            config.secret_name.clone_from(secret_name);
        }
        if let Some(config_map_name) = &self.config_map_name {
            config.config_map_name.clone_from(config_map_name);
        }
        if let Some(log_level) = &self.log_level {
            config.log_level.clone_from(log_level);
        }
        if let Some(log_format) = &self.log_format {
            config.log_format = log_format
                .parse::<LogFormat>()
                .map_err(|e| anyhow::anyhow!(e))?;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Configure rustls crypto provider FIRST, before any other operations
    // Required for rustls 0.23+ when no default provider is set via features
    // We use ring as the crypto provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        return Err(anyhow::anyhow!("Failed to install rustls crypto provider"));
    }

    let cli = Cli::parse();
    let config = cli.config()?;

    observability::init_tracing(&config.log_level, config.log_format)?;

    match cli.command.unwrap_or(Commands::Apply) {
        Commands::Apply => apply::apply_command(&config, cli.context.as_deref()).await,
        Commands::Render => render::render_command(&config),
        Commands::Status => status::status_command(&config, cli.context.as_deref()).await,
    }
}

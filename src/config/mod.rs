//! # Configuration
//!
//! Configuration for a reconciliation run.
//!
//! Values are resolved in three layers: compiled-in defaults from
//! [`crate::constants`], then environment variables, then command-line flags.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `K8S_NAMESPACE` | `namespace` | `swlabpods` |
//! | `SSH_KEY_SECRET_NAME` | `secret_name` | `backend-ssh-key` |
//! | `SSH_PUBLIC_KEY_CONFIGMAP_NAME` | `config_map_name` | `backend-public-key` |
//! | `SSH_KEY_DIR` | `key_dir` | directory of the executable |
//! | `SSH_PRIVATE_KEY_FILE` | `private_key_file` | `backend_ssh_key` |
//! | `SSH_PUBLIC_KEY_FILE` | `public_key_file` | `backend_ssh_key.pub` |
//! | `LOG_LEVEL` | `log_level` | `INFO` |
//! | `LOG_FORMAT` | `log_format` | `text` |

pub mod reconciler;
pub mod validation;

pub use reconciler::{LogFormat, ReconcilerConfig, ResourceNames};
pub use validation::{validate_namespace, validate_resource_name};

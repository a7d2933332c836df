//! # Constants
//!
//! Shared constants used throughout the tool.
//!
//! Names and paths here are defaults; `ReconcilerConfig` can override them
//! from the environment or the command line. Data keys and labels are fixed
//! because the pods that consume the resources mount them by key.

/// Default namespace the backend and frontend pods run in
pub const DEFAULT_NAMESPACE: &str = "swlabpods";

/// Default name of the Secret holding the backend's SSH identity
pub const DEFAULT_SECRET_NAME: &str = "backend-ssh-key";

/// Default name of the ConfigMap holding the authorized public key
pub const DEFAULT_CONFIG_MAP_NAME: &str = "backend-public-key";

/// Key directory used when the executable's own directory cannot be determined
pub const FALLBACK_KEY_DIR: &str = ".";

/// Default private key file name (as written by `ssh-keygen -f backend_ssh_key`)
pub const DEFAULT_PRIVATE_KEY_FILE: &str = "backend_ssh_key";

/// Default public key file name
pub const DEFAULT_PUBLIC_KEY_FILE: &str = "backend_ssh_key.pub";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "INFO";

/// Default log format (`text` or `json`)
pub const DEFAULT_LOG_FORMAT: &str = "text";

/// Data key of the private key in the Secret
pub const PRIVATE_KEY_DATA_KEY: &str = "id_rsa";

/// Data key of the public key in both the Secret and the ConfigMap
pub const PUBLIC_KEY_DATA_KEY: &str = "id_rsa.pub";

/// Secret type used for the SSH identity (`kubectl create secret generic`)
pub const SECRET_TYPE_OPAQUE: &str = "Opaque";

/// Field manager recorded on every object written by this tool
pub const FIELD_MANAGER: &str = "sshfs-keysync";

/// Label marking objects written by this tool
pub const MANAGED_BY_LABEL: &str = "app.kubernetes.io/managed-by";

/// Label value for [`MANAGED_BY_LABEL`]
pub const MANAGED_BY_VALUE: &str = "sshfs-keysync";

/// Maximum length of a namespace (RFC 1123 label)
pub const MAX_NAMESPACE_LEN: usize = 63;

/// Maximum length of a Secret or ConfigMap name (RFC 1123 subdomain)
pub const MAX_RESOURCE_NAME_LEN: usize = 253;

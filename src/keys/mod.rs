//! # SSH Key Material
//!
//! Loads the SSH key pair from local files.
//!
//! Both files are checked before anything talks to the cluster: a missing or
//! unreadable key is a precondition failure, not something a retry would fix.
//! The private key is held in a [`Zeroizing`] buffer and never printed by `Debug`.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use zeroize::Zeroizing;

/// Precondition failures while reading the key pair
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("private key not found or unreadable at '{}': {source}", .path.display())]
    MissingPrivateKey {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("public key not found or unreadable at '{}': {source}", .path.display())]
    MissingPublicKey {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Locations of the private and public key files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
}

impl KeyPair {
    pub fn new(private_key_path: impl Into<PathBuf>, public_key_path: impl Into<PathBuf>) -> Self {
        Self {
            private_key_path: private_key_path.into(),
            public_key_path: public_key_path.into(),
        }
    }

    /// Read both key files
    ///
    /// The private key is checked first, so when both are missing the private key is reported.
    pub fn load(&self) -> Result<KeyMaterial, KeyError> {
        let private_key =
            read_key_file(&self.private_key_path).map_err(|source| KeyError::MissingPrivateKey {
                path: self.private_key_path.clone(),
                source,
            })?;
        let public_key =
            read_key_file(&self.public_key_path).map_err(|source| KeyError::MissingPublicKey {
                path: self.public_key_path.clone(),
                source,
            })?;

        warn_if_private_key_exposed(&self.private_key_path);

        debug!(
            "Loaded key pair: private={} ({} bytes), public={} ({} bytes)",
            self.private_key_path.display(),
            private_key.len(),
            self.public_key_path.display(),
            public_key.len()
        );

        Ok(KeyMaterial {
            private_key: Zeroizing::new(private_key),
            public_key,
        })
    }
}

/// Bytes of a loaded key pair
#[derive(Clone)]
pub struct KeyMaterial {
    pub private_key: Zeroizing<Vec<u8>>,
    pub public_key: Vec<u8>,
}

impl KeyMaterial {
    pub fn new(private_key: impl Into<Vec<u8>>, public_key: impl Into<Vec<u8>>) -> Self {
        Self {
            private_key: Zeroizing::new(private_key.into()),
            public_key: public_key.into(),
        }
    }

    /// OpenSSH fingerprint of the public key, if it parses as one
    pub fn public_key_fingerprint(&self) -> Option<String> {
        std::str::from_utf8(&self.public_key)
            .ok()
            .and_then(fingerprint)
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("private_key", &"***")
            .field("public_key_len", &self.public_key.len())
            .finish()
    }
}

/// Read a key file, rejecting anything that is not a regular file
fn read_key_file(path: &Path) -> io::Result<Vec<u8>> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a regular file",
        ));
    }
    std::fs::read(path)
}

#[cfg(unix)]
fn warn_if_private_key_exposed(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = std::fs::metadata(path) {
        let mode = metadata.permissions().mode();
        if mode & 0o077 != 0 {
            warn!(
                "⚠️  Private key '{}' is accessible by group/other (mode {:o}); consider chmod 600",
                path.display(),
                mode & 0o777
            );
        }
    }
}

#[cfg(not(unix))]
fn warn_if_private_key_exposed(_path: &Path) {}

/// Compute the OpenSSH `SHA256:` fingerprint of a public key line
///
/// Accepts the `<type> <base64> [comment]` format written by `ssh-keygen`. Returns `None`
/// when no token decodes to a key blob whose embedded type matches the preceding token.
pub fn fingerprint(public_key: &str) -> Option<String> {
    let line = public_key
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with('#'))?;
    let tokens: Vec<&str> = line.split_whitespace().collect();

    tokens.windows(2).find_map(|pair| {
        let blob = STANDARD.decode(pair[1]).ok()?;
        (blob_key_type(&blob)? == pair[0]).then(|| {
            let digest = Sha256::digest(&blob);
            format!("SHA256:{}", STANDARD_NO_PAD.encode(digest))
        })
    })
}

/// Key type string embedded at the start of an SSH wire-format key blob
fn blob_key_type(blob: &[u8]) -> Option<&str> {
    let len_bytes: [u8; 4] = blob.get(..4)?.try_into().ok()?;
    let len = usize::try_from(u32::from_be_bytes(len_bytes)).ok()?;
    let key_type = blob.get(4..4 + len)?;
    std::str::from_utf8(key_type).ok()
}

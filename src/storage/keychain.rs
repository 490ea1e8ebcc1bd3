//! Secure-storage lookups behind a capability trait
//!
//! The resolver only sees [`SecretStore`], so the platform backend (macOS
//! Keychain, Windows Credential Manager, Secret Service) can be swapped
//! without touching resolution-order logic.

use keyring::Entry;
use thiserror::Error;

/// Service identifier the Claude CLI stores its OAuth blob under.
pub const CLAUDE_CODE_SERVICE: &str = "Claude Code-credentials";

#[derive(Debug, Error)]
pub enum KeychainError {
    #[error("keychain error: {0}")]
    Backend(#[from] keyring::Error),
}

/// Read-only secure-storage lookup.
pub trait SecretStore: Send + Sync {
    /// Look up the entry stored under `service`. A missing entry is
    /// `Ok(None)`, not an error.
    fn lookup(&self, service: &str) -> Result<Option<Vec<u8>>, KeychainError>;
}

/// [`SecretStore`] backed by the system keyring.
///
/// The keyring API addresses entries by service and account; the CLI writes
/// under the login user, so the account defaults to the current user name.
pub struct SystemKeychain {
    user: String,
}

impl SystemKeychain {
    pub fn new() -> Self {
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "default".to_string());
        Self { user }
    }
}

impl Default for SystemKeychain {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretStore for SystemKeychain {
    fn lookup(&self, service: &str) -> Result<Option<Vec<u8>>, KeychainError> {
        let entry = Entry::new(service, &self.user)?;
        match entry.get_password() {
            Ok(payload) => {
                tracing::debug!(service, "keychain entry found");
                Ok(Some(payload.into_bytes()))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(KeychainError::Backend(e)),
        }
    }
}

//! Platform secure-storage access

pub mod keychain;

pub use keychain::{KeychainError, SecretStore, SystemKeychain, CLAUDE_CODE_SERVICE};

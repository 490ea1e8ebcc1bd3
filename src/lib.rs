//! Claudebar - Claude usage quota tracking core
//!
//! Resolves the Claude CLI OAuth token from local credential files or the
//! system keychain, fetches the OAuth usage endpoint, and normalizes the
//! evolving response shapes into a stable [`UsageSnapshot`]. Presentation
//! (tray icons, progress bars, notifications) lives outside this crate and
//! consumes [`UsageState`] through [`UsageService::subscribe`].

pub mod credentials;
pub mod error;
pub mod service;
pub mod storage;
pub mod usage;

pub use credentials::{Credential, CredentialResolver};
pub use error::UsageError;
pub use service::{UsageService, UsageState};
pub use usage::{AuxiliaryQuota, RateWindow, UsageClient, UsageSnapshot};

//! Credential resolution for the Claude CLI OAuth token
//!
//! The `claude` CLI writes its OAuth credentials either to a JSON file under
//! the user's home directory or to the platform keychain. Files are tried
//! first: a keychain read can raise an authorization prompt, so a file hit
//! avoids that friction entirely.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::UsageError;
use crate::storage::{SecretStore, CLAUDE_CODE_SERVICE};

/// Bearer token for the usage API. Held only for the duration of a request,
/// never persisted.
#[derive(Clone)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsFile {
    claude_ai_oauth: Option<OauthSection>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OauthSection {
    access_token: Option<String>,
}

/// Locates an access token across an ordered list of credential files, with
/// one secure-storage lookup as the fallback.
pub struct CredentialResolver {
    candidates: Vec<PathBuf>,
    store: Box<dyn SecretStore>,
    service: String,
}

impl CredentialResolver {
    /// Resolver over the standard candidate paths and the given store.
    pub fn new(store: Box<dyn SecretStore>) -> Self {
        Self {
            candidates: default_candidate_paths(),
            store,
            service: CLAUDE_CODE_SERVICE.to_string(),
        }
    }

    /// Resolver with explicit candidate paths and service name.
    pub fn with_candidates(
        candidates: Vec<PathBuf>,
        store: Box<dyn SecretStore>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            candidates,
            store,
            service: service.into(),
        }
    }

    /// Locate an access token. The first existing, parseable, field-complete
    /// file wins; file misses fall through silently. `CredentialNotFound` is
    /// the normal unauthenticated outcome, not a fault.
    pub fn resolve(&self) -> Result<Credential, UsageError> {
        for path in &self.candidates {
            let Ok(bytes) = std::fs::read(path) else {
                continue;
            };
            if let Some(token) = extract_access_token(&bytes) {
                tracing::debug!(path = %path.display(), "resolved credential from file");
                return Ok(Credential { token });
            }
        }

        // Exactly one keychain attempt; the entry holds the same JSON shape
        // as the files, stored as a UTF-8 blob.
        match self.store.lookup(&self.service) {
            Ok(Some(bytes)) => {
                if let Some(token) = extract_access_token(&bytes) {
                    tracing::debug!("resolved credential from keychain");
                    return Ok(Credential { token });
                }
            }
            Ok(None) => {}
            Err(e) => {
                tracing::debug!("keychain lookup failed: {e}");
            }
        }

        Err(UsageError::CredentialNotFound)
    }
}

/// Pull `claudeAiOauth.accessToken` out of a credential blob.
fn extract_access_token(bytes: &[u8]) -> Option<String> {
    let file: CredentialsFile = serde_json::from_slice(bytes).ok()?;
    file.claude_ai_oauth?
        .access_token
        .filter(|token| !token.is_empty())
}

fn default_candidate_paths() -> Vec<PathBuf> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    vec![
        home.join(".claude.json"),
        home.join(".claude").join("credentials.json"),
        home.join(".config").join("claude").join("credentials.json"),
    ]
}

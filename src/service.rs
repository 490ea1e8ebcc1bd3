//! Single-in-flight fetch coordination and observable usage state

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::watch;

use crate::credentials::CredentialResolver;
use crate::error::UsageError;
use crate::usage::{UsageFetcher, UsageSnapshot};

/// What the presentation layer observes: nothing yet, the latest snapshot,
/// or the error that replaced it.
#[derive(Debug, Clone)]
pub enum UsageState {
    Idle,
    Ready(UsageSnapshot),
    Failed(UsageError),
}

impl UsageState {
    pub fn snapshot(&self) -> Option<&UsageSnapshot> {
        match self {
            UsageState::Ready(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// Runs at most one fetch cycle at a time and publishes the outcome as a
/// single replacement value.
pub struct UsageService {
    resolver: CredentialResolver,
    fetcher: Box<dyn UsageFetcher>,
    state: watch::Sender<UsageState>,
    busy: AtomicBool,
}

impl UsageService {
    pub fn new(resolver: CredentialResolver, fetcher: Box<dyn UsageFetcher>) -> Self {
        let (state, _) = watch::channel(UsageState::Idle);
        Self {
            resolver,
            fetcher,
            state,
            busy: AtomicBool::new(false),
        }
    }

    /// Observe state changes. Each completed fetch publishes exactly one
    /// replacement value, so readers never see a half-updated snapshot.
    pub fn subscribe(&self) -> watch::Receiver<UsageState> {
        self.state.subscribe()
    }

    pub fn current(&self) -> UsageState {
        self.state.borrow().clone()
    }

    /// Run one fetch cycle. Returns `false` when a fetch is already in
    /// flight: triggers are neither queued nor do they cancel the running
    /// fetch. Errors replace the previous snapshot; there is no retry.
    pub async fn refresh(&self) -> bool {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::debug!("refresh already in flight, ignoring trigger");
            return false;
        }

        let next = match self.fetch_once().await {
            Ok(snapshot) => UsageState::Ready(snapshot),
            Err(error) => {
                tracing::warn!("usage fetch failed: {error}");
                UsageState::Failed(error)
            }
        };
        self.state.send_replace(next);
        self.busy.store(false, Ordering::Release);
        true
    }

    async fn fetch_once(&self) -> Result<UsageSnapshot, UsageError> {
        let credential = self.resolver.resolve()?;
        self.fetcher.fetch(&credential).await
    }
}

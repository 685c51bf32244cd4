//! Profile lookup: the network collaborator and the tri-state fetcher.
//!
//! [`ProfileFetcher::fetch`] moves its view through
//! `Loading -> Loaded | Failed`. Network faults stop here: they become a
//! `Failed(message)` value and never propagate further.
//!
//! Overlapping fetches are not cancelled or sequenced. Each invocation writes
//! its own outcome to the shared view when it completes, so with two fetches
//! in flight the view ends on whichever completed last, which may be the
//! older request.

pub mod http;

pub use http::HttpProfileSource;

use crate::model::{Profile, ProfileView};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Shown when a fault carries no description of its own.
pub const FALLBACK_FAILURE_MESSAGE: &str = "failed to load user";

/// A network fault while fetching a profile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("HTTP {status} {reason} from {url}")]
    Status {
        url: String,
        status: u16,
        reason: String,
    },
    #[error("failed to decode profile response: {0}")]
    Decode(String),
    #[error("{0}")]
    Transport(String),
}

/// The external lookup `fetch_profile(handle) -> Profile`.
#[async_trait]
pub trait ProfileSource: Send + Sync {
    /// Fetch the public profile for `handle`.
    ///
    /// # Errors
    ///
    /// Returns a [`FetchError`] for transport, timeout, non-2xx and decode faults.
    async fn fetch_profile(&self, handle: &str) -> Result<Profile, FetchError>;
}

/// Human-readable text for a failed fetch.
#[must_use]
pub fn failure_message(error: &FetchError) -> String {
    let message = error.to_string();
    if message.trim().is_empty() {
        FALLBACK_FAILURE_MESSAGE.to_string()
    } else {
        message
    }
}

/// Runs profile lookups and publishes their outcome as a [`ProfileView`].
///
/// Clones share one view sink.
#[derive(Clone)]
pub struct ProfileFetcher {
    source: Arc<dyn ProfileSource>,
    view: Arc<watch::Sender<ProfileView>>,
}

impl ProfileFetcher {
    #[must_use]
    pub fn new(source: Arc<dyn ProfileSource>) -> Self {
        let (view, _) = watch::channel(ProfileView::Loading);
        Self {
            source,
            view: Arc::new(view),
        }
    }

    /// Observe the view. The receiver starts at the current value.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProfileView> {
        self.view.subscribe()
    }

    #[must_use]
    pub fn current(&self) -> ProfileView {
        self.view.borrow().clone()
    }

    /// Look up `handle`, publishing `Loading` first and the outcome last.
    ///
    /// Returns the outcome this invocation published.
    pub async fn fetch(&self, handle: &str) -> ProfileView {
        self.view.send_replace(ProfileView::Loading);

        let outcome = match self.source.fetch_profile(handle).await {
            Ok(profile) => {
                info!(handle, "profile loaded");
                ProfileView::Loaded(profile)
            }
            Err(error) => {
                warn!(handle, error = %error, "profile fetch failed");
                ProfileView::Failed(failure_message(&error))
            }
        };

        self.view.send_replace(outcome.clone());
        outcome
    }
}

impl std::fmt::Debug for ProfileFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileFetcher")
            .field("view", &*self.view.borrow())
            .finish_non_exhaustive()
    }
}

//! The application context: built once at startup and passed by reference.
//!
//! It owns the one [`TaskStore`] handle and the one network collaborator.
//! Nothing in the crate reaches for global state; screens and commands get
//! what they need from here.

use crate::config::AppConfig;
use crate::profile::{HttpProfileSource, ProfileFetcher, ProfileSource};
use crate::service::TaskService;
use crate::store::TaskStore;
use crate::view::{ProfileModel, TaskListModel};
use anyhow::Result;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct AppContext {
    config: AppConfig,
    store: TaskStore,
    profile_source: Arc<dyn ProfileSource>,
}

impl AppContext {
    /// Open the configured database and build the HTTP profile source.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open(config: AppConfig) -> Result<Self> {
        let store = TaskStore::open(&config.database_path())?;
        let profile_source = Arc::new(HttpProfileSource::new(&config.profile));
        info!(base_url = %config.profile.base_url, "application context ready");
        Ok(Self::from_parts(config, store, profile_source))
    }

    /// Assemble a context from already-built collaborators.
    #[must_use]
    pub fn from_parts(
        config: AppConfig,
        store: TaskStore,
        profile_source: Arc<dyn ProfileSource>,
    ) -> Self {
        Self {
            config,
            store,
            profile_source,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AppConfig {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &TaskStore {
        &self.store
    }

    #[must_use]
    pub fn task_service(&self) -> TaskService {
        TaskService::new(self.store.clone())
    }

    /// A fetcher with its own view sink.
    #[must_use]
    pub fn profile_fetcher(&self) -> ProfileFetcher {
        ProfileFetcher::new(Arc::clone(&self.profile_source))
    }

    /// Handle used by the profile screen when none is given.
    #[must_use]
    pub fn default_handle(&self) -> &str {
        &self.config.profile.handle
    }

    /// State for a freshly mounted task-list screen. Requires a tokio runtime.
    #[must_use]
    pub fn task_list_model(&self) -> TaskListModel {
        TaskListModel::new(self.task_service())
    }

    /// State for a freshly mounted profile screen; starts fetching `handle`.
    /// Requires a tokio runtime.
    #[must_use]
    pub fn profile_model(&self, handle: &str) -> ProfileModel {
        ProfileModel::mount(Arc::clone(&self.profile_source), handle)
    }
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("config", &self.config)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

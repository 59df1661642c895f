use std::sync::Arc;

use quiz_core::model::UserId;
use storage::{LocalState, Storage};
use tracing::warn;

use crate::Clock;
use crate::error::AppServicesError;
use crate::identity::IdentityProvider;
use crate::remote::RemoteStore;
use crate::sync::{MistakeSyncManager, SyncConfig};
use crate::visit_service::{DailyVisitOutcome, VisitLogger};

/// Assembles the services a quiz session depends on.
///
/// Building the bundle starts the mistake sync manager, which drains any
/// records left queued by a previous run.
#[derive(Clone)]
pub struct QuizServices {
    clock: Clock,
    storage: Storage,
    remote: Arc<dyn RemoteStore>,
    identity: Arc<dyn IdentityProvider>,
    sync: MistakeSyncManager,
    visits: Arc<VisitLogger>,
}

impl QuizServices {
    /// Build services over an existing storage backend.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the persisted mistake queue cannot be read.
    pub async fn new(
        storage: Storage,
        remote: Arc<dyn RemoteStore>,
        identity: Arc<dyn IdentityProvider>,
        clock: Clock,
        sync_config: SyncConfig,
    ) -> Result<Self, AppServicesError> {
        let sync =
            MistakeSyncManager::start(storage.local_state(), Arc::clone(&remote), sync_config)
                .await?;
        let visits = Arc::new(VisitLogger::new(
            clock,
            storage.local_state(),
            Arc::clone(&remote),
        ));

        Ok(Self {
            clock,
            storage,
            remote,
            identity,
            sync,
            visits,
        })
    }

    /// Build services backed by `SQLite` storage, with sync tuning from the environment.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        remote: Arc<dyn RemoteStore>,
        identity: Arc<dyn IdentityProvider>,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Self::new(storage, remote, identity, clock, SyncConfig::from_env()).await
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    #[must_use]
    pub fn local_state(&self) -> LocalState {
        self.storage.local_state()
    }

    #[must_use]
    pub fn remote(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.remote)
    }

    #[must_use]
    pub fn identity(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(&self.identity)
    }

    #[must_use]
    pub fn sync(&self) -> MistakeSyncManager {
        self.sync.clone()
    }

    #[must_use]
    pub fn visits(&self) -> Arc<VisitLogger> {
        Arc::clone(&self.visits)
    }

    /// The signed-in user, treating provider failures as anonymous.
    pub async fn current_user(&self) -> Option<UserId> {
        match self.identity.current_user().await {
            Ok(user) => user,
            Err(err) => {
                warn!(error = %err, "identity lookup failed");
                None
            }
        }
    }

    /// Log today's visit for the signed-in user, if any.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the local visit marker cannot be accessed.
    pub async fn log_daily_visit(&self) -> Result<Option<DailyVisitOutcome>, AppServicesError> {
        let Some(user) = self.current_user().await else {
            return Ok(None);
        };
        Ok(Some(self.visits.log_daily_visit(&user).await?))
    }

    /// Total mistakes the remote store holds for the signed-in user.
    ///
    /// `None` when anonymous or when the remote store cannot be reached.
    pub async fn mistake_count(&self) -> Option<u64> {
        let user = self.current_user().await?;
        match self.remote.count_mistakes(&user).await {
            Ok(count) => Some(count),
            Err(err) => {
                warn!(user = %user, error = %err, "mistake count unavailable");
                None
            }
        }
    }

    /// Stop background work. Queued mistakes stay persisted for the next run.
    pub fn shutdown(&self) {
        self.sync.shutdown();
    }
}

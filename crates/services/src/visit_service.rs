use std::sync::Arc;

use quiz_core::Clock;
use quiz_core::model::{DailyVisit, PageVisit, UserId};
use storage::LocalState;
use storage::repository::StorageError;
use tracing::{debug, warn};

use crate::error::RemoteError;
use crate::remote::RemoteStore;

/// What `log_daily_visit` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyVisitOutcome {
    /// The local marker already shows today; no remote call was made.
    AlreadyLogged,
    /// The remote store now has today's row (new or pre-existing).
    Logged,
    /// The remote call failed; the next session will try again.
    Deferred,
}

/// Best-effort visit logging.
#[derive(Clone)]
pub struct VisitLogger {
    clock: Clock,
    local: LocalState,
    remote: Arc<dyn RemoteStore>,
}

impl VisitLogger {
    #[must_use]
    pub fn new(clock: Clock, local: LocalState, remote: Arc<dyn RemoteStore>) -> Self {
        Self {
            clock,
            local,
            remote,
        }
    }

    /// Record today's visit for `user` at most once per day.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only for local marker failures; remote failures
    /// yield `DailyVisitOutcome::Deferred`.
    pub async fn log_daily_visit(&self, user: &UserId) -> Result<DailyVisitOutcome, StorageError> {
        let today = self.clock.today();
        let mut marker = self.local.load_visit_marker().await?;
        if marker.logged_on(user, today) {
            return Ok(DailyVisitOutcome::AlreadyLogged);
        }

        let visit = DailyVisit {
            user_id: user.clone(),
            visit_date: today,
        };
        match self.remote.insert_daily_visit(&visit).await {
            Ok(()) | Err(RemoteError::AlreadyExists) => {
                marker.mark(user.clone(), today);
                self.local.save_visit_marker(&marker).await?;
                debug!(%user, %today, "daily visit logged");
                Ok(DailyVisitOutcome::Logged)
            }
            Err(err) => {
                warn!(%user, error = %err, "daily visit log failed");
                Ok(DailyVisitOutcome::Deferred)
            }
        }
    }

    /// Record a page view. Failures are logged and swallowed.
    pub async fn log_page_visit(&self, user: Option<&UserId>, page: &str) -> bool {
        let visit = PageVisit {
            user_id: user.cloned(),
            page: page.to_owned(),
            visited_at: self.clock.now(),
        };
        match self.remote.insert_page_visit(&visit).await {
            Ok(()) => true,
            Err(err) => {
                warn!(page, error = %err, "page visit log failed");
                false
            }
        }
    }
}

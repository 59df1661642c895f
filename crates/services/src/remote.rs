//! Remote store contract and an in-memory implementation for tests and offline use.

use std::collections::{BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use quiz_core::model::{DailyVisit, MistakeRecord, PageVisit, QuestionIndex, UserId};

use crate::error::RemoteError;

/// Write (and minimal read) surface of the durable remote store.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Bulk-insert a batch of mistakes. Either all are accepted or none.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` on any transport or server failure.
    async fn insert_mistakes(&self, batch: &[MistakeRecord]) -> Result<(), RemoteError>;

    /// Insert the once-per-day visit row.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::AlreadyExists` if the row for that user and day exists.
    async fn insert_daily_visit(&self, visit: &DailyVisit) -> Result<(), RemoteError>;

    /// Insert a page-visit row.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` on any transport or server failure.
    async fn insert_page_visit(&self, visit: &PageVisit) -> Result<(), RemoteError>;

    /// Distinct question indices the user has mistake records for.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` on any transport or server failure.
    async fn mistake_indices(&self, user: &UserId) -> Result<BTreeSet<QuestionIndex>, RemoteError>;

    /// Total number of mistake records stored for the user.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError` on any transport or server failure.
    async fn count_mistakes(&self, user: &UserId) -> Result<u64, RemoteError>;
}

#[derive(Default)]
struct Tables {
    mistakes: Vec<MistakeRecord>,
    daily_visits: HashSet<(UserId, NaiveDate)>,
    page_visits: Vec<PageVisit>,
}

/// In-memory remote store with failure injection and simulated latency.
#[derive(Clone, Default)]
pub struct InMemoryRemoteStore {
    tables: Arc<Mutex<Tables>>,
    failing: Arc<AtomicBool>,
    latency: Option<Duration>,
    mistake_calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl InMemoryRemoteStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `latency` before answering.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// While failing, every call returns `RemoteError::Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of bulk mistake inserts attempted, successful or not.
    #[must_use]
    pub fn mistake_calls(&self) -> usize {
        self.mistake_calls.load(Ordering::SeqCst)
    }

    /// Highest number of concurrent bulk mistake inserts observed.
    #[must_use]
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn mistakes(&self) -> Vec<MistakeRecord> {
        self.with_tables(|t| t.mistakes.clone())
    }

    #[must_use]
    pub fn daily_visit_count(&self) -> usize {
        self.with_tables(|t| t.daily_visits.len())
    }

    #[must_use]
    pub fn page_visits(&self) -> Vec<PageVisit> {
        self.with_tables(|t| t.page_visits.clone())
    }

    fn with_tables<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut guard = self
            .tables
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        f(&mut guard)
    }

    async fn round_trip(&self) -> Result<(), RemoteError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(RemoteError::Unavailable("simulated outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for InMemoryRemoteStore {
    async fn insert_mistakes(&self, batch: &[MistakeRecord]) -> Result<(), RemoteError> {
        self.mistake_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let result = self.round_trip().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result?;

        self.with_tables(|t| t.mistakes.extend_from_slice(batch));
        Ok(())
    }

    async fn insert_daily_visit(&self, visit: &DailyVisit) -> Result<(), RemoteError> {
        self.round_trip().await?;
        let inserted =
            self.with_tables(|t| t.daily_visits.insert((visit.user_id.clone(), visit.visit_date)));
        if inserted {
            Ok(())
        } else {
            Err(RemoteError::AlreadyExists)
        }
    }

    async fn insert_page_visit(&self, visit: &PageVisit) -> Result<(), RemoteError> {
        self.round_trip().await?;
        self.with_tables(|t| t.page_visits.push(visit.clone()));
        Ok(())
    }

    async fn mistake_indices(&self, user: &UserId) -> Result<BTreeSet<QuestionIndex>, RemoteError> {
        self.round_trip().await?;
        Ok(self.with_tables(|t| {
            t.mistakes
                .iter()
                .filter(|m| &m.user_id == user)
                .map(|m| m.question_index)
                .collect()
        }))
    }

    async fn count_mistakes(&self, user: &UserId) -> Result<u64, RemoteError> {
        self.round_trip().await?;
        let count = self.with_tables(|t| t.mistakes.iter().filter(|m| &m.user_id == user).count());
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

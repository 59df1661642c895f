use quiz_core::model::{ExclusionSet, QuestionIndex};
use storage::LocalState;
use storage::repository::StorageError;
use tracing::info;

/// Questions removed from the default rotation, persisted on every change.
#[derive(Clone)]
pub struct ExclusionLedger {
    local: LocalState,
    set: ExclusionSet,
}

impl ExclusionLedger {
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub async fn load(local: LocalState) -> Result<Self, StorageError> {
        let set = local.load_exclusions().await?;
        Ok(Self { local, set })
    }

    #[must_use]
    pub fn set(&self) -> &ExclusionSet {
        &self.set
    }

    #[must_use]
    pub fn is_excluded(&self, index: QuestionIndex) -> bool {
        self.set.contains(index)
    }

    /// Excluded indices, ascending.
    #[must_use]
    pub fn excluded(&self) -> Vec<QuestionIndex> {
        self.set.iter().collect()
    }

    /// Remove `index` from rotation. Returns false if it was already excluded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be written.
    pub async fn exclude(&mut self, index: QuestionIndex) -> Result<bool, StorageError> {
        if !self.set.insert(index) {
            return Ok(false);
        }
        info!(%index, "question excluded");
        self.local.save_exclusions(&self.set).await?;
        Ok(true)
    }

    /// Put `index` back into rotation. Returns false if it was not excluded.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be written.
    pub async fn restore(&mut self, index: QuestionIndex) -> Result<bool, StorageError> {
        if !self.set.remove(index) {
            return Ok(false);
        }
        info!(%index, "question restored");
        self.local.save_exclusions(&self.set).await?;
        Ok(true)
    }

    /// Clear every exclusion after `confirm` approves it.
    ///
    /// `confirm` receives the number of excluded questions. Returns whether
    /// anything was cleared.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the list cannot be written.
    pub async fn restore_all(
        &mut self,
        confirm: impl FnOnce(usize) -> bool,
    ) -> Result<bool, StorageError> {
        if self.set.is_empty() || !confirm(self.set.len()) {
            return Ok(false);
        }
        let count = self.set.len();
        self.set.clear();
        self.local.save_exclusions(&self.set).await?;
        info!(count, "all questions restored");
        Ok(true)
    }
}

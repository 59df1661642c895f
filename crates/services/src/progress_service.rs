use quiz_core::model::{ProgressState, QuestionIndex, SelectionRecord};
use storage::LocalState;
use storage::repository::StorageError;

/// Owns the session's progress state and writes it through on every change.
#[derive(Clone)]
pub struct ProgressStore {
    local: LocalState,
    state: ProgressState,
}

impl ProgressStore {
    /// Restore progress from local persistence (empty if nothing was saved).
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    pub async fn load(local: LocalState) -> Result<Self, StorageError> {
        let state = local.load_progress().await?;
        Ok(Self { local, state })
    }

    #[must_use]
    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    #[must_use]
    pub fn record(&self, index: QuestionIndex) -> SelectionRecord {
        self.state.record(index)
    }

    /// Replace the record for `index` and persist the progress map.
    ///
    /// The in-memory state is updated even if the write fails.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the progress cannot be written.
    pub async fn put(
        &mut self,
        index: QuestionIndex,
        record: SelectionRecord,
    ) -> Result<(), StorageError> {
        if self.state.records().get(&index) == Some(&record) {
            return Ok(());
        }
        self.state = std::mem::take(&mut self.state).with_record(index, record);
        self.local.save_progress(&self.state).await
    }

    /// Move the persisted cursor.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the index cannot be written.
    pub async fn set_current(&mut self, index: QuestionIndex) -> Result<(), StorageError> {
        self.state = std::mem::take(&mut self.state).with_current(index);
        self.local.save_current_index(index).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::Question;
    use storage::Storage;

    #[tokio::test]
    async fn changes_survive_reload() {
        let storage = Storage::in_memory();
        let mut store = ProgressStore::load(storage.local_state()).await.unwrap();

        let q = Question::new("Q", vec!["A. a".into(), "B. b".into()], "B");
        let (answered, _) = SelectionRecord::new()
            .with_click(&q, 1)
            .unwrap()
            .submit(&q)
            .unwrap();
        store.put(QuestionIndex::new(2), answered.clone()).await.unwrap();
        store.set_current(QuestionIndex::new(2)).await.unwrap();

        let reloaded = ProgressStore::load(storage.local_state()).await.unwrap();
        assert_eq!(reloaded.record(QuestionIndex::new(2)), answered);
        assert_eq!(reloaded.state().current(), QuestionIndex::new(2));
    }
}

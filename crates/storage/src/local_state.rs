//! Typed access to the quiz's local persistence keys.
//!
//! Values are JSON. A missing or malformed value never fails a load: it is
//! logged and replaced by the empty default for that key.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use quiz_core::model::{
    ExclusionSet, MistakeRecord, ProgressState, QuestionIndex, SelectionRecord, VisitMarker,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::keys;
use crate::repository::{KeyValueStore, StorageError};

/// Persisted shape of a selection record, in the bank's camelCase format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEntry {
    pub selected_indices: Vec<usize>,
    pub is_answered: bool,
    pub is_correct: Option<bool>,
}

impl SelectionEntry {
    #[must_use]
    pub fn from_record(record: &SelectionRecord) -> Self {
        Self {
            selected_indices: record.selected().iter().copied().collect(),
            is_answered: record.is_answered(),
            is_correct: record.is_correct(),
        }
    }

    /// Convert back into a domain record, enforcing the answered/correct invariant.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the entry is inconsistent.
    pub fn into_record(self) -> Result<SelectionRecord, StorageError> {
        SelectionRecord::from_persisted(
            self.selected_indices.into_iter().collect::<BTreeSet<_>>(),
            self.is_answered,
            self.is_correct,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[derive(Clone)]
pub struct LocalState {
    kv: Arc<dyn KeyValueStore>,
}

impl LocalState {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    async fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, StorageError> {
        let Some(raw) = self.kv.get(key).await? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(err) => {
                warn!(key, error = %err, "discarding malformed persisted value");
                Ok(T::default())
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<(), StorageError> {
        let raw =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.kv.set(key, &raw).await
    }

    /// Restore the progress map and current index.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    pub async fn load_progress(&self) -> Result<ProgressState, StorageError> {
        let current: usize = self.read_json(keys::CURRENT_INDEX).await?;
        let entries: BTreeMap<String, SelectionEntry> =
            self.read_json(keys::USER_SELECTIONS).await?;

        let mut records = BTreeMap::new();
        for (raw_index, entry) in entries {
            let index = match raw_index.parse::<QuestionIndex>() {
                Ok(index) => index,
                Err(err) => {
                    warn!(
                        raw_index = %raw_index,
                        error = %err,
                        "skipping selection with invalid index"
                    );
                    continue;
                }
            };
            match entry.into_record() {
                Ok(record) => {
                    records.insert(index, record);
                }
                Err(err) => warn!(%index, error = %err, "skipping inconsistent selection"),
            }
        }

        Ok(ProgressState::from_parts(
            records,
            QuestionIndex::new(current),
        ))
    }

    /// Persist every selection record and the current index.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if either key cannot be written.
    pub async fn save_progress(&self, progress: &ProgressState) -> Result<(), StorageError> {
        let entries: BTreeMap<String, SelectionEntry> = progress
            .records()
            .iter()
            .map(|(index, record)| (index.to_string(), SelectionEntry::from_record(record)))
            .collect();
        self.write_json(keys::USER_SELECTIONS, &entries).await?;
        self.save_current_index(progress.current()).await
    }

    /// Persist only the cursor position.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the key cannot be written.
    pub async fn save_current_index(&self, index: QuestionIndex) -> Result<(), StorageError> {
        self.write_json(keys::CURRENT_INDEX, &index.value()).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    pub async fn load_exclusions(&self) -> Result<ExclusionSet, StorageError> {
        let indices: Vec<usize> = self.read_json(keys::EXCLUDED_INDICES).await?;
        Ok(indices.into_iter().map(QuestionIndex::new).collect())
    }

    /// Persist the exclusion list in ascending order; an empty set removes the key.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the key cannot be written.
    pub async fn save_exclusions(&self, exclusions: &ExclusionSet) -> Result<(), StorageError> {
        if exclusions.is_empty() {
            return self.kv.remove(keys::EXCLUDED_INDICES).await;
        }
        let indices: Vec<usize> = exclusions.iter().map(|i| i.value()).collect();
        self.write_json(keys::EXCLUDED_INDICES, &indices).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    pub async fn load_mistake_queue(&self) -> Result<Vec<MistakeRecord>, StorageError> {
        self.read_json(keys::MISTAKE_QUEUE).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the key cannot be written.
    pub async fn save_mistake_queue(&self, queue: &[MistakeRecord]) -> Result<(), StorageError> {
        self.write_json(keys::MISTAKE_QUEUE, queue).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    pub async fn load_visit_marker(&self) -> Result<VisitMarker, StorageError> {
        self.read_json(keys::DAILY_VISIT_MARKER).await
    }

    /// # Errors
    ///
    /// Returns `StorageError` if the key cannot be written.
    pub async fn save_visit_marker(&self, marker: &VisitMarker) -> Result<(), StorageError> {
        self.write_json(keys::DAILY_VISIT_MARKER, marker).await
    }
}

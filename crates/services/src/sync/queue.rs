use quiz_core::model::MistakeRecord;
use storage::LocalState;
use tokio::sync::Mutex;

use crate::error::SyncError;

/// Persisted FIFO of mistake records awaiting delivery.
///
/// Every operation is a read-modify-write of one storage key, serialized by
/// an internal lock so a timer-driven flush cannot interleave with an enqueue.
pub struct MistakeQueue {
    local: LocalState,
    lock: Mutex<()>,
}

impl MistakeQueue {
    #[must_use]
    pub fn new(local: LocalState) -> Self {
        Self {
            local,
            lock: Mutex::new(()),
        }
    }

    /// Append a record and return the new queue length.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the queue cannot be written.
    pub async fn push(&self, record: MistakeRecord) -> Result<usize, SyncError> {
        let _guard = self.lock.lock().await;
        let mut queue = self.local.load_mistake_queue().await?;
        queue.push(record);
        self.local.save_mistake_queue(&queue).await?;
        Ok(queue.len())
    }

    /// Current contents, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the backend cannot be read.
    pub async fn snapshot(&self) -> Result<Vec<MistakeRecord>, SyncError> {
        let _guard = self.lock.lock().await;
        Ok(self.local.load_mistake_queue().await?)
    }

    /// Remove records that were accepted remotely and return how many remain.
    ///
    /// Matching is by value, one queued record per delivered record, so
    /// records appended while the batch was in flight are kept.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Storage` if the queue cannot be written.
    pub async fn remove_delivered(&self, delivered: &[MistakeRecord]) -> Result<usize, SyncError> {
        let _guard = self.lock.lock().await;
        let mut queue = self.local.load_mistake_queue().await?;
        for record in delivered {
            if let Some(pos) = queue.iter().position(|queued| queued == record) {
                queue.remove(pos);
            }
        }
        self.local.save_mistake_queue(&queue).await?;
        Ok(queue.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{Question, QuestionIndex, SelectionRecord, UserId};
    use quiz_core::time::fixed_now;
    use storage::Storage;

    fn mistake(index: usize) -> MistakeRecord {
        let q = Question::new(format!("Q{index}"), vec!["A. a".into(), "B. b".into()], "A");
        let record = SelectionRecord::new().with_click(&q, 1).unwrap();
        MistakeRecord::from_submission(
            UserId::new("u1"),
            QuestionIndex::new(index),
            &q,
            &record,
            fixed_now(),
        )
    }

    #[tokio::test]
    async fn remove_delivered_keeps_late_arrivals() {
        let queue = MistakeQueue::new(Storage::in_memory().local_state());
        queue.push(mistake(0)).await.unwrap();
        queue.push(mistake(1)).await.unwrap();
        let in_flight = queue.snapshot().await.unwrap();

        queue.push(mistake(2)).await.unwrap();
        let remaining = queue.remove_delivered(&in_flight).await.unwrap();

        assert_eq!(remaining, 1);
        assert_eq!(queue.snapshot().await.unwrap(), vec![mistake(2)]);
    }

    #[tokio::test]
    async fn queue_survives_a_new_handle() {
        let storage = Storage::in_memory();
        let first = MistakeQueue::new(storage.local_state());
        first.push(mistake(3)).await.unwrap();

        let second = MistakeQueue::new(storage.local_state());
        assert_eq!(second.snapshot().await.unwrap(), vec![mistake(3)]);
    }
}

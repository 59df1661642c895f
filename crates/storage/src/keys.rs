//! Local persistence keys. Each key is written independently and overwritten whole.

pub const CURRENT_INDEX: &str = "quiz_currentIndex";
pub const USER_SELECTIONS: &str = "quiz_userSelections";
pub const EXCLUDED_INDICES: &str = "quiz_excludedIndices";
pub const MISTAKE_QUEUE: &str = "mistake_queue";
pub const DAILY_VISIT_MARKER: &str = "daily_visit_marker";

mod exclusion;
mod ids;
mod mistake;
mod progress;
mod question;
mod selection;
mod visit;

pub use ids::{ParseIdError, QuestionIndex, UserId};

pub use exclusion::ExclusionSet;
pub use mistake::{MistakeRecord, SNIPPET_CHARS};
pub use progress::{ProgressCounts, ProgressState};
pub use question::{Question, QuestionBank, QuestionBankError, SelectionMode};
pub use selection::{AnswerError, SelectionRecord, SubmitOutcome};
pub use visit::{DailyVisit, PageVisit, VisitMarker};

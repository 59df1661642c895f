#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod exclusion_service;
pub mod identity;
pub mod progress_service;
pub mod remote;
pub mod rest_remote;
pub mod sessions;
pub mod sync;
pub mod visit_service;

pub use quiz_core::Clock;

pub use app_services::QuizServices;
pub use error::{AppServicesError, IdentityError, QuizSessionError, RemoteError, SyncError};
pub use exclusion_service::ExclusionLedger;
pub use identity::{IdentityProvider, LocalIdentity};
pub use progress_service::ProgressStore;
pub use remote::{InMemoryRemoteStore, RemoteStore};
pub use rest_remote::{RemoteConfig, RestRemoteStore};
pub use sessions::{
    QuizSession, SessionEvent, SessionMode, SessionObserver, SessionSnapshot, SessionStatus,
};
pub use sync::{FlushOutcome, MistakeSyncManager, SyncConfig};
pub use visit_service::{DailyVisitOutcome, VisitLogger};

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::UserId;

/// Once-per-day visit row; the remote store keeps it unique per user and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyVisit {
    pub user_id: UserId,
    pub visit_date: NaiveDate,
}

/// Best-effort page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVisit {
    pub user_id: Option<UserId>,
    pub page: String,
    pub visited_at: DateTime<Utc>,
}

/// Local memo of the last day a visit was logged for each user.
///
/// Only suppresses duplicate writes; the remote uniqueness constraint is authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitMarker {
    last_logged: BTreeMap<UserId, NaiveDate>,
}

impl VisitMarker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn logged_on(&self, user: &UserId, date: NaiveDate) -> bool {
        self.last_logged.get(user) == Some(&date)
    }

    pub fn mark(&mut self, user: UserId, date: NaiveDate) {
        self.last_logged.insert(user, date);
    }
}

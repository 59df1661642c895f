use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

use async_trait::async_trait;
use quiz_core::model::{DailyVisit, MistakeRecord, PageVisit, QuestionIndex, UserId};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RemoteError;
use crate::remote::RemoteStore;

const MISTAKES_TABLE: &str = "mistakes";
const DAILY_VISITS_TABLE: &str = "daily_visits";
const PAGE_VISITS_TABLE: &str = "page_visits";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: String,
}

impl RemoteConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("QUIZ_REMOTE_URL").ok()?;
        let api_key = env::var("QUIZ_REMOTE_KEY").ok()?;
        if base_url.trim().is_empty() || api_key.trim().is_empty() {
            return None;
        }
        Some(Self { base_url, api_key })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url.trim_end_matches('/'))
    }
}

/// Remote store speaking PostgREST-style JSON over HTTP.
///
/// Without a config every call fails with `RemoteError::Disabled`, which the
/// sync manager treats like any other transient failure.
#[derive(Clone)]
pub struct RestRemoteStore {
    client: Client,
    config: Option<RemoteConfig>,
}

impl RestRemoteStore {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(RemoteConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<RemoteConfig>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "falling back to an HTTP client without a timeout");
                Client::new()
            });
        Self { client, config }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    fn config(&self) -> Result<&RemoteConfig, RemoteError> {
        self.config.as_ref().ok_or(RemoteError::Disabled)
    }

    fn authorized(&self, builder: RequestBuilder, config: &RemoteConfig) -> RequestBuilder {
        builder
            .header("apikey", &config.api_key)
            .bearer_auth(&config.api_key)
    }

    async fn insert<T: Serialize + ?Sized>(
        &self,
        table: &str,
        rows: &T,
    ) -> Result<(), RemoteError> {
        let config = self.config()?;
        let request = self
            .client
            .post(config.table_url(table))
            .header("Prefer", "return=minimal")
            .json(rows);
        let response = self.authorized(request, config).send().await?;
        check_status(&response)
    }

    async fn select_mistakes(&self, user: &UserId) -> Result<Response, RemoteError> {
        let config = self.config()?;
        let request = self
            .client
            .get(config.table_url(MISTAKES_TABLE))
            .query(&[
                ("select", "question_index".to_string()),
                ("user_id", format!("eq.{user}")),
            ]);
        Ok(self.authorized(request, config).send().await?)
    }
}

fn check_status(response: &Response) -> Result<(), RemoteError> {
    let status = response.status();
    if status == StatusCode::CONFLICT {
        return Err(RemoteError::AlreadyExists);
    }
    if !status.is_success() {
        return Err(RemoteError::HttpStatus(status));
    }
    Ok(())
}

/// Total from a `Content-Range` header such as `0-24/3573` or `*/0`.
fn parse_content_range_total(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

#[derive(Debug, Deserialize)]
struct MistakeIndexRow {
    question_index: usize,
}

#[async_trait]
impl RemoteStore for RestRemoteStore {
    async fn insert_mistakes(&self, batch: &[MistakeRecord]) -> Result<(), RemoteError> {
        self.insert(MISTAKES_TABLE, batch).await
    }

    async fn insert_daily_visit(&self, visit: &DailyVisit) -> Result<(), RemoteError> {
        self.insert(DAILY_VISITS_TABLE, visit).await
    }

    async fn insert_page_visit(&self, visit: &PageVisit) -> Result<(), RemoteError> {
        self.insert(PAGE_VISITS_TABLE, visit).await
    }

    async fn mistake_indices(&self, user: &UserId) -> Result<BTreeSet<QuestionIndex>, RemoteError> {
        let response = self.select_mistakes(user).await?;
        check_status(&response)?;
        let rows: Vec<MistakeIndexRow> = response.json().await?;
        Ok(rows
            .into_iter()
            .map(|row| QuestionIndex::new(row.question_index))
            .collect())
    }

    async fn count_mistakes(&self, user: &UserId) -> Result<u64, RemoteError> {
        let config = self.config()?;
        let request = self
            .client
            .head(config.table_url(MISTAKES_TABLE))
            .header("Prefer", "count=exact")
            .query(&[("user_id", format!("eq.{user}"))]);
        let response = self.authorized(request, config).send().await?;
        check_status(&response)?;

        let header = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| RemoteError::InvalidResponse("missing Content-Range".into()))?;
        parse_content_range_total(header)
            .ok_or_else(|| RemoteError::InvalidResponse(format!("bad Content-Range: {header}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_totals() {
        assert_eq!(parse_content_range_total("0-24/3573"), Some(3573));
        assert_eq!(parse_content_range_total("*/0"), Some(0));
        assert_eq!(parse_content_range_total("0-24/*"), None);
        assert_eq!(parse_content_range_total("garbage"), None);
    }

    #[test]
    fn table_urls_ignore_trailing_slash() {
        let config = RemoteConfig {
            base_url: "https://example.supabase.co/".into(),
            api_key: "key".into(),
        };
        assert_eq!(
            config.table_url(MISTAKES_TABLE),
            "https://example.supabase.co/rest/v1/mistakes"
        );
    }

    #[tokio::test]
    async fn unconfigured_store_is_disabled() {
        let store = RestRemoteStore::new(None);
        assert!(!store.enabled());
        let err = store.insert_mistakes(&[]).await.unwrap_err();
        assert!(matches!(err, RemoteError::Disabled));
    }
}

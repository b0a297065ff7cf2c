//! Page-view and session totals from the analytics backend, memoized for a day.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::application::view_count::ViewCountCache;

const SOURCE: &str = "folio::application::analytics";

/// Memo key for the site-wide session total; page paths always start with `/`.
const SESSIONS_KEY: &str = "sessions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyticsQuery {
    /// Views of one exact page path.
    PageViews { path: String },
    /// Sessions across the whole property.
    TotalSessions,
}

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Missing GA4 credentials")]
    MissingCredentials,
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("analytics request failed: {0}")]
    Request(String),
    #[error("unexpected analytics response: {0}")]
    Response(String),
}

/// A reporting backend able to count one metric.
#[async_trait]
pub trait AnalyticsBackend: Send + Sync {
    async fn run_report(&self, query: &AnalyticsQuery) -> Result<u64, AnalyticsError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnalyticsReport {
    PageViews {
        path: String,
        views: u64,
    },
    Sessions {
        metric: &'static str,
        label: &'static str,
        total: u64,
    },
}

#[derive(Clone)]
pub struct AnalyticsService {
    backend: Option<Arc<dyn AnalyticsBackend>>,
    cache: Arc<ViewCountCache>,
}

impl AnalyticsService {
    /// `backend` is `None` when credentials are not configured.
    pub fn new(backend: Option<Arc<dyn AnalyticsBackend>>, cache: Arc<ViewCountCache>) -> Self {
        Self { backend, cache }
    }

    pub async fn report(&self, path: Option<&str>) -> Result<AnalyticsReport, AnalyticsError> {
        let backend = self
            .backend
            .as_ref()
            .ok_or(AnalyticsError::MissingCredentials)?;

        let query = match path {
            Some(path) => AnalyticsQuery::PageViews {
                path: normalize_path(path),
            },
            None => AnalyticsQuery::TotalSessions,
        };
        let key = match &query {
            AnalyticsQuery::PageViews { path } => path.as_str(),
            AnalyticsQuery::TotalSessions => SESSIONS_KEY,
        };

        let count = match self.cache.get(key) {
            Some(count) => {
                debug!(target = SOURCE, key, count, "analytics memo hit");
                count
            }
            None => {
                let count = backend.run_report(&query).await?;
                info!(target = SOURCE, key, count, "analytics report fetched");
                self.cache.set(key, count);
                count
            }
        };

        Ok(match query {
            AnalyticsQuery::PageViews { path } => AnalyticsReport::PageViews { path, views: count },
            AnalyticsQuery::TotalSessions => AnalyticsReport::Sessions {
                metric: "sessions",
                label: "Total Sessions",
                total: count,
            },
        })
    }
}

/// Ensure a leading `/`.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}


#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::{BrokenBackend, CountingBackend};
    use super::*;

    fn service(backend: Option<Arc<dyn AnalyticsBackend>>) -> AnalyticsService {
        AnalyticsService::new(backend, Arc::new(ViewCountCache::in_memory()))
    }

    #[tokio::test]
    async fn missing_backend_reports_missing_credentials() {
        let err = service(None).report(Some("/blog/x")).await.expect_err("no backend");
        assert!(matches!(err, AnalyticsError::MissingCredentials));
        assert_eq!(err.to_string(), "Missing GA4 credentials");
    }

    #[tokio::test]
    async fn page_views_are_memoized_per_path() {
        let backend = Arc::new(CountingBackend::returning(42));
        let service = service(Some(backend.clone()));

        let first = service.report(Some("blog/x")).await.expect("report");
        let second = service.report(Some("/blog/x")).await.expect("report");

        assert_eq!(
            first,
            AnalyticsReport::PageViews {
                path: "/blog/x".to_string(),
                views: 42
            }
        );
        assert_eq!(first, second);
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn sessions_serialize_with_label() {
        let service = service(Some(Arc::new(CountingBackend::returning(7))));
        let report = service.report(None).await.expect("report");
        assert_eq!(
            serde_json::to_value(report).expect("json"),
            json!({ "metric": "sessions", "label": "Total Sessions", "total": 7 })
        );
    }

    #[tokio::test]
    async fn backend_failures_are_not_cached() {
        let service = service(Some(Arc::new(BrokenBackend)));
        assert!(service.report(Some("/x")).await.is_err());
        assert!(service.report(Some("/x")).await.is_err());
    }
}

//! Google Analytics Data API client authenticated with a service account.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, header::CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::{
    application::{
        analytics::{AnalyticsBackend, AnalyticsError, AnalyticsQuery},
        dates::today,
    },
    config::AnalyticsSettings,
    infra::error::InfraError,
};

const SOURCE: &str = "folio::infra::analytics";

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const REPORT_BASE_URL: &str = "https://analyticsdata.googleapis.com/v1beta/properties";
const SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";
const GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECS: u64 = 3600;
const REPORT_START_DATE: &str = "2025-01-01";

pub struct Ga4Backend {
    client: Client,
    property_id: String,
    client_email: String,
    private_key: String,
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportResponse {
    #[serde(default)]
    rows: Vec<ReportRow>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReportRow {
    #[serde(default)]
    metric_values: Vec<MetricValue>,
}

#[derive(Debug, Deserialize)]
struct MetricValue {
    value: Option<String>,
}

impl Ga4Backend {
    /// `Ok(None)` unless every credential is present.
    pub fn from_settings(settings: &AnalyticsSettings) -> Result<Option<Self>, InfraError> {
        let (Some(property_id), Some(client_email), Some(private_key)) = (
            settings.property_id.clone(),
            settings.client_email.clone(),
            settings.private_key.clone(),
        ) else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::configuration(format!("analytics client: {err}")))?;
        Ok(Some(Self {
            client,
            property_id,
            client_email,
            private_key,
        }))
    }

    fn signed_assertion(&self) -> Result<String, AnalyticsError> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|err| AnalyticsError::Auth(err.to_string()))?
            .as_secs();
        let claims = Claims {
            iss: &self.client_email,
            scope: SCOPE,
            aud: TOKEN_URL,
            iat,
            exp: iat + TOKEN_LIFETIME_SECS,
        };
        let key = EncodingKey::from_rsa_pem(self.private_key.as_bytes())
            .map_err(|err| AnalyticsError::Auth(err.to_string()))?;
        jsonwebtoken::encode(&Header::new(Algorithm::RS256), &claims, &key)
            .map_err(|err| AnalyticsError::Auth(err.to_string()))
    }

    async fn access_token(&self) -> Result<String, AnalyticsError> {
        let assertion = self.signed_assertion()?;
        self.exchange_assertion(TOKEN_URL, &assertion).await
    }

    async fn exchange_assertion(
        &self,
        token_url: &str,
        assertion: &str,
    ) -> Result<String, AnalyticsError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("grant_type", GRANT_TYPE)
            .append_pair("assertion", assertion)
            .finish();

        let response = self
            .client
            .post(token_url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| AnalyticsError::Auth(err.to_string()))?;

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| AnalyticsError::Auth(err.to_string()))?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl AnalyticsBackend for Ga4Backend {
    async fn run_report(&self, query: &AnalyticsQuery) -> Result<u64, AnalyticsError> {
        let token = self.access_token().await?;
        let url = format!("{REPORT_BASE_URL}/{}:runReport", self.property_id);
        let body = report_body(query, &today().to_string());
        debug!(target = SOURCE, ?query, "running analytics report");

        let report: ReportResponse = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| AnalyticsError::Request(err.to_string()))?
            .json()
            .await
            .map_err(|err| AnalyticsError::Response(err.to_string()))?;

        Ok(first_metric(&report))
    }
}

fn report_body(query: &AnalyticsQuery, end_date: &str) -> Value {
    let date_ranges = json!([{ "startDate": REPORT_START_DATE, "endDate": end_date }]);
    match query {
        AnalyticsQuery::PageViews { path } => json!({
            "dateRanges": date_ranges,
            "dimensions": [{ "name": "pagePath" }],
            "metrics": [{ "name": "screenPageViews" }],
            "dimensionFilter": {
                "filter": {
                    "fieldName": "pagePath",
                    "stringFilter": { "matchType": "EXACT", "value": path }
                }
            }
        }),
        AnalyticsQuery::TotalSessions => json!({
            "dateRanges": date_ranges,
            "metrics": [{ "name": "sessions" }],
        }),
    }
}

/// The first row's first metric; anything unparsable counts as zero.
fn first_metric(report: &ReportResponse) -> u64 {
    report
        .rows
        .first()
        .and_then(|row| row.metric_values.first())
        .and_then(|metric| metric.value.as_deref())
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite() && *value >= 0.0)
        .map(|value| value as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use tokio::net::TcpListener;

    use super::*;

    fn settings(private_key: Option<&str>, timeout: Duration) -> AnalyticsSettings {
        AnalyticsSettings {
            property_id: Some("1".to_string()),
            client_email: Some("svc@example.iam".to_string()),
            private_key: private_key.map(str::to_string),
            timeout,
        }
    }

    #[test]
    fn backend_requires_every_credential() {
        let partial = settings(None, Duration::from_secs(10));
        assert!(
            Ga4Backend::from_settings(&partial)
                .expect("client builds")
                .is_none()
        );
    }

    #[tokio::test]
    async fn token_exchange_gives_up_after_the_configured_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let backend = Ga4Backend::from_settings(&settings(
            Some("unused"),
            Duration::from_millis(200),
        ))
        .expect("client builds")
        .expect("backend");

        let started = Instant::now();
        let result = backend
            .exchange_assertion(&format!("http://{addr}/token"), "assertion")
            .await;
        server.abort();

        assert!(matches!(result, Err(AnalyticsError::Auth(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn page_view_reports_filter_on_the_exact_path() {
        let body = report_body(
            &AnalyticsQuery::PageViews {
                path: "/blog/hello".to_string(),
            },
            "2025-06-01",
        );
        assert_eq!(body["metrics"][0]["name"], "screenPageViews");
        assert_eq!(body["dateRanges"][0]["startDate"], "2025-01-01");
        assert_eq!(body["dateRanges"][0]["endDate"], "2025-06-01");
        let filter = &body["dimensionFilter"]["filter"];
        assert_eq!(filter["fieldName"], "pagePath");
        assert_eq!(filter["stringFilter"]["matchType"], "EXACT");
        assert_eq!(filter["stringFilter"]["value"], "/blog/hello");
    }

    #[test]
    fn session_reports_have_no_dimensions() {
        let body = report_body(&AnalyticsQuery::TotalSessions, "2025-06-01");
        assert_eq!(body["metrics"][0]["name"], "sessions");
        assert!(body.get("dimensions").is_none());
    }

    #[test]
    fn metric_values_fall_back_to_zero() {
        let parse = |value: Value| {
            let report: ReportResponse = serde_json::from_value(value).expect("report");
            first_metric(&report)
        };
        assert_eq!(parse(json!({ "rows": [{ "metricValues": [{ "value": "128" }] }] })), 128);
        assert_eq!(parse(json!({ "rows": [{ "metricValues": [{ "value": "n/a" }] }] })), 0);
        assert_eq!(parse(json!({})), 0);
    }

    #[test]
    fn malformed_keys_fail_authentication() {
        let backend = Ga4Backend::from_settings(&settings(
            Some("not a key"),
            Duration::from_secs(10),
        ))
        .expect("client builds")
        .expect("backend");
        assert!(matches!(
            backend.signed_assertion(),
            Err(AnalyticsError::Auth(_))
        ));
    }
}

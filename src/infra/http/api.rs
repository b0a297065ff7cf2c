//! JSON and XML endpoints under `/api`.

use axum::{
    Json,
    extract::{Query, State},
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_LANGUAGE, CONTENT_TYPE, VARY},
    },
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::application::{
    analytics::AnalyticsError, error::ErrorReport, locale::resolve_locale,
};

use super::HttpState;

const FEED_CONTENT_TYPE: &str = "application/atom+xml; charset=utf-8";
const FEED_CACHE_CONTROL: &str = "public, max-age=3600, s-maxage=3600";
const ANALYTICS_CACHE_CONTROL: &str = "public, s-maxage=86400, stale-while-revalidate=3600";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct FeedQuery {
    locale: Option<String>,
    lang: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct AnalyticsQueryParams {
    path: Option<String>,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

pub(super) async fn atom_feed(
    State(state): State<HttpState>,
    Query(query): Query<FeedQuery>,
    headers: HeaderMap,
) -> Response {
    let accept_language = headers
        .get(ACCEPT_LANGUAGE)
        .and_then(|value| value.to_str().ok());
    let request = resolve_locale(
        state.context.locales(),
        query.locale.as_deref(),
        query.lang.as_deref(),
        accept_language,
    );

    let body = state.syndication.atom_feed(&request);
    let mut response = (StatusCode::OK, body).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(FEED_CONTENT_TYPE));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static(FEED_CACHE_CONTROL));
    headers.insert(VARY, HeaderValue::from_static("Accept-Language"));
    if let Ok(value) = HeaderValue::from_str(request.locale.as_str()) {
        headers.insert(CONTENT_LANGUAGE, value);
    }
    response
}

pub(super) async fn analytics(
    State(state): State<HttpState>,
    Query(query): Query<AnalyticsQueryParams>,
) -> Response {
    const SOURCE: &str = "folio::infra::http::api::analytics";

    let path = query.path.as_deref().filter(|path| !path.is_empty());
    match state.analytics.report(path).await {
        Ok(report) => {
            let mut response = Json(report).into_response();
            response.headers_mut().insert(
                CACHE_CONTROL,
                HeaderValue::from_static(ANALYTICS_CACHE_CONTROL),
            );
            response
        }
        Err(err) => {
            let body = match &err {
                AnalyticsError::MissingCredentials => ApiErrorBody {
                    error: "Missing GA4 credentials",
                    detail: None,
                },
                other => ApiErrorBody {
                    error: "Failed to fetch GA4 data",
                    detail: Some(other.to_string()),
                },
            };
            let mut response = (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
            ErrorReport::from_error(SOURCE, StatusCode::INTERNAL_SERVER_ERROR, &err)
                .attach(&mut response);
            response
        }
    }
}

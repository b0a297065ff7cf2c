#![allow(dead_code)]

use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;

use folio::{
    application::{
        analytics::{AnalyticsBackend, AnalyticsError, AnalyticsQuery},
        content::Site,
        og_image::{FontSource, OgImageError},
        site::SiteContext,
    },
    config::SiteSettings,
    domain::locale::LocaleSet,
    infra::http::{HttpState, build_router},
};

pub const SITE_URL: &str = "https://example.com/";

/// Hands the rasterizer bytes it cannot parse; text is simply skipped.
pub struct StubFonts;

#[async_trait]
impl FontSource for StubFonts {
    async fn load(&self, _family: &str, _weight: u16, _text: &str) -> Result<Vec<u8>, OgImageError> {
        Ok(b"not a font".to_vec())
    }
}

#[derive(Default)]
pub struct FixedAnalytics {
    pub count: u64,
    calls: AtomicUsize,
}

impl FixedAnalytics {
    pub fn returning(count: u64) -> Self {
        Self {
            count,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AnalyticsBackend for FixedAnalytics {
    async fn run_report(&self, _query: &AnalyticsQuery) -> Result<u64, AnalyticsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.count)
    }
}

pub fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/site")
}

pub async fn fixture_context() -> SiteContext {
    let locales = LocaleSet::new(["en", "zh"], "en").expect("locales");
    let site = Site::load(&fixture_root(), locales.clone(), SITE_URL)
        .await
        .expect("fixture site should load");
    let settings = SiteSettings {
        url: Url::parse(SITE_URL).expect("site url"),
        locales,
        avatar: "/me.png".to_string(),
        last_updated: Some("2025.3".to_string()),
        country: "United Kingdom".to_string(),
        repository_url: None,
        baidu_verification: Some("codeva-fixture".to_string()),
    };
    SiteContext::new(site, settings)
}

pub async fn app(analytics: Option<Arc<dyn AnalyticsBackend>>) -> Router {
    let state = HttpState::new(fixture_context().await, Arc::new(StubFonts), "Inter", analytics);
    build_router(state)
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    get_with(app, Request::builder().uri(uri)).await
}

pub async fn get_with(app: &Router, builder: axum::http::request::Builder) -> Response<Body> {
    let request = builder.body(Body::empty()).expect("request should build");
    app.clone()
        .oneshot(request)
        .await
        .expect("router should respond")
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .expect("body should collect")
        .to_bytes()
        .to_vec()
}

pub async fn body_text(response: Response<Body>) -> String {
    String::from_utf8(body_bytes(response).await).expect("utf-8 body")
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> &'a str {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

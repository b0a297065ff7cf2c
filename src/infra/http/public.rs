use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, RawPathParams, State},
    http::{
        HeaderValue, StatusCode, Uri,
        header::{CACHE_CONTROL, CONTENT_TYPE},
        request::Parts,
    },
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::error;

use crate::{
    application::{
        analytics::{AnalyticsBackend, AnalyticsService},
        error::HttpError,
        og_image::{FontSource, OgImageError, OgImageService},
        page::{LegalPage, PageService},
        site::SiteContext,
        sitemap::SitemapService,
        syndication::SyndicationService,
        view_count::ViewCountCache,
    },
    domain::locale::Locale,
    infra::{
        assets,
        media::{PublicFileError, PublicFiles, public_file_response},
    },
    presentation::views::{render_not_found_response, render_template_response},
};

use super::{
    api,
    middleware::{log_responses, set_request_context},
};

#[derive(Clone)]
pub struct HttpState {
    pub context: SiteContext,
    pub pages: Arc<PageService>,
    pub syndication: Arc<SyndicationService>,
    pub sitemap: Arc<SitemapService>,
    pub og_images: Arc<OgImageService>,
    pub analytics: Arc<AnalyticsService>,
    pub public_files: Arc<PublicFiles>,
}

impl HttpState {
    /// Wire every service over one loaded site.
    ///
    /// Without an analytics backend `/api/analytics` answers with a credentials error.
    pub fn new(
        context: SiteContext,
        fonts: Arc<dyn FontSource>,
        font_family: impl Into<String>,
        analytics: Option<Arc<dyn AnalyticsBackend>>,
    ) -> Self {
        let public_files = PublicFiles::new(context.site().public_dir().to_path_buf());
        Self {
            pages: Arc::new(PageService::new(context.clone())),
            syndication: Arc::new(SyndicationService::new(context.clone())),
            sitemap: Arc::new(SitemapService::new(context.clone())),
            og_images: Arc::new(OgImageService::new(context.clone(), fonts, font_family)),
            analytics: Arc::new(AnalyticsService::new(
                analytics,
                Arc::new(ViewCountCache::in_memory()),
            )),
            public_files: Arc::new(public_files),
            context,
        }
    }
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/blog", get(blog_list))
        .route("/blog/{slug}", get(post_detail))
        .route("/privacy-policy", get(privacy_policy))
        .route("/terms-of-service", get(terms_of_service))
        .route("/opengraph-image", get(home_og_image))
        .route("/blog/{slug}/opengraph-image", get(post_og_image))
        .route("/{locale}", get(home))
        .route("/{locale}/blog", get(blog_list))
        .route("/{locale}/blog/{slug}", get(post_detail))
        .route("/{locale}/privacy-policy", get(privacy_policy))
        .route("/{locale}/terms-of-service", get(terms_of_service))
        .route("/{locale}/opengraph-image", get(home_og_image))
        .route("/{locale}/blog/{slug}/opengraph-image", get(post_og_image))
        .route("/api/feed/atom.xml", get(api::atom_feed))
        .route("/api/analytics", get(api::analytics))
        .route("/sitemap.xml", get(sitemap))
        .route("/robots.txt", get(robots_txt))
        .route("/manifest.webmanifest", get(manifest))
        .route("/static/{*path}", get(assets::serve_static))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

/// The locale a page route serves, taken from its optional `{locale}` prefix.
///
/// The default locale is never prefixed: `/en/blog` redirects to `/blog`.
/// An unknown prefix falls through to public files and then the 404 page.
struct PageLocale(Locale);

impl FromRequestParts<HttpState> for PageLocale {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &HttpState,
    ) -> Result<Self, Self::Rejection> {
        let params = RawPathParams::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        let tag = params
            .iter()
            .find(|(key, _)| *key == "locale")
            .map(|(_, value)| value.to_string());

        let locales = state.context.locales();
        let Some(tag) = tag else {
            return Ok(Self(locales.default_locale().clone()));
        };

        match locales.get(&tag) {
            Some(locale) if locales.is_default(locale) => {
                Err(Redirect::permanent(&unprefixed_target(&parts.uri, &tag)).into_response())
            }
            Some(locale) => Ok(Self(locale.clone())),
            None => Err(public_file_or_not_found(state, parts.uri.path()).await),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SlugParams {
    slug: String,
}

async fn home(State(state): State<HttpState>, PageLocale(locale): PageLocale) -> Response {
    match state.pages.home(&locale) {
        Ok(template) => render_template_response(template, StatusCode::OK),
        Err(err) => err.into_response(),
    }
}

async fn blog_list(State(state): State<HttpState>, PageLocale(locale): PageLocale) -> Response {
    render_template_response(state.pages.blog_list(&locale), StatusCode::OK)
}

async fn post_detail(
    State(state): State<HttpState>,
    PageLocale(locale): PageLocale,
    Path(SlugParams { slug }): Path<SlugParams>,
) -> Response {
    match state.pages.post(&locale, &slug) {
        Some(template) => render_template_response(template, StatusCode::OK),
        None => not_found(&state, &locale, &format!("/blog/{slug}")),
    }
}

async fn privacy_policy(
    State(state): State<HttpState>,
    PageLocale(locale): PageLocale,
) -> Response {
    render_template_response(
        state.pages.legal(&locale, LegalPage::PrivacyPolicy),
        StatusCode::OK,
    )
}

async fn terms_of_service(
    State(state): State<HttpState>,
    PageLocale(locale): PageLocale,
) -> Response {
    render_template_response(
        state.pages.legal(&locale, LegalPage::TermsOfService),
        StatusCode::OK,
    )
}

async fn home_og_image(State(state): State<HttpState>, PageLocale(locale): PageLocale) -> Response {
    png_response(state.og_images.home(&locale).await)
}

async fn post_og_image(
    State(state): State<HttpState>,
    PageLocale(locale): PageLocale,
    Path(SlugParams { slug }): Path<SlugParams>,
) -> Response {
    png_response(state.og_images.post(&locale, &slug).await)
}

async fn sitemap(State(state): State<HttpState>) -> Response {
    text_response(state.sitemap.sitemap_xml(), "application/xml; charset=utf-8")
}

async fn robots_txt(State(state): State<HttpState>) -> Response {
    text_response(state.sitemap.robots_txt(), "text/plain; charset=utf-8")
}

async fn manifest(State(state): State<HttpState>) -> Response {
    let mut response = Json(state.sitemap.manifest()).into_response();
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/manifest+json"),
    );
    response
}

async fn fallback(State(state): State<HttpState>, uri: Uri) -> Response {
    public_file_or_not_found(&state, uri.path()).await
}

async fn public_file_or_not_found(state: &HttpState, path: &str) -> Response {
    const SOURCE: &str = "folio::infra::http::public::public_file";

    match state.public_files.read(path).await {
        Ok(Some(bytes)) => public_file_response(path, bytes),
        Ok(None) | Err(PublicFileError::InvalidPath) => {
            let (locale, rest) = split_locale_prefix(state, path);
            not_found(state, &locale, &rest)
        }
        Err(err) => {
            error!(target = SOURCE, path, error = %err, "failed to read public file");
            HttpError::from_error(
                SOURCE,
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to read file",
                &err,
            )
            .into_response()
        }
    }
}

fn not_found(state: &HttpState, locale: &Locale, path: &str) -> Response {
    render_not_found_response(state.pages.not_found(locale, path))
}

/// Split a non-default locale prefix off `path`, so the 404 page speaks that language.
fn split_locale_prefix(state: &HttpState, path: &str) -> (Locale, String) {
    let locales = state.context.locales();
    let trimmed = path.trim_start_matches('/');
    let (first, rest) = trimmed.split_once('/').unwrap_or((trimmed, ""));

    match locales.get(first) {
        Some(locale) if !locales.is_default(locale) => (locale.clone(), format!("/{rest}")),
        _ => (locales.default_locale().clone(), path.to_string()),
    }
}

fn unprefixed_target(uri: &Uri, tag: &str) -> String {
    let rest = uri
        .path()
        .strip_prefix('/')
        .and_then(|path| path.strip_prefix(tag))
        .unwrap_or_default();
    let mut target = if rest.is_empty() {
        "/".to_string()
    } else {
        rest.to_string()
    };
    if let Some(query) = uri.query() {
        target.push('?');
        target.push_str(query);
    }
    target
}

fn png_response(result: Result<Vec<u8>, OgImageError>) -> Response {
    const SOURCE: &str = "folio::infra::http::public::og_image";

    match result {
        Ok(png) => {
            let mut response = (StatusCode::OK, png).into_response();
            let headers = response.headers_mut();
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
            headers.insert(CACHE_CONTROL, HeaderValue::from_static("public, max-age=3600"));
            response
        }
        Err(err) => HttpError::from_error(
            SOURCE,
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to generate image",
            &err,
        )
        .into_response(),
    }
}

fn text_response(body: String, content_type: &'static str) -> Response {
    let mut response = (StatusCode::OK, body).into_response();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prefix_redirects_keep_the_rest_of_the_uri() {
        let uri: Uri = "/en/blog/hello?ref=feed".parse().expect("uri");
        assert_eq!(unprefixed_target(&uri, "en"), "/blog/hello?ref=feed");

        let uri: Uri = "/en".parse().expect("uri");
        assert_eq!(unprefixed_target(&uri, "en"), "/");
    }
}

//! Open Graph preview images rendered from SVG.
//!
//! Fonts are fetched per request, subset to exactly the characters drawn.
//! A missing font fails the request; there is no fallback face.

use std::{path::Path, sync::Arc};

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use futures::future::try_join_all;
use resvg::{tiny_skia, usvg};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    application::{dates::long_date, site::SiteContext, syndication::xml_escape},
    domain::locale::Locale,
};

const SOURCE: &str = "folio::application::og_image";

pub const WIDTH: u32 = 1200;
pub const HEIGHT: u32 = 630;

const HOME_WEIGHTS: [u16; 3] = [500, 700, 900];
const POST_WEIGHTS: [u16; 3] = [500, 600, 700];
const NOT_FOUND_WEIGHTS: [u16; 1] = [500];

const TITLE_LIMIT: usize = 80;
const SUMMARY_LIMIT: usize = 150;
const NOT_FOUND_TEXT: &str = "Blog Post Not Found";

#[derive(Debug, Error)]
pub enum OgImageError {
    #[error("font request for {family} {weight} failed: {message}")]
    FontRequest {
        family: String,
        weight: u16,
        message: String,
    },
    #[error("no usable font resource for {family} weight {weight}")]
    FontMissing { family: String, weight: u16 },
    #[error("failed to build preview SVG: {0}")]
    Svg(String),
    #[error("failed to rasterize preview image: {0}")]
    Raster(String),
}

/// Supplies font files subset to the given text.
#[async_trait]
pub trait FontSource: Send + Sync {
    async fn load(&self, family: &str, weight: u16, text: &str) -> Result<Vec<u8>, OgImageError>;
}

#[derive(Clone)]
pub struct OgImageService {
    context: SiteContext,
    fonts: Arc<dyn FontSource>,
    family: String,
}

impl OgImageService {
    pub fn new(context: SiteContext, fonts: Arc<dyn FontSource>, family: impl Into<String>) -> Self {
        Self {
            context,
            fonts,
            family: family.into(),
        }
    }

    pub async fn home(&self, locale: &Locale) -> Result<Vec<u8>, OgImageError> {
        let dictionary = self.context.dictionary(locale);
        let bubble = self.site_label(locale);
        let welcome = dictionary.text_or("welcome", "");
        let name = dictionary.text("name.full");
        let subtitle = dictionary.text_or("subtitle", "");
        let headline: Vec<String> = dictionary
            .text_or("headline", "")
            .lines()
            .map(str::to_string)
            .collect();

        let text = format!("{bubble}{welcome}{name}{subtitle}{}", headline.concat());
        let fonts = self.load_fonts(&HOME_WEIGHTS, &text).await?;
        let avatar = self.avatar_data_uri().await;

        let mut canvas = Canvas::new(&self.family);
        canvas.bubble(&bubble, 96.0);
        canvas.text(f64::from(WIDTH) / 2.0, 170.0, 28, 700, 1.0, Anchor::Middle, &welcome);
        canvas.card(210.0, 340.0);

        let mut y = 310.0;
        canvas.text(160.0, y, 64, 700, 1.0, Anchor::Start, &name);
        y += 52.0;
        canvas.text(160.0, y, 28, 400, 0.75, Anchor::Start, &subtitle);
        y += 46.0;
        for line in &headline {
            canvas.text(160.0, y, 24, 400, 1.0, Anchor::Start, line);
            y += 36.0;
        }
        if let Some(avatar) = avatar {
            canvas.avatar(940.0, 380.0, 100.0, &avatar);
        }

        rasterize(&canvas.finish(), fonts)
    }

    /// An unknown slug still yields an image, carrying a not-found notice.
    pub async fn post(&self, locale: &Locale, slug: &str) -> Result<Vec<u8>, OgImageError> {
        let Some(post) = self.context.site().post(slug, locale) else {
            debug!(target = SOURCE, slug, locale = %locale, "preview for unknown post");
            let fonts = self.load_fonts(&NOT_FOUND_WEIGHTS, NOT_FOUND_TEXT).await?;
            let mut canvas = Canvas::new(&self.family);
            canvas.text(
                f64::from(WIDTH) / 2.0,
                f64::from(HEIGHT) / 2.0 + 16.0,
                48,
                500,
                1.0,
                Anchor::Middle,
                NOT_FOUND_TEXT,
            );
            return rasterize(&canvas.finish(), fonts);
        };

        let dictionary = self.context.dictionary(locale);
        let title = truncate(&post.metadata.title, TITLE_LIMIT);
        let summary = truncate(&post.metadata.summary, SUMMARY_LIMIT);
        let date = long_date(post.metadata.date, locale.date_style());
        let author = format!(
            "{} {}",
            dictionary.text("blog.authorLabel"),
            dictionary.text("name.full")
        );
        let bubble = format!("{}/blog", self.site_label(locale));

        let text = format!(
            "{}{}{date}{author}{bubble}",
            post.metadata.title, post.metadata.summary
        );
        let fonts = self.load_fonts(&POST_WEIGHTS, &text).await?;

        let mut canvas = Canvas::new(&self.family);
        canvas.bubble(&bubble, 96.0);
        canvas.card(150.0, 400.0);

        let mut y = 240.0;
        for line in wrap(&title, 30).iter().take(3) {
            canvas.text(160.0, y, 56, 700, 1.0, Anchor::Start, line);
            y += 64.0;
        }
        y -= 16.0;
        canvas.text(160.0, y, 20, 500, 0.8, Anchor::Start, &author);
        y += 44.0;
        for line in wrap(&summary, 68).iter().take(3) {
            canvas.text(160.0, y, 24, 400, 0.85, Anchor::Start, line);
            y += 34.0;
        }
        canvas.text(160.0, 520.0, 18, 500, 0.6, Anchor::Start, &date);

        rasterize(&canvas.finish(), fonts)
    }

    /// `ogImageUrl` from the dictionary, else the public host.
    fn site_label(&self, locale: &Locale) -> String {
        self.context
            .dictionary(locale)
            .text_opt("ogImageUrl")
            .unwrap_or_else(|| self.context.host().to_string())
    }

    async fn load_fonts(&self, weights: &[u16], text: &str) -> Result<Vec<Vec<u8>>, OgImageError> {
        try_join_all(
            weights
                .iter()
                .map(|weight| self.fonts.load(&self.family, *weight, text)),
        )
        .await
    }

    async fn avatar_data_uri(&self) -> Option<String> {
        let avatar = &self.context.settings().avatar;
        let path = self
            .context
            .site()
            .public_dir()
            .join(avatar.trim_start_matches('/'));
        match tokio::fs::read(&path).await {
            Ok(bytes) => Some(data_uri(&path, &bytes)),
            Err(err) => {
                warn!(
                    target = SOURCE,
                    path = %path.display(),
                    error = %err,
                    "avatar unavailable for preview image"
                );
                None
            }
        }
    }
}

fn data_uri(path: &Path, bytes: &[u8]) -> String {
    let mime = mime_guess::from_path(path).first_or_octet_stream();
    format!("data:{};base64,{}", mime.essence_str(), STANDARD.encode(bytes))
}

/// Keep `limit` characters in total, ending in `...` when shortened.
pub fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let kept: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{kept}...")
}

/// Greedy word wrap measured in characters; overlong words are split.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }
        let word: String = word.into_iter().collect();
        let needed = current.chars().count() + word.chars().count() + usize::from(!current.is_empty());
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[derive(Clone, Copy)]
enum Anchor {
    Start,
    Middle,
}

impl Anchor {
    fn as_str(self) -> &'static str {
        match self {
            Anchor::Start => "start",
            Anchor::Middle => "middle",
        }
    }
}

/// Builds the preview SVG on the shared dark background.
struct Canvas {
    family: String,
    body: String,
}

impl Canvas {
    fn new(family: &str) -> Self {
        let body = format!(
            r##"<rect width="{WIDTH}" height="{HEIGHT}" fill="#1a1a1a"/><rect width="{WIDTH}" height="{HEIGHT}" fill="url(#grid)"/>"##
        );
        Self {
            family: xml_escape(family),
            body,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn text(&mut self, x: f64, y: f64, size: u32, weight: u16, opacity: f64, anchor: Anchor, text: &str) {
        if text.is_empty() {
            return;
        }
        self.body.push_str(&format!(
            r##"<text x="{x}" y="{y}" font-family="{}" font-size="{size}" font-weight="{weight}" fill="#ffffff" fill-opacity="{opacity}" text-anchor="{}">{}</text>"##,
            self.family,
            anchor.as_str(),
            xml_escape(text),
        ));
    }

    /// Pill-shaped outline around the site URL, centred horizontally.
    fn bubble(&mut self, label: &str, y: f64) {
        let width = label.chars().count() as f64 * 9.5 + 24.0;
        let x = (f64::from(WIDTH) - width) / 2.0;
        self.body.push_str(&format!(
            r##"<rect x="{x}" y="{}" width="{width}" height="32" rx="16" fill="none" stroke="#ffffff" stroke-width="2"/>"##,
            y - 22.0
        ));
        self.text(f64::from(WIDTH) / 2.0, y, 16, 500, 1.0, Anchor::Middle, label);
    }

    fn card(&mut self, y: f64, height: f64) {
        self.body.push_str(&format!(
            r##"<rect x="80" y="{y}" width="{}" height="{height}" rx="24" fill="#000000"/>"##,
            WIDTH - 160
        ));
    }

    fn avatar(&mut self, cx: f64, cy: f64, radius: f64, data_uri: &str) {
        let size = radius * 2.0;
        self.body.push_str(&format!(
            r#"<clipPath id="avatar"><circle cx="{cx}" cy="{cy}" r="{radius}"/></clipPath><image x="{}" y="{}" width="{size}" height="{size}" preserveAspectRatio="xMidYMid slice" clip-path="url(#avatar)" href="{data_uri}"/>"#,
            cx - radius,
            cy - radius,
        ));
    }

    fn finish(self) -> String {
        format!(
            r##"<svg xmlns="http://www.w3.org/2000/svg" width="{WIDTH}" height="{HEIGHT}" viewBox="0 0 {WIDTH} {HEIGHT}"><defs><pattern id="grid" width="20" height="20" patternUnits="userSpaceOnUse"><path d="M 20 0 L 0 0 0 20" fill="none" stroke="#ffffff" stroke-opacity="0.03" stroke-width="1"/></pattern></defs>{}</svg>"##,
            self.body
        )
    }
}

fn rasterize(svg: &str, fonts: Vec<Vec<u8>>) -> Result<Vec<u8>, OgImageError> {
    let mut database = usvg::fontdb::Database::new();
    for font in fonts {
        database.load_font_data(font);
    }
    let options = usvg::Options {
        fontdb: Arc::new(database),
        ..Default::default()
    };

    let tree =
        usvg::Tree::from_str(svg, &options).map_err(|err| OgImageError::Svg(err.to_string()))?;
    let mut pixmap = tiny_skia::Pixmap::new(WIDTH, HEIGHT)
        .ok_or_else(|| OgImageError::Raster("invalid canvas size".to_string()))?;
    resvg::render(&tree, tiny_skia::Transform::default(), &mut pixmap.as_mut());
    pixmap
        .encode_png()
        .map_err(|err| OgImageError::Raster(err.to_string()))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Serves placeholder bytes; the rasterizer skips faces it cannot parse.
    pub struct StubFontSource;

    #[async_trait]
    impl FontSource for StubFontSource {
        async fn load(&self, _family: &str, _weight: u16, _text: &str) -> Result<Vec<u8>, OgImageError> {
            Ok(b"not a font".to_vec())
        }
    }

    pub struct FailingFontSource;

    #[async_trait]
    impl FontSource for FailingFontSource {
        async fn load(&self, family: &str, weight: u16, _text: &str) -> Result<Vec<u8>, OgImageError> {
            Err(OgImageError::FontMissing {
                family: family.to_string(),
                weight,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::testing::{FailingFontSource, StubFontSource};
    use super::*;
    use crate::application::site::testing::site_context;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

    fn png_dimensions(png: &[u8]) -> (u32, u32) {
        let width = u32::from_be_bytes([png[16], png[17], png[18], png[19]]);
        let height = u32::from_be_bytes([png[20], png[21], png[22], png[23]]);
        (width, height)
    }

    fn service(fonts: Arc<dyn FontSource>) -> OgImageService {
        let context = site_context(json!({
            "name": { "full": "Ada & Lovelace" },
            "subtitle": "Analyst",
            "headline": "Engines\nNotes",
            "welcome": "Welcome <home>",
        }));
        OgImageService::new(context, fonts, "Inter")
    }

    #[tokio::test]
    async fn home_preview_is_a_full_size_png() {
        let service = service(Arc::new(StubFontSource));
        let en = service.context.locales().default_locale().clone();

        let png = service.home(&en).await.expect("png");
        assert_eq!(png[..8], PNG_SIGNATURE);
        assert_eq!(png_dimensions(&png), (WIDTH, HEIGHT));
    }

    #[tokio::test]
    async fn unknown_posts_still_render() {
        let service = service(Arc::new(StubFontSource));
        let en = service.context.locales().default_locale().clone();

        let png = service.post(&en, "missing").await.expect("png");
        assert_eq!(png_dimensions(&png), (WIDTH, HEIGHT));
    }

    #[tokio::test]
    async fn font_failures_fail_the_request() {
        let service = service(Arc::new(FailingFontSource));
        let en = service.context.locales().default_locale().clone();

        let err = service.home(&en).await.expect_err("fonts are required");
        assert!(matches!(err, OgImageError::FontMissing { weight: 500, .. }));
    }

    #[test]
    fn truncation_keeps_the_limit() {
        assert_eq!(truncate("short", 80), "short");
        let long = "x".repeat(100);
        let cut = truncate(&long, 80);
        assert_eq!(cut.chars().count(), 80);
        assert!(cut.ends_with("..."));
    }

    #[test]
    fn wrapping_splits_on_words_and_long_runs() {
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("零一二三四五六七", 3), vec!["零一二", "三四五", "六七"]);
    }
}

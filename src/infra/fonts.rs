//! Google Fonts CSS2 client used by the preview image generator.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::{
    application::og_image::{FontSource, OgImageError},
    config::OgImageSettings,
    infra::error::InfraError,
};

const SOURCE: &str = "folio::infra::fonts";

/// Fetches font subsets for the exact text being drawn.
///
/// Requests carry no browser user agent, so the stylesheet links TrueType
/// files rather than WOFF2.
#[derive(Clone)]
pub struct GoogleFontSource {
    client: Client,
    css_url: Url,
}

impl GoogleFontSource {
    pub fn new(settings: &OgImageSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|err| InfraError::configuration(format!("font client: {err}")))?;
        Ok(Self {
            client,
            css_url: settings.font_css_url.clone(),
        })
    }

    fn stylesheet_url(&self, family: &str, weight: u16, text: &str) -> Url {
        let mut url = self.css_url.clone();
        url.query_pairs_mut()
            .append_pair("family", &format!("{family}:wght@{weight}"))
            .append_pair("text", text);
        url
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl FontSource for GoogleFontSource {
    async fn load(&self, family: &str, weight: u16, text: &str) -> Result<Vec<u8>, OgImageError> {
        let request_error = |err: reqwest::Error| OgImageError::FontRequest {
            family: family.to_string(),
            weight,
            message: err.to_string(),
        };

        let stylesheet = self.stylesheet_url(family, weight, text);
        let css = self
            .client
            .get(stylesheet.as_str())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(request_error)?
            .text()
            .await
            .map_err(request_error)?;

        let font_url = font_url_from_css(&css).ok_or_else(|| OgImageError::FontMissing {
            family: family.to_string(),
            weight,
        })?;
        debug!(target = SOURCE, family, weight, font_url, "fetching font subset");

        self.get_bytes(font_url).await.map_err(request_error)
    }
}

/// The first `src: url(...)` whose format is TrueType or OpenType.
fn font_url_from_css(css: &str) -> Option<&str> {
    const MARKER: &str = "src: url(";
    let mut rest = css;
    while let Some(start) = rest.find(MARKER) {
        let after = &rest[start + MARKER.len()..];
        let end = after.find(')')?;
        let url = after[..end].trim_matches(|c| c == '\'' || c == '"');
        let tail = after[end + 1..].trim_start();
        if tail.starts_with("format('truetype')") || tail.starts_with("format('opentype')") {
            return Some(url);
        }
        rest = &after[end + 1..];
    }
    None
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn truetype_sources_are_selected() {
        let css = "@font-face {\n  font-family: 'Inter';\n  src: url(https://fonts.gstatic.com/a.woff2) format('woff2');\n}\n@font-face {\n  src: url(https://fonts.gstatic.com/b.ttf) format('truetype');\n}";
        assert_eq!(
            font_url_from_css(css),
            Some("https://fonts.gstatic.com/b.ttf")
        );
        assert_eq!(font_url_from_css("body {}"), None);
    }

    #[test]
    fn stylesheet_urls_carry_family_weight_and_text() {
        let source = GoogleFontSource::new(&OgImageSettings {
            font_family: "Inter".to_string(),
            font_css_url: Url::parse("https://fonts.googleapis.com/css2").expect("url"),
            timeout: Duration::from_secs(1),
        })
        .expect("client");

        let url = source.stylesheet_url("Inter", 700, "Ada & 中");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("family".to_string(), "Inter:wght@700".to_string()),
                ("text".to_string(), "Ada & 中".to_string()),
            ]
        );
    }
}

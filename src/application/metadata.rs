//! Per-page SEO metadata: titles, canonical and alternate links, OpenGraph.

use time::Date;

use crate::{
    application::{dates::rfc3339_date, site::SiteContext, syndication::FEED_PATH},
    domain::locale::Locale,
    presentation::views::{AlternateLinkView, PageMetaView},
};

const OG_IMAGE_SEGMENT: &str = "opengraph-image";

/// Builder for the `<head>` metadata of one page.
pub struct PageMeta<'a> {
    locale: &'a Locale,
    path: String,
    title: Option<String>,
    description: Option<String>,
    alternates: Option<Vec<Locale>>,
    published: Option<Date>,
    og_image_path: Option<String>,
    indexable: bool,
}

impl<'a> PageMeta<'a> {
    /// `path` is the locale-less route, e.g. `/blog`.
    pub fn new(locale: &'a Locale, path: impl Into<String>) -> Self {
        Self {
            locale,
            path: path.into(),
            title: None,
            description: None,
            alternates: None,
            published: None,
            og_image_path: None,
            indexable: true,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restrict `hreflang` alternates to the locales the page exists in.
    pub fn available_in(mut self, locales: Vec<Locale>) -> Self {
        self.alternates = Some(locales);
        self
    }

    /// Mark the page as an article published on `date`.
    pub fn article(mut self, date: Date) -> Self {
        self.published = Some(date);
        self
    }

    /// Use the preview image generated for this page rather than the home one.
    pub fn own_og_image(mut self) -> Self {
        self.og_image_path = Some(self.path.clone());
        self
    }

    pub fn noindex(mut self) -> Self {
        self.indexable = false;
        self
    }

    pub fn build(self, context: &SiteContext) -> PageMetaView {
        let locales = context.locales();
        let dictionary = context.dictionary(self.locale);
        let site_name = dictionary.text("name.full");

        let page_title = self.title.unwrap_or_else(|| site_name.clone());
        let title = if self.path == "/" {
            page_title.clone()
        } else {
            format!("{page_title} | {site_name}")
        };
        let description = self
            .description
            .unwrap_or_else(|| dictionary.text("headline"));

        let available = self
            .alternates
            .unwrap_or_else(|| locales.iter().cloned().collect());
        let mut alternates: Vec<AlternateLinkView> = available
            .iter()
            .map(|locale| AlternateLinkView {
                hreflang: locale.region_tag(),
                href: context.locale_url(locale, &self.path),
            })
            .collect();
        alternates.push(AlternateLinkView {
            hreflang: "x-default".to_string(),
            href: context.locale_url(locales.default_locale(), &self.path),
        });

        let mut atom_url = context.absolute_url(FEED_PATH);
        if !locales.is_default(self.locale) {
            atom_url.push_str(&format!("?locale={}", self.locale));
        }

        let og_image = match self.og_image_path.as_deref() {
            Some(path) if path != "/" => format!(
                "{}/{OG_IMAGE_SEGMENT}",
                context.locale_url(self.locale, path)
            ),
            _ => context.locale_url(self.locale, &format!("/{OG_IMAGE_SEGMENT}")),
        };

        PageMetaView {
            title,
            description,
            author: site_name,
            canonical: context.locale_url(self.locale, &self.path),
            alternates,
            atom_url,
            og_type: if self.published.is_some() {
                "article"
            } else {
                "website"
            },
            og_title: page_title,
            og_locale: self.locale.region_tag(),
            og_image,
            published_time: self.published.map(rfc3339_date),
            robots: if self.indexable {
                "index, follow"
            } else {
                "noindex, nofollow"
            },
            baidu_verification: context.settings().baidu_verification.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use super::*;
    use crate::application::site::testing::site_context;

    fn context() -> SiteContext {
        site_context(json!({
            "name": { "full": "Ada Lovelace" },
            "headline": "Analyst",
        }))
    }

    #[test]
    fn home_title_stands_alone() {
        let context = context();
        let en = context.locales().default_locale().clone();
        let meta = PageMeta::new(&en, "/").build(&context);

        assert_eq!(meta.title, "Ada Lovelace");
        assert_eq!(meta.description, "Analyst");
        assert_eq!(meta.canonical, "https://example.com/");
        assert_eq!(meta.og_image, "https://example.com/opengraph-image");
        assert_eq!(meta.atom_url, "https://example.com/api/feed/atom.xml");
        assert_eq!(meta.robots, "index, follow");
        assert!(meta.baidu_verification.is_none());
    }

    #[test]
    fn inner_pages_carry_the_site_name() {
        let context = context();
        let zh = context.locales().get("zh").expect("zh").clone();
        let meta = PageMeta::new(&zh, "/blog").title("Blog").build(&context);

        assert_eq!(meta.title, "Blog | Ada Lovelace");
        assert_eq!(meta.og_title, "Blog");
        assert_eq!(meta.og_locale, "zh-CN");
        assert_eq!(meta.canonical, "https://example.com/zh/blog");
        assert_eq!(meta.og_image, "https://example.com/zh/opengraph-image");
        assert_eq!(
            meta.atom_url,
            "https://example.com/api/feed/atom.xml?locale=zh"
        );

        let hreflangs: Vec<_> = meta.alternates.iter().map(|a| a.hreflang.as_str()).collect();
        assert_eq!(hreflangs, vec!["en-US", "zh-CN", "x-default"]);
        assert_eq!(meta.alternates[2].href, "https://example.com/blog");
    }

    #[test]
    fn articles_use_their_own_preview_image() {
        let context = context();
        let en = context.locales().default_locale().clone();
        let meta = PageMeta::new(&en, "/blog/hello")
            .title("Hello")
            .article(date!(2025 - 03 - 01))
            .available_in(vec![en.clone()])
            .own_og_image()
            .build(&context);

        assert_eq!(meta.og_type, "article");
        assert_eq!(
            meta.published_time.as_deref(),
            Some("2025-03-01T00:00:00Z")
        );
        assert_eq!(
            meta.og_image,
            "https://example.com/blog/hello/opengraph-image"
        );
        assert_eq!(meta.alternates.len(), 2);
    }
}

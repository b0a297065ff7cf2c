//! Sitemap, robots.txt and web manifest generation.

use std::collections::HashSet;

use serde_json::{Value, json};
use time::Date;

use crate::application::{
    dates::{rfc3339_date, today},
    site::SiteContext,
    syndication::xml_escape,
};

/// `(path, changefreq, priority)` for each page every locale serves.
const STATIC_PAGES: [(&str, &str, &str); 4] = [
    ("", "weekly", "1.0"),
    ("/blog", "weekly", "0.8"),
    ("/privacy-policy", "monthly", "0.5"),
    ("/terms-of-service", "monthly", "0.5"),
];

const POST_CHANGEFREQ: &str = "monthly";
const POST_PRIORITY: &str = "0.7";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: Date,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

/// Service for generating sitemap.xml, robots.txt and the web manifest.
#[derive(Clone)]
pub struct SitemapService {
    context: SiteContext,
}

impl SitemapService {
    pub fn new(context: SiteContext) -> Self {
        Self { context }
    }

    /// Every public URL once, static pages first.
    pub fn entries(&self) -> Vec<SitemapEntry> {
        let base = self.context.base_url();
        let locales = self.context.locales();
        let today = today();
        let mut entries = Vec::new();

        for locale in locales.iter() {
            let prefix = locale_prefix(locales.is_default(locale), locale.as_str());
            for (page, changefreq, priority) in STATIC_PAGES {
                entries.push(SitemapEntry {
                    loc: format!("{base}{prefix}{page}"),
                    lastmod: today,
                    changefreq,
                    priority,
                });
            }
        }

        for locale in locales.iter() {
            let prefix = locale_prefix(locales.is_default(locale), locale.as_str());
            for post in self.context.site().list_posts(locale) {
                entries.push(SitemapEntry {
                    loc: format!("{base}{prefix}/blog/{}", post.slug),
                    lastmod: post.metadata.last_modified(),
                    changefreq: POST_CHANGEFREQ,
                    priority: POST_PRIORITY,
                });
            }
        }

        let mut seen = HashSet::new();
        entries.retain(|entry| seen.insert(entry.loc.clone()));
        entries
    }

    pub fn sitemap_xml(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
        );
        for entry in self.entries() {
            xml.push_str(&format!(
                "  <url><loc>{}</loc><lastmod>{}</lastmod><changefreq>{}</changefreq><priority>{}</priority></url>\n",
                xml_escape(&entry.loc),
                rfc3339_date(entry.lastmod),
                entry.changefreq,
                entry.priority,
            ));
        }
        xml.push_str("</urlset>\n");
        xml
    }

    pub fn robots_txt(&self) -> String {
        let sitemap_url = self.context.absolute_url("/sitemap.xml");
        format!("User-agent: *\nAllow: /\nSitemap: {sitemap_url}\n")
    }

    /// The web app manifest, described in the default locale.
    pub fn manifest(&self) -> Value {
        let locale = self.context.locales().default_locale();
        let dictionary = self.context.dictionary(locale);
        let name = dictionary.text("name.full");

        json!({
            "name": name,
            "short_name": name,
            "description": dictionary.text("headline").replace('\n', ", "),
            "start_url": "/",
            "display": "standalone",
            "background_color": "#ffffff",
            "theme_color": "#000000",
            "orientation": "portrait-primary",
            "scope": "/",
            "lang": locale.as_str(),
            "icons": [
                { "src": "/favicon.ico", "sizes": "any", "type": "image/x-icon" }
            ],
        })
    }
}

fn locale_prefix(is_default: bool, tag: &str) -> String {
    if is_default {
        String::new()
    } else {
        format!("/{tag}")
    }
}

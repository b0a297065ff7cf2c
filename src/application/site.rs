//! The loaded site together with the settings that shape its public URLs.

use std::sync::Arc;

use tracing::warn;

use crate::{
    application::content::Site,
    config::SiteSettings,
    domain::{
        collections::SocialLink,
        dictionary::Dictionary,
        icons::Icon,
        locale::{Locale, LocaleSet},
    },
};

const SOURCE: &str = "folio::application::site";

#[derive(Clone)]
pub struct SiteContext {
    site: Arc<Site>,
    settings: Arc<SiteSettings>,
}

impl SiteContext {
    pub fn new(site: Site, settings: SiteSettings) -> Self {
        Self {
            site: Arc::new(site),
            settings: Arc::new(settings),
        }
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn settings(&self) -> &SiteSettings {
        &self.settings
    }

    pub fn locales(&self) -> &LocaleSet {
        self.site.locales()
    }

    pub fn dictionary(&self, locale: &Locale) -> &Dictionary {
        self.site.dictionary(locale)
    }

    /// The site URL without its trailing slash.
    pub fn base_url(&self) -> &str {
        self.settings.url.as_str().trim_end_matches('/')
    }

    pub fn host(&self) -> &str {
        self.settings.url.host_str().unwrap_or_default()
    }

    /// Resolve a site-relative path against the public URL.
    pub fn absolute_url(&self, path: &str) -> String {
        let relative = path.trim_start_matches('/');
        self.settings
            .url
            .join(relative)
            .map(String::from)
            .unwrap_or_else(|_| format!("{}/{relative}", self.base_url()))
    }

    /// Absolute URL of `path` as served in `locale`.
    pub fn locale_url(&self, locale: &Locale, path: &str) -> String {
        self.absolute_url(&self.locales().localized_path(locale, path))
    }

    /// Social links in dictionary order, each tagged with its key.
    pub fn social_links(&self, locale: &Locale) -> Vec<SocialLink> {
        self.dictionary(locale)
            .entries::<SocialLink>("social")
            .into_iter()
            .map(|(id, link)| SocialLink { id, ..link })
            .collect()
    }

    pub fn social_link(&self, locale: &Locale, id: &str) -> Option<SocialLink> {
        self.social_links(locale)
            .into_iter()
            .find(|link| link.id.eq_ignore_ascii_case(id))
    }

    /// Prefix an internal href for `locale`. External links and file paths pass through.
    pub fn localize_href(&self, locale: &Locale, href: &str) -> String {
        if !href.starts_with('/') || href.contains('.') {
            return href.to_string();
        }
        if let Some(fragment) = href.strip_prefix("/#") {
            let home = self.locales().localized_path(locale, "/");
            return format!("{home}#{fragment}");
        }
        self.locales().localized_path(locale, href)
    }
}

/// Downloadable documents and images linked from navigation.
pub fn is_file_link(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    [".pdf", ".png", ".jpg", ".jpeg"]
        .iter()
        .any(|extension| lower.ends_with(extension))
}

/// Links that leave the site or open a file get a new tab.
pub fn opens_new_tab(href: &str) -> bool {
    !href.starts_with('/') || is_file_link(href)
}

/// Map a dictionary icon key, logging and substituting `fallback` when unknown.
pub fn resolve_icon(key: &str, fallback: Icon) -> Icon {
    key.parse().unwrap_or_else(|err| {
        warn!(target = SOURCE, key, error = %err, "unknown icon key");
        fallback
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{collections::HashMap, path::PathBuf};

    use serde_json::{Value, json};
    use url::Url;

    use super::*;
    use crate::domain::dictionary::Dictionary;

    /// A two-locale site with a handful of messages and no posts.
    pub fn site_context(messages: Value) -> SiteContext {
        let locales = LocaleSet::new(["en", "zh"], "en").expect("locales");
        let mut dictionaries = HashMap::new();
        for locale in locales.iter() {
            let mut dictionary = Dictionary::new();
            dictionary.merge(messages.clone());
            dictionaries.insert(locale.clone(), dictionary);
        }
        let site = Site::new(
            locales.clone(),
            dictionaries,
            HashMap::new(),
            PathBuf::from("public"),
        );
        let settings = SiteSettings {
            url: Url::parse("https://example.com/").expect("url"),
            locales,
            avatar: "/me.png".to_string(),
            last_updated: Some("2025.3".to_string()),
            country: "Singapore".to_string(),
            repository_url: None,
            baidu_verification: None,
        };
        SiteContext::new(site, settings)
    }

    pub fn empty_site_context() -> SiteContext {
        site_context(json!({}))
    }
}

use tracing::debug;
use url::Url;

use crate::{
    application::{
        dates::today,
        jsonld,
        site::{SiteContext, opens_new_tab, resolve_icon},
    },
    domain::{
        collections::{FooterLink, NavbarItem, SocialLink},
        icons::Icon,
        locale::Locale,
    },
    presentation::views::{
        FooterSectionView, FooterView, LayoutChrome, LinkView, LocaleToggleView, NavbarLinkView,
        NavbarView, PageMetaView, SocialLinkView,
    },
};

const SOURCE: &str = "folio::application::chrome::ChromeService";

const QUICK_NAVIGATION: [(&str, &str); 6] = [
    ("about", "/#about"),
    ("projects", "/#projects"),
    ("education", "/#education"),
    ("experience", "/#work"),
    ("skills", "/#skills"),
    ("awards", "/#awards"),
];

const LEGAL_LINKS: [(&str, &str); 2] = [
    ("footer.legal.privacyPolicy", "/privacy-policy"),
    ("footer.legal.termsDisclaimer", "/terms-of-service"),
];

/// Assembles the navbar, footer and site-wide structured data around a page.
#[derive(Clone)]
pub struct ChromeService {
    context: SiteContext,
}

impl ChromeService {
    pub fn new(context: SiteContext) -> Self {
        Self { context }
    }

    /// `path` is the locale-less route of the page. The toggle is disabled when
    /// the page has no counterpart in the next locale.
    pub fn build(
        &self,
        locale: &Locale,
        path: &str,
        meta: PageMetaView,
        toggle_enabled: bool,
    ) -> LayoutChrome {
        debug!(target = SOURCE, locale = %locale, path, "building layout chrome");

        let json_ld = vec![
            jsonld::to_script(&jsonld::website(&self.context, locale)),
            jsonld::to_script(&jsonld::breadcrumbs(&self.context, locale)),
        ];

        LayoutChrome {
            lang: locale.to_string(),
            meta,
            navbar: self.navbar(locale, path, toggle_enabled),
            footer: self.footer(locale),
            json_ld,
        }
    }

    fn navbar(&self, locale: &Locale, path: &str, toggle_enabled: bool) -> NavbarView {
        let dictionary = self.context.dictionary(locale);
        let locales = self.context.locales();

        let links = dictionary
            .list::<NavbarItem>("navbar.items")
            .into_iter()
            .map(|item| NavbarLinkView {
                href: self.context.localize_href(locale, &item.href),
                icon_svg: resolve_icon(&item.icon, Icon::Home).svg("navbar-icon"),
                label: item.label,
            })
            .collect();

        let target = locales.next_after(locale);
        let label = if toggle_enabled {
            locale.toggle_label()
        } else {
            locales.default_locale().as_str().to_ascii_uppercase()
        };

        NavbarView {
            links,
            toggle: LocaleToggleView {
                label,
                href: locales.localized_path(target, path),
                scroll_path: path.to_string(),
                disabled: !toggle_enabled,
                tooltip: dictionary.text("navbar.language"),
            },
        }
    }

    fn footer(&self, locale: &Locale) -> FooterView {
        let dictionary = self.context.dictionary(locale);
        let settings = self.context.settings();

        let quick_navigation = FooterSectionView {
            title: dictionary.text("footer.sections.quickNavigation"),
            links: QUICK_NAVIGATION
                .iter()
                .map(|(key, href)| LinkView {
                    href: self.context.localize_href(locale, href),
                    label: dictionary.text(&format!("footer.navigation.{key}")),
                    external: false,
                })
                .collect(),
        };

        let socials = self
            .context
            .social_links(locale)
            .into_iter()
            .filter(|link| link.footer)
            .map(social_link_view)
            .collect();

        let mut contact_links = Vec::new();
        if let Some(map_url) = dictionary.text_opt("location.mapUrl") {
            contact_links.push(self.link(locale, &map_url, dictionary.text("location.name")));
        }
        if let Some(email) = self.context.social_link(locale, "email") {
            contact_links.push(self.link(
                locale,
                &email.url,
                dictionary.text("footer.contact.support"),
            ));
        }

        let legal = LEGAL_LINKS
            .iter()
            .map(|(key, href)| self.link(locale, href, dictionary.text(key)))
            .collect();

        let last_updated = settings.last_updated.as_ref().map(|value| {
            format!("{}: {value}", dictionary.text("footer.bottom.lastUpdated"))
        });

        let repository = settings.repository_url.as_deref().map(|href| LinkView {
            href: href.to_string(),
            label: repository_label(href),
            external: true,
        });

        FooterView {
            quick_navigation,
            connect_title: dictionary.text("footer.sections.connect"),
            socials,
            resources: self.link_section(locale, "footer.sections.resources", "footer.resources"),
            discover: self.link_section(locale, "footer.sections.discover", "footer.discover"),
            contact: FooterSectionView {
                title: dictionary.text("footer.sections.contact"),
                links: contact_links,
            },
            copyright: format!("© {} {}", today().year(), dictionary.text("name.full")),
            all_rights_reserved: dictionary.text("footer.legal.allRightsReserved"),
            legal,
            last_updated,
            modified_from_label: dictionary.text("footer.bottom.modifiedFrom"),
            repository,
        }
    }

    fn link_section(&self, locale: &Locale, title_key: &str, links_key: &str) -> FooterSectionView {
        let dictionary = self.context.dictionary(locale);
        FooterSectionView {
            title: dictionary.text(title_key),
            links: dictionary
                .list::<FooterLink>(links_key)
                .into_iter()
                .map(|link| self.link(locale, &link.url, link.name))
                .collect(),
        }
    }

    fn link(&self, locale: &Locale, href: &str, label: String) -> LinkView {
        LinkView {
            href: self.context.localize_href(locale, href),
            label,
            external: opens_new_tab(href),
        }
    }
}

pub fn social_link_view(link: SocialLink) -> SocialLinkView {
    SocialLinkView {
        icon_svg: resolve_icon(&link.icon, Icon::Globe).svg("social-icon"),
        external: opens_new_tab(&link.url),
        href: link.url,
        label: link.name,
    }
}

/// "owner/repo" for a hosted repository URL, else the URL itself.
fn repository_label(href: &str) -> String {
    Url::parse(href)
        .ok()
        .map(|url| url.path().trim_matches('/').to_string())
        .filter(|path| !path.is_empty())
        .unwrap_or_else(|| href.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::{metadata::PageMeta, site::testing::site_context};

    fn service() -> (ChromeService, SiteContext) {
        let context = site_context(json!({
            "name": { "full": "Ada Lovelace" },
            "navbar": {
                "language": "Switch language",
                "items": [
                    { "href": "/", "icon": "home", "label": "Home" },
                    { "href": "/blog", "icon": "notebook", "label": "Blog" },
                    { "href": "/cv.pdf", "icon": "sparkles", "label": "CV" },
                ]
            },
            "location": { "name": "London", "mapUrl": "https://maps.example/london" },
            "social": {
                "github": { "name": "GitHub", "url": "https://github.com/ada", "icon": "github", "footer": true },
                "email": { "name": "Email", "url": "mailto:ada@example.com", "icon": "email" },
            },
            "footer": {
                "resources": [ { "name": "Blog", "url": "/blog" } ],
                "contact": { "support": "Email me" },
                "bottom": { "lastUpdated": "Last updated" },
            },
        }));
        (ChromeService::new(context.clone()), context)
    }

    #[test]
    fn navbar_links_are_localized_except_files() {
        let (service, context) = service();
        let zh = context.locales().get("zh").expect("zh").clone();
        let meta = PageMeta::new(&zh, "/blog").build(&context);
        let chrome = service.build(&zh, "/blog", meta, true);

        let hrefs: Vec<_> = chrome.navbar.links.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, vec!["/zh", "/zh/blog", "/cv.pdf"]);
        assert_eq!(chrome.navbar.toggle.label, "中");
        assert_eq!(chrome.navbar.toggle.href, "/blog");
        assert_eq!(chrome.navbar.toggle.scroll_path, "/blog");
        assert_eq!(chrome.navbar.toggle.tooltip, "Switch language");
        assert_eq!(chrome.lang, "zh");
        assert_eq!(chrome.json_ld.len(), 2);
    }

    #[test]
    fn disabled_toggle_shows_the_default_tag() {
        let (service, context) = service();
        let en = context.locales().default_locale().clone();
        let meta = PageMeta::new(&en, "/blog/solo").build(&context);
        let chrome = service.build(&en, "/blog/solo", meta, false);

        assert!(chrome.navbar.toggle.disabled);
        assert_eq!(chrome.navbar.toggle.label, "EN");
        assert_eq!(chrome.navbar.toggle.href, "/zh/blog/solo");
    }

    #[test]
    fn footer_collects_sections() {
        let (service, context) = service();
        let zh = context.locales().get("zh").expect("zh").clone();
        let meta = PageMeta::new(&zh, "/").build(&context);
        let footer = service.build(&zh, "/", meta, true).footer;

        assert_eq!(footer.quick_navigation.links[0].href, "/zh#about");
        assert_eq!(footer.quick_navigation.links[3].href, "/zh#work");
        assert_eq!(footer.socials.len(), 1);
        assert!(footer.socials[0].external);
        assert_eq!(footer.resources.links[0].href, "/zh/blog");
        assert!(!footer.resources.links[0].external);
        assert_eq!(footer.contact.links[0].label, "London");
        assert_eq!(footer.contact.links[1].label, "Email me");
        assert_eq!(footer.legal[0].href, "/zh/privacy-policy");
        assert_eq!(footer.last_updated.as_deref(), Some("Last updated: 2025.3"));
        assert!(footer.copyright.ends_with("Ada Lovelace"));
    }

    #[test]
    fn repository_labels_use_the_path() {
        assert_eq!(
            repository_label("https://github.com/owner/folio"),
            "owner/folio"
        );
        assert_eq!(repository_label("not a url"), "not a url");
    }
}

//! Atom feed generation for the blog.
//!
//! The HTTP layer resolves the locale; this service only assembles XML.

use crate::{
    application::{
        dates::{rfc3339_date, rfc3339_now},
        locale::FeedRequestContext,
        site::SiteContext,
    },
    domain::locale::Locale,
};

pub const FEED_PATH: &str = "/api/feed/atom.xml";

/// Service for generating the Atom feed.
#[derive(Clone)]
pub struct SyndicationService {
    context: SiteContext,
}

impl SyndicationService {
    pub fn new(context: SiteContext) -> Self {
        Self { context }
    }

    /// Generate Atom 1.0 feed XML for the resolved locale.
    pub fn atom_feed(&self, request: &FeedRequestContext) -> String {
        let locale = &request.locale;
        let dictionary = self.context.dictionary(locale);

        let name = dictionary.text("name.full");
        let feed_title = format!("{} | {name}", dictionary.text("blog.title"));
        let subtitle = dictionary.text("headline").replace('\n', ", ");
        let blog_url = self.context.locale_url(locale, "/blog");
        let self_url = self.self_url(locale, request.explicitly_requested);
        let email = self
            .context
            .social_link(locale, "email")
            .map(|link| strip_mailto(&link.url).to_string())
            .unwrap_or_default();

        let mut entries = String::new();
        for post in self.context.site().list_posts(locale) {
            let post_url = self
                .context
                .locale_url(locale, &format!("/blog/{}", post.slug));
            let published = rfc3339_date(post.metadata.date);
            entries.push_str(&format!(
                "  <entry>\n    <title>{}</title>\n    <link href=\"{}\"/>\n    <id>{}</id>\n    <published>{}</published>\n    <updated>{}</updated>\n    {}\n    <summary>{}</summary>\n    <content type=\"html\">{}</content>\n  </entry>\n",
                xml_escape(&format!("{} | {name}", post.metadata.title)),
                xml_escape(&post_url),
                xml_escape(&post_url),
                published,
                published,
                author_element(&name, &email, "    "),
                xml_escape(&post.metadata.summary),
                xml_escape(&post.body_html),
            ));
        }

        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<feed xmlns=\"http://www.w3.org/2005/Atom\" xml:lang=\"{}\">\n  <title>{}</title>\n  <subtitle>{}</subtitle>\n  <link href=\"{}\" rel=\"self\"/>\n  <link href=\"{}\"/>\n  <id>{}</id>\n  {}\n  <updated>{}</updated>\n{}</feed>\n",
            locale,
            xml_escape(&feed_title),
            xml_escape(&subtitle),
            xml_escape(&self_url),
            xml_escape(&blog_url),
            xml_escape(&blog_url),
            author_element(&name, &email, "  "),
            rfc3339_now(),
            entries
        )
    }

    /// The default locale keeps the bare URL unless it was asked for by name.
    fn self_url(&self, locale: &Locale, explicit: bool) -> String {
        let mut url = self.context.absolute_url(FEED_PATH);
        if explicit || !self.context.locales().is_default(locale) {
            url.push_str(&format!("?locale={locale}"));
        }
        url
    }
}

fn author_element(name: &str, email: &str, indent: &str) -> String {
    format!(
        "<author>\n{indent}  <name>{}</name>\n{indent}  <email>{}</email>\n{indent}</author>",
        xml_escape(name),
        xml_escape(email),
    )
}

fn strip_mailto(url: &str) -> &str {
    url.get(..7)
        .filter(|prefix| prefix.eq_ignore_ascii_case("mailto:"))
        .map_or(url, |_| &url[7..])
}

pub(crate) fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping_covers_markup_and_quotes() {
        assert_eq!(
            xml_escape(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#039;s&lt;/a&gt;"
        );
    }

    #[test]
    fn mailto_prefix_is_removed_in_any_case() {
        assert_eq!(strip_mailto("mailto:ada@example.com"), "ada@example.com");
        assert_eq!(strip_mailto("MAILTO:ada@example.com"), "ada@example.com");
        assert_eq!(strip_mailto("ada@example.com"), "ada@example.com");
    }
}

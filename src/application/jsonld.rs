//! schema.org structured data for search engines.

use serde_json::{Map, Value, json};

use crate::{
    application::site::SiteContext,
    domain::{
        collections::{EducationItem, NavbarItem, WorkItem},
        locale::Locale,
        posts::Post,
    },
};

const CONTEXT: &str = "https://schema.org";
const EMAIL_NAME: &str = "Email";

/// Serialize for embedding inside `<script type="application/ld+json">`.
pub fn to_script(document: &Value) -> String {
    document
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn one_line_headline(context: &SiteContext, locale: &Locale) -> String {
    context
        .dictionary(locale)
        .text("headline")
        .replace('\n', ", ")
}

pub fn website(context: &SiteContext, locale: &Locale) -> Value {
    let dictionary = context.dictionary(locale);
    let url = context.locale_url(locale, "/");
    json!({
        "@context": CONTEXT,
        "@type": "WebSite",
        "name": dictionary.text("name.full"),
        "description": one_line_headline(context, locale),
        "url": url,
        "author": {
            "@type": "Person",
            "name": dictionary.text("name.full"),
            "url": url,
        },
    })
}

pub fn breadcrumbs(context: &SiteContext, locale: &Locale) -> Value {
    let items: Vec<NavbarItem> = context.dictionary(locale).list("navbar.items");
    let elements: Vec<Value> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "name": item.label,
                "item": context.locale_url(locale, &item.href),
            })
        })
        .collect();

    json!({
        "@context": CONTEXT,
        "@type": "BreadcrumbList",
        "itemListElement": elements,
    })
}

fn same_as(context: &SiteContext, locale: &Locale) -> Vec<String> {
    context
        .social_links(locale)
        .into_iter()
        .filter(|link| !link.url.is_empty() && link.name != EMAIL_NAME)
        .map(|link| link.url)
        .collect()
}

pub fn person(context: &SiteContext, locale: &Locale) -> Value {
    let dictionary = context.dictionary(locale);
    let settings = context.settings();

    let alumni: Vec<Value> = dictionary
        .collection::<EducationItem>("education")
        .into_iter()
        .map(|education| {
            json!({
                "@type": "EducationalOrganization",
                "name": education.school,
                "url": education.href,
            })
        })
        .collect();

    let mut person = Map::new();
    person.insert("@context".into(), json!(CONTEXT));
    person.insert("@type".into(), json!("Person"));
    person.insert("name".into(), json!(dictionary.text("name.full")));
    person.insert("givenName".into(), json!(dictionary.text("name.given")));
    person.insert("familyName".into(), json!(dictionary.text("name.family")));
    person.insert("alternateName".into(), json!(dictionary.text("name.full")));
    person.insert("description".into(), json!(one_line_headline(context, locale)));
    person.insert("url".into(), json!(context.locale_url(locale, "/")));
    person.insert(
        "image".into(),
        json!(format!("{}{}", context.base_url(), settings.avatar)),
    );
    if let Some(email) = context.social_link(locale, "email") {
        person.insert("email".into(), json!(email.url));
    }
    person.insert("sameAs".into(), json!(same_as(context, locale)));
    person.insert(
        "address".into(),
        json!({
            "@type": "PostalAddress",
            "addressLocality": dictionary.text("location.name"),
            "addressCountry": { "@type": "Country", "name": settings.country },
        }),
    );
    person.insert("alumniOf".into(), Value::Array(alumni));

    let skills = dictionary.strings("skills");
    if !skills.is_empty() {
        person.insert("knowsAbout".into(), json!(skills));
    }

    if let Some(current) = dictionary.collection::<WorkItem>("work").into_iter().next() {
        person.insert("jobTitle".into(), json!(current.title));
        person.insert(
            "worksFor".into(),
            json!({ "@type": "Organization", "name": current.company, "url": current.href }),
        );
        person.insert(
            "hasOccupation".into(),
            json!({
                "@type": "Occupation",
                "name": current.title,
                "description": current.description,
            }),
        );
    }

    Value::Object(person)
}

pub fn blog_list(context: &SiteContext, locale: &Locale, posts: &[&Post]) -> Value {
    let elements: Vec<Value> = posts
        .iter()
        .enumerate()
        .map(|(index, post)| {
            json!({
                "@type": "ListItem",
                "position": index + 1,
                "url": context.locale_url(locale, &format!("/blog/{}", post.slug)),
            })
        })
        .collect();

    json!({
        "@context": CONTEXT,
        "@type": "ItemList",
        "itemListElement": elements,
    })
}

pub fn blog_posting(context: &SiteContext, post: &Post) -> Value {
    let locale = &post.locale;
    let dictionary = context.dictionary(locale);
    let home = context.locale_url(locale, "/");
    let post_url = context.locale_url(locale, &format!("/blog/{}", post.slug));
    let image = match post.metadata.image.as_deref() {
        Some(image) if image.starts_with("http://") || image.starts_with("https://") => {
            image.to_string()
        }
        Some(image) => format!("{}{}", context.base_url(), image),
        None => format!("{post_url}/opengraph-image"),
    };

    json!({
        "@context": CONTEXT,
        "@type": "BlogPosting",
        "headline": post.metadata.title,
        "datePublished": post.metadata.date.to_string(),
        "dateModified": post.metadata.last_modified().to_string(),
        "description": post.metadata.summary,
        "image": image,
        "url": post_url,
        "author": {
            "@type": "Person",
            "name": dictionary.text("name.full"),
            "url": home,
            "sameAs": same_as(context, locale),
        },
        "publisher": {
            "@type": "Person",
            "name": dictionary.text("name.full"),
            "url": home,
        },
        "mainEntityOfPage": { "@type": "WebPage", "@id": post_url },
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::application::site::testing::site_context;

    fn context() -> SiteContext {
        site_context(json!({
            "name": { "full": "Ada Lovelace", "given": "Ada", "family": "Lovelace" },
            "headline": "Analyst\nWriter",
            "location": { "name": "London" },
            "skills": ["Mathematics"],
            "social": {
                "GitHub": { "name": "GitHub", "url": "https://github.com/ada", "icon": "github" },
                "email": { "name": "Email", "url": "mailto:ada@example.com", "icon": "email" },
            },
            "navbar": { "items": [
                { "href": "/", "icon": "home", "label": "Home" },
                { "href": "/blog", "icon": "notebook", "label": "Blog" },
            ] },
            "work": { "items": [
                { "company": "Engine Co", "href": "https://engine.example", "title": "Analyst",
                  "start": "1842", "description": "Notes" },
            ] },
            "education": { "items": [
                { "school": "Home School", "degree": "Maths", "start": "1830", "end": "1835" },
            ] },
        }))
    }

    #[test]
    fn person_describes_the_owner() {
        let context = context();
        let zh = context.locales().get("zh").expect("zh").clone();
        let person = person(&context, &zh);

        assert_eq!(person["description"], "Analyst, Writer");
        assert_eq!(person["url"], "https://example.com/zh");
        assert_eq!(person["image"], "https://example.com/me.png");
        assert_eq!(person["email"], "mailto:ada@example.com");
        assert_eq!(person["sameAs"], json!(["https://github.com/ada"]));
        assert_eq!(person["address"]["addressCountry"]["name"], "Singapore");
        assert_eq!(person["worksFor"]["name"], "Engine Co");
        assert_eq!(person["hasOccupation"]["name"], "Analyst");
        assert_eq!(person["knowsAbout"], json!(["Mathematics"]));
        assert_eq!(person["alumniOf"][0]["name"], "Home School");
    }

    #[test]
    fn breadcrumbs_follow_navbar_items() {
        let context = context();
        let zh = context.locales().get("zh").expect("zh").clone();
        let list = breadcrumbs(&context, &zh);

        assert_eq!(list["itemListElement"][0]["position"], 1);
        assert_eq!(list["itemListElement"][1]["item"], "https://example.com/zh/blog");
    }

    #[test]
    fn scripts_cannot_close_their_tag() {
        let script = to_script(&json!({ "headline": "</script><b>" }));
        assert!(!script.contains('<'));
        assert!(script.contains("\\u003c/script\\u003e"));
    }
}

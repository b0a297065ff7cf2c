//! Loads the content directory into an immutable [`Site`] snapshot.
//!
//! Layout:
//!
//! ```text
//! {root}/messages/{locale}/common.json
//! {root}/messages/{locale}/personal.json
//! {root}/messages/{locale}/collections.json
//! {root}/blog/{locale}/{slug}.md
//! {root}/public/...
//! ```
//!
//! Posts open with a TOML front matter block fenced by `+++` lines.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use once_cell::sync::Lazy;
use thiserror::Error;
use time::{Date, Month, macros::format_description};
use tokio::fs;
use tracing::{debug, info};

use crate::{
    application::{
        render::{RenderError, RenderRequest, RenderService, render_service},
        toc::extract_toc,
    },
    domain::{
        dictionary::Dictionary,
        locale::{Locale, LocaleSet},
        posts::{Post, PostMetadata, PostStatus},
        slug::{SlugError, validate_post_slug},
    },
};

const SOURCE: &str = "folio::application::content";
const MESSAGE_FILES: [&str; 3] = ["common.json", "personal.json", "collections.json"];
const FRONT_MATTER_FENCE: &str = "+++";

static EMPTY_DICTIONARY: Lazy<Dictionary> = Lazy::new(Dictionary::new);

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to read `{path}`")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("`{path}` is not valid JSON")]
    Messages {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("no message files found for locale `{locale}`")]
    NoMessages { locale: String },
    #[error("`{path}` has no `+++` front matter block")]
    MissingFrontMatter { path: PathBuf },
    #[error("`{path}` has malformed front matter")]
    FrontMatter {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("`{path}` is missing front matter field `{field}`")]
    MissingField { path: PathBuf, field: &'static str },
    #[error("`{path}` has invalid `{field}` value `{value}`")]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        value: String,
    },
    #[error("`{path}` has an invalid file name")]
    Slug {
        path: PathBuf,
        #[source]
        source: SlugError,
    },
    #[error("failed to render `{path}`")]
    Render {
        path: PathBuf,
        #[source]
        source: RenderError,
    },
}

/// Everything the server renders, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Site {
    locales: LocaleSet,
    dictionaries: HashMap<Locale, Dictionary>,
    posts: HashMap<Locale, Vec<Post>>,
    public_dir: PathBuf,
}

impl Site {
    pub fn new(
        locales: LocaleSet,
        dictionaries: HashMap<Locale, Dictionary>,
        posts: HashMap<Locale, Vec<Post>>,
        public_dir: PathBuf,
    ) -> Self {
        let mut posts = posts;
        for list in posts.values_mut() {
            sort_posts(list);
        }
        Self {
            locales,
            dictionaries,
            posts,
            public_dir,
        }
    }

    /// Read and render the whole content directory.
    pub async fn load(
        root: &Path,
        locales: LocaleSet,
        public_site_url: &str,
    ) -> Result<Self, ContentError> {
        let mut dictionaries = HashMap::new();
        let mut posts = HashMap::new();

        for locale in locales.iter() {
            let dictionary = load_dictionary(root, locale).await?;
            let locale_posts = load_posts(root, locale, public_site_url).await?;
            info!(
                target = SOURCE,
                locale = %locale,
                posts = locale_posts.len(),
                "content loaded"
            );
            dictionaries.insert(locale.clone(), dictionary);
            posts.insert(locale.clone(), locale_posts);
        }

        Ok(Self::new(locales, dictionaries, posts, root.join("public")))
    }

    pub fn locales(&self) -> &LocaleSet {
        &self.locales
    }

    pub fn public_dir(&self) -> &Path {
        &self.public_dir
    }

    /// The dictionary for `locale`; an empty one if the locale is not loaded.
    pub fn dictionary(&self, locale: &Locale) -> &Dictionary {
        self.dictionaries.get(locale).unwrap_or(&EMPTY_DICTIONARY)
    }

    /// Published posts for `locale`, newest first.
    pub fn list_posts(&self, locale: &Locale) -> Vec<&Post> {
        self.posts
            .get(locale)
            .map(|posts| posts.iter().filter(|post| post.is_published()).collect())
            .unwrap_or_default()
    }

    /// A single post by slug. Drafts are reachable by direct link.
    pub fn post(&self, slug: &str, locale: &Locale) -> Option<&Post> {
        self.posts
            .get(locale)?
            .iter()
            .find(|post| post.slug == slug)
    }

    /// Locales, in configured order, that carry a post with `slug`.
    pub fn available_locales(&self, slug: &str) -> Vec<&Locale> {
        self.locales
            .iter()
            .filter(|locale| self.post(slug, locale).is_some())
            .collect()
    }

    pub fn post_count(&self) -> usize {
        self.posts.values().map(Vec::len).sum()
    }
}

fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        b.metadata
            .date
            .cmp(&a.metadata.date)
            .then_with(|| a.slug.cmp(&b.slug))
    });
}

async fn load_dictionary(root: &Path, locale: &Locale) -> Result<Dictionary, ContentError> {
    let directory = root.join("messages").join(locale.as_str());
    let mut dictionary = Dictionary::new();
    let mut found = 0usize;

    for name in MESSAGE_FILES {
        let path = directory.join(name);
        let raw = match fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(target = SOURCE, path = %path.display(), "message file absent");
                continue;
            }
            Err(source) => return Err(ContentError::Io { path, source }),
        };
        let value = serde_json::from_str(&raw)
            .map_err(|source| ContentError::Messages { path: path.clone(), source })?;
        dictionary.merge(value);
        found += 1;
    }

    if found == 0 {
        return Err(ContentError::NoMessages {
            locale: locale.to_string(),
        });
    }

    Ok(dictionary)
}

async fn load_posts(
    root: &Path,
    locale: &Locale,
    public_site_url: &str,
) -> Result<Vec<Post>, ContentError> {
    let directory = root.join("blog").join(locale.as_str());
    let mut entries = match fs::read_dir(&directory).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(ContentError::Io {
                path: directory,
                source,
            });
        }
    };

    let mut paths = Vec::new();
    loop {
        let entry = entries.next_entry().await.map_err(|source| ContentError::Io {
            path: directory.clone(),
            source,
        })?;
        let Some(entry) = entry else { break };
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("md") {
            paths.push(path);
        }
    }
    paths.sort();

    let mut posts = Vec::with_capacity(paths.len());
    for path in paths {
        let raw = fs::read_to_string(&path)
            .await
            .map_err(|source| ContentError::Io {
                path: path.clone(),
                source,
            })?;
        posts.push(parse_post(&path, &raw, locale, public_site_url)?);
    }

    Ok(posts)
}

/// Parse and render one post file.
pub fn parse_post(
    path: &Path,
    raw: &str,
    locale: &Locale,
    public_site_url: &str,
) -> Result<Post, ContentError> {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    let slug = validate_post_slug(stem)
        .map_err(|source| ContentError::Slug {
            path: path.to_path_buf(),
            source,
        })?
        .to_string();

    let (front_matter, body) = split_front_matter(raw).ok_or_else(|| {
        ContentError::MissingFrontMatter {
            path: path.to_path_buf(),
        }
    })?;
    let metadata = parse_metadata(path, front_matter)?;

    let request = RenderRequest::new(body).with_public_site_url(public_site_url);
    let output = render_service()
        .render(&request)
        .map_err(|source| ContentError::Render {
            path: path.to_path_buf(),
            source,
        })?;
    let toc = extract_toc(&output.html).map_err(|source| ContentError::Render {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(Post {
        slug,
        locale: locale.clone(),
        metadata,
        reading_minutes: output.content_metrics.reading_time_minutes,
        body_html: output.html,
        toc,
    })
}

fn split_front_matter(raw: &str) -> Option<(&str, &str)> {
    let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
    let rest = raw.trim_start().strip_prefix(FRONT_MATTER_FENCE)?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == FRONT_MATTER_FENCE {
            let front_matter = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Some((front_matter, body));
        }
        offset += line.len();
    }
    None
}

fn parse_metadata(path: &Path, front_matter: &str) -> Result<PostMetadata, ContentError> {
    let table: toml::Table = toml::from_str(front_matter).map_err(|source| {
        ContentError::FrontMatter {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let text = |field: &'static str| -> Result<Option<String>, ContentError> {
        match table.get(field) {
            None => Ok(None),
            Some(toml::Value::String(value)) => Ok(Some(value.trim().to_string())),
            Some(other) => Err(ContentError::InvalidField {
                path: path.to_path_buf(),
                field,
                value: other.to_string(),
            }),
        }
    };
    let required = |field: &'static str| -> Result<String, ContentError> {
        text(field)?
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ContentError::MissingField {
                path: path.to_path_buf(),
                field,
            })
    };
    let date = |field: &'static str| -> Result<Option<Date>, ContentError> {
        table
            .get(field)
            .map(|value| {
                parse_date(value).ok_or_else(|| ContentError::InvalidField {
                    path: path.to_path_buf(),
                    field,
                    value: value.to_string(),
                })
            })
            .transpose()
    };

    let status = match text("status")?.as_deref() {
        None | Some("published") => PostStatus::Published,
        Some("draft") => PostStatus::Draft,
        Some(other) => {
            return Err(ContentError::InvalidField {
                path: path.to_path_buf(),
                field: "status",
                value: other.to_string(),
            });
        }
    };

    Ok(PostMetadata {
        title: required("title")?,
        date: date("date")?.ok_or_else(|| ContentError::MissingField {
            path: path.to_path_buf(),
            field: "date",
        })?,
        summary: required("summary")?,
        image: text("image")?.filter(|value| !value.is_empty()),
        status,
        updated_at: date("updated_at")?,
    })
}

fn parse_date(value: &toml::Value) -> Option<Date> {
    match value {
        toml::Value::Datetime(datetime) => {
            let date = datetime.date?;
            let month = Month::try_from(date.month).ok()?;
            Date::from_calendar_date(i32::from(date.year), month, date.day).ok()
        }
        toml::Value::String(text) => {
            let text = text.trim();
            let day = text.get(..10).unwrap_or(text);
            Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use super::*;

    fn english() -> Locale {
        LocaleSet::new(["en"], "en")
            .expect("locales")
            .default_locale()
            .clone()
    }

    const POST: &str = "+++\ntitle = \"Hello & welcome\"\ndate = 2025-01-02\nsummary = \"First post\"\nupdated_at = \"2025-02-03\"\n+++\n\n## Intro\n\nSome words here.\n";

    #[test]
    fn parses_front_matter_and_renders_body() {
        let post = parse_post(Path::new("blog/en/hello-world.md"), POST, &english(), "https://example.com")
            .expect("post");

        assert_eq!(post.slug, "hello-world");
        assert_eq!(post.metadata.title, "Hello & welcome");
        assert_eq!(post.metadata.date, date!(2025 - 01 - 02));
        assert_eq!(post.metadata.updated_at, Some(date!(2025 - 02 - 03)));
        assert_eq!(post.metadata.status, PostStatus::Published);
        assert_eq!(post.reading_minutes, 1);
        assert!(post.body_html.contains(r#"<h2 id="intro">"#));
        assert_eq!(post.toc.len(), 1);
    }

    #[test]
    fn missing_summary_names_the_file() {
        let raw = "+++\ntitle = \"T\"\ndate = 2025-01-02\n+++\nbody";
        let err = parse_post(Path::new("blog/en/t.md"), raw, &english(), "")
            .expect_err("summary is required");
        assert!(matches!(err, ContentError::MissingField { field: "summary", .. }));
        assert!(err.to_string().contains("blog/en/t.md"));
    }

    #[test]
    fn rejects_files_without_front_matter() {
        let err = parse_post(Path::new("blog/en/t.md"), "# Just markdown", &english(), "")
            .expect_err("front matter is required");
        assert!(matches!(err, ContentError::MissingFrontMatter { .. }));
    }

    #[test]
    fn rejects_unknown_status() {
        let raw = "+++\ntitle = \"T\"\ndate = 2025-01-02\nsummary = \"S\"\nstatus = \"hidden\"\n+++\nbody";
        let err = parse_post(Path::new("blog/en/t.md"), raw, &english(), "")
            .expect_err("status must be known");
        assert!(matches!(err, ContentError::InvalidField { field: "status", .. }));
    }

    #[test]
    fn split_handles_crlf() {
        let (front, body) = split_front_matter("+++\r\ntitle = \"x\"\r\n+++\r\nbody").expect("split");
        assert_eq!(front, "title = \"x\"\r\n");
        assert_eq!(body, "body");
    }
}

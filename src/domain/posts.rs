use serde::Deserialize;
use time::Date;

use super::locale::Locale;

/// Publication state declared in a post's front matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Published,
    Draft,
}

#[derive(Debug, Clone)]
pub struct PostMetadata {
    pub title: String,
    pub date: Date,
    pub summary: String,
    pub image: Option<String>,
    pub status: PostStatus,
    pub updated_at: Option<Date>,
}

impl PostMetadata {
    /// Date used for `lastmod` and `dateModified`.
    pub fn last_modified(&self) -> Date {
        self.updated_at.unwrap_or(self.date)
    }
}

/// A heading extracted from rendered post HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub id: String,
    pub text: String,
    pub level: u8,
}

/// A fully rendered blog post. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Post {
    pub slug: String,
    pub locale: Locale,
    pub metadata: PostMetadata,
    pub reading_minutes: u32,
    pub body_html: String,
    pub toc: Vec<TocEntry>,
}

impl Post {
    pub fn is_published(&self) -> bool {
        self.metadata.status == PostStatus::Published
    }
}

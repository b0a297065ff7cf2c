//! Typed list data decoded from translation dictionaries.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct NewsItem {
    pub date: String,
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectLink {
    #[serde(rename = "type")]
    pub kind: String,
    pub href: String,
    #[serde(default)]
    pub icon: String,
}

/// A project or publication card.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectItem {
    pub title: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub dates: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub technologies: Vec<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub links: Vec<ProjectLink>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationItem {
    pub school: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub logo_url: String,
    pub degree: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub location: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    pub company: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub badges: Vec<String>,
    #[serde(default)]
    pub location: String,
    pub title: String,
    #[serde(default)]
    pub logo_url: String,
    pub start: String,
    #[serde(default)]
    pub end: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AwardItem {
    pub year: u32,
    pub title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TeachingItem {
    pub date: String,
    pub title: String,
    pub location: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TalkItem {
    pub host: String,
    pub url: String,
    pub date: String,
    pub title: String,
    #[serde(default)]
    pub logo_url: Option<String>,
}

/// A social profile; the flags select where it is displayed.
#[derive(Debug, Clone, Deserialize)]
pub struct SocialLink {
    /// The key the link is stored under in the `social` object.
    #[serde(skip)]
    pub id: String,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub navbar: bool,
    #[serde(default)]
    pub content: bool,
    #[serde(default)]
    pub footer: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NavbarItem {
    pub href: String,
    #[serde(default)]
    pub icon: String,
    pub label: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FooterLink {
    pub name: String,
    pub url: String,
}

/// One section of a legal page.
#[derive(Debug, Clone, Deserialize)]
pub struct LegalSection {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub note: Option<String>,
}

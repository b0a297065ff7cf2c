//! The closed set of icons that content may reference by key.

use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Globe,
    Github,
    Paper,
    BookOpen,
    Newspaper,
    Email,
    LinkedIn,
    X,
    Youtube,
    GoogleScholar,
    Home,
    Notebook,
    FileUser,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown icon key `{0}`")]
pub struct UnknownIcon(pub String);

impl FromStr for Icon {
    type Err = UnknownIcon;

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        let icon = match key.trim() {
            "globe" => Icon::Globe,
            "github" => Icon::Github,
            "paper" => Icon::Paper,
            "bookopen" | "bookOpen" | "book-open" => Icon::BookOpen,
            "newspaper" => Icon::Newspaper,
            "email" => Icon::Email,
            "linkedin" => Icon::LinkedIn,
            "x" => Icon::X,
            "youtube" => Icon::Youtube,
            "googleScholar" | "google-scholar" => Icon::GoogleScholar,
            "home" => Icon::Home,
            "notebook" => Icon::Notebook,
            "fileUser" | "file-user" => Icon::FileUser,
            other => return Err(UnknownIcon(other.to_string())),
        };
        Ok(icon)
    }
}

impl Icon {
    pub fn key(self) -> &'static str {
        match self {
            Icon::Globe => "globe",
            Icon::Github => "github",
            Icon::Paper => "paper",
            Icon::BookOpen => "book-open",
            Icon::Newspaper => "newspaper",
            Icon::Email => "email",
            Icon::LinkedIn => "linkedin",
            Icon::X => "x",
            Icon::Youtube => "youtube",
            Icon::GoogleScholar => "google-scholar",
            Icon::Home => "home",
            Icon::Notebook => "notebook",
            Icon::FileUser => "file-user",
        }
    }

    /// Inner SVG markup drawn on a 24x24 stroke canvas.
    fn paths(self) -> &'static str {
        match self {
            Icon::Globe => {
                r#"<circle cx="12" cy="12" r="10"/><path d="M2 12h20"/><path d="M12 2a15.3 15.3 0 0 1 4 10 15.3 15.3 0 0 1-4 10 15.3 15.3 0 0 1-4-10 15.3 15.3 0 0 1 4-10z"/>"#
            }
            Icon::Github => {
                r#"<path d="M15 22v-4a4.8 4.8 0 0 0-1-3.5c3 0 6-2 6-5.5.08-1.25-.27-2.48-1-3.5.28-1.15.28-2.35 0-3.5 0 0-1 0-3 1.5-2.64-.5-5.36-.5-8 0C6 2 5 2 5 2c-.3 1.15-.3 2.35 0 3.5A5.4 5.4 0 0 0 4 9c0 3.5 3 5.5 6 5.5-.39.49-.68 1.05-.85 1.65S8.93 17.38 9 18v4"/><path d="M9 18c-4.51 2-5-2-7-2"/>"#
            }
            Icon::Paper => {
                r#"<path d="M14 2H6a2 2 0 0 0-2 2v16a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2V8z"/><path d="M14 2v6h6"/><path d="M16 13H8"/><path d="M16 17H8"/><path d="M10 9H8"/>"#
            }
            Icon::BookOpen => {
                r#"<path d="M2 3h6a4 4 0 0 1 4 4v14a3 3 0 0 0-3-3H2z"/><path d="M22 3h-6a4 4 0 0 0-4 4v14a3 3 0 0 1 3-3h7z"/>"#
            }
            Icon::Newspaper => {
                r#"<path d="M4 22h16a2 2 0 0 0 2-2V4a2 2 0 0 0-2-2H8a2 2 0 0 0-2 2v16a2 2 0 0 1-2 2zm0 0a2 2 0 0 1-2-2v-9c0-1.1.9-2 2-2h2"/><path d="M18 14h-8"/><path d="M15 18h-5"/><path d="M10 6h8v4h-8z"/>"#
            }
            Icon::Email => {
                r#"<rect width="20" height="16" x="2" y="4" rx="2"/><path d="m22 7-8.97 5.7a1.94 1.94 0 0 1-2.06 0L2 7"/>"#
            }
            Icon::LinkedIn => {
                r#"<path d="M16 8a6 6 0 0 1 6 6v7h-4v-7a2 2 0 0 0-2-2 2 2 0 0 0-2 2v7h-4v-7a6 6 0 0 1 6-6z"/><rect width="4" height="12" x="2" y="9"/><circle cx="4" cy="4" r="2"/>"#
            }
            Icon::X => r#"<path d="M4 4l16 16"/><path d="M20 4 4 20"/>"#,
            Icon::Youtube => {
                r#"<path d="M2.5 17a24.12 24.12 0 0 1 0-10 2 2 0 0 1 1.4-1.4 49.56 49.56 0 0 1 16.2 0A2 2 0 0 1 21.5 7a24.12 24.12 0 0 1 0 10 2 2 0 0 1-1.4 1.4 49.55 49.55 0 0 1-16.2 0A2 2 0 0 1 2.5 17"/><path d="m10 15 5-3-5-3z"/>"#
            }
            Icon::GoogleScholar => {
                r#"<path d="M22 10 12 5 2 10l10 5 10-5z"/><path d="M6 12v5c3 3 9 3 12 0v-5"/>"#
            }
            Icon::Home => {
                r#"<path d="m3 9 9-7 9 7v11a2 2 0 0 1-2 2H5a2 2 0 0 1-2-2z"/><path d="M9 22V12h6v10"/>"#
            }
            Icon::Notebook => {
                r#"<path d="M2 6h4"/><path d="M2 10h4"/><path d="M2 14h4"/><path d="M2 18h4"/><rect width="16" height="20" x="4" y="2" rx="2"/><path d="M16 2v20"/>"#
            }
            Icon::FileUser => {
                r#"<path d="M14 2H6a2 2 0 0 0-2 2v16a2 2 0 0 0 2 2h12a2 2 0 0 0 2-2V8z"/><path d="M14 2v6h6"/><path d="M16 22a4 4 0 0 0-8 0"/><circle cx="12" cy="15" r="3"/>"#
            }
        }
    }

    /// A standalone inline `<svg>` element with the given CSS class.
    pub fn svg(self, class: &str) -> String {
        format!(
            r#"<svg class="icon icon-{key} {class}" xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="none" stroke="currentColor" stroke-width="2" stroke-linecap="round" stroke-linejoin="round" aria-hidden="true">{paths}</svg>"#,
            key = self.key(),
            paths = self.paths(),
        )
    }
}

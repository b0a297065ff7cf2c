//! Supported locales and the "as-needed" path prefix convention.
//!
//! The default locale is served from unprefixed paths (`/blog`), every other
//! supported locale lives under `/{tag}` (`/zh/blog`).

use std::fmt;

use super::error::DomainError;

/// A language tag drawn from the configured supported set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locale(String);

impl Locale {
    fn new(tag: &str) -> Self {
        Self(tag.trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short label shown on the locale toggle.
    pub fn toggle_label(&self) -> String {
        match self.0.as_str() {
            "en" => "En".to_string(),
            "zh" => "中".to_string(),
            other => {
                let mut chars = other.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        }
    }

    /// Region-qualified tag used for `hreflang` and `og:locale`.
    pub fn region_tag(&self) -> String {
        match self.0.as_str() {
            "en" => "en-US".to_string(),
            "zh" => "zh-CN".to_string(),
            other => other.to_string(),
        }
    }

    pub fn date_style(&self) -> DateStyle {
        match self.0.as_str() {
            "zh" => DateStyle::Chinese,
            _ => DateStyle::English,
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Calendar rendering family for a locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    English,
    Chinese,
}

/// The configured supported locales with exactly one default.
#[derive(Debug, Clone)]
pub struct LocaleSet {
    locales: Vec<Locale>,
    default: Locale,
}

impl LocaleSet {
    pub fn new<I, S>(tags: I, default: &str) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut locales: Vec<Locale> = Vec::new();
        for tag in tags {
            let locale = Locale::new(tag.as_ref());
            if locale.0.is_empty() {
                return Err(DomainError::validation("locale tags must not be empty"));
            }
            if locale.0.contains('/') {
                return Err(DomainError::validation(format!(
                    "locale tag `{locale}` must not contain `/`"
                )));
            }
            if !locales.contains(&locale) {
                locales.push(locale);
            }
        }

        if locales.is_empty() {
            return Err(DomainError::validation(
                "at least one supported locale is required",
            ));
        }

        let default = Locale::new(default);
        if !locales.contains(&default) {
            return Err(DomainError::validation(format!(
                "default locale `{default}` is not in the supported set"
            )));
        }

        Ok(Self { locales, default })
    }

    pub fn default_locale(&self) -> &Locale {
        &self.default
    }

    pub fn is_default(&self, locale: &Locale) -> bool {
        locale == &self.default
    }

    pub fn iter(&self) -> impl Iterator<Item = &Locale> {
        self.locales.iter()
    }

    /// Look up a supported locale by tag, ignoring ASCII case.
    pub fn get(&self, tag: &str) -> Option<&Locale> {
        let needle = tag.trim();
        self.locales
            .iter()
            .find(|locale| locale.0.eq_ignore_ascii_case(needle))
    }

    /// The locale the toggle switches to: the next one in configured order.
    pub fn next_after(&self, locale: &Locale) -> &Locale {
        let position = self
            .locales
            .iter()
            .position(|candidate| candidate == locale)
            .unwrap_or(0);
        &self.locales[(position + 1) % self.locales.len()]
    }

    /// Prefix `path` for `locale` using the as-needed convention.
    pub fn localized_path(&self, locale: &Locale, path: &str) -> String {
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };

        if self.is_default(locale) {
            return path;
        }

        if path == "/" {
            format!("/{locale}")
        } else {
            format!("/{locale}{path}")
        }
    }
}

//! Slugs for post identifiers and heading anchors.
//!
//! Chinese text is transliterated through `pinyin` before `slug` folds it to
//! ASCII, so a heading such as “基线对齐” anchors as `ji-xian-dui-qi`.

use std::collections::HashMap;

use pinyin::ToPinyin;
use slug::slugify;
use thiserror::Error;

const FALLBACK_ANCHOR: &str = "section";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SlugError {
    #[error("slug source text is empty")]
    EmptyInput,
    #[error("failed to derive slug from `{input}`")]
    Unrepresentable { input: String },
    #[error("`{input}` is not a valid post slug")]
    Malformed { input: String },
}

/// Derive a lowercase, hyphen-separated slug from human-readable text.
pub fn derive_slug(input: &str) -> Result<String, SlugError> {
    if input.trim().is_empty() {
        return Err(SlugError::EmptyInput);
    }

    let slug = slugify(transliterate(input));
    if slug.is_empty() {
        return Err(SlugError::Unrepresentable {
            input: input.to_string(),
        });
    }

    Ok(slug)
}

/// Check that a post file stem is already in canonical slug form.
pub fn validate_post_slug(input: &str) -> Result<&str, SlugError> {
    let canonical = !input.is_empty()
        && !input.starts_with('-')
        && !input.ends_with('-')
        && !input.contains("--")
        && input
            .chars()
            .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');

    if canonical {
        Ok(input)
    } else {
        Err(SlugError::Malformed {
            input: input.to_string(),
        })
    }
}

/// Hands out heading anchors that are unique within one document.
///
/// Repeated headings get `-2`, `-3`, ... suffixes; headings that produce no
/// slug at all share the `section` base.
#[derive(Debug, Default)]
pub struct AnchorSlugger {
    seen: HashMap<String, usize>,
}

impl AnchorSlugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anchor_for(&mut self, heading: &str) -> String {
        let base = derive_slug(heading).unwrap_or_else(|_| FALLBACK_ANCHOR.to_string());
        let count = self.seen.entry(base.clone()).or_insert(0);
        *count += 1;

        match *count {
            1 => base,
            n => format!("{base}-{n}"),
        }
    }
}

fn transliterate(input: &str) -> String {
    let mut output = String::with_capacity(input.len());

    for ch in input.chars() {
        if ch.is_ascii() {
            output.push(ch);
            continue;
        }

        match ch.to_pinyin() {
            Some(syllable) => {
                if !output.is_empty() && !output.ends_with(' ') {
                    output.push(' ');
                }
                output.push_str(syllable.plain());
                output.push(' ');
            }
            None if ch.is_whitespace() => output.push(' '),
            None => output.push(ch),
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transliterates_mixed_text() {
        assert_eq!(
            derive_slug("Rust 基础教程").expect("slug"),
            "rust-ji-chu-jiao-cheng"
        );
    }

    #[test]
    fn rejects_blank_input() {
        assert_eq!(derive_slug("   "), Err(SlugError::EmptyInput));
    }

    #[test]
    fn anchors_are_suffixed_on_repeat() {
        let mut slugger = AnchorSlugger::new();
        assert_eq!(slugger.anchor_for("Overview"), "overview");
        assert_eq!(slugger.anchor_for("Overview"), "overview-2");
        assert_eq!(slugger.anchor_for("深入理解"), "shen-ru-li-jie");
        assert_eq!(slugger.anchor_for("!!!"), "section");
        assert_eq!(slugger.anchor_for("???"), "section-2");
    }

    #[test]
    fn post_slugs_must_be_canonical() {
        assert_eq!(validate_post_slug("hello-world"), Ok("hello-world"));
        assert!(validate_post_slug("Hello World").is_err());
        assert!(validate_post_slug("trailing-").is_err());
        assert!(validate_post_slug("").is_err());
    }
}

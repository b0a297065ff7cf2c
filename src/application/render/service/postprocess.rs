use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

use lol_html::{RewriteStrSettings, element, rewrite_str, text};
use tracing::debug;

use crate::application::render::types::{ContentMetrics, RenderError};

use super::headings::HeadingInfo;

const WORDS_PER_MINUTE: f32 = 225.0;

#[derive(Default, Clone)]
struct AugmentState {
    next_heading: usize,
    word_count: u32,
}

pub(crate) struct ProcessedHtml {
    pub(crate) html: String,
    pub(crate) content_metrics: ContentMetrics,
}

/// Apply heading ids and link attributes, then count what the reader will see.
pub(crate) fn post_process(
    sanitized_html: &str,
    headings: &[HeadingInfo],
    public_site_url: Option<&str>,
) -> Result<ProcessedHtml, RenderError> {
    let state = Rc::new(RefCell::new(AugmentState::default()));
    let headings = Rc::new(headings.to_vec());

    let rewritten = rewrite_str(
        sanitized_html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("h1, h2, h3, h4, h5, h6", {
                    let state = Rc::clone(&state);
                    let headings = Rc::clone(&headings);
                    move |el| {
                        let level = el
                            .tag_name()
                            .strip_prefix('h')
                            .and_then(|value| value.parse::<u8>().ok())
                            .unwrap_or(0);
                        let mut state = state.borrow_mut();
                        match headings.get(state.next_heading) {
                            Some(info) if info.level == level => {
                                el.set_attribute("id", &info.slug)?;
                                state.next_heading += 1;
                            }
                            _ => {
                                // Raw HTML headings have no Markdown counterpart.
                                debug!(
                                    target = "folio::application::render",
                                    level, "heading left without anchor"
                                );
                            }
                        }
                        Ok(())
                    }
                }),
                element!("a[href]", move |el| {
                    let href = el.get_attribute("href").unwrap_or_default();
                    if classify_link(&href, public_site_url) == LinkKind::External {
                        let rel_value =
                            merge_rel(el.get_attribute("rel"), &["noopener", "noreferrer"]);
                        el.set_attribute("rel", &rel_value)?;
                        el.set_attribute("target", "_blank")?;
                    }
                    Ok(())
                }),
                element!("img", |el| {
                    if el.get_attribute("alt").is_none() {
                        el.set_attribute("alt", "")?;
                    }
                    if el.get_attribute("loading").is_none() {
                        el.set_attribute("loading", "lazy")?;
                    }
                    if el.get_attribute("decoding").is_none() {
                        el.set_attribute("decoding", "async")?;
                    }
                    Ok(())
                }),
                text!("*", {
                    let state = Rc::clone(&state);
                    move |t| {
                        let words = t.as_str().split_whitespace().count() as u32;
                        if words > 0 {
                            let mut state = state.borrow_mut();
                            state.word_count = state.word_count.saturating_add(words);
                        }
                        Ok(())
                    }
                }),
            ],
            ..RewriteStrSettings::default()
        },
    )
    .map_err(|err| RenderError::Document {
        message: err.to_string(),
    })?;

    let state = state.borrow().clone();
    Ok(ProcessedHtml {
        html: rewritten,
        content_metrics: build_content_metrics(&state),
    })
}

fn build_content_metrics(state: &AugmentState) -> ContentMetrics {
    ContentMetrics {
        word_count: state.word_count,
        reading_time_minutes: reading_time_minutes(state.word_count),
    }
}

/// Minutes at 225 words per minute, rounded up, never below one.
pub(crate) fn reading_time_minutes(word_count: u32) -> u32 {
    let minutes = (word_count as f32 / WORDS_PER_MINUTE).ceil() as u32;
    minutes.max(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LinkKind {
    Internal,
    External,
    Anchor,
    Other,
}

fn classify_link(href: &str, public_site_url: Option<&str>) -> LinkKind {
    if href.starts_with('#') || href.is_empty() {
        return LinkKind::Anchor;
    }

    if is_external_http_url(href) {
        let same_origin = public_site_url.is_some_and(|site| href.starts_with(site));
        return if same_origin {
            LinkKind::Internal
        } else {
            LinkKind::External
        };
    }

    if is_internal_path(href) {
        return LinkKind::Internal;
    }

    LinkKind::Other
}

fn is_internal_path(href: &str) -> bool {
    href.starts_with('/')
        || href.starts_with("./")
        || href.starts_with("../")
        || (!href.contains(':') && !href.starts_with("//"))
}

fn is_external_http_url(value: &str) -> bool {
    value.starts_with("http://") || value.starts_with("https://")
}

fn merge_rel(existing: Option<String>, required: &[&str]) -> String {
    let mut tokens: BTreeSet<String> = existing
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    for &token in required {
        tokens.insert(token.to_string());
    }
    tokens.into_iter().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reading_time_rounds_up_with_floor_of_one() {
        assert_eq!(reading_time_minutes(0), 1);
        assert_eq!(reading_time_minutes(225), 1);
        assert_eq!(reading_time_minutes(226), 2);
    }

    #[test]
    fn classifies_links_against_site_origin() {
        let site = Some("https://example.com/");
        assert_eq!(
            classify_link("https://example.com/blog", site),
            LinkKind::Internal
        );
        assert_eq!(
            classify_link("https://rust-lang.org", site),
            LinkKind::External
        );
        assert_eq!(classify_link("#intro", site), LinkKind::Anchor);
        assert_eq!(classify_link("mailto:me@example.com", site), LinkKind::Other);
    }

    #[test]
    fn merge_rel_keeps_existing_tokens() {
        assert_eq!(
            merge_rel(Some("me".to_string()), &["noopener", "noreferrer"]),
            "me noopener noreferrer"
        );
    }
}

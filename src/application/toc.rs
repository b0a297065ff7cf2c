//! Table-of-contents extraction from rendered post HTML.

use std::{cell::RefCell, rc::Rc};

use lol_html::{RewriteStrSettings, element, rewrite_str, text};

use crate::{application::render::RenderError, domain::posts::TocEntry};

const HEADINGS: &str = "h1, h2, h3, h4, h5, h6";

#[derive(Default)]
struct Collector {
    entries: Vec<TocEntry>,
    current: Option<usize>,
}

/// Collect every heading that has an `id` and visible text, in document order.
pub fn extract_toc(html: &str) -> Result<Vec<TocEntry>, RenderError> {
    let collector = Rc::new(RefCell::new(Collector::default()));

    rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!(HEADINGS, {
                    let collector = Rc::clone(&collector);
                    move |el| {
                        let level = el
                            .tag_name()
                            .strip_prefix('h')
                            .and_then(|value| value.parse::<u8>().ok())
                            .unwrap_or(0);
                        let mut collector = collector.borrow_mut();
                        let current = match el.get_attribute("id") {
                            Some(id) if !id.trim().is_empty() => {
                                collector.entries.push(TocEntry {
                                    id,
                                    text: String::new(),
                                    level,
                                });
                                Some(collector.entries.len() - 1)
                            }
                            _ => None,
                        };
                        collector.current = current;
                        Ok(())
                    }
                }),
                text!(HEADINGS, {
                    let collector = Rc::clone(&collector);
                    move |chunk| {
                        let mut collector = collector.borrow_mut();
                        if let Some(index) = collector.current {
                            collector.entries[index].text.push_str(chunk.as_str());
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

    let entries = std::mem::take(&mut collector.borrow_mut().entries);
    Ok(entries
        .into_iter()
        .filter_map(|entry| {
            let text = decode_entities(entry.text.trim());
            let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
            (!text.is_empty()).then_some(TocEntry { text, ..entry })
        })
        .collect())
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_identified_headings_with_text() {
        let html = r#"
            <h1 id="intro">Intro</h1>
            <h2>No id</h2>
            <h2 id="empty">   </h2>
            <h3 id="deep">Deep <code>dive</code></h3>
            <h2 id="qa">Q&amp;A &lt;live&gt;</h2>
        "#;

        let toc = extract_toc(html).expect("toc");
        assert_eq!(
            toc,
            vec![
                TocEntry {
                    id: "intro".to_string(),
                    text: "Intro".to_string(),
                    level: 1
                },
                TocEntry {
                    id: "deep".to_string(),
                    text: "Deep dive".to_string(),
                    level: 3
                },
                TocEntry {
                    id: "qa".to_string(),
                    text: "Q&A <live>".to_string(),
                    level: 2
                },
            ]
        );
    }

    #[test]
    fn no_headings_means_empty_toc() {
        assert!(extract_toc("<p>Just prose</p>").expect("toc").is_empty());
    }
}

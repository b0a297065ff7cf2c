use comrak::nodes::{AstNode, NodeValue};

use crate::domain::slug::AnchorSlugger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HeadingInfo {
    pub(crate) level: u8,
    pub(crate) slug: String,
}

/// Walk the Markdown AST and allocate a unique anchor for every heading.
pub(crate) fn collect_headings<'a>(root: &'a AstNode<'a>) -> Vec<HeadingInfo> {
    let mut slugger = AnchorSlugger::new();
    root.descendants()
        .filter_map(|node| {
            let level = heading_level(node)?;
            let text = collect_inline_text(node);
            let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
            Some(HeadingInfo {
                level,
                slug: slugger.anchor_for(&normalized),
            })
        })
        .collect()
}

fn heading_level(node: &AstNode<'_>) -> Option<u8> {
    let data = node.data.borrow();
    if let NodeValue::Heading(heading) = &data.value {
        Some(heading.level)
    } else {
        None
    }
}

fn collect_inline_text(node: &AstNode<'_>) -> String {
    fn walk(node: &AstNode<'_>, buffer: &mut String) {
        {
            let data = node.data.borrow();
            match &data.value {
                NodeValue::Text(text) => buffer.push_str(text),
                NodeValue::Code(code) => buffer.push_str(&code.literal),
                NodeValue::LineBreak | NodeValue::SoftBreak => buffer.push(' '),
                _ => {}
            }
        }
        let mut child = node.first_child();
        while let Some(next) = child {
            walk(next, buffer);
            child = next.next_sibling();
        }
    }

    let mut text = String::new();
    let mut child = node.first_child();
    while let Some(next) = child {
        walk(next, &mut text);
        child = next.next_sibling();
    }
    text
}

#[cfg(test)]
mod tests {
    use comrak::{Arena, parse_document};

    use super::*;
    use crate::application::render::service::config::default_options;

    #[test]
    fn headings_get_unique_anchors_in_order() {
        let arena = Arena::new();
        let markdown = "# Intro\n\n## Setup `cargo`\n\ntext\n\n## Setup `cargo`\n\n### 总结\n";
        let root = parse_document(&arena, markdown, &default_options());

        let headings = collect_headings(root);
        let slugs: Vec<_> = headings
            .iter()
            .map(|heading| (heading.level, heading.slug.as_str()))
            .collect();

        assert_eq!(
            slugs,
            vec![
                (1, "intro"),
                (2, "setup-cargo"),
                (2, "setup-cargo-2"),
                (3, "zong-jie"),
            ]
        );
    }
}

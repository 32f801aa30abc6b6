use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use htmd::{
    Element,
    element_handler::{HandlerResult, Handlers},
};
use markup5ever_rcdom::{Node, NodeData};

use crate::assets::AssetResolver;

/// Converts an item's HTML body to Markdown, saving its images through `resolver`.
///
/// Every distinct image `src` is resolved once, in document order, before the
/// body is rendered so that the Markdown links to the local copies.
pub async fn html_to_markdown(html: &str, resolver: &impl AssetResolver) -> String {
    let mut images: HashMap<String, String> = HashMap::new();

    for src in image_sources(html) {
        if images.contains_key(&src) {
            continue;
        }

        let resolved = if src.is_empty() {
            String::new()
        } else {
            resolver.resolve(&src).await
        };
        images.insert(src, resolved);
    }

    render(html, images)
}

fn image_sources(html: &str) -> Vec<String> {
    let fragment = scraper::Html::parse_fragment(html);
    let Ok(img_selector) = scraper::Selector::parse("img") else {
        return Vec::new();
    };

    fragment
        .select(&img_selector)
        .map(|img| img.value().attr("src").unwrap_or_default().to_string())
        .collect()
}

/// Renders HTML to Markdown, linking images to the names in `images`.
pub fn render(html: &str, images: HashMap<String, String>) -> String {
    let scope = CitationScope::default();
    let anchor_scope = scope.clone();
    let item_scope = scope;

    htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style"])
        .options(htmd::options::Options {
            heading_style: htmd::options::HeadingStyle::Atx,
            bullet_list_marker: htmd::options::BulletListMarker::Asterisk,
            code_block_style: htmd::options::CodeBlockStyle::Fenced,
            code_block_fence: htmd::options::CodeBlockFence::Backticks,
            ..Default::default()
        })
        .add_handler(vec!["img"], move |_handlers: &dyn Handlers, element: Element| {
            let alt = attr(&element, "alt").unwrap_or_default();
            let src = attr(&element, "src").unwrap_or_default();
            let target = images.get(&src).cloned().unwrap_or(src);

            Some(HandlerResult {
                content: format!("![{alt}]({target})"),
                markdown_translated: true,
            })
        })
        .add_handler(vec!["a"], move |handlers: &dyn Handlers, element: Element| {
            convert_anchor(handlers, element, &anchor_scope)
        })
        .add_handler(vec!["li"], move |handlers: &dyn Handlers, element: Element| {
            if !contains_back_anchor(element.node) {
                return handlers.fallback(element);
            }

            item_scope.enter();
            let content = handlers.walk_children(element.node).content;
            item_scope.exit();

            translated(back_link_item(&content))
        })
        .add_handler(vec!["ol", "ul"], convert_list)
        .build()
        .convert(html)
        .unwrap_or_default()
}

fn convert_anchor(
    handlers: &dyn Handlers,
    element: Element,
    scope: &CitationScope,
) -> Option<HandlerResult> {
    let href = attr(&element, "href");
    let is_back = attr(&element, "aria-label").as_deref() == Some("back");

    let content = handlers.walk_children(element.node).content;
    let (prefix, suffix, text) = chomp(&content);
    if text.is_empty() {
        return translated(String::new());
    }

    if attr(&element, "aria-labelledby").is_some_and(|label| label.contains("ref")) {
        return translated(format!("{prefix}{}{suffix}", footnote_reference(text)));
    }

    let is_reference_back_link = attr(&element, "data-reference-link").is_some()
        || attr(&element, "class").is_some_and(|class| {
            class
                .split_whitespace()
                .any(|c| c == "ReferenceList-backLink")
        });
    if is_reference_back_link {
        return translated(footnote_definition(href.as_deref().unwrap_or_default()));
    }

    if is_back && scope.inside_item() {
        return translated(String::new());
    }

    let title = attr(&element, "title");
    translated(link(prefix, text, suffix, href.as_deref(), title.as_deref()))
}

/// Lists holding citation entries are written out as plain lines, since a
/// numbered marker in front of `[^1]: ` would turn the footnote definition into
/// an ordinary list item. Other lists keep the default rendering.
fn convert_list(handlers: &dyn Handlers, element: Element) -> Option<HandlerResult> {
    let node = element.node;
    let has_citations = node.children.borrow().iter().any(|child| is_citation_item(child));
    if !has_citations {
        return handlers.fallback(element);
    }

    let mut index = attr(&element, "start")
        .and_then(|start| start.parse::<usize>().ok())
        .unwrap_or(1)
        .max(1);

    let mut content = String::new();
    for child in node.children.borrow().iter() {
        if !is_element(child, "li") {
            continue;
        }

        let Some(result) = handlers.handle(child) else {
            continue;
        };

        if is_citation_item(child) {
            content.push_str(&result.content);
        } else if element.tag == "ol" {
            let spacing = handlers.options().ol_number_spacing.into();
            content.push_str(&ordered_item(index, spacing, &result.content));
            index += 1;
        } else {
            content.push_str(result.content.trim_matches('\n'));
            content.push('\n');
        }
    }

    let content = content.trim_matches('\n');
    if content.trim().is_empty() {
        return None;
    }

    translated(format!("\n\n{content}\n\n"))
}

/// Numbers an `ol` entry the way the default list rendering would.
fn ordered_item(index: usize, spacing: usize, content: &str) -> String {
    let marker = format!("{index}.{}", " ".repeat(spacing));
    let indent = " ".repeat(marker.len());
    let body = content
        .trim()
        .lines()
        .collect::<Vec<_>>()
        .join(&format!("\n{indent}"));

    format!("{marker}{body}\n")
}

fn translated(content: String) -> Option<HandlerResult> {
    Some(HandlerResult {
        content,
        markdown_translated: true,
    })
}

fn attr(element: &Element, name: &str) -> Option<String> {
    element
        .attrs
        .iter()
        .find(|a| a.name.local.to_string() == name)
        .map(|a| a.value.to_string())
}

/// Splits surrounding whitespace off inline text, keeping one space on each
/// side where there was any so `a <b>word</b>` doesn't collapse into `a**word**`.
pub fn chomp(text: &str) -> (&'static str, &'static str, &str) {
    let prefix = if text.starts_with(char::is_whitespace) { " " } else { "" };
    let suffix = if text.ends_with(char::is_whitespace) { " " } else { "" };
    (prefix, suffix, text.trim())
}

/// `[1]` becomes the footnote reference `[^1]`.
pub fn footnote_reference(text: &str) -> String {
    text.replace("\\[", "[")
        .replace("\\]", "]")
        .replacen('[', "[^", 1)
}

/// Opens the footnote definition a citation back-link points at.
///
/// The platform's back-links look like `#ref_1_0`, the footnote number sits at offset 5.
pub fn footnote_definition(href: &str) -> String {
    let number = href.chars().nth(5).map(String::from).unwrap_or_default();
    format!("[^{number}]: ")
}

/// A citation list entry: just its text, the back-link itself is dropped.
pub fn back_link_item(content: &str) -> String {
    format!("{}\n", content.trim())
}

fn link(prefix: &str, text: &str, suffix: &str, href: Option<&str>, title: Option<&str>) -> String {
    let Some(href) = href.filter(|h| !h.is_empty()) else {
        return format!("{prefix}{text}{suffix}");
    };

    if title.is_none() && text.replace("\\_", "_") == href {
        return format!("{prefix}<{href}>{suffix}");
    }

    match title {
        Some(title) => format!(
            "{prefix}[{text}]({href} \"{}\"){suffix}",
            title.replace('"', "\\\"")
        ),
        None => format!("{prefix}[{text}]({href}){suffix}"),
    }
}

fn is_element(node: &Node, tag: &str) -> bool {
    matches!(&node.data, NodeData::Element { name, .. } if &*name.local == tag)
}

fn is_citation_item(node: &Node) -> bool {
    is_element(node, "li") && contains_back_anchor(node)
}

/// Whether an `aria-label="back"` anchor sits anywhere below `node`.
fn contains_back_anchor(node: &Node) -> bool {
    node.children.borrow().iter().any(|child| {
        let is_back = match &child.data {
            NodeData::Element { name, attrs, .. } => {
                &*name.local == "a"
                    && attrs
                        .borrow()
                        .iter()
                        .any(|a| &*a.name.local == "aria-label" && &*a.value == "back")
            }
            _ => false,
        };

        is_back || contains_back_anchor(child)
    })
}

/// Counts how many citation entries enclose the node being rendered.
#[derive(Clone, Default)]
struct CitationScope {
    depth: Arc<AtomicUsize>,
}

impl CitationScope {
    fn enter(&self) {
        self.depth.fetch_add(1, Ordering::SeqCst);
    }

    fn exit(&self) {
        self.depth.fetch_sub(1, Ordering::SeqCst);
    }

    fn inside_item(&self) -> bool {
        self.depth.load(Ordering::SeqCst) > 0
    }
}

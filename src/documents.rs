use crate::assets::AssetResolver;
use crate::models::{ContentItem, ContentKind};
use crate::parsers::{front_matter, html_to_markdown};

/// Builds the complete Markdown document for an item: front matter, title heading and body.
pub async fn assemble(item: &ContentItem, resolver: &impl AssetResolver) -> String {
    let body = if let Some(html) = item.body() {
        html_to_markdown(html, resolver).await
    } else if item.kind == ContentKind::ZVideo {
        format!("[{}]({})", item.url, item.url)
    } else {
        String::new()
    };

    let mut document = front_matter(item);
    document.push('\n');
    if let Some(title) = item.title() {
        document.push_str(&format!("# {title}\n\n"));
    }
    document.push_str(&body);
    document
}

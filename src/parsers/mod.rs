mod frontmatter;
mod html;

pub use frontmatter::front_matter;
pub use html::html_to_markdown;

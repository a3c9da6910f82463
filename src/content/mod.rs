//! Content module - handles posts and content processing

mod frontmatter;
mod loader;
mod markdown;
mod normalize;
mod post;

pub use frontmatter::FrontMatter;
pub use loader::{
    ContentAsset, ContentError, ContentSource, DirectorySource, EmbeddedSource, PostRepository,
};
pub use markdown::{MarkdownRenderer, RenderedDocument};
pub use normalize::{normalize, Normalizer};
pub use post::{Author, Feed, OgImage, Post};

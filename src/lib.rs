//! inkfeed: a markdown blog content pipeline
//!
//! Posts are markdown files with YAML front-matter. They are discovered in a
//! content directory, normalized so code samples stay browser-safe, sorted
//! newest first and rendered to highlighted HTML, optionally tagged for a
//! scroll-reveal animation.

pub mod commands;
pub mod config;
pub mod content;
pub mod helpers;
pub mod render;
pub mod reveal;

use anyhow::Result;
use std::path::{Path, PathBuf};

use content::{DirectorySource, MarkdownRenderer, PostRepository};

/// The main blog application
#[derive(Debug, Clone)]
pub struct Blog {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Directory holding the markdown posts
    pub content_dir: PathBuf,
}

impl Blog {
    /// Create a new blog instance from a directory
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let config = if config_path.exists() {
            config::SiteConfig::load(&config_path)?
        } else {
            config::SiteConfig::default()
        };

        let content_dir = base_dir.join(&config.content_dir);

        Ok(Self {
            config,
            base_dir,
            content_dir,
        })
    }

    /// Repository over the content directory
    pub fn repository(&self) -> PostRepository<DirectorySource> {
        PostRepository::new(DirectorySource::new(&self.content_dir))
            .with_sanitize(self.config.render.sanitize_env_refs)
    }

    /// Renderer configured from `render:` in the site config
    pub fn renderer(&self) -> MarkdownRenderer {
        MarkdownRenderer::with_options(self.config.render.clone())
    }
}

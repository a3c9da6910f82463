//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::reveal::{RevealError, RevealOptions, RootMargin};

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub description: String,
    pub author: String,

    // URL
    /// Deployment base path; root-relative asset paths resolve under it
    pub base_path: String,

    // Directory
    /// Directory holding the markdown posts, relative to the site directory
    pub content_dir: String,

    // Date format used when listing posts
    pub date_format: String,

    // Rendering
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub reveal: RevealConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            description: String::new(),
            author: "Anonymous".to_string(),

            base_path: "/".to_string(),

            content_dir: "_posts".to_string(),

            date_format: "%Y-%m-%d".to_string(),

            render: RenderConfig::default(),
            reveal: RevealConfig::default(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        tracing::debug!("Loaded site config from {:?}", path.as_ref());
        Ok(config)
    }
}

/// Markdown renderer configuration
///
/// Built once and handed to each renderer instance; there is no
/// process-wide parser state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Rewrite server-only references in code samples
    pub sanitize_env_refs: bool,
    /// Tag top-level blocks for scroll-reveal
    pub enable_reveal_animation: bool,
    /// Language class used when a fence has no known language
    pub highlight_fallback_language: String,
    /// Render single newlines as `<br />`
    pub line_breaks: bool,
    /// Stagger between consecutive revealed blocks
    pub reveal_delay_step_ms: u64,
    /// syntect theme used for the highlighting stylesheet
    pub highlight_theme: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sanitize_env_refs: true,
            enable_reveal_animation: false,
            highlight_fallback_language: "plaintext".to_string(),
            line_breaks: true,
            reveal_delay_step_ms: 100,
            highlight_theme: "InspiredGitHub".to_string(),
        }
    }
}

/// Scroll-reveal observer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealConfig {
    pub threshold: f64,
    pub root_margin: String,
    pub trigger_once: bool,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: "0px".to_string(),
            trigger_once: true,
        }
    }
}

impl RevealConfig {
    /// Validate into observer options
    pub fn options(&self) -> Result<RevealOptions, RevealError> {
        RevealOptions::new(
            self.threshold,
            self.root_margin.parse::<RootMargin>()?,
            self.trigger_once,
        )
    }
}

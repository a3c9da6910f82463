//! Markdown rendering with syntax highlighting

use anyhow::{anyhow, Result};
use pulldown_cmark::{
    html, BlockQuoteKind, CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd,
};
use std::borrow::Cow;
use syntect::highlighting::ThemeSet;
use syntect::html::{css_for_theme_with_class_style, ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use super::normalize::Normalizer;
use crate::config::RenderConfig;
use crate::helpers::{attr, html_escape};
use crate::reveal::{RevealTarget, REVEAL_CLASS};

/// Heading attribute that overrides the computed reveal delay
const DELAY_ATTR: &str = "data-delay";

/// HTML plus the blocks tagged for scroll-reveal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedDocument {
    pub html: String,
    /// Empty unless reveal annotation is enabled
    pub reveal_targets: Vec<RevealTarget>,
}

/// Markdown renderer with syntax highlighting
///
/// Each instance owns its syntax definitions and options; nothing is shared
/// between renderers.
pub struct MarkdownRenderer {
    syntax_set: SyntaxSet,
    theme_set: ThemeSet,
    options: RenderConfig,
    normalizer: Normalizer,
}

impl MarkdownRenderer {
    /// Create a new markdown renderer
    pub fn new() -> Self {
        Self::with_options(RenderConfig::default())
    }

    /// Create with custom settings
    pub fn with_options(options: RenderConfig) -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme_set: ThemeSet::load_defaults(),
            options,
            normalizer: Normalizer::new(),
        }
    }

    pub fn options(&self) -> &RenderConfig {
        &self.options
    }

    /// Render markdown to HTML
    pub fn render(&self, markdown: &str) -> String {
        self.render_document(markdown).html
    }

    /// Render markdown with this renderer's options
    pub fn render_document(&self, markdown: &str) -> RenderedDocument {
        self.render_with(markdown, &self.options)
    }

    /// Render markdown with explicit options
    pub fn render_with(&self, markdown: &str, options: &RenderConfig) -> RenderedDocument {
        let parser_options = Options::ENABLE_TABLES
            | Options::ENABLE_FOOTNOTES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_HEADING_ATTRIBUTES
            | Options::ENABLE_GFM;
        let parser = Parser::new_ext(markdown, parser_options);

        let mut events: Vec<Event> = Vec::new();
        let mut reveal = RevealTagger::new(options);
        let mut code_block: Option<CodeBlock> = None;
        let mut depth = 0usize;

        for event in parser {
            if code_block.is_some() {
                match event {
                    Event::Text(text) => {
                        if let Some(block) = code_block.as_mut() {
                            block.content.push_str(&text);
                        }
                    }
                    Event::End(TagEnd::CodeBlock) => {
                        depth -= 1;
                        if let Some(block) = code_block.take() {
                            let html = self.code_block_html(block, &mut reveal, options);
                            events.push(Event::Html(CowStr::from(html)));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    code_block = Some(CodeBlock {
                        lang: match kind {
                            CodeBlockKind::Fenced(info) => fence_language(&info),
                            CodeBlockKind::Indented => None,
                        },
                        content: String::new(),
                        top_level: depth == 0,
                    });
                    depth += 1;
                }
                Event::Start(tag) => {
                    let top_level = depth == 0;
                    depth += 1;
                    match top_level.then(|| reveal.open_tag(&tag)).flatten() {
                        Some(open) => events.push(Event::Html(CowStr::from(open))),
                        None => events.push(Event::Start(tag)),
                    }
                }
                Event::End(tag) => {
                    depth = depth.saturating_sub(1);
                    events.push(Event::End(tag));
                }
                Event::SoftBreak if options.line_breaks => events.push(Event::HardBreak),
                other => events.push(other),
            }
        }

        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        RenderedDocument {
            html: html_output,
            reveal_targets: reveal.targets,
        }
    }

    fn code_block_html(
        &self,
        block: CodeBlock,
        reveal: &mut RevealTagger,
        options: &RenderConfig,
    ) -> String {
        let reveal_attrs = if block.top_level {
            reveal.tag("pre", None, &[])
        } else {
            String::new()
        };
        let (lang, highlighted) =
            self.highlight_code(&block.content, block.lang.as_deref(), options);
        format!(
            "<pre{}><code class=\"language-{}\">{}</code></pre>\n",
            reveal_attrs,
            html_escape(&lang),
            highlighted
        )
    }

    /// Highlight a code block, returning the language class and inner HTML
    fn highlight_code(
        &self,
        code: &str,
        lang: Option<&str>,
        options: &RenderConfig,
    ) -> (String, String) {
        // Highlighting sees the raw block text, so rewrite it again here
        let code = if options.sanitize_env_refs {
            self.normalizer.normalize(code)
        } else {
            Cow::Borrowed(code)
        };

        if let Some(lang) = lang {
            match self.find_syntax(lang) {
                Some(syntax) => match self.classed_html(&code, syntax) {
                    Ok(highlighted) => return (lang.to_string(), highlighted),
                    Err(e) => {
                        tracing::warn!(
                            "Failed to highlight {} code block, rendering as plain text: {}",
                            lang,
                            e
                        );
                    }
                },
                None => tracing::debug!("No syntax for language {:?}, using plain text", lang),
            }
        }

        (
            options.highlight_fallback_language.clone(),
            html_escape(&code),
        )
    }

    fn find_syntax(&self, lang: &str) -> Option<&SyntaxReference> {
        self.syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
    }

    fn classed_html(&self, code: &str, syntax: &SyntaxReference) -> Result<String, syntect::Error> {
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &self.syntax_set, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            generator.parse_html_for_line_which_includes_newline(line)?;
        }
        Ok(generator.finalize())
    }

    /// Stylesheet for the class names emitted by highlighted code blocks
    pub fn stylesheet(&self, theme: Option<&str>) -> Result<String> {
        let name = theme.unwrap_or(&self.options.highlight_theme);
        let theme = self.theme_set.themes.get(name).ok_or_else(|| {
            let mut known: Vec<&str> = self.theme_set.themes.keys().map(String::as_str).collect();
            known.sort_unstable();
            anyhow!(
                "Unknown highlight theme: {}. Available: {}",
                name,
                known.join(", ")
            )
        })?;
        Ok(css_for_theme_with_class_style(theme, ClassStyle::Spaced)?)
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct CodeBlock {
    lang: Option<String>,
    content: String,
    top_level: bool,
}

/// First word of a fence info string (`rust,ignore` and `js title=x` both
/// name their language first)
fn fence_language(info: &str) -> Option<String> {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

/// Numbers top-level blocks and writes their reveal attributes
struct RevealTagger {
    enabled: bool,
    step_ms: u64,
    targets: Vec<RevealTarget>,
}

impl RevealTagger {
    fn new(options: &RenderConfig) -> Self {
        Self {
            enabled: options.enable_reveal_animation,
            step_ms: options.reveal_delay_step_ms,
            targets: Vec::new(),
        }
    }

    /// Register the next block and return its attributes
    fn tag(&mut self, tag: &'static str, delay_override: Option<u64>, classes: &[&str]) -> String {
        if !self.enabled {
            return String::new();
        }

        let id = self.targets.len();
        let delay_ms = delay_override.unwrap_or(id as u64 * self.step_ms);
        self.targets.push(RevealTarget { id, tag, delay_ms });

        let mut class = REVEAL_CLASS.to_string();
        for extra in classes {
            class.push(' ');
            class.push_str(extra);
        }
        format!(
            "{}{}{}",
            attr("class", &class),
            attr(DELAY_ATTR, &delay_ms.to_string()),
            attr("style", &format!("transition-delay: {}ms", delay_ms))
        )
    }

    /// Opening HTML for a revealable top-level block, `None` to leave the
    /// tag to the default writer
    fn open_tag(&mut self, tag: &Tag) -> Option<String> {
        if !self.enabled {
            return None;
        }

        match tag {
            Tag::Paragraph => Some(format!("<p{}>", self.tag("p", None, &[]))),
            Tag::Heading {
                level,
                id,
                classes,
                attrs,
            } => {
                let name = heading_tag(*level);
                let delay_override = attrs
                    .iter()
                    .find(|(key, _)| &**key == DELAY_ATTR)
                    .and_then(|(_, value)| value.as_ref())
                    .and_then(|value| value.parse::<u64>().ok());
                let classes: Vec<&str> = classes.iter().map(|c| &**c).collect();

                let mut open = format!("<{}", name);
                if let Some(id) = id {
                    open.push_str(&attr("id", id));
                }
                open.push_str(&self.tag(name, delay_override, &classes));
                for (key, value) in attrs.iter().filter(|(key, _)| &**key != DELAY_ATTR) {
                    match value {
                        Some(value) => open.push_str(&attr(key, value)),
                        None => {
                            open.push(' ');
                            open.push_str(&html_escape(key));
                        }
                    }
                }
                open.push('>');
                Some(open)
            }
            Tag::BlockQuote(kind) => {
                let classes: Vec<&str> = kind.as_ref().map(alert_class).into_iter().collect();
                Some(format!(
                    "<blockquote{}>\n",
                    self.tag("blockquote", None, &classes)
                ))
            }
            Tag::List(Some(1)) => Some(format!("<ol{}>\n", self.tag("ol", None, &[]))),
            Tag::List(Some(start)) => Some(format!(
                "<ol start=\"{}\"{}>\n",
                start,
                self.tag("ol", None, &[])
            )),
            Tag::List(None) => Some(format!("<ul{}>\n", self.tag("ul", None, &[]))),
            _ => None,
        }
    }
}

fn heading_tag(level: HeadingLevel) -> &'static str {
    match level {
        HeadingLevel::H1 => "h1",
        HeadingLevel::H2 => "h2",
        HeadingLevel::H3 => "h3",
        HeadingLevel::H4 => "h4",
        HeadingLevel::H5 => "h5",
        HeadingLevel::H6 => "h6",
    }
}

fn alert_class(kind: &BlockQuoteKind) -> &'static str {
    match kind {
        BlockQuoteKind::Note => "markdown-alert-note",
        BlockQuoteKind::Tip => "markdown-alert-tip",
        BlockQuoteKind::Important => "markdown-alert-important",
        BlockQuoteKind::Warning => "markdown-alert-warning",
        BlockQuoteKind::Caution => "markdown-alert-caution",
    }
}

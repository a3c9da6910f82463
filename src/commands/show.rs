//! Show a single post

use anyhow::Result;
use std::sync::Arc;

use crate::content::{MarkdownRenderer, Post, RenderedDocument};
use crate::helpers;
use crate::render::{RenderSlot, RenderState};
use crate::reveal::{
    ElementId, IntersectionEntry, Observer, Rect, RevealChange, RevealController, RevealOptions,
    RevealTarget,
};
use crate::Blog;

/// Width of the simulated viewport for the reveal preview
const PREVIEW_WIDTH: f64 = 800.0;

/// Height given to every block in the reveal preview
const PREVIEW_BLOCK_HEIGHT: f64 = 120.0;

/// Print a post, or a not-found notice
pub async fn run(blog: &Blog, identifier: &str, reveal: bool, viewport_height: f64) -> Result<()> {
    print!("{}", page(blog, identifier, reveal, viewport_height).await?);
    Ok(())
}

/// The detail page for `identifier` as text
pub async fn page(
    blog: &Blog,
    identifier: &str,
    reveal: bool,
    viewport_height: f64,
) -> Result<String> {
    let Some(post) = blog.repository().get_by_identifier(identifier)? else {
        return Ok(not_found(blog, identifier));
    };

    let mut config = blog.config.render.clone();
    config.enable_reveal_animation |= reveal;
    let renderer = Arc::new(MarkdownRenderer::with_options(config));

    let slot = RenderSlot::new(renderer);
    slot.render(&post.identifier, post.body.clone()).await;

    let mut out = header(blog, &post);
    match slot.state() {
        RenderState::Ready { document, .. } => {
            out.push('\n');
            out.push_str(&document.html);
            if reveal {
                let options = blog.config.reveal.options()?;
                out.push('\n');
                out.push_str(&reveal_summary(&document, options, viewport_height));
            }
        }
        RenderState::Failed { message, .. } => {
            out.push('\n');
            out.push_str(&message);
            out.push('\n');
        }
        RenderState::Idle | RenderState::Rendering { .. } => {}
    }
    slot.leave();

    Ok(out)
}

/// Shown when no post has the requested identifier
pub fn not_found(blog: &Blog, identifier: &str) -> String {
    format!(
        "Post not found: {}\nBack to posts: {}\n",
        identifier,
        helpers::home_url(&blog.config.base_path)
    )
}

fn header(blog: &Blog, post: &Post) -> String {
    let base_path = &blog.config.base_path;
    let mut out = format!(
        "{}\n{} by {}\n",
        post.title,
        helpers::display_date(&post.date, &blog.config.date_format),
        post.author.name
    );
    if let Some(cover) = post.cover_image_url(base_path) {
        out.push_str(&format!("Cover: {}\n", cover));
    }
    if !post.excerpt.is_empty() {
        out.push_str(&format!("{}\n", post.excerpt));
    }
    out
}

/// Logs observer registrations
#[derive(Debug, Default)]
struct LogObserver;

impl Observer for LogObserver {
    fn observe(&mut self, target: ElementId) {
        tracing::debug!("Observing block {}", target);
    }

    fn unobserve(&mut self, target: ElementId) {
        tracing::debug!("Released block {}", target);
    }
}

/// Which blocks are revealed on load when stacked in a viewport
pub fn preview_reveal(
    targets: &[RevealTarget],
    options: RevealOptions,
    viewport_height: f64,
) -> Vec<RevealChange> {
    let viewport = Rect::new(0.0, 0.0, PREVIEW_WIDTH, viewport_height);
    let margin = options.root_margin;
    let mut controller = RevealController::attach(targets, options, LogObserver);

    for (index, target) in targets.iter().enumerate() {
        let bounds = Rect::new(
            0.0,
            index as f64 * PREVIEW_BLOCK_HEIGHT,
            PREVIEW_WIDTH,
            PREVIEW_BLOCK_HEIGHT,
        );
        controller.enqueue(IntersectionEntry::measure(
            target.id, bounds, viewport, &margin,
        ));
    }

    controller.flush_frame()
}

fn reveal_summary(document: &RenderedDocument, options: RevealOptions, viewport_height: f64) -> String {
    let targets = &document.reveal_targets;
    let changes = preview_reveal(targets, options, viewport_height);

    let mut out = format!(
        "Reveal: {} blocks, {} visible on load\n",
        targets.len(),
        changes.len()
    );
    for change in &changes {
        let tag = targets
            .iter()
            .find(|t| t.id == change.target)
            .map(|t| t.tag)
            .unwrap_or("?");
        out.push_str(&format!(
            "  #{} <{}> after {}ms\n",
            change.target, tag, change.delay_ms
        ));
    }
    out
}

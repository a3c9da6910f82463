//! Article rendering for the post detail view
//!
//! A [`RenderSlot`] stands for the one container a detail view renders
//! into. Every request takes a ticket; a completion is only committed while
//! its ticket is the newest one, so a slow render for a post the reader has
//! already left can never overwrite the current article.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::task::{self, JoinError};

use crate::content::{MarkdownRenderer, RenderedDocument};

/// Shown in place of the article when rendering fails
pub const RENDER_FAILED_MESSAGE: &str = "Sorry, this article could not be rendered.";

/// Errors from a render task
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render task failed: {0}")]
    Worker(#[from] JoinError),
}

/// What the article container currently shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderState {
    Idle,
    Rendering {
        identifier: String,
    },
    Ready {
        identifier: String,
        document: RenderedDocument,
    },
    Failed {
        identifier: String,
        message: String,
    },
}

/// Proof of a render request, checked when its result comes back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTicket {
    generation: u64,
    identifier: String,
}

impl RenderTicket {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

#[derive(Debug)]
struct Slot {
    generation: u64,
    state: RenderState,
}

/// Render target for one detail view
#[derive(Clone)]
pub struct RenderSlot {
    renderer: Arc<MarkdownRenderer>,
    inner: Arc<Mutex<Slot>>,
}

impl RenderSlot {
    pub fn new(renderer: Arc<MarkdownRenderer>) -> Self {
        Self {
            renderer,
            inner: Arc::new(Mutex::new(Slot {
                generation: 0,
                state: RenderState::Idle,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> RenderState {
        self.lock().state.clone()
    }

    /// Start a request, superseding any earlier one
    pub fn begin(&self, identifier: &str) -> RenderTicket {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.state = RenderState::Rendering {
            identifier: identifier.to_string(),
        };
        RenderTicket {
            generation: slot.generation,
            identifier: identifier.to_string(),
        }
    }

    pub fn is_current(&self, ticket: &RenderTicket) -> bool {
        self.lock().generation == ticket.generation
    }

    /// Commit a result if its ticket is still the newest
    ///
    /// Returns whether the result was committed. Failures are logged and
    /// turned into [`RenderState::Failed`].
    pub fn complete(
        &self,
        ticket: RenderTicket,
        result: Result<RenderedDocument, RenderError>,
    ) -> bool {
        let mut slot = self.lock();
        if slot.generation != ticket.generation {
            tracing::debug!("Discarding stale render of {}", ticket.identifier);
            return false;
        }

        slot.state = match result {
            Ok(document) => RenderState::Ready {
                identifier: ticket.identifier,
                document,
            },
            Err(e) => {
                tracing::error!("Failed to render {}: {}", ticket.identifier, e);
                RenderState::Failed {
                    identifier: ticket.identifier,
                    message: RENDER_FAILED_MESSAGE.to_string(),
                }
            }
        };
        true
    }

    /// Leave the view: pending results are ignored from now on
    pub fn leave(&self) {
        let mut slot = self.lock();
        slot.generation += 1;
        slot.state = RenderState::Idle;
    }

    /// Render a post body off the async runtime and commit it
    ///
    /// Returns whether this render's result is the one now displayed.
    pub async fn render(&self, identifier: &str, body: String) -> bool {
        let ticket = self.begin(identifier);
        let renderer = Arc::clone(&self.renderer);
        let result = task::spawn_blocking(move || renderer.render_document(&body))
            .await
            .map_err(RenderError::from);
        self.complete(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot() -> RenderSlot {
        RenderSlot::new(Arc::new(MarkdownRenderer::new()))
    }

    fn document(html: &str) -> RenderedDocument {
        RenderedDocument {
            html: html.to_string(),
            reveal_targets: Vec::new(),
        }
    }

    async fn join_error() -> JoinError {
        tokio::spawn(async { panic!("renderer panicked") })
            .await
            .unwrap_err()
    }

    #[tokio::test]
    async fn test_render_commits_html() {
        let slot = slot();
        assert_eq!(slot.state(), RenderState::Idle);

        assert!(slot.render("hello", "# Title\n\nBody text".to_string()).await);
        match slot.state() {
            RenderState::Ready {
                identifier,
                document,
            } => {
                assert_eq!(identifier, "hello");
                assert!(document.html.contains("<h1>Title</h1>"));
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_completion_is_ignored() {
        let slot = slot();
        let first = slot.begin("a");
        let second = slot.begin("b");
        assert!(!slot.is_current(&first));

        assert!(slot.complete(second, Ok(document("<p>b</p>"))));
        assert!(!slot.complete(first, Ok(document("<p>a</p>"))));
        assert_eq!(
            slot.state(),
            RenderState::Ready {
                identifier: "b".to_string(),
                document: document("<p>b</p>"),
            }
        );
    }

    #[tokio::test]
    async fn test_latest_request_wins_concurrently() {
        let slot = slot();
        let long_body = "paragraph\n\n".repeat(2000);
        let (_, newest) = tokio::join!(
            slot.render("old", long_body),
            slot.render("new", "# New".to_string())
        );
        assert!(newest);
        match slot.state() {
            RenderState::Ready { identifier, .. } => assert_eq!(identifier, "new"),
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_leave_discards_pending_render() {
        let slot = slot();
        let ticket = slot.begin("a");
        slot.leave();
        assert!(!slot.complete(ticket, Ok(document("<p>a</p>"))));
        assert_eq!(slot.state(), RenderState::Idle);
    }

    #[tokio::test]
    async fn test_failure_becomes_message() {
        let slot = slot();
        let ticket = slot.begin("broken");
        let error = RenderError::from(join_error().await);
        assert!(slot.complete(ticket, Err(error)));
        assert_eq!(
            slot.state(),
            RenderState::Failed {
                identifier: "broken".to_string(),
                message: RENDER_FAILED_MESSAGE.to_string(),
            }
        );
    }
}

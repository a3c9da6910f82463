//! Scroll-reveal controller
//!
//! Rendered blocks start `Pending` and become `Visible` once they scroll into
//! view. The host (a browser binding, a test) owns the actual intersection
//! observer; this module decides which element changes state and when an
//! observation can be released.

mod geometry;

pub use geometry::{IntersectionEntry, Length, Rect, RootMargin};

use std::collections::HashMap;
use thiserror::Error;

/// Class carried by every element taking part in the reveal animation
pub const REVEAL_CLASS: &str = "scroll-reveal-element";

/// Class added once an element is visible
pub const REVEALED_CLASS: &str = "revealed";

/// Index of a revealable element inside its container
pub type ElementId = usize;

/// Errors raised while building reveal options
#[derive(Debug, Error, PartialEq)]
pub enum RevealError {
    #[error("invalid root margin: {0:?}")]
    InvalidRootMargin(String),

    #[error("threshold must be between 0 and 1, got {0}")]
    InvalidThreshold(f64),
}

/// A block tagged for reveal by the markdown renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealTarget {
    pub id: ElementId,
    /// HTML tag name of the block (`h2`, `p`, `pre`, ...)
    pub tag: &'static str,
    /// Transition delay before the block animates in
    pub delay_ms: u64,
}

/// Observer options
#[derive(Debug, Clone, PartialEq)]
pub struct RevealOptions {
    /// Visible fraction at which an element counts as revealed
    pub threshold: f64,
    pub root_margin: RootMargin,
    /// Reveal once and stop observing, instead of toggling back
    pub trigger_once: bool,
}

impl RevealOptions {
    pub fn new(
        threshold: f64,
        root_margin: RootMargin,
        trigger_once: bool,
    ) -> Result<Self, RevealError> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(RevealError::InvalidThreshold(threshold));
        }
        Ok(Self {
            threshold,
            root_margin,
            trigger_once,
        })
    }
}

impl Default for RevealOptions {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            root_margin: RootMargin::default(),
            trigger_once: true,
        }
    }
}

/// The host side of intersection observation
pub trait Observer {
    fn observe(&mut self, target: ElementId);
    fn unobserve(&mut self, target: ElementId);
}

/// Per-element state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealState {
    Pending,
    Visible,
}

/// A state change the host applies by toggling [`REVEALED_CLASS`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevealChange {
    pub target: ElementId,
    pub state: RevealState,
    pub delay_ms: u64,
}

#[derive(Debug)]
struct Tracked {
    target: RevealTarget,
    state: RevealState,
    observed: bool,
}

/// Drives the reveal state of one container's elements
///
/// Attaching observes every target; dropping or detaching the controller
/// releases whatever is still observed.
pub struct RevealController<O: Observer> {
    options: RevealOptions,
    elements: HashMap<ElementId, Tracked>,
    observer: Option<O>,
    queued: Vec<IntersectionEntry>,
}

impl<O: Observer> RevealController<O> {
    /// Start observing the targets of a rendered container
    pub fn attach(targets: &[RevealTarget], options: RevealOptions, mut observer: O) -> Self {
        let mut elements = HashMap::with_capacity(targets.len());
        for target in targets {
            observer.observe(target.id);
            elements.insert(
                target.id,
                Tracked {
                    target: target.clone(),
                    state: RevealState::Pending,
                    observed: true,
                },
            );
        }
        tracing::debug!("Observing {} reveal targets", elements.len());

        Self {
            options,
            elements,
            observer: Some(observer),
            queued: Vec::new(),
        }
    }

    pub fn options(&self) -> &RevealOptions {
        &self.options
    }

    pub fn state(&self, id: ElementId) -> Option<RevealState> {
        self.elements.get(&id).map(|t| t.state)
    }

    pub fn is_observing(&self, id: ElementId) -> bool {
        self.elements.get(&id).is_some_and(|t| t.observed)
    }

    /// Number of elements still registered with the observer
    pub fn observed_count(&self) -> usize {
        self.elements.values().filter(|t| t.observed).count()
    }

    /// Class attribute value for an element in its current state
    pub fn class_name(&self, id: ElementId) -> Option<String> {
        self.state(id).map(|state| match state {
            RevealState::Pending => REVEAL_CLASS.to_string(),
            RevealState::Visible => format!("{} {}", REVEAL_CLASS, REVEALED_CLASS),
        })
    }

    /// Apply a batch of observations immediately
    pub fn handle_entries<I>(&mut self, entries: I) -> Vec<RevealChange>
    where
        I: IntoIterator<Item = IntersectionEntry>,
    {
        entries
            .into_iter()
            .filter_map(|entry| self.apply(entry))
            .collect()
    }

    /// Queue an observation until the next frame
    pub fn enqueue(&mut self, entry: IntersectionEntry) {
        self.queued.push(entry);
    }

    /// Apply queued observations, keeping only the latest per element
    pub fn flush_frame(&mut self) -> Vec<RevealChange> {
        let mut latest: Vec<IntersectionEntry> = Vec::with_capacity(self.queued.len());
        for entry in self.queued.drain(..) {
            match latest.iter_mut().find(|e| e.target == entry.target) {
                Some(slot) => *slot = entry,
                None => latest.push(entry),
            }
        }
        self.handle_entries(latest)
    }

    fn apply(&mut self, entry: IntersectionEntry) -> Option<RevealChange> {
        let tracked = self.elements.get_mut(&entry.target)?;
        if !tracked.observed {
            return None;
        }

        // Revealing needs the threshold; hiding again only once the element
        // has fully left the root
        let in_view = entry.is_intersecting && entry.ratio >= self.options.threshold;
        let next = match tracked.state {
            RevealState::Pending if in_view => RevealState::Visible,
            RevealState::Visible if !self.options.trigger_once && !entry.is_intersecting => {
                RevealState::Pending
            }
            _ => return None,
        };
        tracked.state = next;

        if next == RevealState::Visible && self.options.trigger_once {
            tracked.observed = false;
            if let Some(observer) = self.observer.as_mut() {
                observer.unobserve(entry.target);
            }
        }

        Some(RevealChange {
            target: entry.target,
            state: next,
            delay_ms: tracked.target.delay_ms,
        })
    }

    /// Stop observing and hand the observer back
    pub fn detach(mut self) -> O {
        self.release();
        self.observer
            .take()
            .expect("observer is only taken by detach")
    }

    fn release(&mut self) {
        let Some(observer) = self.observer.as_mut() else {
            return;
        };
        let mut remaining: Vec<ElementId> = self
            .elements
            .values()
            .filter(|t| t.observed)
            .map(|t| t.target.id)
            .collect();
        remaining.sort_unstable();
        for id in remaining {
            observer.unobserve(id);
        }
        for tracked in self.elements.values_mut() {
            tracked.observed = false;
        }
        self.queued.clear();
    }
}

impl<O: Observer> Drop for RevealController<O> {
    fn drop(&mut self) {
        self.release();
    }
}

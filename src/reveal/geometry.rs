//! Viewport geometry for intersection checks

use std::fmt;
use std::str::FromStr;

use super::{ElementId, RevealError};

/// Axis-aligned rectangle in CSS pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Overlap of two rectangles; edge-adjacent rectangles overlap with zero area
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }

    /// Grow (or shrink, for negative lengths) by a root margin
    pub fn expand(&self, margin: &RootMargin) -> Rect {
        let top = margin.top.resolve(self.height);
        let right = margin.right.resolve(self.width);
        let bottom = margin.bottom.resolve(self.height);
        let left = margin.left.resolve(self.width);
        Rect::new(
            self.x - left,
            self.y - top,
            self.width + left + right,
            self.height + top + bottom,
        )
    }
}

/// A margin length: pixels or a percentage of the root's size
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Length {
    Px(f64),
    Percent(f64),
}

impl Length {
    fn resolve(&self, basis: f64) -> f64 {
        match *self {
            Length::Px(px) => px,
            Length::Percent(pct) => basis * pct / 100.0,
        }
    }
}

impl FromStr for Length {
    type Err = RevealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RevealError::InvalidRootMargin(s.to_string());
        let (number, ctor): (&str, fn(f64) -> Length) = if let Some(n) = s.strip_suffix("px") {
            (n, Length::Px)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, Length::Percent)
        } else if s == "0" {
            ("0", Length::Px)
        } else {
            return Err(invalid());
        };
        let value: f64 = number.parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        Ok(ctor(value))
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(v) => write!(f, "{}px", v),
            Length::Percent(v) => write!(f, "{}%", v),
        }
    }
}

/// CSS-style margin around the viewport, `top right bottom left`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self {
            top: Length::Px(0.0),
            right: Length::Px(0.0),
            bottom: Length::Px(0.0),
            left: Length::Px(0.0),
        }
    }
}

impl FromStr for RootMargin {
    type Err = RevealError;

    /// Accepts the CSS shorthand with one to four values
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split_whitespace()
            .map(str::parse::<Length>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| RevealError::InvalidRootMargin(s.to_string()))?;

        let (top, right, bottom, left) = match values.as_slice() {
            [all] => (*all, *all, *all, *all),
            [vertical, horizontal] => (*vertical, *horizontal, *vertical, *horizontal),
            [top, horizontal, bottom] => (*top, *horizontal, *bottom, *horizontal),
            [top, right, bottom, left] => (*top, *right, *bottom, *left),
            _ => return Err(RevealError::InvalidRootMargin(s.to_string())),
        };

        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// One observation of an element against the viewport
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntersectionEntry {
    pub target: ElementId,
    pub is_intersecting: bool,
    /// Visible fraction of the element, `0.0..=1.0`
    pub ratio: f64,
}

impl IntersectionEntry {
    pub fn new(target: ElementId, is_intersecting: bool, ratio: f64) -> Self {
        Self {
            target,
            is_intersecting,
            ratio,
        }
    }

    /// Measure an element's bounds against the viewport grown by `margin`
    pub fn measure(target: ElementId, element: Rect, viewport: Rect, margin: &RootMargin) -> Self {
        let root = viewport.expand(margin);
        match element.intersection(&root) {
            Some(overlap) => {
                let area = element.area();
                let ratio = if area > 0.0 {
                    (overlap.area() / area).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                Self::new(target, true, ratio)
            }
            None => Self::new(target, false, 0.0),
        }
    }
}

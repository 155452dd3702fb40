//! Viewport visibility tracking for preview slots.
//!
//! The tracker holds the layout rectangle of every observed slot and, given
//! the current viewport, reports which slots entered or left view. A slot
//! counts as visible once the fraction of its area inside the viewport
//! (grown by a pre-trigger margin) reaches a threshold. It carries no caching
//! logic; its events are fed to the preview cache.

use catalog_preview_core::CatalogItemRef;

/// An axis-aligned rectangle in layout pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl Rect {
    /// Creates a rectangle.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Area, zero for degenerate rectangles.
    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Grows the rectangle by `margin` on every side.
    #[must_use]
    pub fn expanded(&self, margin: f32) -> Rect {
        Rect::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Area of the overlap with `other`.
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let w = (self.x + self.width).min(other.x + other.width) - self.x.max(other.x);
        let h = (self.y + self.height).min(other.y + other.height) - self.y.max(other.y);
        w.max(0.0) * h.max(0.0)
    }

    /// Moves the rectangle by `(dx, dy)`.
    #[must_use]
    pub fn translated(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

/// A visibility transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityEvent {
    /// The slot became visible.
    Enter(CatalogItemRef),
    /// The slot stopped being visible.
    Leave(CatalogItemRef),
}

impl VisibilityEvent {
    /// Returns the item the event is about.
    pub fn item_ref(&self) -> &CatalogItemRef {
        match self {
            VisibilityEvent::Enter(r) | VisibilityEvent::Leave(r) => r,
        }
    }
}

#[derive(Debug, Clone)]
struct TrackedSlot {
    item_ref: CatalogItemRef,
    rect: Rect,
    visible: bool,
}

/// Reports enter/leave-viewport transitions for a set of slots.
#[derive(Debug, Clone)]
pub struct VisibilityTracker {
    margin: f32,
    threshold: f32,
    slots: Vec<TrackedSlot>,
}

impl VisibilityTracker {
    /// Creates a tracker with a pre-trigger `margin` in pixels and a minimum
    /// visible fraction `threshold`.
    pub fn new(margin: f32, threshold: f32) -> Self {
        Self {
            margin: margin.max(0.0),
            threshold: threshold.clamp(0.0, 1.0),
            slots: Vec::new(),
        }
    }

    /// Starts observing a slot. Re-observing an item replaces its rectangle.
    ///
    /// A new slot starts invisible; the next [`update`](Self::update) reports
    /// it if it is on screen.
    pub fn observe(&mut self, item_ref: CatalogItemRef, rect: Rect) {
        match self.slots.iter_mut().find(|s| s.item_ref == item_ref) {
            Some(slot) => slot.rect = rect,
            None => self.slots.push(TrackedSlot {
                item_ref,
                rect,
                visible: false,
            }),
        }
    }

    /// Stops observing a slot. Returns a leave event if it was visible.
    pub fn unobserve(&mut self, item_ref: &CatalogItemRef) -> Option<VisibilityEvent> {
        let index = self.slots.iter().position(|s| &s.item_ref == item_ref)?;
        let slot = self.slots.remove(index);
        slot.visible.then(|| VisibilityEvent::Leave(slot.item_ref))
    }

    /// Stops observing every slot without reporting events.
    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Number of observed slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if no slot is observed.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns whether a slot was visible at the last update.
    pub fn is_visible(&self, item_ref: &CatalogItemRef) -> bool {
        self.slots
            .iter()
            .any(|s| &s.item_ref == item_ref && s.visible)
    }

    /// Fraction of `rect` inside the margin-grown `viewport`.
    pub fn visible_fraction(&self, rect: &Rect, viewport: &Rect) -> f32 {
        overlap_fraction(rect, &viewport.expanded(self.margin))
    }

    /// Recomputes visibility against `viewport` and returns the transitions,
    /// in observation order.
    pub fn update(&mut self, viewport: &Rect) -> Vec<VisibilityEvent> {
        let root = viewport.expanded(self.margin);
        let mut events = Vec::new();
        for slot in &mut self.slots {
            let fraction = overlap_fraction(&slot.rect, &root);
            let visible = fraction > 0.0 && fraction >= self.threshold;
            if visible != slot.visible {
                slot.visible = visible;
                events.push(if visible {
                    VisibilityEvent::Enter(slot.item_ref.clone())
                } else {
                    VisibilityEvent::Leave(slot.item_ref.clone())
                });
            }
        }
        events
    }
}

fn overlap_fraction(rect: &Rect, root: &Rect) -> f32 {
    let area = rect.area();
    if area <= 0.0 {
        return 0.0;
    }
    rect.intersection_area(root) / area
}

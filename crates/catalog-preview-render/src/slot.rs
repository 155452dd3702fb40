//! Preview slots: drawable surfaces owned by the UI shell.

use std::sync::{Arc, Mutex, PoisonError};

use image::RgbaImage;

/// Static content shown in a slot that has no live preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    /// Preview is being built.
    Loading,
    /// Nothing to show (released or never loaded).
    Neutral,
    /// The asset failed to load.
    Error,
}

/// A drawable surface owned by the UI shell.
///
/// The cache only draws into slots; placement and sizing belong to the shell.
/// Handles are shared with the shell, so drawing goes through `&self`.
pub trait PreviewSlot {
    /// Displays a rendered frame.
    fn present(&self, frame: &RgbaImage);

    /// Replaces the slot content with a placeholder.
    fn show_placeholder(&self, placeholder: Placeholder);
}

/// What a [`MemorySlot`] currently shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SlotContent {
    /// Nothing drawn yet.
    #[default]
    Empty,
    /// A placeholder.
    Placeholder(Placeholder),
    /// The last presented frame.
    Frame(RgbaImage),
}

#[derive(Debug, Default)]
struct SlotState {
    content: SlotContent,
    frames_presented: u64,
}

/// In-memory slot that keeps the last thing drawn into it.
///
/// Clones share the same surface, so the shell can keep one handle and give
/// another to the cache.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    state: Arc<Mutex<SlotState>>,
}

impl MemorySlot {
    /// Creates an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut SlotState) -> R) -> R {
        let mut guard = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    /// Returns a copy of the current content.
    pub fn content(&self) -> SlotContent {
        self.with_state(|s| s.content.clone())
    }

    /// Returns the placeholder currently shown, if any.
    pub fn placeholder(&self) -> Option<Placeholder> {
        self.with_state(|s| match s.content {
            SlotContent::Placeholder(p) => Some(p),
            _ => None,
        })
    }

    /// Returns true if the slot shows a rendered frame.
    pub fn has_frame(&self) -> bool {
        self.with_state(|s| matches!(s.content, SlotContent::Frame(_)))
    }

    /// Number of frames presented since creation.
    pub fn frames_presented(&self) -> u64 {
        self.with_state(|s| s.frames_presented)
    }
}

impl PreviewSlot for MemorySlot {
    fn present(&self, frame: &RgbaImage) {
        self.with_state(|s| {
            s.content = SlotContent::Frame(frame.clone());
            s.frames_presented += 1;
        });
    }

    fn show_placeholder(&self, placeholder: Placeholder) {
        self.with_state(|s| s.content = SlotContent::Placeholder(placeholder));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_surface() {
        let shell = MemorySlot::new();
        let cache_handle = shell.clone();
        assert_eq!(shell.content(), SlotContent::Empty);

        cache_handle.show_placeholder(Placeholder::Error);
        assert_eq!(shell.placeholder(), Some(Placeholder::Error));

        cache_handle.present(&RgbaImage::new(2, 2));
        assert!(shell.has_frame());
        assert_eq!(shell.placeholder(), None);
        assert_eq!(shell.frames_presented(), 1);
    }
}

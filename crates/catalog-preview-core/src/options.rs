//! Configuration options for the preview subsystem.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PreviewError, Result};

/// Largest accepted thumbnail edge, in pixels.
pub const MAX_THUMBNAIL_SIZE: u32 = 4096;

/// What to show when an asset was fetched but could not be turned into a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum LoadFailurePolicy {
    /// Inert error placeholder in the slot.
    #[default]
    Placeholder,
    /// Dimensionally-accurate fallback box.
    FallbackBox,
}

/// Tunables for the cache, normalizer, renderer and visibility tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewOptions {
    /// Hard capacity of the resident pool.
    pub max_resident: usize,

    /// Soft floor: idle eviction never goes below this many residents.
    pub min_resident: usize,

    /// Delay between leaving view and the eviction re-check, in milliseconds.
    pub eviction_delay_ms: u64,

    /// Rotation per display refresh while hovered, in radians.
    pub rotation_step: f32,

    /// Minimum dihedral angle for an edge to appear in the overlay, in degrees.
    pub edge_threshold_degrees: f32,

    /// Offscreen target size of a render context, in pixels. Each edge is
    /// limited to [`MAX_THUMBNAIL_SIZE`].
    pub thumbnail_size: [u32; 2],

    /// Pre-trigger margin around the viewport, in pixels.
    pub visibility_margin: f32,

    /// Minimum visible fraction of a slot before it counts as visible.
    pub visibility_threshold: f32,

    /// Handling of parse/normalize failures (fetch failures always use the placeholder).
    pub load_failure: LoadFailurePolicy,

    /// Re-check visibility as soon as a load completes instead of waiting for
    /// the next leave-view timer.
    pub recheck_on_completion: bool,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            max_resident: 10,
            min_resident: 5,
            eviction_delay_ms: 2000,
            rotation_step: 0.01,
            edge_threshold_degrees: 15.0,
            thumbnail_size: [160, 120],
            visibility_margin: 50.0,
            visibility_threshold: 0.1,
            load_failure: LoadFailurePolicy::Placeholder,
            recheck_on_completion: false,
        }
    }
}

impl PreviewOptions {
    /// Parses options from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        let options = options.validate()?;
        log::debug!(
            "preview options: capacity {}..{}, eviction delay {} ms",
            options.min_resident,
            options.max_resident,
            options.eviction_delay_ms
        );
        Ok(options)
    }

    /// Serializes options to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Checks option consistency.
    pub fn validate(self) -> Result<Self> {
        if self.max_resident == 0 {
            return Err(PreviewError::InvalidOptions(
                "max_resident must be at least 1".into(),
            ));
        }
        if self.min_resident > self.max_resident {
            return Err(PreviewError::InvalidOptions(format!(
                "min_resident ({}) exceeds max_resident ({})",
                self.min_resident, self.max_resident
            )));
        }
        let [width, height] = self.thumbnail_size;
        if width == 0 || height == 0 {
            return Err(PreviewError::InvalidOptions(
                "thumbnail_size must be non-zero".into(),
            ));
        }
        if width > MAX_THUMBNAIL_SIZE || height > MAX_THUMBNAIL_SIZE {
            return Err(PreviewError::InvalidOptions(format!(
                "thumbnail_size {width}x{height} exceeds {MAX_THUMBNAIL_SIZE}x{MAX_THUMBNAIL_SIZE}"
            )));
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(PreviewError::InvalidOptions(
                "visibility_threshold must be within [0, 1]".into(),
            ));
        }
        Ok(self)
    }

    /// Returns the eviction re-check delay.
    pub fn eviction_delay(&self) -> Duration {
        Duration::from_millis(self.eviction_delay_ms)
    }

    /// Sets the resident pool capacity and floor.
    #[must_use]
    pub fn with_capacity(mut self, max_resident: usize, min_resident: usize) -> Self {
        self.max_resident = max_resident;
        self.min_resident = min_resident;
        self
    }

    /// Sets the load failure policy.
    #[must_use]
    pub fn with_load_failure(mut self, policy: LoadFailurePolicy) -> Self {
        self.load_failure = policy;
        self
    }

    /// Sets the render context size.
    #[must_use]
    pub fn with_thumbnail_size(mut self, width: u32, height: u32) -> Self {
        self.thumbnail_size = [width, height];
        self
    }

    /// Enables or disables the visibility re-check on load completion.
    #[must_use]
    pub fn with_recheck_on_completion(mut self, enabled: bool) -> Self {
        self.recheck_on_completion = enabled;
        self
    }
}

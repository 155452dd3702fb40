//! catalog-preview: rotating 3D thumbnails for long, scrollable catalogs.
//!
//! Each catalog item may come with a 3D asset. Previews exist only while their
//! slot is on screen (plus a short grace period), the number of live render
//! contexts is capped, and every displayed model is stretched to the item's
//! declared dimensions and centered so it rotates in place.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! use catalog_preview::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let gpu = GpuDevice::request()?;
//!     let source = Arc::new(FileAssetSource::new("assets"));
//!     let mut cache = PreviewCache::new(PreviewOptions::default(), source, gpu)?;
//!
//!     let item = CatalogItem::new("Door", "doors", Dimensions::new(90.0, 10.0, 210.0))
//!         .with_asset("door.glb");
//!     let slot = MemorySlot::new();
//!
//!     // The shell reports the slot as visible; run the load it asks for
//!     if let Some(task) = cache.on_enter_view(&item, slot.clone()) {
//!         let outcome = task.run_blocking();
//!         cache.complete_load(outcome, Instant::now());
//!     }
//!     assert!(slot.has_frame());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - [`VisibilityTracker`] turns slot layout and scroll position into
//!   enter/leave events
//! - [`PreviewCache`] owns every live preview and decides when to load, keep
//!   or release one
//! - [`LoadTask`] fetches, parses and normalizes an asset (or builds a
//!   fallback box) off the cache's books
//! - [`RenderContext`] draws a model on the shared [`GpuDevice`] into a
//!   shell-owned [`PreviewSlot`]
//! - [`RotationDriver`] spins hovered previews once per display refresh

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

pub mod cache;
pub mod loader;
pub mod rotation;
pub mod visibility;

// Re-export core types
pub use catalog_preview_core::{
    catalog_from_json, Aabb, CatalogItem, CatalogItemRef, CategoryPalette, Dimensions,
    LoadFailurePolicy, MaterialConfig, PreviewError, PreviewOptions, Result, Vec3,
};

// Re-export geometry
pub use catalog_preview_geometry::{
    build_fallback, normalize_item, parse_asset, AssetFormat, EdgeOverlay, LineVertex, Mesh,
    ModelOrigin, PreviewModel, RawAsset, SubSurface, SurfaceMaterial, SurfaceVertex,
};

// Re-export render types
pub use catalog_preview_render::{
    GpuDevice, MemorySlot, Placeholder, PreviewSlot, RenderContext, RenderError, RenderResult,
    Scene, SlotContent,
};

pub use cache::{CacheStats, EntryState, PreviewCache};
pub use loader::{
    AssetSource, FetchFuture, FileAssetSource, LoadOutcome, LoadTask, LoadTicket,
    MemoryAssetSource,
};
pub use rotation::{RotationDriver, StepOutcome};
pub use visibility::{Rect, VisibilityEvent, VisibilityTracker};

/// Initializes the `env_logger` backend.
///
/// Safe to call more than once; later calls are ignored. Filter with
/// `RUST_LOG`, e.g. `RUST_LOG=catalog_preview=debug`.
pub fn init_logging() {
    let _ = env_logger::try_init();
}

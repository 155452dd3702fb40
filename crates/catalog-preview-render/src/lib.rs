//! Rendering for catalog-preview.
//!
//! This crate draws [`PreviewModel`](catalog_preview_geometry::PreviewModel)s
//! into shell-owned preview slots:
//! - [`GpuDevice`], a shared headless wgpu device with the surface and line
//!   pipelines
//! - [`Camera`] framed once per model
//! - [`RenderContext`], the per-slot GPU state: offscreen target, vertex
//!   buffers and readback
//! - [`PreviewSlot`], the surface interface implemented by the UI shell

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod context;
pub mod error;
pub mod gpu;
pub mod slot;
mod target;

pub use camera::Camera;
pub use context::{AttachError, RenderContext, Scene};
pub use error::{RenderError, RenderResult};
pub use gpu::GpuDevice;
pub use slot::{MemorySlot, Placeholder, PreviewSlot, SlotContent};

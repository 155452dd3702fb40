//! Core abstractions for catalog-preview.
//!
//! This crate provides the fundamental types shared by the preview subsystem:
//! - [`CatalogItem`] and its derived identity key [`CatalogItemRef`]
//! - [`Dimensions`] with the domain-to-render axis remap
//! - [`PreviewOptions`] for every tunable of the cache and normalizer
//! - [`Aabb`] bounding boxes and the shared [`PreviewError`] type

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]

pub mod bounds;
pub mod catalog;
pub mod error;
pub mod options;
pub mod palette;

pub use bounds::Aabb;
pub use catalog::{catalog_from_json, CatalogItem, CatalogItemRef, Dimensions, MaterialConfig};
pub use error::{PreviewError, Result};
pub use options::{LoadFailurePolicy, PreviewOptions, MAX_THUMBNAIL_SIZE};
pub use palette::{color_from_hex, emissive_for, CategoryPalette};

// Re-export glam types for convenience
pub use glam::{Mat4, UVec2, Vec2, Vec3, Vec4};

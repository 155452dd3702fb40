//! Geometry for catalog-preview.
//!
//! This crate turns raw 3D assets into preview models:
//! - [`parse_asset`] reads glTF/GLB, OBJ and PLY bytes into a [`RawAsset`]
//! - [`normalize_item`] fits an asset to declared dimensions, centers it and
//!   derives its edge overlay
//! - [`build_fallback`] synthesizes a box of the declared size when no asset
//!   is available
//!
//! Both paths return a [`PreviewModel`] of the same shape.

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Mesh indices are u32 by convention
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]

pub mod asset;
pub mod edges;
pub mod fallback;
pub mod material;
pub mod mesh;
pub mod model;
pub mod normalize;

pub use asset::{parse_asset, AssetFormat};
pub use edges::{box_edges, feature_edges, EdgeOverlay};
pub use fallback::{build_fallback, build_fallback_box};
pub use material::{apply_material_policy, SurfaceMaterial};
pub use mesh::{Mesh, RawAsset, SubSurface};
pub use model::{LineVertex, ModelOrigin, PreviewModel, SurfaceVertex};
pub use normalize::{normalize_item, normalize_to_size};

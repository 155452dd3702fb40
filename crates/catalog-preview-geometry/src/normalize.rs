//! Geometry normalization.
//!
//! Fits a raw asset to a target size per axis (non-uniform, no letterboxing),
//! moves the center of the scaled bounds to the origin and derives the edge
//! overlay of every sub-surface.

use catalog_preview_core::{CatalogItem, CategoryPalette, PreviewError, Result};
use glam::{Mat4, Vec3};

use crate::edges::{feature_edges, EdgeOverlay};
use crate::material::apply_material_policy;
use crate::mesh::RawAsset;
use crate::model::{ModelOrigin, PreviewModel};

/// Native extents below this are treated as flat along that axis.
const MIN_EXTENT: f32 = 1e-6;

/// Scales `asset` to `target` (render axes), centers it and derives overlays.
///
/// `name` is only used for errors and logging.
pub fn normalize_to_size(
    name: &str,
    mut asset: RawAsset,
    target: Vec3,
    edge_threshold_degrees: f32,
) -> Result<PreviewModel> {
    for surface in &mut asset.surfaces {
        let dropped = surface.mesh.retain_valid_triangles();
        if dropped > 0 {
            log::warn!(
                "{name}: dropped {dropped} triangles with out-of-range indices in '{}'",
                surface.name
            );
        }
    }
    asset.surfaces.retain(|s| !s.mesh.is_empty());

    let native = asset
        .bounds()
        .ok_or_else(|| PreviewError::EmptyAsset(name.to_string()))?;
    let native_size = native.size();

    let scale = Vec3::from_array(std::array::from_fn(|axis| {
        if native_size[axis] > MIN_EXTENT {
            target[axis] / native_size[axis]
        } else {
            log::warn!("{name}: asset is flat along axis {axis}, leaving it unscaled");
            1.0
        }
    }));

    // Scale about the origin, then move the scaled center to the origin
    let scaled_center = native.center() * scale;
    let content = Mat4::from_translation(-scaled_center) * Mat4::from_scale(scale);

    let overlays = asset
        .surfaces
        .iter()
        .enumerate()
        .map(|(i, s)| {
            EdgeOverlay::new(i, s.transform, feature_edges(&s.mesh, edge_threshold_degrees))
        })
        .collect();

    log::debug!(
        "{name}: normalized {} surfaces from {:?} to {:?}",
        asset.surfaces.len(),
        native_size,
        target
    );

    Ok(PreviewModel::new(
        content,
        asset.surfaces,
        overlays,
        ModelOrigin::Asset,
    ))
}

/// Normalizes an asset for a catalog item.
///
/// Remaps the declared dimensions to render axes and applies the material
/// policy before fitting.
pub fn normalize_item(
    mut asset: RawAsset,
    item: &CatalogItem,
    palette: &CategoryPalette,
    edge_threshold_degrees: f32,
) -> Result<PreviewModel> {
    let target = item.dims.validate()?.to_render_size();
    apply_material_policy(
        &mut asset.surfaces,
        item.material,
        palette.color_for(&item.category),
    );
    normalize_to_size(&item.name, asset, target, edge_threshold_degrees)
}

//! Fallback box for items without a usable asset.
//!
//! The box is built directly at the declared size around the origin, so it
//! comes out of the same centering convention as a normalized asset and the
//! cache cannot tell the two apart.

use catalog_preview_core::{Aabb, CatalogItem, CategoryPalette, Result};
use glam::{Mat4, Vec3};

use crate::edges::{box_edges, EdgeOverlay};
use crate::material::apply_material_policy;
use crate::mesh::{Mesh, SubSurface};
use crate::model::{ModelOrigin, PreviewModel};

/// Builds a centered box of `size` (render axes) with category material.
pub fn build_fallback_box(size: Vec3, color: u32) -> PreviewModel {
    let bounds = Aabb::centered(size);
    let mesh = Mesh::cuboid(&bounds);
    let mut surfaces = vec![SubSurface::new("fallback-box", mesh)];
    apply_material_policy(&mut surfaces, Default::default(), color);

    let overlay = EdgeOverlay::new(0, Mat4::IDENTITY, box_edges(&bounds));
    PreviewModel::new(Mat4::IDENTITY, surfaces, vec![overlay], ModelOrigin::Fallback)
}

/// Builds the fallback box for a catalog item.
pub fn build_fallback(item: &CatalogItem, palette: &CategoryPalette) -> Result<PreviewModel> {
    let size = item.dims.validate()?.to_render_size();
    log::debug!("{}: using fallback box {:?}", item.name, size);
    Ok(build_fallback_box(size, palette.color_for(&item.category)))
}

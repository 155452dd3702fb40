//! The normalized preview model.
//!
//! A model is a parent node holding the scaled and centered sub-surfaces and
//! their edge overlays. Rotating the parent rotates both together.

use bytemuck::{Pod, Zeroable};
use catalog_preview_core::Aabb;
use glam::Mat4;

use crate::edges::EdgeOverlay;
use crate::mesh::SubSurface;

/// Where a model's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelOrigin {
    /// Normalized from a parsed asset.
    Asset,
    /// Synthesized box.
    Fallback,
}

/// Flat-shaded surface vertex, three per triangle.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SurfaceVertex {
    /// Position in model space.
    pub position: [f32; 3],
    /// Face normal in model space.
    pub normal: [f32; 3],
    /// Base color.
    pub color: [f32; 3],
    /// Emissive color added after lighting.
    pub emissive: [f32; 3],
}

/// Overlay line vertex, two per segment.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LineVertex {
    /// Position in model space.
    pub position: [f32; 3],
    /// Line color.
    pub color: [f32; 3],
}

/// A normalized model: parent transform, content transform, surfaces and overlays.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewModel {
    /// Rotation of the parent around the render-space up axis, in radians.
    rotation: f32,
    /// Scale and centering applied to the content under the parent.
    content: Mat4,
    surfaces: Vec<SubSurface>,
    overlays: Vec<EdgeOverlay>,
    origin: ModelOrigin,
}

impl PreviewModel {
    pub(crate) fn new(
        content: Mat4,
        surfaces: Vec<SubSurface>,
        overlays: Vec<EdgeOverlay>,
        origin: ModelOrigin,
    ) -> Self {
        Self {
            rotation: 0.0,
            content,
            surfaces,
            overlays,
            origin,
        }
    }

    /// Returns where the geometry came from.
    pub fn origin(&self) -> ModelOrigin {
        self.origin
    }

    /// Returns the sub-surfaces.
    pub fn surfaces(&self) -> &[SubSurface] {
        &self.surfaces
    }

    /// Returns the edge overlays.
    pub fn overlays(&self) -> &[EdgeOverlay] {
        &self.overlays
    }

    /// Total number of overlay segments.
    pub fn edge_count(&self) -> usize {
        self.overlays.iter().map(|o| o.segments.len()).sum()
    }

    /// Total number of triangles.
    pub fn triangle_count(&self) -> usize {
        self.surfaces.iter().map(|s| s.mesh.triangles.len()).sum()
    }

    /// Returns the parent rotation in radians.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Advances the parent rotation, wrapping to `[0, 2π)`.
    pub fn rotate_by(&mut self, radians: f32) {
        self.rotation = (self.rotation + radians).rem_euclid(std::f32::consts::TAU);
    }

    /// Returns the parent transform.
    pub fn parent_matrix(&self) -> Mat4 {
        Mat4::from_rotation_y(self.rotation)
    }

    /// Bounds of the content under the parent, before the parent rotation.
    pub fn bounds(&self) -> Option<Aabb> {
        self.surfaces
            .iter()
            .filter_map(|s| s.mesh.bounds(self.content * s.transform))
            .reduce(|a, b| a.union(&b))
    }

    /// Flattens every overlay into model-space line vertices (two per segment).
    pub fn overlay_vertices(&self) -> Vec<LineVertex> {
        let mut out = Vec::with_capacity(self.edge_count() * 2);
        for overlay in &self.overlays {
            let m = self.content * overlay.transform;
            let color = overlay.color.to_array();
            for segment in &overlay.segments {
                for p in segment {
                    out.push(LineVertex {
                        position: m.transform_point3(*p).to_array(),
                        color,
                    });
                }
            }
        }
        out
    }

    /// Flattens every sub-surface into model-space triangle vertices with
    /// face normals. Degenerate triangles are skipped.
    pub fn surface_vertices(&self) -> Vec<SurfaceVertex> {
        let mut out = Vec::with_capacity(self.triangle_count() * 3);
        for surface in &self.surfaces {
            let m = self.content * surface.transform;
            let color = surface.material.base_color.to_array();
            let emissive = surface.material.emissive.to_array();
            for tri in &surface.mesh.triangles {
                let p = tri.map(|i| m.transform_point3(surface.mesh.positions[i as usize]));
                let Some(normal) = (p[1] - p[0]).cross(p[2] - p[0]).try_normalize() else {
                    continue;
                };
                let normal = normal.to_array();
                out.extend(p.map(|position| SurfaceVertex {
                    position: position.to_array(),
                    normal,
                    color,
                    emissive,
                }));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Mesh, SubSurface};
    use glam::Vec3;

    fn model() -> PreviewModel {
        let mesh = Mesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y],
            vec![[0, 1, 2]],
        );
        let overlay = EdgeOverlay::new(0, Mat4::IDENTITY, vec![[Vec3::ZERO, Vec3::X]]);
        PreviewModel::new(
            Mat4::from_scale(Vec3::splat(2.0)),
            vec![SubSurface::new("tri", mesh)],
            vec![overlay],
            ModelOrigin::Asset,
        )
    }

    #[test]
    fn test_rotation_wraps() {
        let mut m = model();
        m.rotate_by(std::f32::consts::TAU + 0.5);
        assert!((m.rotation() - 0.5).abs() < 1e-5);
        m.rotate_by(-1.0);
        assert!(m.rotation() >= 0.0);
    }

    #[test]
    fn test_bounds_exclude_parent_rotation() {
        let mut m = model();
        let before = m.bounds().unwrap();
        m.rotate_by(1.0);
        assert_eq!(m.bounds().unwrap(), before);
        assert_eq!(before.max, Vec3::new(2.0, 2.0, 0.0));
    }

    #[test]
    fn test_overlay_vertices_use_content_transform() {
        let m = model();
        let verts = m.overlay_vertices();
        assert_eq!(verts.len(), 2);
        assert_eq!(verts[1].position, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_surface_vertices_are_flat_shaded() {
        let m = model();
        let verts = m.surface_vertices();
        assert_eq!(verts.len(), 3);
        assert_eq!(verts[2].position, [0.0, 2.0, 0.0]);
        assert!(verts.iter().all(|v| v.normal == [0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_degenerate_triangles_are_skipped() {
        let mesh = Mesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::X * 2.0], vec![[0, 1, 2]]);
        let m = PreviewModel::new(
            Mat4::IDENTITY,
            vec![SubSurface::new("line", mesh)],
            Vec::new(),
            ModelOrigin::Asset,
        );
        assert!(m.surface_vertices().is_empty());
    }
}

//! Edge overlay extraction.
//!
//! An edge belongs to the overlay when it bounds the surface (one adjacent
//! face), is non-manifold, or when the dihedral angle between its two faces
//! reaches the threshold. Vertices are welded by position first, so meshes
//! with split normals or UV seams still produce clean creases.

use std::collections::{BTreeMap, HashMap};

use catalog_preview_core::Aabb;
use glam::{Mat4, Vec3};

use crate::mesh::Mesh;

/// Quantization used to weld coincident vertices.
const WELD_PRECISION: f32 = 1e4;

/// Default overlay line color.
pub const EDGE_COLOR: Vec3 = Vec3::new(0.12, 0.12, 0.12);

/// A line set drawn on top of one sub-surface.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeOverlay {
    /// Index of the sub-surface this overlay belongs to.
    pub surface: usize,
    /// Local transform, shared with the sub-surface.
    pub transform: Mat4,
    /// Line segments in the sub-surface's local space.
    pub segments: Vec<[Vec3; 2]>,
    /// Line color.
    pub color: Vec3,
}

impl EdgeOverlay {
    /// Creates an overlay for a sub-surface.
    pub fn new(surface: usize, transform: Mat4, segments: Vec<[Vec3; 2]>) -> Self {
        Self {
            surface,
            transform,
            segments,
            color: EDGE_COLOR,
        }
    }

    /// Returns true if the overlay has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

fn weld_key(p: Vec3) -> [i64; 3] {
    #[allow(clippy::cast_possible_truncation)]
    let q = |v: f32| (v * WELD_PRECISION).round() as i64;
    [q(p.x), q(p.y), q(p.z)]
}

/// Extracts boundary and crease edges at or above `threshold_degrees`.
///
/// Degenerate triangles are ignored. Output order is deterministic.
pub fn feature_edges(mesh: &Mesh, threshold_degrees: f32) -> Vec<[Vec3; 2]> {
    let cos_threshold = threshold_degrees.to_radians().cos();

    // Weld vertices by quantized position
    let mut welded: HashMap<[i64; 3], u32> = HashMap::new();
    let mut welded_positions: Vec<Vec3> = Vec::new();
    let remap: Vec<u32> = mesh
        .positions
        .iter()
        .map(|&p| {
            *welded.entry(weld_key(p)).or_insert_with(|| {
                welded_positions.push(p);
                (welded_positions.len() - 1) as u32
            })
        })
        .collect();

    let mut face_normals: Vec<Vec3> = Vec::with_capacity(mesh.triangles.len());
    let mut edge_faces: BTreeMap<(u32, u32), Vec<usize>> = BTreeMap::new();

    for tri_idx in 0..mesh.triangles.len() {
        let [a, b, c] = mesh.triangle(tri_idx);
        let normal = (b - a).cross(c - a);
        if normal.length_squared() <= f32::EPSILON * f32::EPSILON {
            continue;
        }
        let face = face_normals.len();
        face_normals.push(normal.normalize());

        let w = mesh.triangles[tri_idx].map(|i| remap[i as usize]);
        for i in 0..3 {
            let (v0, v1) = (w[i], w[(i + 1) % 3]);
            if v0 == v1 {
                continue;
            }
            // Store as sorted pair to avoid duplicates
            let edge = if v0 < v1 { (v0, v1) } else { (v1, v0) };
            edge_faces.entry(edge).or_default().push(face);
        }
    }

    edge_faces
        .into_iter()
        .filter(|(_, faces)| match faces.as_slice() {
            [f0, f1] => face_normals[*f0].dot(face_normals[*f1]) <= cos_threshold,
            _ => true,
        })
        .map(|((v0, v1), _)| [welded_positions[v0 as usize], welded_positions[v1 as usize]])
        .collect()
}

/// Returns the twelve silhouette edges of an axis-aligned box.
pub fn box_edges(bounds: &Aabb) -> Vec<[Vec3; 2]> {
    const PAIRS: [(usize, usize); 12] = [
        (0, 1),
        (1, 2),
        (2, 3),
        (3, 0),
        (4, 5),
        (5, 6),
        (6, 7),
        (7, 4),
        (0, 4),
        (1, 5),
        (2, 6),
        (3, 7),
    ];
    let c = bounds.corners();
    PAIRS.iter().map(|&(a, b)| [c[a], c[b]]).collect()
}

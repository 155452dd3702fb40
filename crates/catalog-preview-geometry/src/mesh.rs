//! Triangle meshes and the sub-surfaces of a raw asset.

use catalog_preview_core::Aabb;
use glam::{Mat4, Vec3};

use crate::material::SurfaceMaterial;

/// An indexed triangle mesh in its own local space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions.
    pub positions: Vec<Vec3>,
    /// Triangles as vertex index triples.
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    /// Creates a mesh from positions and triangles.
    pub fn new(positions: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Self {
        Self {
            positions,
            triangles,
        }
    }

    /// Creates a mesh from polygon faces using fan triangulation.
    ///
    /// For a polygon with vertices [v0, v1, v2, v3, ...], creates triangles:
    /// [v0, v1, v2], [v0, v2, v3], [v0, v3, v4], ...
    pub fn from_polygons(positions: Vec<Vec3>, faces: &[Vec<u32>]) -> Self {
        let mut triangles = Vec::new();
        for face in faces {
            if face.len() < 3 {
                continue;
            }
            let v0 = face[0];
            for i in 1..(face.len() - 1) {
                triangles.push([v0, face[i], face[i + 1]]);
            }
        }
        Self::new(positions, triangles)
    }

    /// Creates a closed box mesh spanning `bounds`.
    pub fn cuboid(bounds: &Aabb) -> Self {
        let faces = Aabb::FACES.map(|face| face.to_vec());
        Self::from_polygons(bounds.corners().to_vec(), &faces)
    }

    /// Returns true if the mesh has no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty() || self.positions.is_empty()
    }

    /// Drops triangles that reference missing vertices.
    ///
    /// Returns the number of triangles removed.
    pub fn retain_valid_triangles(&mut self) -> usize {
        let n = self.positions.len() as u32;
        let before = self.triangles.len();
        self.triangles.retain(|t| t.iter().all(|&i| i < n));
        before - self.triangles.len()
    }

    /// Bounds of the vertices referenced by triangles, after `transform`.
    pub fn bounds(&self, transform: Mat4) -> Option<Aabb> {
        Aabb::from_points(
            self.triangles
                .iter()
                .flatten()
                .map(|&i| transform.transform_point3(self.positions[i as usize])),
        )
    }

    /// Returns the positions of one triangle.
    pub fn triangle(&self, index: usize) -> [Vec3; 3] {
        let [a, b, c] = self.triangles[index];
        [
            self.positions[a as usize],
            self.positions[b as usize],
            self.positions[c as usize],
        ]
    }
}

/// One renderable piece of an asset: a mesh, its local transform and material.
#[derive(Debug, Clone, PartialEq)]
pub struct SubSurface {
    /// Name from the asset, for logging.
    pub name: String,
    /// Geometry in local space.
    pub mesh: Mesh,
    /// Local transform relative to the asset root.
    pub transform: Mat4,
    /// Surface material.
    pub material: SurfaceMaterial,
    /// Whether the surface casts shadows.
    pub cast_shadow: bool,
    /// Whether the surface receives shadows.
    pub receive_shadow: bool,
}

impl SubSurface {
    /// Creates a sub-surface with an identity transform and default material.
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            mesh,
            transform: Mat4::IDENTITY,
            material: SurfaceMaterial::default(),
            cast_shadow: false,
            receive_shadow: false,
        }
    }

    /// Sets the local transform.
    #[must_use]
    pub fn with_transform(mut self, transform: Mat4) -> Self {
        self.transform = transform;
        self
    }

    /// Sets the material.
    #[must_use]
    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.material = material;
        self
    }
}

/// A parsed asset in its native authoring space.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAsset {
    /// Renderable sub-surfaces.
    pub surfaces: Vec<SubSurface>,
}

impl RawAsset {
    /// Creates an asset from sub-surfaces.
    pub fn new(surfaces: Vec<SubSurface>) -> Self {
        Self { surfaces }
    }

    /// Creates a single-surface asset.
    pub fn from_mesh(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::new(vec![SubSurface::new(name, mesh)])
    }

    /// Bounds of all sub-surfaces in the asset's native space.
    pub fn bounds(&self) -> Option<Aabb> {
        self.surfaces
            .iter()
            .filter_map(|s| s.mesh.bounds(s.transform))
            .reduce(|a, b| a.union(&b))
    }

    /// Total triangle count.
    pub fn triangle_count(&self) -> usize {
        self.surfaces.iter().map(|s| s.mesh.triangles.len()).sum()
    }
}

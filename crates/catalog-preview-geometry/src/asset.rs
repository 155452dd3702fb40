//! Asset parsing.
//!
//! Supported formats, detected from the bytes first and the path second:
//! - glTF 2.0, binary (`.glb`) or JSON with embedded buffers
//! - Wavefront OBJ
//! - PLY (ASCII or binary)

use std::path::Path;

use catalog_preview_core::{PreviewError, Result};
use glam::{Mat4, Vec3};
use ply_rs::ply::{DefaultElement, Property};

use crate::material::SurfaceMaterial;
use crate::mesh::{Mesh, RawAsset, SubSurface};

/// Recognized asset formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetFormat {
    /// glTF 2.0 (binary or JSON).
    Gltf,
    /// Wavefront OBJ.
    Obj,
    /// Stanford PLY.
    Ply,
}

impl AssetFormat {
    /// Detects the format from magic bytes, falling back to the file extension.
    pub fn detect(path: &str, bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"glTF") {
            return Some(AssetFormat::Gltf);
        }
        if bytes.starts_with(b"ply") {
            return Some(AssetFormat::Ply);
        }
        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "glb" | "gltf" => Some(AssetFormat::Gltf),
            "obj" => Some(AssetFormat::Obj),
            "ply" => Some(AssetFormat::Ply),
            _ => None,
        }
    }
}

fn parse_error(path: &str, reason: impl ToString) -> PreviewError {
    PreviewError::AssetParse {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

/// Parses asset bytes into sub-surfaces in native authoring space.
pub fn parse_asset(path: &str, bytes: &[u8]) -> Result<RawAsset> {
    let format = AssetFormat::detect(path, bytes)
        .ok_or_else(|| PreviewError::UnsupportedFormat(path.to_string()))?;
    let asset = match format {
        AssetFormat::Gltf => parse_gltf(path, bytes)?,
        AssetFormat::Obj => parse_obj(path, bytes)?,
        AssetFormat::Ply => parse_ply(path, bytes)?,
    };
    if asset.triangle_count() == 0 {
        return Err(PreviewError::EmptyAsset(path.to_string()));
    }
    log::debug!(
        "parsed {path} as {format:?}: {} surfaces, {} triangles",
        asset.surfaces.len(),
        asset.triangle_count()
    );
    Ok(asset)
}

// === glTF ===

fn parse_gltf(path: &str, bytes: &[u8]) -> Result<RawAsset> {
    let (document, buffers, _images) =
        gltf::import_slice(bytes).map_err(|e| parse_error(path, e))?;

    let mut surfaces = Vec::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                collect_gltf_node(&node, Mat4::IDENTITY, &buffers, &mut surfaces);
            }
        }
        None => {
            // No scene: take meshes as-is
            for mesh in document.meshes() {
                collect_gltf_mesh(&mesh, Mat4::IDENTITY, &buffers, &mut surfaces);
            }
        }
    }
    Ok(RawAsset::new(surfaces))
}

fn collect_gltf_node(
    node: &gltf::Node,
    parent: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<SubSurface>,
) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(mesh) = node.mesh() {
        collect_gltf_mesh(&mesh, world, buffers, out);
    }
    for child in node.children() {
        collect_gltf_node(&child, world, buffers, out);
    }
}

fn collect_gltf_mesh(
    mesh: &gltf::Mesh,
    transform: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut Vec<SubSurface>,
) {
    let name = mesh.name().unwrap_or("mesh");
    for primitive in mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::debug!("skipping non-triangle primitive in '{name}'");
            continue;
        }
        let reader = primitive.reader(|buffer| Some(&buffers[buffer.index()]));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<Vec3> = positions.map(Vec3::from_array).collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(iter) => iter.into_u32().collect(),
            None => (0..positions.len() as u32).collect(),
        };
        let triangles = indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect();

        let material = primitive.material();
        let pbr = material.pbr_metallic_roughness();
        let [r, g, b, a] = pbr.base_color_factor();
        let surface_material = SurfaceMaterial::authored(
            material.name().unwrap_or("gltf"),
            Vec3::new(r, g, b),
            Vec3::from_array(material.emissive_factor()),
            a,
        );

        out.push(
            SubSurface::new(name, Mesh::new(positions, triangles))
                .with_transform(transform)
                .with_material(surface_material),
        );
    }
}

// === OBJ ===

fn parse_obj(path: &str, bytes: &[u8]) -> Result<RawAsset> {
    let mut reader = bytes;
    let (models, _materials) = tobj::load_obj_buf(
        &mut reader,
        &tobj::LoadOptions {
            triangulate: true,
            single_index: true,
            ..Default::default()
        },
        // Material libraries are never resolved for previews
        |_| Err(tobj::LoadError::OpenFileFailed),
    )
    .map_err(|e| parse_error(path, e))?;

    let surfaces = models
        .into_iter()
        .map(|model| {
            let positions = model
                .mesh
                .positions
                .chunks_exact(3)
                .map(|p| Vec3::new(p[0], p[1], p[2]))
                .collect();
            let triangles = model
                .mesh
                .indices
                .chunks_exact(3)
                .map(|c| [c[0], c[1], c[2]])
                .collect();
            SubSurface::new(model.name, Mesh::new(positions, triangles))
        })
        .collect();
    Ok(RawAsset::new(surfaces))
}

// === PLY ===

#[allow(clippy::cast_possible_truncation)]
fn property_f32(property: &Property) -> Option<f32> {
    match property {
        Property::Float(v) => Some(*v),
        Property::Double(v) => Some(*v as f32),
        Property::Int(v) => Some(*v as f32),
        Property::UInt(v) => Some(*v as f32),
        Property::Short(v) => Some(f32::from(*v)),
        Property::UShort(v) => Some(f32::from(*v)),
        Property::Char(v) => Some(f32::from(*v)),
        Property::UChar(v) => Some(f32::from(*v)),
        _ => None,
    }
}

#[allow(clippy::cast_sign_loss)]
fn property_indices(property: &Property) -> Option<Vec<u32>> {
    match property {
        Property::ListInt(v) => Some(v.iter().map(|&i| i as u32).collect()),
        Property::ListUInt(v) => Some(v.clone()),
        Property::ListShort(v) => Some(v.iter().map(|&i| i as u32).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&i| u32::from(i)).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&i| i as u32).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&i| u32::from(i)).collect()),
        _ => None,
    }
}

fn parse_ply(path: &str, bytes: &[u8]) -> Result<RawAsset> {
    let parser = ply_rs::parser::Parser::<DefaultElement>::new();
    let mut reader = bytes;
    let ply = parser
        .read_ply(&mut reader)
        .map_err(|e| parse_error(path, e))?;

    let vertices = ply
        .payload
        .get("vertex")
        .ok_or_else(|| parse_error(path, "missing vertex element"))?;
    let positions = vertices
        .iter()
        .map(|v| {
            let coord = |key: &str| v.get(key).and_then(property_f32);
            match (coord("x"), coord("y"), coord("z")) {
                (Some(x), Some(y), Some(z)) => Ok(Vec3::new(x, y, z)),
                _ => Err(parse_error(path, "vertex without x/y/z")),
            }
        })
        .collect::<Result<Vec<_>>>()?;

    let faces: Vec<Vec<u32>> = ply
        .payload
        .get("face")
        .map(|faces| {
            faces
                .iter()
                .filter_map(|f| {
                    f.get("vertex_indices")
                        .or_else(|| f.get("vertex_index"))
                        .and_then(property_indices)
                })
                .collect()
        })
        .unwrap_or_default();

    let name = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("ply");
    Ok(RawAsset::from_mesh(name, Mesh::from_polygons(positions, &faces)))
}

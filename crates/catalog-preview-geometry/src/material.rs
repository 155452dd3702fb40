//! Surface materials and the preview material policy.
//!
//! Items flagged "preserve materials" keep what the asset authored. Everything
//! else is repainted with a flat category color plus a small emissive tint
//! looked up by that color.

use catalog_preview_core::{color_from_hex, emissive_for, MaterialConfig};
use glam::Vec3;

use crate::mesh::SubSurface;

/// Material of a sub-surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceMaterial {
    /// Material name.
    pub name: String,
    /// Base (albedo) color.
    pub base_color: Vec3,
    /// Emissive color added after lighting.
    pub emissive: Vec3,
    /// Opacity in `[0, 1]`.
    pub opacity: f32,
    /// Whether the material came from the asset.
    pub authored: bool,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            base_color: Vec3::splat(0.8),
            emissive: Vec3::ZERO,
            opacity: 1.0,
            authored: false,
        }
    }
}

impl SurfaceMaterial {
    /// Creates an authored material read from an asset.
    pub fn authored(name: impl Into<String>, base_color: Vec3, emissive: Vec3, opacity: f32) -> Self {
        Self {
            name: name.into(),
            base_color,
            emissive,
            opacity: opacity.clamp(0.0, 1.0),
            authored: true,
        }
    }

    /// Creates the flat category material for a `0xRRGGBB` color.
    pub fn category(color: u32) -> Self {
        Self {
            name: format!("category-{color:06x}"),
            base_color: color_from_hex(color),
            emissive: emissive_for(color),
            opacity: 1.0,
            authored: false,
        }
    }
}

/// Applies the material policy to every sub-surface.
///
/// Shadow flags are always enabled; materials are only replaced when the
/// configuration does not ask to preserve them.
pub fn apply_material_policy(surfaces: &mut [SubSurface], config: MaterialConfig, color: u32) {
    for surface in surfaces {
        surface.cast_shadow = true;
        surface.receive_shadow = true;
        if !config.preserve_materials {
            surface.material = SurfaceMaterial::category(color);
        }
    }
}

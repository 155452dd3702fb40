//! Category colors and the emissive tint table.

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Emissive tint per base color (both `0xRRGGBB`).
///
/// Keyed by color rather than by category: any category mapped to one of these
/// colors gets the same tint.
const EMISSIVE_TABLE: &[(u32, u32)] = &[
    (0x8b_7d_6b, 0x1a_17_14), // walls
    (0x8b_5a_2b, 0x1c_12_08), // doors
    (0x87_ce_eb, 0x10_1e_24), // windows
    (0xc1_9a_6b, 0x1e_18_10), // furniture
    (0x9e_9e_9e, 0x18_18_18), // stairs, columns
    (0x6b_8e_23, 0x10_16_06), // landscape
];

/// Tint used for colors missing from the table.
const DEFAULT_EMISSIVE: u32 = 0x14_14_14;

/// Color used for categories missing from the palette.
const DEFAULT_COLOR: u32 = 0xb0_b0_b0;

/// Converts `0xRRGGBB` to linear-ish RGB in `[0, 1]`.
pub fn color_from_hex(hex: u32) -> Vec3 {
    let r = ((hex >> 16) & 0xff) as f32 / 255.0;
    let g = ((hex >> 8) & 0xff) as f32 / 255.0;
    let b = (hex & 0xff) as f32 / 255.0;
    Vec3::new(r, g, b)
}

/// Returns the emissive tint for a base color.
pub fn emissive_for(color: u32) -> Vec3 {
    let tint = EMISSIVE_TABLE
        .iter()
        .find(|(base, _)| *base == color)
        .map_or(DEFAULT_EMISSIVE, |(_, tint)| *tint);
    color_from_hex(tint)
}

/// Category to color lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPalette {
    /// Category name -> `0xRRGGBB`.
    colors: HashMap<String, u32>,
    /// Color for unknown categories.
    #[serde(default = "default_color")]
    fallback: u32,
}

fn default_color() -> u32 {
    DEFAULT_COLOR
}

impl Default for CategoryPalette {
    fn default() -> Self {
        let colors = [
            ("walls", 0x8b_7d_6b),
            ("doors", 0x8b_5a_2b),
            ("windows", 0x87_ce_eb),
            ("furniture", 0xc1_9a_6b),
            ("stairs", 0x9e_9e_9e),
            ("columns", 0x9e_9e_9e),
            ("landscape", 0x6b_8e_23),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();
        Self {
            colors,
            fallback: DEFAULT_COLOR,
        }
    }
}

impl CategoryPalette {
    /// Creates an empty palette; every category maps to the fallback color.
    pub fn empty() -> Self {
        Self {
            colors: HashMap::new(),
            fallback: DEFAULT_COLOR,
        }
    }

    /// Sets the color for a category.
    #[must_use]
    pub fn with_color(mut self, category: impl Into<String>, color: u32) -> Self {
        self.colors.insert(category.into(), color);
        self
    }

    /// Returns the `0xRRGGBB` color for a category.
    pub fn color_for(&self, category: &str) -> u32 {
        self.colors.get(category).copied().unwrap_or(self.fallback)
    }
}

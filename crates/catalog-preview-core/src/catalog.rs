//! Catalog data model consumed from the catalog layer.
//!
//! Declared dimensions use the domain convention `(x = width, y = depth,
//! z = height)`. Render space is `(x = width, y = height, z = depth)`, so the
//! declared `y` and `z` swap when building a target size.

use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{PreviewError, Result};

/// Declared physical size of a catalog item, in domain axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width.
    pub x: f32,
    /// Depth.
    pub y: f32,
    /// Height.
    pub z: f32,
}

impl Dimensions {
    /// Creates dimensions from domain `(width, depth, height)`.
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns the target size in render axes `(width, height, depth)`.
    pub fn to_render_size(self) -> Vec3 {
        Vec3::new(self.x, self.z, self.y)
    }

    /// Checks that every axis is finite and strictly positive.
    pub fn validate(self) -> Result<Self> {
        let ok = [self.x, self.y, self.z]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0);
        if ok {
            Ok(self)
        } else {
            Err(PreviewError::InvalidDimensions {
                x: self.x,
                y: self.y,
                z: self.z,
            })
        }
    }
}

/// Material handling flags from the catalog configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MaterialConfig {
    /// Keep the asset's authored materials instead of the category color.
    #[serde(default)]
    pub preserve_materials: bool,
}

/// One entry of the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Display name.
    pub name: String,
    /// Category name, used for the flat preview color.
    #[serde(default)]
    pub category: String,
    /// Declared dimensions in domain axes.
    pub dims: Dimensions,
    /// Path of the 3D asset, if the item has one.
    #[serde(default)]
    pub asset_path: Option<String>,
    /// Material flags.
    #[serde(default)]
    pub material: MaterialConfig,
}

impl CatalogItem {
    /// Creates an item without an asset.
    pub fn new(name: impl Into<String>, category: impl Into<String>, dims: Dimensions) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            dims,
            asset_path: None,
            material: MaterialConfig::default(),
        }
    }

    /// Sets the asset path.
    #[must_use]
    pub fn with_asset(mut self, path: impl Into<String>) -> Self {
        self.asset_path = Some(path.into());
        self
    }

    /// Sets whether authored materials are kept.
    #[must_use]
    pub fn with_preserved_materials(mut self, preserve: bool) -> Self {
        self.material.preserve_materials = preserve;
        self
    }

    /// Returns the identity key of this item.
    pub fn item_ref(&self) -> CatalogItemRef {
        CatalogItemRef::new(&self.name, self.dims)
    }
}

/// Identity key derived from an item's name and declared dimensions.
///
/// Two items with the same name and dimensions share a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogItemRef(String);

impl CatalogItemRef {
    /// Derives the key for a name and dimensions.
    pub fn new(name: &str, dims: Dimensions) -> Self {
        Self(format!("{name}-{}x{}x{}", dims.x, dims.y, dims.z))
    }

    /// Returns the key as a string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CatalogItemRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parses an ordered catalog list from JSON.
pub fn catalog_from_json(json: &str) -> Result<Vec<CatalogItem>> {
    let items: Vec<CatalogItem> = serde_json::from_str(json)?;
    log::debug!("loaded catalog with {} items", items.len());
    Ok(items)
}

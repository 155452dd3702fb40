//! Asset sources and preview load tasks.
//!
//! A [`LoadTask`] is the asynchronous half of a cache load: fetch the asset
//! bytes, parse them, and normalize the result (or build a fallback box).
//! It never touches cache state. The host drives the future to completion and
//! hands the [`LoadOutcome`] back to [`PreviewCache::complete_load`].
//!
//! [`PreviewCache::complete_load`]: crate::PreviewCache::complete_load

use std::collections::HashMap;
use std::future::{self, Future};
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use catalog_preview_core::{
    CatalogItem, CatalogItemRef, CategoryPalette, LoadFailurePolicy, PreviewError, Result,
};
use catalog_preview_geometry::{build_fallback, normalize_item, parse_asset, PreviewModel};
use log::{debug, warn};
use pollster::FutureExt;

/// Future resolving to the raw bytes of an asset.
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send>>;

/// Resolves asset paths to binary asset data.
pub trait AssetSource: Send + Sync {
    /// Starts fetching the asset at `path`.
    fn fetch(&self, path: &str) -> FetchFuture;
}

/// Asset source backed by an in-memory map.
///
/// Assets can be added and removed while the source is shared with a cache.
#[derive(Debug, Default)]
pub struct MemoryAssetSource {
    assets: RwLock<HashMap<String, Arc<[u8]>>>,
}

impl MemoryAssetSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an asset, builder style.
    #[must_use]
    pub fn with_asset(self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }

    /// Adds or replaces an asset.
    pub fn insert(&self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        self.assets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), bytes.into());
    }

    /// Removes an asset, returning whether it existed.
    pub fn remove(&self, path: &str) -> bool {
        self.assets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(path)
            .is_some()
    }

    /// Number of stored assets.
    pub fn len(&self) -> usize {
        self.assets.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Returns true if no assets are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AssetSource for MemoryAssetSource {
    fn fetch(&self, path: &str) -> FetchFuture {
        let found = self
            .assets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned();
        let result = found
            .map(|bytes| bytes.to_vec())
            .ok_or_else(|| PreviewError::AssetFetch {
                path: path.to_string(),
                reason: "not found".to_string(),
            });
        Box::pin(future::ready(result))
    }
}

/// Asset source reading files below a root directory.
///
/// Reads are synchronous: the returned future does the whole `std::fs::read`
/// on its first poll and blocks the executor thread until it finishes. Run
/// the task on a blocking pool (or through [`LoadTask::run_blocking`]) when
/// assets are large or the disk is slow.
#[derive(Debug, Clone)]
pub struct FileAssetSource {
    root: PathBuf,
}

impl FileAssetSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetSource for FileAssetSource {
    fn fetch(&self, path: &str) -> FetchFuture {
        let full = self.root.join(path);
        let path = path.to_string();
        Box::pin(async move {
            std::fs::read(&full).map_err(|e| PreviewError::AssetFetch {
                path,
                reason: e.to_string(),
            })
        })
    }
}

/// Identifies one load attempt. Completions carrying an outdated ticket are
/// ignored by the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(pub(crate) u64);

/// Result of a finished [`LoadTask`].
#[derive(Debug)]
pub struct LoadOutcome {
    /// Ticket of the load attempt.
    pub ticket: LoadTicket,
    /// Item that was loaded.
    pub item_ref: CatalogItemRef,
    /// The normalized model, or why it could not be built.
    pub result: Result<PreviewModel>,
}

/// An in-flight preview load: fetch, parse and normalize one catalog item.
pub struct LoadTask {
    ticket: LoadTicket,
    item: CatalogItem,
    source: Arc<dyn AssetSource>,
    palette: Arc<CategoryPalette>,
    edge_threshold: f32,
    failure_policy: LoadFailurePolicy,
}

impl LoadTask {
    pub(crate) fn new(
        ticket: LoadTicket,
        item: CatalogItem,
        source: Arc<dyn AssetSource>,
        palette: Arc<CategoryPalette>,
        edge_threshold: f32,
        failure_policy: LoadFailurePolicy,
    ) -> Self {
        Self {
            ticket,
            item,
            source,
            palette,
            edge_threshold,
            failure_policy,
        }
    }

    /// Returns the load ticket.
    pub fn ticket(&self) -> LoadTicket {
        self.ticket
    }

    /// Returns the item being loaded.
    pub fn item(&self) -> &CatalogItem {
        &self.item
    }

    /// Runs the load to completion.
    ///
    /// Items without an asset path get a fallback box. Fetch errors are always
    /// reported; parse and normalization errors fall back to a box when the
    /// failure policy asks for it.
    pub async fn run(self) -> LoadOutcome {
        let item_ref = self.item.item_ref();
        let result = self.build().await;
        LoadOutcome {
            ticket: self.ticket,
            item_ref,
            result,
        }
    }

    /// Runs the load on the current thread.
    pub fn run_blocking(self) -> LoadOutcome {
        self.run().block_on()
    }

    async fn build(&self) -> Result<PreviewModel> {
        let Some(path) = self.item.asset_path.as_deref() else {
            return build_fallback(&self.item, &self.palette);
        };

        let bytes = self.source.fetch(path).await?;
        debug!("{}: fetched {} bytes from {path}", self.item.name, bytes.len());
        let built = parse_asset(path, &bytes)
            .and_then(|asset| normalize_item(asset, &self.item, &self.palette, self.edge_threshold));

        match built {
            Err(err) if self.failure_policy == LoadFailurePolicy::FallbackBox => {
                warn!("{}: {err}; using fallback box", self.item.name);
                build_fallback(&self.item, &self.palette)
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_preview_core::Dimensions;
    use catalog_preview_geometry::ModelOrigin;

    const TRIANGLE_OBJ: &str = "v 0 0 0\nv 2 0 0\nv 0 4 1\nf 1 2 3\n";

    fn task(item: CatalogItem, source: MemoryAssetSource, policy: LoadFailurePolicy) -> LoadTask {
        LoadTask::new(
            LoadTicket(7),
            item,
            Arc::new(source),
            Arc::new(CategoryPalette::default()),
            15.0,
            policy,
        )
    }

    fn chair() -> CatalogItem {
        CatalogItem::new("Chair", "furniture", Dimensions::new(45.0, 50.0, 90.0))
    }

    #[test]
    fn test_memory_source_fetch() {
        let source = MemoryAssetSource::new().with_asset("a.obj", TRIANGLE_OBJ);
        assert_eq!(source.len(), 1);
        let bytes = source.fetch("a.obj").block_on().unwrap();
        assert_eq!(bytes, TRIANGLE_OBJ.as_bytes());

        let missing = source.fetch("b.obj").block_on();
        assert!(matches!(missing, Err(PreviewError::AssetFetch { .. })));

        assert!(source.remove("a.obj"));
        assert!(source.is_empty());
    }

    #[test]
    fn test_file_source_missing_file() {
        let source = FileAssetSource::new(std::env::temp_dir().join("catalog-preview-none"));
        let result = source.fetch("nope.glb").block_on();
        assert!(matches!(result, Err(PreviewError::AssetFetch { .. })));
    }

    #[test]
    fn test_no_asset_builds_fallback() {
        let outcome = task(chair(), MemoryAssetSource::new(), LoadFailurePolicy::Placeholder)
            .run_blocking();
        assert_eq!(outcome.ticket, LoadTicket(7));
        assert_eq!(outcome.item_ref, chair().item_ref());
        let model = outcome.result.unwrap();
        assert_eq!(model.origin(), ModelOrigin::Fallback);
    }

    #[test]
    fn test_asset_is_normalized() {
        let source = MemoryAssetSource::new().with_asset("chair.obj", TRIANGLE_OBJ);
        let item = chair().with_asset("chair.obj");
        let model = task(item, source, LoadFailurePolicy::Placeholder)
            .run_blocking()
            .result
            .unwrap();
        assert_eq!(model.origin(), ModelOrigin::Asset);
        let size = model.bounds().unwrap().size();
        assert!((size - glam::Vec3::new(45.0, 90.0, 50.0)).abs().max_element() < 1e-3);
    }

    #[test]
    fn test_fetch_failure_ignores_fallback_policy() {
        let item = chair().with_asset("missing.obj");
        let outcome = task(item, MemoryAssetSource::new(), LoadFailurePolicy::FallbackBox)
            .run_blocking();
        assert!(outcome.result.unwrap_err().is_fetch_failure());
    }

    #[test]
    fn test_parse_failure_follows_policy() {
        let item = chair().with_asset("broken.obj");
        let source = || MemoryAssetSource::new().with_asset("broken.obj", "v 0 0 0\n");

        let outcome = task(item.clone(), source(), LoadFailurePolicy::Placeholder).run_blocking();
        assert!(outcome.result.is_err());

        let outcome = task(item, source(), LoadFailurePolicy::FallbackBox).run_blocking();
        assert_eq!(outcome.result.unwrap().origin(), ModelOrigin::Fallback);
    }
}

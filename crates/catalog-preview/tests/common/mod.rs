//! Shared helpers for the integration tests.

use std::sync::{Arc, OnceLock};

use catalog_preview::{GpuDevice, PreviewOptions};

/// Shared headless device, `None` when the machine has no adapter.
pub fn gpu() -> Option<Arc<GpuDevice>> {
    static GPU: OnceLock<Option<Arc<GpuDevice>>> = OnceLock::new();
    GPU.get_or_init(|| match GpuDevice::request() {
        Ok(gpu) => Some(gpu),
        Err(e) => {
            eprintln!("Skipping GPU tests: no adapter available ({e})");
            None
        }
    })
    .clone()
}

/// Default options with small thumbnails to keep readback cheap.
pub fn options() -> PreviewOptions {
    PreviewOptions::default().with_thumbnail_size(64, 48)
}

//! Scrolls a synthetic catalog past the preview cache and reports what it did.
//!
//! Run with `RUST_LOG=debug cargo run --example scroll_demo` to watch every
//! load, activation and eviction. The last rendered thumbnail is written to
//! the system temp directory.

use std::sync::Arc;
use std::time::{Duration, Instant};

use catalog_preview::*;

/// An off-center, oddly scaled wedge: normalization must fix both.
const WEDGE_OBJ: &str = "\
v 10 5 0
v 14 5 0
v 10 5 2
v 14 5 2
v 10 8 0
v 14 8 0
f 1 2 4 3
f 1 5 6 2
f 3 4 6 5
f 1 3 5
f 2 6 4
";

const CATALOG: &str = r#"[
    {"name": "Wall", "category": "walls", "dims": {"x": 300, "y": 20, "z": 250}},
    {"name": "Door", "category": "doors", "dims": {"x": 90, "y": 10, "z": 210}, "asset_path": "wedge.obj"},
    {"name": "Window", "category": "windows", "dims": {"x": 120, "y": 10, "z": 140}, "asset_path": "missing.glb"},
    {"name": "Ramp", "category": "stairs", "dims": {"x": 100, "y": 300, "z": 80}, "asset_path": "wedge.obj",
     "material": {"preserve_materials": true}}
]"#;

const ROW_HEIGHT: f32 = 130.0;

fn main() -> Result<()> {
    init_logging();

    // Repeat the base catalog with varying sizes to get a long list
    let base = catalog_from_json(CATALOG)?;
    let items: Vec<CatalogItem> = (0..15)
        .flat_map(|round| {
            base.iter().map(move |item| {
                let mut item = item.clone();
                item.dims.x += round as f32 * 10.0;
                item
            })
        })
        .collect();

    let source = Arc::new(MemoryAssetSource::new().with_asset("wedge.obj", WEDGE_OBJ));
    let options = PreviewOptions::default();
    let gpu = GpuDevice::request()?;
    let mut cache = PreviewCache::new(options.clone(), source, gpu)?;
    let mut tracker = VisibilityTracker::new(options.visibility_margin, options.visibility_threshold);

    let mut slots = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        tracker.observe(item.item_ref(), Rect::new(0.0, i as f32 * ROW_HEIGHT, 160.0, 120.0));
        slots.push(MemorySlot::new());
    }

    let start = Instant::now();
    let mut viewport = Rect::new(0.0, 0.0, 480.0, 720.0);
    let frame = Duration::from_millis(16);
    for tick in 0..600u32 {
        let now = start + frame * tick;

        let mut tasks = Vec::new();
        for event in tracker.update(&viewport) {
            let Some(index) = items.iter().position(|i| &i.item_ref() == event.item_ref()) else {
                continue;
            };
            match event {
                VisibilityEvent::Enter(_) => {
                    tasks.extend(cache.on_enter_view(&items[index], slots[index].clone()));
                }
                VisibilityEvent::Leave(item_ref) => cache.on_leave_view(&item_ref, now),
            }
        }
        for task in tasks {
            cache.complete_load(task.run_blocking(), now);
        }
        cache.process_timers(now);

        // Hover whatever sits at the top of the viewport
        let hovered = (viewport.y / ROW_HEIGHT) as usize;
        if let Some(item) = items.get(hovered) {
            if tick % 60 == 0 {
                for other in &items {
                    cache.hover_stop(&other.item_ref());
                }
                cache.hover_start(&item.item_ref());
            }
        }
        cache.animate_frame();

        // Scroll for the first half, then sit still
        if tick < 300 {
            viewport = viewport.translated(0.0, 20.0);
        }
    }

    let stats = cache.stats();
    println!("catalog items:      {}", items.len());
    println!("loads started:      {}", stats.loads_started);
    println!("activations:        {}", stats.activations);
    println!("failures:           {}", stats.failures);
    println!("capacity evictions: {}", stats.capacity_evictions);
    println!("idle evictions:     {}", stats.idle_evictions);
    println!("resident now:       {}", stats.resident);

    if let Some(item_ref) = cache.resident_refs().last().cloned() {
        if let Some(context) = cache.context(&item_ref) {
            let path = std::env::temp_dir().join("catalog_preview_demo.png");
            match context.save_png(&path) {
                Ok(()) => println!("thumbnail:          {}", path.display()),
                Err(e) => log::error!("Failed to save thumbnail: {e}"),
            }
        }
    }

    cache.teardown();
    Ok(())
}

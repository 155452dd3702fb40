//! Scroll scenarios for the preview cache.
//!
//! Every test drives a virtual clock: `now` is an `Instant` captured once
//! and advanced by hand.

use std::sync::Arc;
use std::time::{Duration, Instant};

use catalog_preview::*;

mod common;

fn wall(i: usize) -> CatalogItem {
    CatalogItem::new(format!("Wall {i}"), "walls", Dimensions::new(300.0, 20.0, 250.0))
}

fn default_cache() -> Option<PreviewCache<MemorySlot>> {
    let gpu = common::gpu()?;
    let cache = PreviewCache::new(common::options(), Arc::new(MemoryAssetSource::new()), gpu)
        .expect("default options are valid");
    Some(cache)
}

/// Enters an item and resolves its load immediately.
fn show(cache: &mut PreviewCache<MemorySlot>, item: &CatalogItem, now: Instant) -> MemorySlot {
    let slot = MemorySlot::new();
    let task = cache
        .on_enter_view(item, slot.clone())
        .expect("item should be absent");
    cache.complete_load(task.run_blocking(), now);
    slot
}

#[test]
fn test_twelve_items_scroll_in_fifo() {
    let Some(mut cache) = default_cache() else { return };
    let now = Instant::now();
    let items: Vec<_> = (0..12).map(wall).collect();

    let slots: Vec<_> = items.iter().take(10).map(|i| show(&mut cache, i, now)).collect();
    assert_eq!(cache.resident_len(), 10);

    show(&mut cache, &items[10], now);
    assert_eq!(cache.resident_len(), 10);
    assert_eq!(cache.state(&items[0].item_ref()), None);
    assert_eq!(slots[0].placeholder(), Some(Placeholder::Neutral));
    assert!(cache.is_active(&items[1].item_ref()));

    show(&mut cache, &items[11], now);
    assert_eq!(cache.resident_len(), 10);
    assert_eq!(cache.state(&items[1].item_ref()), None);

    let stats = cache.stats();
    assert_eq!(stats.capacity_evictions, 2);
    assert_eq!(stats.disposals, 2);
    assert_eq!(stats.activations, 12);
}

#[test]
fn test_reentry_within_delay_keeps_entry() {
    let Some(mut cache) = default_cache() else { return };
    let start = Instant::now();
    let items: Vec<_> = (0..8).map(wall).collect();
    for item in &items {
        show(&mut cache, item, start);
    }
    let target = items[0].item_ref();

    cache.on_leave_view(&target, start);
    assert!(cache.is_active(&target));

    let back = start + Duration::from_millis(500);
    assert_eq!(cache.process_timers(back), 0);
    assert!(cache.is_active(&target));

    // Back in view 500 ms later: no new load, the re-check is dropped
    assert!(cache.on_enter_view(&items[0], MemorySlot::new()).is_none());
    assert!(cache.is_active(&target));
    assert_eq!(cache.next_deadline(), None);

    assert_eq!(cache.process_timers(start + Duration::from_secs(2)), 0);
    assert!(cache.is_active(&target));
    assert_eq!(cache.stats().loads_started, 8);
}

#[test]
fn test_leave_reenter_leave_gets_full_delay() {
    let Some(mut cache) = default_cache() else { return };
    let start = Instant::now();
    let items: Vec<_> = (0..8).map(wall).collect();
    for item in &items {
        show(&mut cache, item, start);
    }
    let target = items[0].item_ref();

    cache.on_leave_view(&target, start);
    assert!(cache.on_enter_view(&items[0], MemorySlot::new()).is_none());
    let second_leave = start + Duration::from_secs(1);
    cache.on_leave_view(&target, second_leave);
    assert_eq!(cache.next_deadline(), Some(second_leave + Duration::from_secs(2)));

    // The first leave's deadline passes without evicting
    assert_eq!(cache.process_timers(start + Duration::from_secs(2)), 0);
    assert!(cache.is_active(&target));

    assert_eq!(cache.process_timers(second_leave + Duration::from_secs(2)), 1);
    assert_eq!(cache.state(&target), None);
}

#[test]
fn test_failed_fetch_is_retried_on_next_enter() {
    let Some(gpu) = common::gpu() else { return };
    let source = Arc::new(MemoryAssetSource::new());
    let mut cache: PreviewCache<MemorySlot> =
        PreviewCache::new(common::options(), source.clone(), gpu).unwrap();
    let window = CatalogItem::new("Window", "windows", Dimensions::new(120.0, 10.0, 140.0))
        .with_asset("window.obj");
    let slot = MemorySlot::new();

    let task = cache.on_enter_view(&window, slot.clone()).unwrap();
    assert!(!cache.complete_load(task.run_blocking(), Instant::now()));
    assert_eq!(slot.placeholder(), Some(Placeholder::Error));
    assert_eq!(cache.state(&window.item_ref()), None);

    // Still missing: a fresh attempt is made and fails again
    let task = cache.on_enter_view(&window, slot.clone()).unwrap();
    assert!(!cache.complete_load(task.run_blocking(), Instant::now()));
    assert_eq!(cache.stats().loads_started, 2);
    assert_eq!(cache.stats().failures, 2);
}

#[test]
fn test_parse_failure_with_fallback_policy_shows_box() {
    let Some(gpu) = common::gpu() else { return };
    let source = Arc::new(MemoryAssetSource::new().with_asset("stair.obj", "not an obj"));
    let options = common::options().with_load_failure(LoadFailurePolicy::FallbackBox);
    let mut cache: PreviewCache<MemorySlot> = PreviewCache::new(options, source, gpu).unwrap();
    let stair = CatalogItem::new("Stair", "stairs", Dimensions::new(100.0, 300.0, 280.0))
        .with_asset("stair.obj");

    let slot = show(&mut cache, &stair, Instant::now());
    assert!(slot.has_frame());
    let model = cache.model(&stair.item_ref()).unwrap();
    assert_eq!(model.origin(), ModelOrigin::Fallback);
    assert!((model.bounds().unwrap().size() - Vec3::new(100.0, 280.0, 300.0)).length() < 1e-3);
}

#[test]
fn test_idle_eviction_stops_at_floor() {
    let Some(mut cache) = default_cache() else { return };
    let start = Instant::now();
    let items: Vec<_> = (0..8).map(wall).collect();
    for item in &items {
        show(&mut cache, item, start);
    }

    for item in &items {
        cache.on_leave_view(&item.item_ref(), start);
    }
    assert_eq!(cache.next_deadline(), Some(start + Duration::from_secs(2)));

    let evicted = cache.process_timers(start + Duration::from_secs(2));
    assert_eq!(evicted, 3);
    assert_eq!(cache.resident_len(), 5);

    // The oldest leavers go first
    for item in &items[..3] {
        assert!(!cache.is_active(&item.item_ref()));
    }
    for item in &items[3..] {
        assert!(cache.is_active(&item.item_ref()));
    }
}

#[test]
fn test_leave_while_loading_activates_anyway() {
    let Some(mut cache) = default_cache() else { return };
    let start = Instant::now();
    for item in (1..8).map(wall) {
        show(&mut cache, &item, start);
    }

    let item = wall(0);
    let task = cache.on_enter_view(&item, MemorySlot::new()).unwrap();
    cache.on_leave_view(&item.item_ref(), start);

    // The re-check fires while the fetch is still in flight
    assert_eq!(cache.process_timers(start + Duration::from_secs(2)), 0);
    assert!(cache.is_loading(&item.item_ref()));

    let later = start + Duration::from_secs(3);
    assert!(cache.complete_load(task.run_blocking(), later));
    assert!(cache.is_active(&item.item_ref()));
    assert!(!cache.is_visible(&item.item_ref()));

    // Cleaned up on its next visibility re-check
    cache.on_enter_view(&item, MemorySlot::new());
    cache.on_leave_view(&item.item_ref(), later);
    assert_eq!(cache.process_timers(later + Duration::from_secs(2)), 1);
    assert_eq!(cache.state(&item.item_ref()), None);
}

#[test]
fn test_teardown_releases_everything() {
    let Some(mut cache) = default_cache() else { return };
    let now = Instant::now();
    let active: Vec<_> = (0..4).map(|i| show(&mut cache, &wall(i), now)).collect();

    let pending_slot = MemorySlot::new();
    let pending = cache.on_enter_view(&wall(10), pending_slot.clone()).unwrap();
    cache.hover_start(&wall(0).item_ref());

    cache.teardown();
    assert_eq!(cache.resident_len(), 0);
    assert_eq!(cache.loading_len(), 0);
    assert!(!cache.is_rotating(&wall(0).item_ref()));
    for slot in &active {
        assert_eq!(slot.placeholder(), Some(Placeholder::Neutral));
    }
    assert_eq!(pending_slot.placeholder(), Some(Placeholder::Neutral));
    assert_eq!(cache.stats().disposals, 4);

    // The in-flight load resolves after teardown and is discarded
    assert!(!cache.complete_load(pending.run_blocking(), now));
    assert_eq!(cache.state(&wall(10).item_ref()), None);
}

#[test]
fn test_same_name_and_dims_share_entry() {
    let Some(mut cache) = default_cache() else { return };
    let a = CatalogItem::new("Column", "columns", Dimensions::new(30.0, 30.0, 300.0));
    let b = CatalogItem::new("Column", "walls", Dimensions::new(30.0, 30.0, 300.0));

    show(&mut cache, &a, Instant::now());
    assert!(cache.on_enter_view(&b, MemorySlot::new()).is_none());
    assert_eq!(cache.resident_len(), 1);
}

#[test]
fn test_visibility_tracker_drives_cache() {
    let options = PreviewOptions::default();
    let mut tracker = VisibilityTracker::new(options.visibility_margin, options.visibility_threshold);
    let Some(mut cache) = default_cache() else { return };
    let items: Vec<_> = (0..40).map(wall).collect();
    for (i, item) in items.iter().enumerate() {
        tracker.observe(item.item_ref(), Rect::new(0.0, i as f32 * 130.0, 160.0, 120.0));
    }

    let start = Instant::now();
    let mut viewport = Rect::new(0.0, 0.0, 400.0, 600.0);
    for step in 0..30u32 {
        let now = start + Duration::from_millis(u64::from(step) * 300);
        let mut tasks = Vec::new();
        for event in tracker.update(&viewport) {
            match event {
                VisibilityEvent::Enter(item_ref) => {
                    let item = items.iter().find(|i| i.item_ref() == item_ref).unwrap();
                    tasks.extend(cache.on_enter_view(item, MemorySlot::new()));
                }
                VisibilityEvent::Leave(item_ref) => cache.on_leave_view(&item_ref, now),
            }
        }
        for task in tasks {
            cache.complete_load(task.run_blocking(), now);
            assert!(cache.resident_len() <= options.max_resident);
        }
        cache.process_timers(now);

        for item in &items {
            if tracker.is_visible(&item.item_ref()) {
                assert!(cache.is_active(&item.item_ref()), "{} should be shown", item.name);
            }
        }
        viewport = viewport.translated(0.0, 150.0);
    }

    assert!(cache.stats().disposals > 0);
    assert!(cache.resident_len() >= options.min_resident);
}

//! Property tests: cache invariants under arbitrary interleavings of
//! visibility events, load completions and timer ticks.

use std::sync::Arc;
use std::time::{Duration, Instant};

use catalog_preview::*;
use proptest::prelude::*;

mod common;

const ITEMS: usize = 16;

#[derive(Debug, Clone)]
enum Op {
    Enter(usize),
    Leave(usize),
    /// Resolve the n-th pending load (modulo the pending count).
    Complete(usize),
    Advance(u64),
    Unload(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..ITEMS).prop_map(Op::Enter),
        3 => (0..ITEMS).prop_map(Op::Leave),
        4 => any::<usize>().prop_map(Op::Complete),
        2 => (0u64..3000).prop_map(Op::Advance),
        1 => (0..ITEMS).prop_map(Op::Unload),
    ]
}

fn item(i: usize) -> CatalogItem {
    CatalogItem::new(format!("Door {i}"), "doors", Dimensions::new(90.0, 10.0, 210.0))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cache_invariants(ops in prop::collection::vec(op(), 1..80)) {
        let Some(gpu) = common::gpu() else { return Ok(()) };
        let options = common::options().with_thumbnail_size(16, 16).with_capacity(6, 3);
        let (max, min) = (options.max_resident, options.min_resident);
        let mut cache: PreviewCache<MemorySlot> =
            PreviewCache::new(options, Arc::new(MemoryAssetSource::new()), gpu).unwrap();
        let items: Vec<_> = (0..ITEMS).map(item).collect();
        let mut pending: Vec<LoadTask> = Vec::new();
        let mut now = Instant::now();

        for op in ops {
            match op {
                Op::Enter(i) => {
                    let was_present = cache.state(&items[i].item_ref()).is_some();
                    let task = cache.on_enter_view(&items[i], MemorySlot::new());
                    // A load is issued exactly when the item was absent
                    prop_assert_eq!(task.is_some(), !was_present);
                    pending.extend(task);
                }
                Op::Leave(i) => cache.on_leave_view(&items[i].item_ref(), now),
                Op::Complete(n) => {
                    if !pending.is_empty() {
                        let task = pending.remove(n % pending.len());
                        cache.complete_load(task.run_blocking(), now);
                        prop_assert!(cache.resident_len() <= max);
                    }
                }
                Op::Advance(ms) => {
                    now += Duration::from_millis(ms);
                    let before = cache.resident_len();
                    let evicted = cache.process_timers(now);
                    if evicted > 0 {
                        prop_assert!(cache.resident_len() >= min);
                    }
                    prop_assert_eq!(cache.resident_len(), before - evicted);
                }
                Op::Unload(i) => {
                    cache.unload(&items[i].item_ref());
                }
            }

            // One state per item, and the counts add up
            let active = items.iter().filter(|i| cache.is_active(&i.item_ref())).count();
            let loading = items.iter().filter(|i| cache.is_loading(&i.item_ref())).count();
            for i in &items {
                let r = i.item_ref();
                prop_assert!(!(cache.is_active(&r) && cache.is_loading(&r)));
            }
            prop_assert_eq!(active, cache.resident_len());
            prop_assert_eq!(loading, cache.loading_len());
            prop_assert_eq!(cache.resident_refs().count(), active);
            prop_assert!(cache.resident_len() <= max);

            let stats = cache.stats();
            prop_assert_eq!(stats.activations - stats.disposals, active as u64);
        }
    }
}

//! The preview cache.
//!
//! [`PreviewCache`] owns every live preview and drives each catalog item
//! through `Absent -> Loading -> Active -> Absent`:
//!
//! - [`on_enter_view`](PreviewCache::on_enter_view) checks the loading and
//!   resident sets synchronously and, for an absent item, hands out a
//!   [`LoadTask`]. The host runs the task and passes its outcome to
//!   [`complete_load`](PreviewCache::complete_load).
//! - [`on_leave_view`](PreviewCache::on_leave_view) schedules a deferred
//!   re-check; [`process_timers`](PreviewCache::process_timers) evicts items
//!   still out of view while the pool is above its floor. Entering view
//!   again cancels the item's pending re-checks.
//! - Every render context lives on one shared [`GpuDevice`].
//! - Capacity eviction is FIFO over activation order and only ever picks
//!   active entries.
//!
//! Time is passed in explicitly, so the host (or a test) owns the clock.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Instant;

use catalog_preview_core::{
    CatalogItem, CatalogItemRef, CategoryPalette, PreviewOptions, Result, UVec2,
};
use catalog_preview_geometry::PreviewModel;
use catalog_preview_render::{GpuDevice, Placeholder, PreviewSlot, RenderContext};
use log::{debug, info, warn};

use crate::loader::{AssetSource, LoadOutcome, LoadTask, LoadTicket};
use crate::rotation::{RotationDriver, StepOutcome};

/// Lifecycle state of a cached item. Absent items have no state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// The asset is being fetched and built.
    Loading,
    /// The preview is rendered and resident.
    Active,
}

/// Cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Active entries.
    pub resident: usize,
    /// In-flight loads.
    pub loading: usize,
    /// Load tasks handed out.
    pub loads_started: u64,
    /// Loads that became active.
    pub activations: u64,
    /// Loads that ended on the error placeholder.
    pub failures: u64,
    /// Entries evicted to make room.
    pub capacity_evictions: u64,
    /// Entries evicted by the deferred re-check.
    pub idle_evictions: u64,
    /// Render contexts released.
    pub disposals: u64,
}

struct LoadingEntry<S> {
    ticket: LoadTicket,
    slot: S,
}

struct ActiveEntry<S: PreviewSlot> {
    context: RenderContext<S>,
    model: PreviewModel,
}

#[derive(Debug, Clone)]
struct Recheck {
    due: Instant,
    item_ref: CatalogItemRef,
}

/// Viewport-gated cache of rotating preview render contexts.
pub struct PreviewCache<S: PreviewSlot> {
    options: PreviewOptions,
    gpu: Arc<GpuDevice>,
    source: Arc<dyn AssetSource>,
    palette: Arc<CategoryPalette>,
    loading: HashMap<CatalogItemRef, LoadingEntry<S>>,
    resident: HashMap<CatalogItemRef, ActiveEntry<S>>,
    /// Active items in activation order, oldest first.
    insertion_order: VecDeque<CatalogItemRef>,
    visible: HashSet<CatalogItemRef>,
    rechecks: Vec<Recheck>,
    rotation: RotationDriver,
    next_ticket: u64,
    stats: CacheStats,
}

impl<S: PreviewSlot> PreviewCache<S> {
    /// Creates a cache loading assets from `source` and rendering on `gpu`.
    pub fn new(
        options: PreviewOptions,
        source: Arc<dyn AssetSource>,
        gpu: Arc<GpuDevice>,
    ) -> Result<Self> {
        let options = options.validate()?;
        Ok(Self {
            rotation: RotationDriver::new(options.rotation_step),
            options,
            gpu,
            source,
            palette: Arc::new(CategoryPalette::default()),
            loading: HashMap::new(),
            resident: HashMap::new(),
            insertion_order: VecDeque::new(),
            visible: HashSet::new(),
            rechecks: Vec::new(),
            next_ticket: 0,
            stats: CacheStats::default(),
        })
    }

    /// Sets the category palette used for flat preview colors.
    #[must_use]
    pub fn with_palette(mut self, palette: CategoryPalette) -> Self {
        self.palette = Arc::new(palette);
        self
    }

    /// Returns the options.
    pub fn options(&self) -> &PreviewOptions {
        &self.options
    }

    /// Returns the category palette.
    pub fn palette(&self) -> &CategoryPalette {
        &self.palette
    }

    /// Returns the device every render context is created on.
    pub fn gpu(&self) -> &Arc<GpuDevice> {
        &self.gpu
    }

    /// Returns the lifecycle state of an item, `None` if absent.
    pub fn state(&self, item_ref: &CatalogItemRef) -> Option<EntryState> {
        if self.resident.contains_key(item_ref) {
            Some(EntryState::Active)
        } else if self.loading.contains_key(item_ref) {
            Some(EntryState::Loading)
        } else {
            None
        }
    }

    /// Returns true if the item has an active preview.
    pub fn is_active(&self, item_ref: &CatalogItemRef) -> bool {
        self.resident.contains_key(item_ref)
    }

    /// Returns true if the item is loading.
    pub fn is_loading(&self, item_ref: &CatalogItemRef) -> bool {
        self.loading.contains_key(item_ref)
    }

    /// Returns true if the shell last reported the item as visible.
    pub fn is_visible(&self, item_ref: &CatalogItemRef) -> bool {
        self.visible.contains(item_ref)
    }

    /// Size of the resident pool.
    pub fn resident_len(&self) -> usize {
        self.resident.len()
    }

    /// Number of in-flight loads.
    pub fn loading_len(&self) -> usize {
        self.loading.len()
    }

    /// Active items in activation order, oldest first.
    pub fn resident_refs(&self) -> impl Iterator<Item = &CatalogItemRef> {
        self.insertion_order.iter()
    }

    /// Returns the model of an active item.
    pub fn model(&self, item_ref: &CatalogItemRef) -> Option<&PreviewModel> {
        self.resident.get(item_ref).map(|e| &e.model)
    }

    /// Returns the render context of an active item.
    pub fn context(&self, item_ref: &CatalogItemRef) -> Option<&RenderContext<S>> {
        self.resident.get(item_ref).map(|e| &e.context)
    }

    /// Returns the counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            resident: self.resident.len(),
            loading: self.loading.len(),
            ..self.stats
        }
    }

    /// Earliest pending re-check, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.rechecks.iter().map(|r| r.due).min()
    }

    /// Handles an item scrolling into view.
    ///
    /// Returns a load task if the item was absent. Items already loading or
    /// active are left alone and `slot` is dropped. If the pool is full, the
    /// oldest active entry is evicted before the load starts. Pending
    /// re-checks for the item are cancelled.
    pub fn on_enter_view(&mut self, item: &CatalogItem, slot: S) -> Option<LoadTask> {
        let item_ref = item.item_ref();
        self.visible.insert(item_ref.clone());
        self.rechecks.retain(|r| r.item_ref != item_ref);

        if let Some(state) = self.state(&item_ref) {
            debug!("{item_ref}: entered view while {state:?}");
            return None;
        }

        if self.resident.len() >= self.options.max_resident {
            self.capacity_evict();
        }

        let ticket = LoadTicket(self.next_ticket);
        self.next_ticket += 1;
        slot.show_placeholder(Placeholder::Loading);
        self.loading.insert(item_ref.clone(), LoadingEntry { ticket, slot });
        self.stats.loads_started += 1;
        debug!("{item_ref}: loading ({ticket:?})");

        Some(LoadTask::new(
            ticket,
            item.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.palette),
            self.options.edge_threshold_degrees,
            self.options.load_failure,
        ))
    }

    /// Resolves a finished load.
    ///
    /// Outcomes whose ticket no longer matches a loading entry (the item was
    /// unloaded or the cache torn down meanwhile) are discarded. Failures show
    /// the error placeholder and return the item to absent. Returns true if the
    /// item became active.
    pub fn complete_load(&mut self, outcome: LoadOutcome, now: Instant) -> bool {
        let LoadOutcome {
            ticket,
            item_ref,
            result,
        } = outcome;

        if self.loading.get(&item_ref).map(|e| e.ticket) != Some(ticket) {
            debug!("{item_ref}: discarding stale load ({ticket:?})");
            return false;
        }
        let Some(LoadingEntry { slot, .. }) = self.loading.remove(&item_ref) else {
            return false;
        };

        let model = match result {
            Ok(model) => model,
            Err(err) => {
                warn!("{item_ref}: preview load failed: {err}");
                self.stats.failures += 1;
                slot.show_placeholder(Placeholder::Error);
                return false;
            }
        };

        while self.resident.len() >= self.options.max_resident {
            if self.capacity_evict().is_none() {
                break;
            }
        }

        let size = UVec2::from_array(self.options.thumbnail_size);
        let mut context = match RenderContext::new(Arc::clone(&self.gpu), slot, size, &model) {
            Ok(context) => context,
            Err(err) => {
                warn!("{item_ref}: cannot create render context: {}", err.error);
                self.stats.failures += 1;
                err.into_slot().show_placeholder(Placeholder::Error);
                return false;
            }
        };
        if let Err(err) = context.render(&model) {
            warn!("{item_ref}: first frame failed: {err}");
            self.stats.failures += 1;
            context.release(Placeholder::Error);
            return false;
        }

        self.resident
            .insert(item_ref.clone(), ActiveEntry { context, model });
        self.insertion_order.push_back(item_ref.clone());
        self.stats.activations += 1;
        debug!("{item_ref}: active ({} resident)", self.resident.len());

        if self.options.recheck_on_completion && !self.visible.contains(&item_ref) {
            self.rechecks.push(Recheck { due: now, item_ref });
            self.process_timers(now);
        }
        true
    }

    /// Handles an item scrolling out of view.
    ///
    /// Schedules a re-check after the eviction delay. Loading items are not
    /// affected until their load resolves.
    pub fn on_leave_view(&mut self, item_ref: &CatalogItemRef, now: Instant) {
        self.visible.remove(item_ref);
        let due = now + self.options.eviction_delay();
        self.rechecks.push(Recheck {
            due,
            item_ref: item_ref.clone(),
        });
    }

    /// Runs every re-check due at `now`. Returns the number of evictions.
    ///
    /// An item is evicted if it is active, still out of view, and the pool is
    /// above the floor.
    pub fn process_timers(&mut self, now: Instant) -> usize {
        let (mut due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.rechecks)
            .into_iter()
            .partition(|r| r.due <= now);
        self.rechecks = pending;
        due.sort_by_key(|r| r.due);

        let mut evicted = 0;
        for Recheck { item_ref, .. } in due {
            if self.visible.contains(&item_ref) || !self.resident.contains_key(&item_ref) {
                continue;
            }
            if self.resident.len() <= self.options.min_resident {
                debug!("{item_ref}: kept off-screen, pool at floor");
                continue;
            }
            if self.release(&item_ref, Placeholder::Neutral) {
                debug!("{item_ref}: evicted after leaving view");
                self.stats.idle_evictions += 1;
                evicted += 1;
            }
        }
        evicted
    }

    /// Releases an item regardless of the floor.
    ///
    /// Active previews are disposed; in-flight loads are abandoned and their
    /// outcome will be discarded. Returns false if the item was absent.
    pub fn unload(&mut self, item_ref: &CatalogItemRef) -> bool {
        if self.release(item_ref, Placeholder::Neutral) {
            debug!("{item_ref}: unloaded");
            return true;
        }
        if let Some(entry) = self.loading.remove(item_ref) {
            entry.slot.show_placeholder(Placeholder::Neutral);
            debug!("{item_ref}: load abandoned");
            return true;
        }
        false
    }

    /// Releases every preview and abandons every load.
    ///
    /// Used when the catalog view is discarded; ignores the floor.
    pub fn teardown(&mut self) {
        let mut released = 0;
        for item_ref in self.insertion_order.clone() {
            if self.release(&item_ref, Placeholder::Neutral) {
                released += 1;
            }
        }
        let abandoned = self.loading.len();
        for (_, entry) in self.loading.drain() {
            entry.slot.show_placeholder(Placeholder::Neutral);
        }
        self.insertion_order.clear();
        self.visible.clear();
        self.rechecks.clear();
        self.rotation.clear();
        info!("preview cache torn down: {released} released, {abandoned} loads abandoned");
    }

    /// Starts rotating an item while it is hovered. Returns false if the item
    /// is absent or already rotating.
    pub fn hover_start(&mut self, item_ref: &CatalogItemRef) -> bool {
        if self.state(item_ref).is_none() {
            return false;
        }
        self.rotation.start(item_ref.clone())
    }

    /// Stops rotating an item. Returns false if it was not rotating.
    pub fn hover_stop(&mut self, item_ref: &CatalogItemRef) -> bool {
        self.rotation.stop(item_ref)
    }

    /// Returns true if the item has a running rotation task.
    pub fn is_rotating(&self, item_ref: &CatalogItemRef) -> bool {
        self.rotation.is_rotating(item_ref)
    }

    /// Advances every hovered preview by one rotation step and re-renders it.
    ///
    /// Call once per display refresh. Tasks whose entry is gone are dropped.
    /// Returns the number of previews rendered.
    pub fn animate_frame(&mut self) -> usize {
        let resident = &mut self.resident;
        let loading = &self.loading;
        self.rotation.tick(|item_ref, step| {
            if let Some(entry) = resident.get_mut(item_ref) {
                entry.model.rotate_by(step);
                if let Err(err) = entry.context.render(&entry.model) {
                    warn!("{item_ref}: rotation frame failed: {err}");
                }
                StepOutcome::Advanced
            } else if loading.contains_key(item_ref) {
                StepOutcome::Waiting
            } else {
                StepOutcome::Finished
            }
        })
    }

    /// Evicts the oldest active entry. Loading items are never selected.
    fn capacity_evict(&mut self) -> Option<CatalogItemRef> {
        while let Some(candidate) = self.insertion_order.front().cloned() {
            if self.release(&candidate, Placeholder::Neutral) {
                debug!("{candidate}: evicted for capacity");
                self.stats.capacity_evictions += 1;
                return Some(candidate);
            }
            self.insertion_order.pop_front();
        }
        None
    }

    /// The only path from active to absent: disposes the render context and
    /// leaves a placeholder in the slot.
    fn release(&mut self, item_ref: &CatalogItemRef, placeholder: Placeholder) -> bool {
        let Some(ActiveEntry { context, .. }) = self.resident.remove(item_ref) else {
            return false;
        };
        self.insertion_order.retain(|r| r != item_ref);
        context.release(placeholder);
        self.stats.disposals += 1;
        true
    }
}

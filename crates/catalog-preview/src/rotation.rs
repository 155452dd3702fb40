//! Hover-driven rotation of previews.
//!
//! Each hovered item owns a rotation task that is re-posted on every display
//! refresh while hover lasts. A task ends on hover loss, or when its preview
//! is gone.

use std::collections::BTreeMap;

use catalog_preview_core::CatalogItemRef;

/// What happened to a rotation task on one refresh tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The model was rotated and re-rendered.
    Advanced,
    /// The preview is not ready yet; keep the task.
    Waiting,
    /// The preview is gone; drop the task.
    Finished,
}

/// Per-item rotation state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RotationTask {
    /// Steps applied since hover started.
    pub steps: u64,
}

/// Drives rotation tasks for hovered items.
#[derive(Debug, Clone)]
pub struct RotationDriver {
    step: f32,
    tasks: BTreeMap<CatalogItemRef, RotationTask>,
}

impl RotationDriver {
    /// Creates a driver advancing `step` radians per refresh.
    pub fn new(step: f32) -> Self {
        Self {
            step,
            tasks: BTreeMap::new(),
        }
    }

    /// Returns the angular step in radians.
    pub fn step(&self) -> f32 {
        self.step
    }

    /// Starts rotating `item_ref`. Returns false if it was already rotating.
    pub fn start(&mut self, item_ref: CatalogItemRef) -> bool {
        if self.tasks.contains_key(&item_ref) {
            return false;
        }
        self.tasks.insert(item_ref, RotationTask::default());
        true
    }

    /// Stops rotating `item_ref`. Returns false if it was not rotating.
    pub fn stop(&mut self, item_ref: &CatalogItemRef) -> bool {
        self.tasks.remove(item_ref).is_some()
    }

    /// Returns true if `item_ref` has a rotation task.
    pub fn is_rotating(&self, item_ref: &CatalogItemRef) -> bool {
        self.tasks.contains_key(item_ref)
    }

    /// Returns the task for `item_ref`.
    pub fn task(&self, item_ref: &CatalogItemRef) -> Option<&RotationTask> {
        self.tasks.get(item_ref)
    }

    /// Number of running tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if nothing is rotating.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Stops every task.
    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    /// Runs one refresh tick.
    ///
    /// `advance` is called for each task with the angular step and reports
    /// whether the preview was rotated. Finished tasks are dropped. Returns the
    /// number of previews advanced.
    pub fn tick(&mut self, mut advance: impl FnMut(&CatalogItemRef, f32) -> StepOutcome) -> usize {
        let step = self.step;
        let mut advanced = 0;
        self.tasks.retain(|item_ref, task| match advance(item_ref, step) {
            StepOutcome::Advanced => {
                task.steps += 1;
                advanced += 1;
                true
            }
            StepOutcome::Waiting => true,
            StepOutcome::Finished => {
                log::debug!("{item_ref}: rotation stopped, preview released");
                false
            }
        });
        advanced
    }
}

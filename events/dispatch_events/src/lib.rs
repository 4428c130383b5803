use {
    bevy::prelude::*,
    circuit_components::{ConditionTree, GroupRow, SelectionPolicy},
};

/// Scheduler hook: re-discover target caches. `controller: None` refreshes
/// every registered controller (the batch variant the periodic clock uses).
#[derive(Event)]
pub struct RefreshTopology {
    pub controller: Option<Entity>,
}

/// Scheduler hook: re-evaluate guards and reconcile bindings. `None` runs
/// every registered controller.
#[derive(Event)]
pub struct DispatchTick {
    pub controller: Option<Entity>,
}

/// Lifecycle: tear down a controller. Retracts every tracked binding on
/// still-valid cached targets, then despawns and unregisters it.
#[derive(Event)]
pub struct DecommissionController {
    pub controller: Entity,
}

// --- Configuration setters (GUI-facing) ---

#[derive(Event)]
pub struct SetPolicy {
    pub controller: Entity,
    pub policy: SelectionPolicy,
}

/// Replaces the shared guard gating all rows. `None` removes the gate.
#[derive(Event)]
pub struct SetSharedGuard {
    pub controller: Entity,
    pub guard: Option<ConditionTree>,
}

/// Inserts or replaces one configured row. `index: None` appends.
#[derive(Event)]
pub struct UpsertGroupRow {
    pub controller: Entity,
    pub index: Option<usize>,
    pub row: GroupRow,
}

#[derive(Event)]
pub struct RemoveGroupRow {
    pub controller: Entity,
    pub index: usize,
}

/// Replaces the guard of one existing row.
#[derive(Event)]
pub struct SetRowGuard {
    pub controller: Entity,
    pub index: usize,
    pub guard: Option<ConditionTree>,
}

use {
    bevy::prelude::*,
    circuit_components::GroupBinding,
    std::collections::HashMap,
};

/// O(1) lookup of bus node entities by stable id.
#[derive(Resource, Default)]
pub struct NodeRegistry {
    pub entities: HashMap<u64, Entity>,
    next_id: u64,
}

impl NodeRegistry {
    /// Registers `entity` under a freshly allocated id.
    pub fn allocate(&mut self, entity: Entity) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entities.insert(id, entity);
        id
    }

    /// Registers `entity` under an id restored from a save file.
    pub fn restore(&mut self, id: u64, entity: Entity) {
        self.next_id = self.next_id.max(id + 1);
        self.entities.insert(id, entity);
    }

    pub fn get(&self, id: u64) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    pub fn remove(&mut self, id: u64) {
        self.entities.remove(&id);
    }
}

/// Per-controller record of which bindings on which targets the engine is
/// responsible for. Keys are stable node ids so records serialize; entries
/// are created on first injection and dropped when empty. Two controllers
/// may hold independent entries against the same target.
#[derive(Resource, Reflect, Default, Debug, Clone)]
#[reflect(Resource, Default)]
pub struct TrackingLedger {
    pub entries: HashMap<u64, HashMap<u64, Vec<GroupBinding>>>,
}

impl TrackingLedger {
    /// Bindings this controller tracks on `target`.
    pub fn tracked(&self, controller: u64, target: u64) -> &[GroupBinding] {
        self.entries
            .get(&controller)
            .and_then(|targets| targets.get(&target))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_tracked(&self, controller: u64, target: u64, binding: &GroupBinding) -> bool {
        self.tracked(controller, target).contains(binding)
    }

    /// Records responsibility for `binding` on `target`. Idempotent.
    pub fn record(&mut self, controller: u64, target: u64, binding: GroupBinding) {
        let bindings = self
            .entries
            .entry(controller)
            .or_default()
            .entry(target)
            .or_default();
        if !bindings.contains(&binding) {
            bindings.push(binding);
        }
    }

    /// Drops one tracked binding, pruning empty maps behind it.
    pub fn forget(&mut self, controller: u64, target: u64, binding: &GroupBinding) {
        let Some(targets) = self.entries.get_mut(&controller) else {
            return;
        };
        if let Some(bindings) = targets.get_mut(&target) {
            bindings.retain(|b| b != binding);
            if bindings.is_empty() {
                targets.remove(&target);
            }
        }
        if targets.is_empty() {
            self.entries.remove(&controller);
        }
    }

    /// Forgets everything a controller tracks. Teardown bookkeeping.
    pub fn clear_controller(&mut self, controller: u64) {
        self.entries.remove(&controller);
    }

    /// Total bindings a controller currently tracks across all targets.
    pub fn injected_count(&self, controller: u64) -> usize {
        self.entries
            .get(&controller)
            .map(|targets| targets.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

/// Coarse interval at which target caches are re-discovered.
#[derive(Resource)]
pub struct TopologyTimer(pub Timer);

impl Default for TopologyTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(1.5, TimerMode::Repeating))
    }
}

/// Fine interval at which conditions are re-evaluated and bindings
/// reconciled.
#[derive(Resource)]
pub struct DispatchTimer(pub Timer);

impl Default for DispatchTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(0.25, TimerMode::Repeating))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ledger_prunes_empty_entries() {
        let mut ledger = TrackingLedger::default();
        let fuel = GroupBinding::new("fuel", 1.0);

        ledger.record(1, 10, fuel.clone());
        ledger.record(1, 10, fuel.clone()); // idempotent
        assert_eq!(ledger.tracked(1, 10).len(), 1);
        assert_eq!(ledger.injected_count(1), 1);

        ledger.forget(1, 10, &fuel);
        assert!(ledger.entries.is_empty());
    }

    #[test]
    fn controllers_track_the_same_target_independently() {
        let mut ledger = TrackingLedger::default();
        ledger.record(1, 10, GroupBinding::new("fuel", 1.0));
        ledger.record(2, 10, GroupBinding::new("fuel", 1.0));

        ledger.clear_controller(1);
        assert_eq!(ledger.injected_count(1), 0);
        assert_eq!(ledger.injected_count(2), 1);
    }
}

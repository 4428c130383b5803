use {
    bevy::prelude::*,
    bus::{discover_targets, read_port},
    circuit_components::{BusTerminals, LogisticSections, NodeId, SignalEmitter},
    dispatch_events::{
        DecommissionController, DispatchTick, RefreshTopology, RemoveGroupRow, SetPolicy,
        SetRowGuard, SetSharedGuard, UpsertGroupRow,
    },
    dispatch_resources::{DispatchTimer, NodeRegistry, TopologyTimer, TrackingLedger},
};

use crate::{GroupController, LastSelection, TargetCache, desired_bindings, reconcile, teardown};

/// Gives every new bus node a stable id. Controllers and binding-capable
/// stations both need one before tracking can refer to them.
pub fn assign_node_ids(
    mut commands: Commands,
    mut registry: ResMut<NodeRegistry>,
    unregistered: Query<
        Entity,
        (
            Or<(With<GroupController>, With<LogisticSections>)>,
            Without<NodeId>,
        ),
    >,
) {
    for entity in &unregistered {
        let id = registry.allocate(entity);
        commands.entity(entity).insert(NodeId(id));
        debug!(?entity, id, "registered bus node");
    }
}

/// Keeps the registry in step with ids that arrived with their entity,
/// e.g. nodes restored from a save file.
pub fn sync_registry(
    mut registry: ResMut<NodeRegistry>,
    restored: Query<(Entity, &NodeId), Added<NodeId>>,
) {
    for (entity, node) in &restored {
        registry.restore(node.0, entity);
    }
}

/// Drives the two periodic hooks. The topology refresh is queued before
/// the dispatch pass, so a reconciliation in the same frame always sees
/// the freshly replaced cache.
pub fn tick_clocks(
    time: Res<Time>,
    mut topology: ResMut<TopologyTimer>,
    mut dispatch: ResMut<DispatchTimer>,
    mut commands: Commands,
) {
    if topology.0.tick(time.delta()).just_finished() {
        commands.trigger(RefreshTopology { controller: None });
    }
    if dispatch.0.tick(time.delta()).just_finished() {
        commands.trigger(DispatchTick { controller: None });
    }
}

/// Observer: full re-discovery of target caches. Each cache is replaced
/// wholesale; a target that has not been assigned its id yet is picked up
/// on the next refresh.
pub fn on_refresh_topology(
    trigger: On<RefreshTopology>,
    mut controllers: Query<(Entity, &GroupController, &mut TargetCache)>,
    terminals: Query<&BusTerminals>,
    capable: Query<(), With<LogisticSections>>,
    node_ids: Query<&NodeId>,
    mut registry: ResMut<NodeRegistry>,
) {
    let only = trigger.event().controller;

    for (entity, config, mut cache) in controllers.iter_mut() {
        if only.is_some_and(|wanted| wanted != entity) {
            continue;
        }
        let found = discover_targets(entity, &config.write_ports, &terminals, &capable);
        cache.0 = found
            .iter()
            .filter_map(|&target| node_ids.get(target).ok().map(|node| node.0))
            .collect();
        trace!(controller = ?entity, targets = cache.0.len(), "target cache refreshed");
    }

    // Registry hygiene piggybacks on the coarse tick.
    if only.is_none() {
        registry.entities.retain(|_, entity| node_ids.get(*entity).is_ok());
    }
}

/// Observer: one scheduling tick. Reads the bus, recomputes each
/// controller's desired set, and reconciles it against the cached targets.
/// The reconciler's idempotence, not this policy pass, is what keeps
/// no-op ticks cheap.
pub fn on_dispatch_tick(
    trigger: On<DispatchTick>,
    mut controllers: Query<(
        Entity,
        &NodeId,
        &GroupController,
        &TargetCache,
        &mut LastSelection,
    )>,
    terminals: Query<&BusTerminals>,
    emitters: Query<&SignalEmitter>,
    mut sections: Query<&mut LogisticSections>,
    registry: Res<NodeRegistry>,
    mut ledger: ResMut<TrackingLedger>,
) {
    let only = trigger.event().controller;

    for (entity, node, config, cache, mut selection) in controllers.iter_mut() {
        if only.is_some_and(|wanted| wanted != entity) {
            continue;
        }
        let signals = read_port(entity, config.read_port, &terminals, &emitters);
        let desired = desired_bindings(config, &signals);
        reconcile(node.0, &cache.0, &desired, &registry, &mut sections, &mut ledger);
        if selection.0 != desired {
            debug!(controller = ?entity, active = desired.len(), "selection changed");
            selection.0 = desired;
        }
    }
}

/// Observer: controller teardown. Tracked bindings on still-valid cached
/// targets are retracted before the entity goes away; anything that
/// already vanished keeps its binding (best effort, no full-world scan).
pub fn on_decommission(
    trigger: On<DecommissionController>,
    controllers: Query<(&NodeId, &TargetCache), With<GroupController>>,
    mut sections: Query<&mut LogisticSections>,
    mut registry: ResMut<NodeRegistry>,
    mut ledger: ResMut<TrackingLedger>,
    mut commands: Commands,
) {
    let entity = trigger.event().controller;
    let Ok((node, cache)) = controllers.get(entity) else {
        // Became invalid between scheduling and execution: no-op.
        return;
    };

    teardown(node.0, &cache.0, &registry, &mut sections, &mut ledger);
    registry.remove(node.0);
    commands.entity(entity).despawn();
    info!(controller = ?entity, id = node.0, "controller decommissioned");
}

// --- Configuration setters ---

pub fn on_set_policy(trigger: On<SetPolicy>, mut controllers: Query<&mut GroupController>) {
    let event = trigger.event();
    if let Ok(mut config) = controllers.get_mut(event.controller) {
        config.policy = event.policy;
    } else {
        warn!(controller = ?event.controller, "set_policy on unknown controller");
    }
}

pub fn on_set_shared_guard(
    trigger: On<SetSharedGuard>,
    mut controllers: Query<&mut GroupController>,
) {
    let event = trigger.event();
    if let Ok(mut config) = controllers.get_mut(event.controller) {
        config.shared_guard = event.guard.clone();
    } else {
        warn!(controller = ?event.controller, "set_shared_guard on unknown controller");
    }
}

pub fn on_upsert_row(trigger: On<UpsertGroupRow>, mut controllers: Query<&mut GroupController>) {
    let event = trigger.event();
    let Ok(mut config) = controllers.get_mut(event.controller) else {
        warn!(controller = ?event.controller, "upsert_row on unknown controller");
        return;
    };

    let mut row = event.row.clone();
    // Only type-level validation here: the multiplier must stay >= 0.
    row.binding.multiplier = row.binding.multiplier.max(0.0);

    match event.index {
        Some(index) if index < config.rows.len() => config.rows[index] = row,
        Some(index) => {
            warn!(index, rows = config.rows.len(), "upsert_row out of range, appending");
            config.rows.push(row);
        }
        None => config.rows.push(row),
    }
}

pub fn on_remove_row(trigger: On<RemoveGroupRow>, mut controllers: Query<&mut GroupController>) {
    let event = trigger.event();
    let Ok(mut config) = controllers.get_mut(event.controller) else {
        return;
    };
    if event.index < config.rows.len() {
        config.rows.remove(event.index);
    } else {
        warn!(index = event.index, "remove_row out of range");
    }
}

pub fn on_set_row_guard(trigger: On<SetRowGuard>, mut controllers: Query<&mut GroupController>) {
    let event = trigger.event();
    let Ok(mut config) = controllers.get_mut(event.controller) else {
        return;
    };
    if let Some(row) = config.rows.get_mut(event.index) {
        row.guard = event.guard.clone();
    } else {
        warn!(index = event.index, "set_row_guard out of range");
    }
}

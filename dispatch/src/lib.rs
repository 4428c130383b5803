mod reconcile;
pub mod systems;

pub use reconcile::*;

use {
    bevy::prelude::*,
    circuit_components::{
        BusTerminals, ConditionTree, GroupBinding, GroupRow, IncludeInSave, PortId,
        SelectionPolicy,
    },
    dispatch_resources::{DispatchTimer, NodeRegistry, TopologyTimer, TrackingLedger},
    states::SimState,
    system_schedule::DispatchSchedule,
};

/// The decision-making node: owns the configured rows and guards, reads the
/// bus on `read_port`, and keeps the targets reachable from `write_ports`
/// consistent with whatever its policy currently selects.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(IncludeInSave, BusTerminals, TargetCache, LastSelection)]
pub struct GroupController {
    pub read_port: PortId,
    pub write_ports: Vec<PortId>,
    pub policy: SelectionPolicy,
    /// Optional gate over all rows at once (the shared-condition shape).
    pub shared_guard: Option<ConditionTree>,
    pub rows: Vec<GroupRow>,
}

impl GroupController {
    pub fn new(read_port: PortId, write_ports: Vec<PortId>) -> Self {
        Self {
            read_port,
            write_ports,
            policy: SelectionPolicy::All,
            shared_guard: None,
            rows: Vec::new(),
        }
    }
}

/// Snapshot of discovered target node ids, replaced wholesale by the
/// topology tick. Never refreshed during reconciliation.
#[derive(Component, Reflect, Default, Debug, Clone)]
#[reflect(Component)]
pub struct TargetCache(pub Vec<u64>);

/// The desired set computed by the most recent dispatch tick. Read by the
/// status query and any UI instead of re-reading the bus.
#[derive(Component, Reflect, Default, Debug, Clone)]
#[reflect(Component)]
pub struct LastSelection(pub Vec<GroupBinding>);

/// Diagnostics snapshot for one controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerStatus {
    pub configured_rows: usize,
    pub active: Vec<GroupBinding>,
    pub connected_targets: usize,
    pub injected: usize,
}

/// Status query for GUI/diagnostics display.
pub fn controller_status(
    controller: Entity,
    controllers: &Query<(
        &GroupController,
        &TargetCache,
        &LastSelection,
        &circuit_components::NodeId,
    )>,
    ledger: &TrackingLedger,
) -> Option<ControllerStatus> {
    let (config, cache, selection, node) = controllers.get(controller).ok()?;
    Some(ControllerStatus {
        configured_rows: config.rows.len(),
        active: selection.0.clone(),
        connected_targets: cache.0.len(),
        injected: ledger.injected_count(node.0),
    })
}

pub struct DispatchPlugin;

impl Plugin for DispatchPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<NodeRegistry>()
            .init_resource::<TrackingLedger>()
            .init_resource::<TopologyTimer>()
            .init_resource::<DispatchTimer>()
            .register_type::<TrackingLedger>()
            .register_type::<GroupController>()
            .register_type::<TargetCache>()
            .register_type::<LastSelection>()
            .register_type::<circuit_components::LogisticSections>()
            .register_type::<circuit_components::NodeId>()
            .register_type::<IncludeInSave>()
            .add_systems(
                Update,
                (systems::assign_node_ids, systems::sync_registry)
                    .in_set(DispatchSchedule::Sense)
                    .run_if(in_state(SimState::Running)),
            )
            .add_systems(
                Update,
                systems::tick_clocks
                    .in_set(DispatchSchedule::Reconcile)
                    .run_if(in_state(SimState::Running)),
            )
            .add_observer(systems::on_refresh_topology)
            .add_observer(systems::on_dispatch_tick)
            .add_observer(systems::on_decommission)
            .add_observer(systems::on_set_policy)
            .add_observer(systems::on_set_shared_guard)
            .add_observer(systems::on_upsert_row)
            .add_observer(systems::on_remove_row)
            .add_observer(systems::on_set_row_guard);
    }
}

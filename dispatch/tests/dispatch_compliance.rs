use {
    bevy::{prelude::*, state::app::StatesPlugin},
    circuit_components::{
        BusTerminals, Channel, ChannelFilter, ComparisonOp, ConditionLeaf, GroupBinding, GroupRow,
        LogisticSections, NodeId, PortId, SignalEmitter, SignalKey,
    },
    dispatch::{DispatchPlugin, GroupController, LastSelection, TargetCache, controller_status},
    dispatch_events::{DispatchTick, RefreshTopology},
    dispatch_resources::TrackingLedger,
    states::SimState,
};

const READ: PortId = PortId(0);
const WRITE: PortId = PortId(1);

/// Full pass: two guarded rows, one emitter per channel, one discovered
/// target. Both guards hold, so both bindings land exactly once and both
/// are tracked.
#[test]
fn all_matching_controller_binds_every_true_row() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin))
        .insert_state(SimState::Running)
        .add_plugins(DispatchPlugin);

    let fuel_guard = vec![ConditionLeaf::constant(
        SignalKey::item("item_a"),
        ChannelFilter::A,
        ComparisonOp::Gt,
        10,
    )];
    let science_guard = vec![ConditionLeaf::constant(
        SignalKey::item("item_b"),
        ChannelFilter::B,
        ComparisonOp::Lt,
        5,
    )];

    let mut config = GroupController::new(READ, vec![WRITE]);
    config.rows = vec![
        GroupRow::guarded(GroupBinding::new("fuel", 1.0), fuel_guard),
        GroupRow::guarded(GroupBinding::new("science", 2.0), science_guard),
    ];
    let controller = app.world_mut().spawn(config).id();

    let station = app
        .world_mut()
        .spawn((BusTerminals::default(), LogisticSections::default()))
        .id();
    let supply = app
        .world_mut()
        .spawn((
            BusTerminals::default(),
            SignalEmitter {
                signals: [(SignalKey::item("item_a"), 15)].into_iter().collect(),
            },
        ))
        .id();
    let demand = app
        .world_mut()
        .spawn((
            BusTerminals::default(),
            SignalEmitter {
                signals: [(SignalKey::item("item_b"), 2)].into_iter().collect(),
            },
        ))
        .id();

    bus::connect(app.world_mut(), controller, READ, supply, PortId(0), Channel::A);
    bus::connect(app.world_mut(), controller, READ, demand, PortId(0), Channel::B);
    bus::connect(app.world_mut(), controller, WRITE, station, PortId(0), Channel::A);

    app.update(); // node id assignment
    app.world_mut().trigger(RefreshTopology { controller: None });
    app.world_mut().trigger(DispatchTick { controller: None });
    app.update();

    let sections = &app.world().get::<LogisticSections>(station).unwrap().sections;
    assert_eq!(
        *sections,
        vec![
            GroupBinding::new("fuel", 1.0),
            GroupBinding::new("science", 2.0),
        ]
    );

    let controller_id = app.world().get::<NodeId>(controller).unwrap().0;
    let station_id = app.world().get::<NodeId>(station).unwrap().0;
    let ledger = app.world().resource::<TrackingLedger>();
    assert!(ledger.is_tracked(controller_id, station_id, &GroupBinding::new("fuel", 1.0)));
    assert!(ledger.is_tracked(controller_id, station_id, &GroupBinding::new("science", 2.0)));

    // Status query agrees with the world.
    let ledger = ledger.clone();
    let mut state: bevy::ecs::system::SystemState<
        Query<(&GroupController, &TargetCache, &LastSelection, &NodeId)>,
    > = bevy::ecs::system::SystemState::new(app.world_mut());
    let controllers = state.get(app.world());
    let status = controller_status(controller, &controllers, &ledger).unwrap();
    assert_eq!(status.configured_rows, 2);
    assert_eq!(status.active.len(), 2);
    assert_eq!(status.connected_targets, 1);
    assert_eq!(status.injected, 2);

    // A second identical tick is a no-op.
    app.world_mut().trigger(DispatchTick { controller: None });
    app.update();
    let sections = &app.world().get::<LogisticSections>(station).unwrap().sections;
    assert_eq!(sections.len(), 2);
}

/// Guard flips low again: the engine retracts its binding and only its
/// binding.
#[test]
fn guard_flip_retracts_cleanly() {
    let mut app = App::new();
    app.add_plugins((MinimalPlugins, StatesPlugin))
        .insert_state(SimState::Running)
        .add_plugins(DispatchPlugin);

    let guard = vec![ConditionLeaf::constant(
        SignalKey::item("iron"),
        ChannelFilter::Both,
        ComparisonOp::Gt,
        10,
    )];
    let mut config = GroupController::new(READ, vec![WRITE]);
    config.rows = vec![GroupRow::guarded(GroupBinding::new("fuel", 1.0), guard)];
    let controller = app.world_mut().spawn(config).id();

    let station = app
        .world_mut()
        .spawn((BusTerminals::default(), LogisticSections::default()))
        .id();
    app.world_mut()
        .get_mut::<LogisticSections>(station)
        .unwrap()
        .append("manual", 1.0);
    let emitter = app
        .world_mut()
        .spawn((
            BusTerminals::default(),
            SignalEmitter {
                signals: [(SignalKey::item("iron"), 20)].into_iter().collect(),
            },
        ))
        .id();

    bus::connect(app.world_mut(), controller, READ, emitter, PortId(0), Channel::A);
    bus::connect(app.world_mut(), controller, WRITE, station, PortId(0), Channel::B);

    app.update();
    app.world_mut().trigger(RefreshTopology { controller: None });
    app.world_mut().trigger(DispatchTick { controller: None });
    app.update();
    assert_eq!(
        app.world().get::<LogisticSections>(station).unwrap().len(),
        2
    );

    app.world_mut()
        .get_mut::<SignalEmitter>(emitter)
        .unwrap()
        .signals
        .insert(SignalKey::item("iron"), 3);
    app.world_mut().trigger(DispatchTick { controller: None });
    app.update();

    let sections = &app.world().get::<LogisticSections>(station).unwrap().sections;
    assert_eq!(*sections, vec![GroupBinding::new("manual", 1.0)]);
}

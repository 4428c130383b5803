use {
    bevy::prelude::*,
    circuit_components::{BusLink, BusTerminals, LogisticSections, PortId, SignalEmitter},
    dispatch::GroupController,
    rand::Rng,
    scenario_assets::ScenarioDefinition,
    states::SimState,
    std::collections::HashMap,
};

/// Handle of the scenario being loaded.
#[derive(Resource)]
pub struct ScenarioHandle(pub Handle<ScenarioDefinition>);

pub fn queue_scenario(mut commands: Commands, asset_server: Res<AssetServer>) {
    let handle = asset_server.load("scenarios/basic.scenario.ron");
    commands.insert_resource(ScenarioHandle(handle));
    info!("loading scenario");
}

/// Marker for emitters whose counts wander while the demo runs.
#[derive(Component)]
pub struct DriftingEmitter;

#[derive(Resource)]
pub struct DriftTimer(pub Timer);

impl Default for DriftTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(1.0, TimerMode::Repeating))
    }
}

/// Spawns the scenario once the asset is in. Entities come first, then the
/// wire list resolves names to the freshly spawned ids.
pub fn spawn_when_loaded(
    mut commands: Commands,
    scenario: Res<ScenarioHandle>,
    assets: Res<Assets<ScenarioDefinition>>,
    mut next_state: ResMut<NextState<SimState>>,
) {
    let Some(def) = assets.get(&scenario.0) else {
        return;
    };

    let mut by_name: HashMap<&str, Entity> = HashMap::new();

    for spec in &def.emitters {
        let mut entity = commands.spawn(SignalEmitter {
            signals: spec.signals.iter().map(|s| (s.key.clone(), s.count)).collect(),
        });
        if spec.drift {
            entity.insert(DriftingEmitter);
        }
        by_name.insert(spec.id.as_str(), entity.id());
    }

    for spec in &def.stations {
        let entity = commands
            .spawn(LogisticSections {
                sections: spec.preset.clone(),
                capacity: spec.capacity,
            })
            .id();
        by_name.insert(spec.id.as_str(), entity);
    }

    for spec in &def.controllers {
        let mut controller = GroupController::new(
            PortId(spec.read_port),
            spec.write_ports.iter().map(|&p| PortId(p)).collect(),
        );
        controller.policy = spec.policy;
        controller.shared_guard = spec.shared_guard.clone();
        controller.rows = spec.rows.clone();
        by_name.insert(spec.id.as_str(), commands.spawn(controller).id());
    }

    let mut links: HashMap<Entity, Vec<BusLink>> = HashMap::new();
    for wire in &def.wires {
        let (Some(&from), Some(&to)) = (
            by_name.get(wire.from.node.as_str()),
            by_name.get(wire.to.node.as_str()),
        ) else {
            warn!(from = %wire.from.node, to = %wire.to.node, "wire references unknown node");
            continue;
        };
        let from_port = PortId(wire.from.port);
        let to_port = PortId(wire.to.port);
        links.entry(from).or_default().push(BusLink {
            port: from_port,
            channel: wire.channel,
            peer: to,
            peer_port: to_port,
        });
        links.entry(to).or_default().push(BusLink {
            port: to_port,
            channel: wire.channel,
            peer: from,
            peer_port: from_port,
        });
    }
    for (entity, links) in links {
        commands.entity(entity).insert(BusTerminals { links });
    }

    info!(scenario = %def.name, nodes = by_name.len(), "scenario spawned");
    next_state.set(SimState::Running);
}

/// Random walk on drifting emitter counts so guards flip while running.
pub fn drift_emitters(
    time: Res<Time>,
    mut timer: ResMut<DriftTimer>,
    mut emitters: Query<&mut SignalEmitter, With<DriftingEmitter>>,
) {
    if !timer.0.tick(time.delta()).just_finished() {
        return;
    }
    let mut rng = rand::rng();
    for mut emitter in emitters.iter_mut() {
        for count in emitter.signals.values_mut() {
            *count += rng.random_range(-3..=3);
        }
    }
}

use {
    bevy::prelude::*,
    circuit_components::{BusTerminals, Channel, ChannelFilter, PortId, SignalEmitter, SignalKey},
    std::collections::{HashMap, HashSet},
};

/// The two merged value maps feeding one port. Absent key means count zero.
#[derive(Default, Debug, Clone)]
pub struct ChannelSignals {
    pub a: HashMap<SignalKey, i64>,
    pub b: HashMap<SignalKey, i64>,
}

impl ChannelSignals {
    /// Count of `key` under a channel filter. `Both` sums the channels,
    /// `Neither` is a fixed zero.
    pub fn count(&self, key: &SignalKey, filter: ChannelFilter) -> i64 {
        let a = self.a.get(key).copied().unwrap_or(0);
        let b = self.b.get(key).copied().unwrap_or(0);
        match filter {
            ChannelFilter::A => a,
            ChannelFilter::B => b,
            ChannelFilter::Both => a + b,
            ChannelFilter::Neither => 0,
        }
    }

    /// Every key present on the selected channel(s).
    pub fn keys(&self, filter: ChannelFilter) -> Vec<SignalKey> {
        let mut keys: Vec<SignalKey> = match filter {
            ChannelFilter::A => self.a.keys().cloned().collect(),
            ChannelFilter::B => self.b.keys().cloned().collect(),
            ChannelFilter::Both => {
                let set: HashSet<&SignalKey> = self.a.keys().chain(self.b.keys()).collect();
                set.into_iter().cloned().collect()
            }
            ChannelFilter::Neither => Vec::new(),
        };
        keys.sort_by(|l, r| l.name.cmp(&r.name));
        keys
    }

    pub fn is_empty(&self) -> bool {
        self.a.is_empty() && self.b.is_empty()
    }
}

/// Reads the two sub-buses feeding `port` of `node`. Pure; returns empty
/// maps (never an error) for an invalid node or an unwired port, so it is
/// safe to call at arbitrary frequency.
pub fn read_port(
    node: Entity,
    port: PortId,
    terminals: &Query<&BusTerminals>,
    emitters: &Query<&SignalEmitter>,
) -> ChannelSignals {
    ChannelSignals {
        a: read_channel(node, port, Channel::A, terminals, emitters),
        b: read_channel(node, port, Channel::B, terminals, emitters),
    }
}

/// Walks the single-channel network attached to `(node, port)`, summing
/// each member's emitted signals once per member.
fn read_channel(
    node: Entity,
    port: PortId,
    channel: Channel,
    terminals: &Query<&BusTerminals>,
    emitters: &Query<&SignalEmitter>,
) -> HashMap<SignalKey, i64> {
    let mut totals = HashMap::new();

    // No wire of this channel on the port means no sub-bus at all.
    let Ok(start) = terminals.get(node) else {
        return totals;
    };
    if start.links_on(port, Some(channel)).next().is_none() {
        return totals;
    }

    let mut visited: HashSet<(Entity, PortId)> = HashSet::new();
    let mut members: HashSet<Entity> = HashSet::new();
    let mut stack = vec![(node, port)];

    while let Some((entity, at_port)) = stack.pop() {
        if !visited.insert((entity, at_port)) {
            continue;
        }
        if members.insert(entity)
            && let Ok(emitter) = emitters.get(entity)
        {
            for (key, count) in &emitter.signals {
                *totals.entry(key.clone()).or_insert(0) += count;
            }
        }

        // Despawned mid-walk: skip, never fail.
        let Ok(node_terminals) = terminals.get(entity) else {
            continue;
        };
        for link in node_terminals.links_on(at_port, Some(channel)) {
            stack.push((link.peer, link.peer_port));
        }
    }

    totals
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::SystemState;

    const P0: PortId = PortId(0);
    const P1: PortId = PortId(1);

    fn read(world: &mut World, node: Entity, port: PortId) -> ChannelSignals {
        let mut state: SystemState<(Query<&BusTerminals>, Query<&SignalEmitter>)> =
            SystemState::new(world);
        let (terminals, emitters) = state.get(world);
        read_port(node, port, &terminals, &emitters)
    }

    fn emitter(world: &mut World, signals: &[(SignalKey, i64)]) -> Entity {
        world
            .spawn((
                BusTerminals::default(),
                SignalEmitter {
                    signals: signals.iter().cloned().collect(),
                },
            ))
            .id()
    }

    #[test]
    fn merges_emitters_per_channel() {
        let mut world = World::new();
        let reader = world.spawn(BusTerminals::default()).id();
        let iron = emitter(&mut world, &[(SignalKey::item("iron"), 5)]);
        let more_iron = emitter(&mut world, &[(SignalKey::item("iron"), 3)]);
        let copper = emitter(&mut world, &[(SignalKey::item("copper"), 7)]);

        crate::connect(&mut world, reader, P0, iron, P0, Channel::A);
        crate::connect(&mut world, reader, P0, more_iron, P0, Channel::A);
        crate::connect(&mut world, reader, P0, copper, P0, Channel::B);

        let signals = read(&mut world, reader, P0);
        assert_eq!(signals.count(&SignalKey::item("iron"), ChannelFilter::A), 8);
        assert_eq!(signals.count(&SignalKey::item("iron"), ChannelFilter::B), 0);
        assert_eq!(signals.count(&SignalKey::item("copper"), ChannelFilter::B), 7);
        assert_eq!(signals.count(&SignalKey::item("copper"), ChannelFilter::Both), 7);
    }

    #[test]
    fn emitter_counts_once_despite_two_wires() {
        let mut world = World::new();
        let reader = world.spawn(BusTerminals::default()).id();
        let iron = emitter(&mut world, &[(SignalKey::item("iron"), 5)]);

        crate::connect(&mut world, reader, P0, iron, P0, Channel::A);
        crate::connect(&mut world, reader, P0, iron, P1, Channel::A);

        let signals = read(&mut world, reader, P0);
        assert_eq!(signals.count(&SignalKey::item("iron"), ChannelFilter::A), 5);
    }

    #[test]
    fn unwired_port_reads_empty() {
        let mut world = World::new();
        let reader = world.spawn(BusTerminals::default()).id();
        let iron = emitter(&mut world, &[(SignalKey::item("iron"), 5)]);
        crate::connect(&mut world, reader, P0, iron, P0, Channel::A);

        // Different port, no wires.
        assert!(read(&mut world, reader, P1).is_empty());
        // B sub-bus of the wired port is also empty.
        let signals = read(&mut world, reader, P0);
        assert!(signals.b.is_empty());
    }

    #[test]
    fn invalid_node_reads_empty() {
        let mut world = World::new();
        let ghost = world.spawn(BusTerminals::default()).id();
        world.despawn(ghost);
        assert!(read(&mut world, ghost, P0).is_empty());
    }

    #[test]
    fn survives_wire_cycles() {
        let mut world = World::new();
        let a = emitter(&mut world, &[(SignalKey::item("iron"), 1)]);
        let b = emitter(&mut world, &[(SignalKey::item("iron"), 2)]);
        let c = emitter(&mut world, &[(SignalKey::item("iron"), 4)]);
        crate::connect(&mut world, a, P0, b, P0, Channel::A);
        crate::connect(&mut world, b, P0, c, P0, Channel::A);
        crate::connect(&mut world, c, P0, a, P0, Channel::A);

        let signals = read(&mut world, a, P0);
        assert_eq!(signals.count(&SignalKey::item("iron"), ChannelFilter::A), 7);
    }
}

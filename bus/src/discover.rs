use {
    bevy::prelude::*,
    circuit_components::{BusTerminals, LogisticSections, PortId},
    std::collections::HashSet,
};

/// Depth-first walk of the wire topology reachable from the given output
/// ports, collecting every owner that is binding-capable (carries
/// `LogisticSections`). The visited set is keyed by `(owner, port)` so
/// cyclic topologies terminate; owners reached through two different ports
/// are walked twice but reported once. Despawned peers are skipped, and an
/// invalid start yields the empty set.
///
/// Not incremental: callers replace their whole cache with the result and
/// throttle how often they ask (periodic poll; the host offers no reliable
/// topology-change notification).
pub fn discover_targets(
    node: Entity,
    ports: &[PortId],
    terminals: &Query<&BusTerminals>,
    capable: &Query<(), With<LogisticSections>>,
) -> Vec<Entity> {
    let mut found = Vec::new();
    if terminals.get(node).is_err() {
        return found;
    }

    let mut visited: HashSet<(Entity, PortId)> = HashSet::new();
    let mut owners: HashSet<Entity> = HashSet::new();
    let mut stack: Vec<(Entity, PortId)> = ports.iter().map(|&port| (node, port)).collect();

    while let Some((entity, port)) = stack.pop() {
        if !visited.insert((entity, port)) {
            continue;
        }

        if capable.get(entity).is_ok() && owners.insert(entity) {
            found.push(entity);
        }

        // Follow every wire on this connector, both channels, regardless
        // of what kind of node sits on the other end. A despawned peer has
        // no terminals and simply ends the walk there.
        let Ok(node_terminals) = terminals.get(entity) else {
            continue;
        };
        for link in node_terminals.links_on(port, None) {
            stack.push((link.peer, link.peer_port));
        }
    }

    found
}

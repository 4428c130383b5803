use {
    bevy::prelude::*,
    serde::{Deserialize, Serialize},
    std::collections::HashMap,
};

use crate::SignalKey;

/// One of the two independent sub-buses feeding every port.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    A,
    B,
}

/// Logical connector on a bus node. Controllers read on one port and write
/// on others; traversal never jumps between ports of the same node.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PortId(pub u8);

/// A single wire attached to one port of this node.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusLink {
    pub port: PortId,
    pub channel: Channel,
    pub peer: Entity,
    pub peer_port: PortId,
}

/// All wires attached to this node, across all of its ports.
#[derive(Component, Reflect, Default, Debug, Clone)]
#[reflect(Component)]
pub struct BusTerminals {
    pub links: Vec<BusLink>,
}

impl BusTerminals {
    /// Links leaving `port`, optionally restricted to one channel.
    pub fn links_on(&self, port: PortId, channel: Option<Channel>) -> impl Iterator<Item = &BusLink> {
        self.links
            .iter()
            .filter(move |l| l.port == port && channel.is_none_or(|c| l.channel == c))
    }

    pub fn push_link(&mut self, port: PortId, channel: Channel, peer: Entity, peer_port: PortId) {
        self.links.push(BusLink {
            port,
            channel,
            peer,
            peer_port,
        });
    }
}

/// Signals this node broadcasts onto every sub-bus its wires join.
/// One contribution per network regardless of how many wires attach it.
#[derive(Component, Default, Debug, Clone)]
pub struct SignalEmitter {
    pub signals: HashMap<SignalKey, i64>,
}

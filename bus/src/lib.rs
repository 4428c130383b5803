//! Pure reads over the wire graph: merged per-channel signal maps, condition
//! evaluation, and discovery of binding-capable targets. Nothing in this
//! crate mutates the world.

mod discover;
mod eval;
mod read;

pub use discover::*;
pub use eval::*;
pub use read::*;

use {
    bevy::prelude::*,
    circuit_components::{BusTerminals, Channel, PortId},
};

/// Attaches a wire between two ports, recording the link on both endpoints.
pub fn connect(world: &mut World, a: Entity, pa: PortId, b: Entity, pb: PortId, channel: Channel) {
    if let Some(mut terminals) = world.get_mut::<BusTerminals>(a) {
        terminals.push_link(pa, channel, b, pb);
    }
    if let Some(mut terminals) = world.get_mut::<BusTerminals>(b) {
        terminals.push_link(pb, channel, a, pa);
    }
}

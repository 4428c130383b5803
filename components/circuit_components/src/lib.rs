mod bindings;
mod conditions;
mod controller;
mod wires;

pub use bindings::*;
pub use conditions::*;
pub use controller::*;
pub use wires::*;

use bevy::prelude::*;

/// Marker for entities that belong in save files.
#[derive(Component, Reflect, Default, Debug, Clone, PartialEq, Eq, Hash)]
#[reflect(Component)]
pub struct IncludeInSave;

/// Stable identity for a bus node. Survives save/load, unlike `Entity`,
/// so tracking records and caches key on this instead.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[reflect(Component)]
#[require(IncludeInSave)]
pub struct NodeId(pub u64);

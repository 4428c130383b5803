use {
    bevy::prelude::*,
    circuit_components::{Channel, ConditionTree, GroupBinding, GroupRow, SelectionPolicy, SignalKey},
    serde::Deserialize,
};

// --- Asset Definition ---

/// A demo world loaded from RON: emitters, stations, controllers, and the
/// wires between them. Node references inside `wires` are by `id`.
#[derive(Asset, TypePath, Debug, Clone, Deserialize)]
pub struct ScenarioDefinition {
    pub name: String,
    #[serde(default)]
    pub emitters: Vec<EmitterSpec>,
    #[serde(default)]
    pub stations: Vec<StationSpec>,
    #[serde(default)]
    pub controllers: Vec<ControllerSpec>,
    #[serde(default)]
    pub wires: Vec<WireSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmitterSpec {
    pub id: String,
    pub signals: Vec<SignalSpec>,
    /// Nudge counts periodically so guards flip while the demo runs.
    #[serde(default)]
    pub drift: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignalSpec {
    pub key: SignalKey,
    pub count: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StationSpec {
    pub id: String,
    #[serde(default)]
    pub capacity: Option<usize>,
    /// Sections present before any controller touches the station.
    #[serde(default)]
    pub preset: Vec<GroupBinding>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ControllerSpec {
    pub id: String,
    pub read_port: u8,
    pub write_ports: Vec<u8>,
    #[serde(default)]
    pub policy: SelectionPolicy,
    #[serde(default)]
    pub shared_guard: Option<ConditionTree>,
    #[serde(default)]
    pub rows: Vec<GroupRow>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointSpec {
    pub node: String,
    pub port: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireSpec {
    pub from: EndpointSpec,
    pub to: EndpointSpec,
    pub channel: Channel,
}

use bevy::prelude::*;

/// Per-frame ordering for the dispatch engine. Topology refresh always runs
/// before reconciliation within the same frame.
#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub enum DispatchSchedule {
    Sense,
    RefreshTopology,
    Reconcile,
    FrameEnd,
}

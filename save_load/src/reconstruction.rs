//! Post-load migration. Old save files may carry record shapes the engine
//! no longer produces; everything is normalized here, before the first
//! tick runs against the restored state.

use {
    bevy::{prelude::*, scene::SceneInstanceReady},
    dispatch::TargetCache,
    dispatch_resources::TrackingLedger,
};

/// Observer fired when a loaded scene finished spawning. Runs the record
/// migration and invalidates caches so the next topology tick rebuilds
/// them against the live graph.
pub fn on_scene_ready(
    _trigger: On<SceneInstanceReady>,
    mut ledger: ResMut<TrackingLedger>,
    mut caches: Query<&mut TargetCache>,
) {
    normalize_ledger(&mut ledger);
    for mut cache in caches.iter_mut() {
        cache.0.clear();
    }
    info!("save state reconstructed");
}

/// Brings restored tracking records into the current shape:
/// - multipliers below zero clamp to zero (pre-clamp-era saves),
/// - duplicate tracked bindings collapse to one,
/// - empty binding lists and empty controller maps are dropped.
pub fn normalize_ledger(ledger: &mut TrackingLedger) {
    for targets in ledger.entries.values_mut() {
        for bindings in targets.values_mut() {
            for binding in bindings.iter_mut() {
                if binding.multiplier < 0.0 {
                    binding.multiplier = 0.0;
                }
            }
            let mut seen = Vec::new();
            bindings.retain(|binding| {
                if seen.contains(binding) {
                    false
                } else {
                    seen.push(binding.clone());
                    true
                }
            });
        }
        targets.retain(|_, bindings| !bindings.is_empty());
    }
    ledger.entries.retain(|_, targets| !targets.is_empty());
}

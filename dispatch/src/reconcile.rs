use {
    bevy::prelude::*,
    bus::{ChannelSignals, evaluate},
    circuit_components::{GroupBinding, LogisticSections, SelectionPolicy},
    dispatch_resources::{NodeRegistry, TrackingLedger},
};

use crate::GroupController;

/// Computes the desired set for one controller from the bus it currently
/// sees. `All` takes every row whose guard holds (gated by the shared
/// guard when one is set); `FirstMatch` takes the first row in declaration
/// order whose own guard holds, so ties go to the earlier row. A missing
/// guard counts as true.
pub fn desired_bindings(controller: &GroupController, signals: &ChannelSignals) -> Vec<GroupBinding> {
    let guard_holds =
        |guard: &Option<Vec<_>>| guard.as_ref().is_none_or(|tree| evaluate(tree, signals));

    match controller.policy {
        SelectionPolicy::All => {
            if !guard_holds(&controller.shared_guard) {
                return Vec::new();
            }
            controller
                .rows
                .iter()
                .filter(|row| guard_holds(&row.guard))
                .map(|row| row.binding.clone())
                .collect()
        }
        SelectionPolicy::FirstMatch => controller
            .rows
            .iter()
            .find(|row| guard_holds(&row.guard))
            .map(|row| row.binding.clone())
            .into_iter()
            .collect(),
    }
}

/// Diff-and-apply: brings every cached target's sections in line with
/// `desired`, touching only bindings this controller tracks.
///
/// Retraction runs before injection so a binding whose multiplier changed
/// is removed under its old identity before the new one lands, instead of
/// accumulating both. Idempotent: a second call with the same inputs makes
/// no section mutations. An invalid or capability-revoked target is
/// skipped; its stale non-desired tracking entries are dropped without a
/// remove call, orphaning any physical binding (accepted trade-off).
pub fn reconcile(
    controller: u64,
    targets: &[u64],
    desired: &[GroupBinding],
    registry: &NodeRegistry,
    sections: &mut Query<&mut LogisticSections>,
    ledger: &mut TrackingLedger,
) {
    for &target in targets {
        let mut store = registry
            .get(target)
            .and_then(|entity| sections.get_mut(entity).ok());

        // Retraction pass.
        let stale: Vec<GroupBinding> = ledger
            .tracked(controller, target)
            .iter()
            .filter(|binding| !desired.contains(binding))
            .cloned()
            .collect();
        for binding in stale {
            if let Some(store) = store.as_mut()
                && let Some(index) = store.find_last(&binding.group, binding.multiplier)
            {
                store.remove(index);
            }
            ledger.forget(controller, target, &binding);
        }

        // Injection pass.
        let Some(mut store) = store else {
            continue;
        };
        for binding in desired {
            if store.find_last(&binding.group, binding.multiplier).is_some() {
                // Already satisfied; just make sure we own it in tracking.
                ledger.record(controller, target, binding.clone());
            } else if store.append(&binding.group, binding.multiplier).is_some() {
                ledger.record(controller, target, binding.clone());
            } else {
                // Rejected append (capacity). No tracking entry; the next
                // tick retries because reconciliation is repeatable.
                debug!(controller, target, group = %binding.group, "section append rejected");
            }
        }
    }
}

/// Teardown path: retracts every tracked binding on the cached targets and
/// wipes the controller's ledger entry, including entries whose target is
/// no longer cached.
pub fn teardown(
    controller: u64,
    targets: &[u64],
    registry: &NodeRegistry,
    sections: &mut Query<&mut LogisticSections>,
    ledger: &mut TrackingLedger,
) {
    reconcile(controller, targets, &[], registry, sections, ledger);
    ledger.clear_controller(controller);
}

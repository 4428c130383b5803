use {
    bevy::prelude::*,
    serde::{Deserialize, Serialize},
};

use crate::{ConditionTree, GroupBinding};

/// How a controller turns its configured rows into the desired set.
#[derive(Reflect, Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    /// Every row whose guard holds, optionally gated by a shared guard
    /// covering all rows at once.
    #[default]
    All,
    /// Only the first row (declaration order) whose own guard holds.
    FirstMatch,
}

/// One configured binding plus its optional guard. A missing guard counts
/// as always true, which is how the shared-guard shape configures rows.
#[derive(Reflect, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRow {
    pub binding: GroupBinding,
    pub guard: Option<ConditionTree>,
}

impl GroupRow {
    pub fn unguarded(binding: GroupBinding) -> Self {
        Self {
            binding,
            guard: None,
        }
    }

    pub fn guarded(binding: GroupBinding, guard: ConditionTree) -> Self {
        Self {
            binding,
            guard: Some(guard),
        }
    }
}

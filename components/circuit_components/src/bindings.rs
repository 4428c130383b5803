use {
    crate::IncludeInSave,
    bevy::prelude::*,
    serde::{Deserialize, Serialize},
};

/// A named resource-request profile plus multiplier. Two bindings are the
/// same logical binding iff group and multiplier match exactly.
#[derive(Reflect, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBinding {
    pub group: String,
    pub multiplier: f32,
}

impl GroupBinding {
    pub fn new(group: impl Into<String>, multiplier: f32) -> Self {
        Self {
            group: group.into(),
            multiplier,
        }
    }
}

/// Ordered list of group bindings held by a target node. Presence of this
/// component is what makes a node binding-capable; order is append order,
/// never sorted or merged. Duplicates the engine did not create (manual
/// edits) are legal and must be left alone unless tracked.
#[derive(Component, Reflect, Default, Debug, Clone)]
#[reflect(Component)]
#[require(IncludeInSave)]
pub struct LogisticSections {
    pub sections: Vec<GroupBinding>,
    /// Upper bound on section count. `None` means unbounded.
    pub capacity: Option<usize>,
}

impl LogisticSections {
    pub fn bounded(capacity: usize) -> Self {
        Self {
            sections: Vec::new(),
            capacity: Some(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Index of the most-recently-appended section matching the logical
    /// binding, searching from the end. Last match wins: when duplicates
    /// exist this approximates "the one we created last".
    pub fn find_last(&self, group: &str, multiplier: f32) -> Option<usize> {
        self.sections
            .iter()
            .rposition(|s| s.group == group && s.multiplier == multiplier)
    }

    /// Appends a section, returning its index, or `None` when at capacity.
    /// The multiplier is set explicitly on the stored section.
    pub fn append(&mut self, group: &str, multiplier: f32) -> Option<usize> {
        if self.capacity.is_some_and(|cap| self.sections.len() >= cap) {
            return None;
        }
        self.sections.push(GroupBinding::new(group, multiplier));
        Some(self.sections.len() - 1)
    }

    pub fn remove(&mut self, index: usize) -> Option<GroupBinding> {
        if index < self.sections.len() {
            Some(self.sections.remove(index))
        } else {
            None
        }
    }
}

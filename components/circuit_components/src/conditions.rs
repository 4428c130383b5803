use {
    bevy::prelude::*,
    serde::{Deserialize, Serialize},
};

use crate::Channel;

/// Namespace tag of a signal identifier. `Each` is the wildcard: it is only
/// meaningful inside a condition leaf and never appears as a bus value.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalDomain {
    Item,
    Fluid,
    Virtual,
    Each,
}

/// Identity of a value on a channel: domain plus name.
#[derive(Reflect, Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignalKey {
    pub domain: SignalDomain,
    pub name: String,
}

impl SignalKey {
    pub fn item(name: impl Into<String>) -> Self {
        Self {
            domain: SignalDomain::Item,
            name: name.into(),
        }
    }

    pub fn virtual_signal(name: impl Into<String>) -> Self {
        Self {
            domain: SignalDomain::Virtual,
            name: name.into(),
        }
    }

    /// The wildcard key, matched existentially against every key present
    /// on the selected channels.
    pub fn each() -> Self {
        Self {
            domain: SignalDomain::Each,
            name: String::new(),
        }
    }

    pub fn is_each(&self) -> bool {
        self.domain == SignalDomain::Each
    }
}

/// Which sub-buses a condition side reads. `Both` sums the two counts,
/// `Neither` pins the side to zero.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelFilter {
    A,
    B,
    Both,
    Neither,
}

impl ChannelFilter {
    pub fn accepts(&self, channel: Channel) -> bool {
        matches!(
            (self, channel),
            (ChannelFilter::A, Channel::A)
                | (ChannelFilter::B, Channel::B)
                | (ChannelFilter::Both, _)
        )
    }
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl ComparisonOp {
    pub fn compare(&self, left: i64, right: i64) -> bool {
        match self {
            ComparisonOp::Eq => left == right,
            ComparisonOp::Ne => left != right,
            ComparisonOp::Lt => left < right,
            ComparisonOp::Gt => left > right,
            ComparisonOp::Le => left <= right,
            ComparisonOp::Ge => left >= right,
        }
    }
}

/// How a leaf combines with the running result of the leaves before it.
/// Ignored on the first leaf.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinOp {
    And,
    Or,
}

/// Right-hand side of a comparison: a fixed constant or another signal read.
#[derive(Reflect, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Constant(i64),
    Signal { key: SignalKey, filter: ChannelFilter },
}

/// One comparison in a condition tree. A missing left key reads as zero so
/// half-configured conditions stay evaluable.
#[derive(Reflect, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionLeaf {
    pub join: JoinOp,
    pub left: Option<SignalKey>,
    pub left_filter: ChannelFilter,
    pub op: ComparisonOp,
    pub right: Operand,
}

impl ConditionLeaf {
    /// `left(filter) op constant`, joined with AND. Convenience for the
    /// common single-leaf guard.
    pub fn constant(left: SignalKey, filter: ChannelFilter, op: ComparisonOp, value: i64) -> Self {
        Self {
            join: JoinOp::And,
            left: Some(left),
            left_filter: filter,
            op,
            right: Operand::Constant(value),
        }
    }

    pub fn joined(mut self, join: JoinOp) -> Self {
        self.join = join;
        self
    }
}

/// Ordered leaves, folded strictly left to right with no precedence and no
/// short-circuiting. Empty tree evaluates false.
pub type ConditionTree = Vec<ConditionLeaf>;

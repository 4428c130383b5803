use circuit_components::{ConditionLeaf, JoinOp, Operand, SignalKey};

use crate::ChannelSignals;

/// Evaluates a condition tree against the merged channel maps.
///
/// The tree is folded strictly left to right: each leaf combines with the
/// running result via its own join operator, the first leaf's operator is
/// ignored, and there is no precedence or short-circuiting beyond source
/// order. Zero leaves evaluate false. Total: malformed leaves read their
/// broken side as zero instead of failing.
pub fn evaluate(tree: &[ConditionLeaf], signals: &ChannelSignals) -> bool {
    let mut result: Option<bool> = None;
    for leaf in tree {
        let value = eval_leaf(leaf, signals);
        result = Some(match (result, leaf.join) {
            (None, _) => value,
            (Some(acc), JoinOp::And) => acc && value,
            (Some(acc), JoinOp::Or) => acc || value,
        });
    }
    result.unwrap_or(false)
}

fn eval_leaf(leaf: &ConditionLeaf, signals: &ChannelSignals) -> bool {
    match &leaf.left {
        Some(left) if left.is_each() => eval_wildcard(leaf, signals),
        left => {
            let left_value = left
                .as_ref()
                .map(|key| signals.count(key, leaf.left_filter))
                .unwrap_or(0);
            leaf.op.compare(left_value, right_value(leaf, None, signals))
        }
    }
}

/// Existential wildcard: the leaf holds iff the comparison holds for *any*
/// key present on the selected left channel(s). A wildcard right side reads
/// the same key in lock-step, never a cross product.
fn eval_wildcard(leaf: &ConditionLeaf, signals: &ChannelSignals) -> bool {
    signals.keys(leaf.left_filter).iter().any(|key| {
        let left_value = signals.count(key, leaf.left_filter);
        leaf.op.compare(left_value, right_value(leaf, Some(key), signals))
    })
}

/// Right-hand value of a leaf. `wildcard_key` is the key currently under
/// evaluation when the left side is the wildcard; a wildcard right side
/// without one is malformed and reads zero.
fn right_value(leaf: &ConditionLeaf, wildcard_key: Option<&SignalKey>, signals: &ChannelSignals) -> i64 {
    match &leaf.right {
        Operand::Constant(value) => *value,
        Operand::Signal { key, filter } if key.is_each() => match wildcard_key {
            Some(key) => signals.count(key, *filter),
            None => 0,
        },
        Operand::Signal { key, filter } => signals.count(key, *filter),
    }
}

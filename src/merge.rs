//! Tree Merge Engine
//!
//! Combines a source tree into a destination tree node by node using the
//! structural-equivalence rule from [`DocNode::equivalent`]. For every source
//! child, an equivalent destination child is searched: when found the pair is
//! merged recursively so deeper structure is combined rather than replaced;
//! when absent the source child is appended with its whole sub-tree.
//!
//! The operation is idempotent (merging a tree into itself adds nothing) and
//! commutative with respect to equivalence matching, which is what lets the
//! worker pool fold per-file results into the cumulative tree in any order.
//! The publish-boundary diff relies on the same equivalence predicate but
//! compares flattened page sets instead of calling merge.

use crate::types::DocNode;

/// Merge `src` into `dest` in place. `dest` becomes a superset of both trees
/// with no duplicate equivalent branches.
pub fn merge_into(dest: &mut DocNode, src: &DocNode) {
    for child in src.children() {
        match dest
            .children_mut()
            .iter_mut()
            .find(|existing| existing.equivalent(child))
        {
            Some(existing) => merge_into(existing, child),
            None => dest.push(child.clone()),
        }
    }
}

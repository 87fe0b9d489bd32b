//! Flattening the navigation tree into an ordered, deduplicated
//! target list.

use std::collections::HashSet;

use super::resolve_href;
use super::toc::NavPoint;

/// A navigation target resolved to a canonical archive path, fragment
/// stripped. The flattened sequence never contains two entries with the
/// same path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlatNavPoint {
    pub label: String,
    pub path: String,
}

/// Depth-first pre-order flatten of the navigation tree.
///
/// Each node's target is resolved against `base_dir`; the first
/// occurrence of a path wins and later duplicates are dropped without
/// reordering. Children of a duplicate node are still visited, since
/// they may reference distinct targets. The traversal uses an explicit
/// stack, so pathological nesting depth cannot overflow the call stack.
pub fn flatten(points: &[NavPoint], base_dir: &str) -> Vec<FlatNavPoint> {
    let mut out = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    // Children are pushed in reverse so pops come out left-to-right.
    let mut stack: Vec<&NavPoint> = points.iter().rev().collect();

    while let Some(point) = stack.pop() {
        let path = resolve_href(base_dir, &point.target);

        if seen.insert(path.clone()) {
            out.push(FlatNavPoint {
                label: point.label.clone(),
                path,
            });
        }

        for child in point.children.iter().rev() {
            stack.push(child);
        }
    }

    out
}

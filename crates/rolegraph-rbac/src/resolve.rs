//! Traversal algorithms over the parent graph.
//!
//! Every walk keeps a visited set keyed by [`RoleId`], so shared ancestors
//! (diamond inheritance) are visited once and a graph that does contain a
//! cycle still terminates.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use tracing::trace;

use crate::graph::{RoleGraph, RoleNode};
use crate::roles::{ParentMap, RoleId, Roler};

/// Collects every ancestor reachable through `parents`, each exactly once.
///
/// Plain roles are expanded through their parents. A cached role already
/// holds its complete closure, so it contributes that set instead of being
/// walked (a cached role never has a plain ancestor).
pub(crate) fn ancestor_ids(graph: &RoleGraph, parents: &ParentMap) -> Vec<RoleId> {
    let mut visited = HashSet::new();
    let mut ancestors = Vec::new();
    let mut stack: Vec<RoleId> = parents.values().rev().copied().collect();

    while let Some(id) = stack.pop() {
        if !visited.insert(id) {
            continue;
        }
        ancestors.push(id);

        match graph.node(id) {
            Some(RoleNode::Cached(cached)) => {
                for ancestor in cached.ancestor_ids() {
                    if visited.insert(*ancestor) {
                        ancestors.push(*ancestor);
                    }
                }
            }
            Some(RoleNode::Plain(role)) => {
                stack.extend(role.parents().values().rev().copied());
            }
            None => {}
        }
    }

    ancestors
}

/// Maps handles to names. A name shared by several handles maps to the
/// lowest one, so the result does not depend on visiting order.
pub(crate) fn named(graph: &RoleGraph, ids: impl IntoIterator<Item = RoleId>) -> ParentMap {
    let mut map = ParentMap::new();
    for id in ids {
        if let Some(node) = graph.node(id) {
            map.entry(node.as_roler().name().to_string())
                .and_modify(|kept| *kept = (*kept).min(id))
                .or_insert(id);
        }
    }
    map
}

/// Rebuilds an ancestor closure as the union of `{p} ∪ all_parents(p)` over
/// the direct parents, leaving out `owner` itself.
///
/// Recomputing from the remaining parents keeps an ancestor that is still
/// reachable through a sibling parent after another parent is removed.
pub(crate) fn closure_from_parents(
    graph: &RoleGraph,
    owner: RoleId,
    parents: &ParentMap,
) -> BTreeSet<RoleId> {
    let mut closure = BTreeSet::new();
    for id in parents.values() {
        closure.insert(*id);
        match graph.node(*id) {
            Some(RoleNode::Cached(parent)) => closure.extend(parent.ancestor_ids()),
            Some(RoleNode::Plain(parent)) => {
                closure.extend(ancestor_ids(graph, parent.parents()));
            }
            None => {}
        }
    }
    closure.remove(&owner);
    closure
}

/// Returns whether `target` is `from` or one of its ancestors.
pub(crate) fn reaches(graph: &RoleGraph, from: RoleId, target: RoleId) -> bool {
    if from == target {
        return true;
    }
    match graph.node(from) {
        Some(node) => ancestor_ids(graph, node.as_roler().parents()).contains(&target),
        None => false,
    }
}

/// Orders `root` and every cached descendant so that each role comes after
/// all of its parents that are also being refreshed (Kahn's algorithm over
/// the affected subgraph).
///
/// Roles left over by a cycle are appended in discovery order.
pub(crate) fn refresh_order(graph: &RoleGraph, root: RoleId) -> Vec<RoleId> {
    // Discover the affected subgraph through child links.
    let mut discovered = vec![root];
    let mut seen: HashSet<RoleId> = HashSet::from([root]);
    let mut queue = VecDeque::from([root]);
    while let Some(id) = queue.pop_front() {
        if let Some(RoleNode::Cached(cached)) = graph.node(id) {
            for child in cached.children_ids() {
                if seen.insert(child) {
                    discovered.push(child);
                    queue.push_back(child);
                }
            }
        }
    }

    // In-degree counts only parents inside the affected subgraph.
    let mut in_degree: HashMap<RoleId, usize> = HashMap::new();
    for id in &discovered {
        let degree = graph.node(*id).map_or(0, |node| {
            node.as_roler()
                .parents()
                .values()
                .filter(|parent| seen.contains(parent))
                .count()
        });
        in_degree.insert(*id, degree);
    }

    let mut ready: VecDeque<RoleId> = discovered
        .iter()
        .copied()
        .filter(|id| in_degree[id] == 0)
        .collect();
    let mut order = Vec::with_capacity(discovered.len());
    let mut placed = HashSet::new();

    while let Some(id) = ready.pop_front() {
        order.push(id);
        placed.insert(id);
        if let Some(RoleNode::Cached(cached)) = graph.node(id) {
            for child in cached.children_ids() {
                if let Some(degree) = in_degree.get_mut(&child) {
                    *degree = degree.saturating_sub(1);
                    if *degree == 0 && !placed.contains(&child) {
                        ready.push_back(child);
                    }
                }
            }
        }
    }

    if order.len() < discovered.len() {
        trace!(
            root = %root,
            unordered = discovered.len() - order.len(),
            "refresh order contains a cycle"
        );
        order.extend(discovered.into_iter().filter(|id| !placed.contains(id)));
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GraphConfig;

    #[test]
    fn test_ancestor_ids_visits_shared_ancestor_once() {
        let mut graph = RoleGraph::new();
        let a = graph.create_role("A");
        let b = graph.create_role("B");
        let c = graph.create_role("C");
        let d = graph.create_role("D");
        graph.set_parent(b, a).unwrap();
        graph.set_parent(c, a).unwrap();
        graph.set_parent(d, b).unwrap();
        graph.set_parent(d, c).unwrap();

        let parents = graph.parents(d).unwrap().clone();
        let ancestors = ancestor_ids(&graph, &parents);

        assert_eq!(ancestors.len(), 3);
        assert_eq!(ancestors.iter().filter(|id| **id == a).count(), 1);
    }

    #[test]
    fn test_walk_terminates_on_cycle_when_rejection_disabled() {
        let mut graph = RoleGraph::with_config(GraphConfig {
            reject_cycles: false,
            ..GraphConfig::default()
        });
        let a = graph.create_role("A");
        let b = graph.create_role("B");
        let c = graph.create_role("C");
        graph.set_parent(b, a).unwrap();
        graph.set_parent(c, b).unwrap();
        graph.set_parent(a, c).unwrap();

        let all = graph.all_parents(a).unwrap();
        assert_eq!(all.keys().collect::<Vec<_>>(), vec!["B", "C"]);
        assert!(reaches(&graph, a, a));
        assert!(reaches(&graph, c, a));
    }

    #[test]
    fn test_refresh_order_respects_longer_paths() {
        // root -> x -> y -> leaf, and root -> leaf directly
        let mut graph = RoleGraph::new();
        let root = graph.create_cached_role("root");
        let x = graph.create_cached_role("x");
        let y = graph.create_cached_role("y");
        let leaf = graph.create_cached_role("leaf");
        graph.set_child(root, x).unwrap();
        graph.set_child(x, y).unwrap();
        graph.set_child(y, leaf).unwrap();
        graph.set_child(root, leaf).unwrap();

        let order = refresh_order(&graph, root.id());
        let position = |id: RoleId| order.iter().position(|o| *o == id).unwrap();

        assert_eq!(order.len(), 4);
        assert_eq!(position(root.id()), 0);
        assert!(position(y.id()) < position(leaf.id()));
        assert!(position(x.id()) < position(y.id()));
    }

    #[test]
    fn test_closure_from_parents_keeps_shared_ancestor() {
        let mut graph = RoleGraph::new();
        let a = graph.create_cached_role("A");
        let b = graph.create_cached_role("B");
        let c = graph.create_cached_role("C");
        let d = graph.create_cached_role("D");
        graph.set_parent(b, a).unwrap();
        graph.set_parent(c, a).unwrap();
        graph.set_parent(d, b).unwrap();
        graph.set_parent(d, c).unwrap();

        let mut parents = graph.parents(d).unwrap().clone();
        parents.remove("B");
        let closure = closure_from_parents(&graph, d.id(), &parents);

        assert_eq!(closure, BTreeSet::from([a.id(), c.id()]));
    }

    #[test]
    fn test_named_prefers_lowest_handle() {
        let mut graph = RoleGraph::new();
        let first = graph.create_role("Auditor");
        let second = graph.create_role("Auditor");
        let other = graph.create_role("Admin");

        let map = named(&graph, [second, other, first]);

        assert_eq!(map.len(), 2);
        assert_eq!(map["Auditor"], first);
        assert_eq!(map["Admin"], other);
    }
}

//! Resolution of transition boundaries.
//!
//! For an external transition the engine needs to know, before anything is
//! exited or entered, which subtree leaves and which subtree arrives: the
//! deepest state enclosing both ends, its direct child on the source branch
//! and its direct child on the destination branch.

use crate::core::topology::{StateId, Topology};

/// Boundaries of one external transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TransitionData {
    /// Deepest state enclosing both ends.
    pub(crate) common_ancestor: StateId,
    /// Child of the common ancestor on the source branch; the subtree that
    /// will be exited. Absent when a plain transit finds the region idle.
    pub(crate) src_outermost: Option<StateId>,
    /// Child of the common ancestor on the destination branch; the subtree
    /// that will be entered.
    pub(crate) dst_outermost: StateId,
    pub(crate) src: Option<StateId>,
    pub(crate) dst: StateId,
}

/// Resolve the boundaries between a known source and destination.
///
/// Climbs from the destination: at each level, the climb node's own region
/// is searched for a sibling subtree holding the source. No such level
/// means the arrow would cross orthogonal regions or connect nested
/// states, and the transition is illegal.
pub(crate) fn resolve(topo: &Topology, src: StateId, dst: StateId) -> Option<TransitionData> {
    if src == dst {
        let parent = topo.node(src).parent?;
        return Some(TransitionData {
            common_ancestor: parent,
            src_outermost: Some(src),
            dst_outermost: src,
            src: Some(src),
            dst,
        });
    }

    let mut node = dst;
    while let Some(parent) = topo.node(node).parent {
        let region = topo.region(parent, topo.node(node).region_index);
        let sibling = region
            .children
            .values()
            .copied()
            .find(|&child| child != node && topo.contains(child, src));
        if let Some(src_outermost) = sibling {
            return Some(TransitionData {
                common_ancestor: parent,
                src_outermost: Some(src_outermost),
                dst_outermost: node,
                src: Some(src),
                dst,
            });
        }
        node = parent;
    }
    None
}

/// Resolve the boundaries of a transit requested without a source state.
///
/// The common ancestor is the nearest started ancestor of the destination;
/// whatever that region currently runs is the subtree to exit.
pub(crate) fn resolve_from_root(topo: &Topology, dst: StateId) -> Option<TransitionData> {
    let mut node = dst;
    loop {
        let parent = topo.node(node).parent?;
        if topo.node(parent).started {
            let current = topo.region(parent, topo.node(node).region_index).current;
            return Some(TransitionData {
                common_ancestor: parent,
                src_outermost: current,
                dst_outermost: node,
                src: current,
                dst,
            });
        }
        node = parent;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::TypeId;

    struct Root;
    struct A;
    struct B;
    struct C;
    struct D;
    struct E;

    fn kind<T: 'static>() -> TypeId {
        TypeId::of::<T>()
    }

    /// root
    ///  ├─ a (region 0)
    ///  │   ├─ c (region 0)
    ///  │   └─ d (region 1)
    ///  └─ b (region 0)
    ///      └─ e
    struct Fixture {
        topo: Topology,
        a: StateId,
        b: StateId,
        c: StateId,
        d: StateId,
        e: StateId,
    }

    fn fixture() -> Fixture {
        let mut topo = Topology::new(kind::<Root>(), "root".into());
        let root = topo.root();
        let a = topo.attach(kind::<A>(), "a".into(), root, 0, true).unwrap();
        let b = topo.attach(kind::<B>(), "b".into(), root, 0, false).unwrap();
        let c = topo.attach(kind::<C>(), "c".into(), a, 0, true).unwrap();
        let d = topo.attach(kind::<D>(), "d".into(), a, 1, true).unwrap();
        let e = topo.attach(kind::<E>(), "e".into(), b, 0, true).unwrap();
        Fixture { topo, a, b, c, d, e }
    }

    #[test]
    fn siblings_resolve_to_their_parent() {
        let f = fixture();
        let td = resolve(&f.topo, f.a, f.b).unwrap();
        assert_eq!(td.common_ancestor, f.topo.root());
        assert_eq!(td.src_outermost, Some(f.a));
        assert_eq!(td.dst_outermost, f.b);
        assert_eq!(td.dst, f.b);
    }

    #[test]
    fn deep_source_climbs_to_shared_level() {
        let f = fixture();
        // c sits two levels below root; b is a sibling of its grandparent.
        let td = resolve(&f.topo, f.c, f.b).unwrap();
        assert_eq!(td.common_ancestor, f.topo.root());
        assert_eq!(td.src_outermost, Some(f.a));
        assert_eq!(td.dst_outermost, f.b);
    }

    #[test]
    fn deep_destination_keeps_outermost_entry() {
        let f = fixture();
        let td = resolve(&f.topo, f.a, f.e).unwrap();
        assert_eq!(td.common_ancestor, f.topo.root());
        assert_eq!(td.src_outermost, Some(f.a));
        assert_eq!(td.dst_outermost, f.b);
        assert_eq!(td.dst, f.e);
    }

    #[test]
    fn self_transition_pivots_on_the_parent() {
        let f = fixture();
        let td = resolve(&f.topo, f.a, f.a).unwrap();
        assert_eq!(td.common_ancestor, f.topo.root());
        assert_eq!(td.src_outermost, Some(f.a));
        assert_eq!(td.dst_outermost, f.a);
    }

    #[test]
    fn root_self_transition_has_no_pivot() {
        let f = fixture();
        let root = f.topo.root();
        assert!(resolve(&f.topo, root, root).is_none());
    }

    #[test]
    fn orthogonal_regions_cannot_be_crossed() {
        let f = fixture();
        // c lives in region 0 of a, d in region 1.
        assert!(resolve(&f.topo, f.c, f.d).is_none());
        assert!(resolve(&f.topo, f.d, f.c).is_none());
    }

    #[test]
    fn nested_endpoints_are_rejected() {
        let f = fixture();
        assert!(resolve(&f.topo, f.a, f.c).is_none());
        assert!(resolve(&f.topo, f.c, f.a).is_none());
    }

    #[test]
    fn root_transit_picks_nearest_started_ancestor() {
        let mut f = fixture();
        let root = f.topo.root();
        f.topo.node_mut(root).started = true;
        f.topo.node_mut(f.a).started = true;
        f.topo.region_mut(root, 0).current = Some(f.a);

        let td = resolve_from_root(&f.topo, f.b).unwrap();
        assert_eq!(td.common_ancestor, root);
        assert_eq!(td.src_outermost, Some(f.a));
        assert_eq!(td.dst_outermost, f.b);

        // e is below b: with only root started, the boundary is still root.
        let td = resolve_from_root(&f.topo, f.e).unwrap();
        assert_eq!(td.common_ancestor, root);
        assert_eq!(td.dst_outermost, f.b);
    }

    #[test]
    fn root_transit_into_idle_region_has_no_source() {
        let mut f = fixture();
        let root = f.topo.root();
        f.topo.node_mut(root).started = true;

        let td = resolve_from_root(&f.topo, f.b).unwrap();
        assert_eq!(td.src_outermost, None);
        assert_eq!(td.src, None);
    }

    #[test]
    fn stopped_machine_resolves_nothing() {
        let f = fixture();
        assert!(resolve_from_root(&f.topo, f.b).is_none());
    }
}

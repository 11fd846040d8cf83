//! Introspection over the active configuration.

use std::any::{Any, TypeId};

use crate::core::topology::Node;

/// Read-only view of one state handed to visitors.
pub struct StateRef<'a> {
    node: &'a Node,
}

impl<'a> StateRef<'a> {
    pub(crate) fn new(node: &'a Node) -> Self {
        Self { node }
    }

    pub fn name(&self) -> &str {
        &self.node.name
    }

    pub fn started(&self) -> bool {
        self.node.started
    }

    /// Whether this state is the entry child of its parent region.
    pub fn is_entry(&self) -> bool {
        self.node.entry
    }

    /// Index of the parent region holding this state; 0 at the root.
    pub fn region_index(&self) -> usize {
        self.node.region_index
    }

    pub fn kind(&self) -> TypeId {
        self.node.kind
    }
}

/// Walks the active configuration; see `Machine::visit`.
///
/// States are visited pre-order: a state first, then each active region's
/// current child, in region-index order.
pub trait StateVisitor {
    fn visit(&mut self, state: StateRef<'_>);
}

/// Tuple of state types accepted by `check_states`.
///
/// Implemented for tuples of one to eight state types:
/// `machine.check_states::<(Running, Pumping)>()`.
pub trait StateSet {
    fn kinds() -> Vec<TypeId>;
}

macro_rules! impl_state_set {
    ($($ty:ident),+) => {
        impl<$($ty: Any),+> StateSet for ($($ty,)+) {
            fn kinds() -> Vec<TypeId> {
                vec![$(TypeId::of::<$ty>()),+]
            }
        }
    };
}

impl_state_set!(S1);
impl_state_set!(S1, S2);
impl_state_set!(S1, S2, S3);
impl_state_set!(S1, S2, S3, S4);
impl_state_set!(S1, S2, S3, S4, S5);
impl_state_set!(S1, S2, S3, S4, S5, S6);
impl_state_set!(S1, S2, S3, S4, S5, S6, S7);
impl_state_set!(S1, S2, S3, S4, S5, S6, S7, S8);

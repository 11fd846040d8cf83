//! The state tree: an arena of nodes with parent back-references.
//!
//! Parents own their children through per-region maps; children refer back
//! by [`StateId`]. Nodes are appended by the builder and never move or get
//! removed, so arena indices are stable for the machine's lifetime and the
//! arena order is topological (a parent always precedes its children).

use std::any::TypeId;
use std::collections::{BTreeMap, HashMap};

use crate::core::history::History;
use crate::error::TopologyError;

/// Stable handle of a state inside one machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) usize);

impl StateId {
    pub(crate) fn index(self) -> usize {
        self.0
    }
}

/// A concurrent sub-partition of a composite state.
#[derive(Debug, Default)]
pub(crate) struct Region {
    pub(crate) index: usize,
    /// Children keyed by their state kind.
    pub(crate) children: BTreeMap<TypeId, StateId>,
    pub(crate) entry: Option<StateId>,
    /// Non-null only while the region is active.
    pub(crate) current: Option<StateId>,
    pub(crate) last_visited: Option<StateId>,
    pub(crate) history: Option<History>,
}

impl Region {
    pub(crate) fn is_deep(&self) -> bool {
        self.history == Some(History::Deep)
    }

    pub(crate) fn has_child(&self, id: StateId) -> bool {
        self.children.values().any(|&c| c == id)
    }
}

/// One state of the tree.
#[derive(Debug)]
pub(crate) struct Node {
    pub(crate) kind: TypeId,
    pub(crate) name: String,
    /// None iff this is the root.
    pub(crate) parent: Option<StateId>,
    /// Index of the parent region holding this node. 0 at the root.
    pub(crate) region_index: usize,
    pub(crate) entry: bool,
    pub(crate) started: bool,
    /// Orthogonal regions in region-index order.
    pub(crate) regions: BTreeMap<usize, Region>,
}

#[derive(Debug)]
pub(crate) struct Topology {
    nodes: Vec<Node>,
    /// Kind lookup enforcing the one-instance-per-kind invariant.
    pub(crate) by_kind: HashMap<TypeId, StateId>,
}

impl Topology {
    pub(crate) fn new(root_kind: TypeId, root_name: String) -> Self {
        let root = Node {
            kind: root_kind,
            name: root_name,
            parent: None,
            region_index: 0,
            entry: false,
            started: false,
            regions: BTreeMap::new(),
        };
        let mut by_kind = HashMap::new();
        by_kind.insert(root_kind, StateId(0));
        Self {
            nodes: vec![root],
            by_kind,
        }
    }

    pub(crate) fn root(&self) -> StateId {
        StateId(0)
    }

    pub(crate) fn root_started(&self) -> bool {
        self.nodes[0].started
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn node(&self, id: StateId) -> &Node {
        &self.nodes[id.0]
    }

    pub(crate) fn node_mut(&mut self, id: StateId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub(crate) fn lookup(&self, kind: TypeId) -> Option<StateId> {
        self.by_kind.get(&kind).copied()
    }

    pub(crate) fn name_of(&self, id: StateId) -> &str {
        &self.nodes[id.0].name
    }

    /// The parent region holding `id`, if any.
    pub(crate) fn region(&self, state: StateId, index: usize) -> &Region {
        self.nodes[state.0]
            .regions
            .get(&index)
            .expect("region exists")
    }

    pub(crate) fn region_mut(&mut self, state: StateId, index: usize) -> &mut Region {
        self.nodes[state.0]
            .regions
            .get_mut(&index)
            .expect("region exists")
    }

    /// Region indices of a state, in order.
    pub(crate) fn region_indices(&self, id: StateId) -> Vec<usize> {
        self.nodes[id.0].regions.keys().copied().collect()
    }

    /// True when `outer` is `inner` or one of its ancestors.
    pub(crate) fn contains(&self, outer: StateId, inner: StateId) -> bool {
        let mut cursor = Some(inner);
        while let Some(id) = cursor {
            if id == outer {
                return true;
            }
            cursor = self.nodes[id.0].parent;
        }
        false
    }

    /// Attach a new node under `parent`, creating the region on demand.
    ///
    /// Validates the uniqueness and single-entry invariants; on error the
    /// tree is unchanged.
    pub(crate) fn attach(
        &mut self,
        kind: TypeId,
        name: String,
        parent: StateId,
        region_index: usize,
        entry: bool,
    ) -> Result<StateId, TopologyError> {
        if let Some(existing) = self.lookup(kind) {
            let owner = match self.nodes[existing.0].parent {
                Some(p) => self.name_of(p).to_string(),
                None => self.name_of(existing).to_string(),
            };
            return Err(TopologyError::DuplicateState { name, parent: owner });
        }

        self.nodes[parent.0]
            .regions
            .entry(region_index)
            .or_insert_with(|| Region {
                index: region_index,
                ..Region::default()
            });

        if entry {
            if let Some(existing_entry) = self.nodes[parent.0].regions[&region_index].entry {
                return Err(TopologyError::MultipleEntries {
                    state: self.nodes[parent.0].name.clone(),
                    region: region_index,
                    entry: self.nodes[existing_entry.0].name.clone(),
                });
            }
        }

        let id = StateId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            name,
            parent: Some(parent),
            region_index,
            entry,
            started: false,
            regions: BTreeMap::new(),
        });

        let region = self.nodes[parent.0]
            .regions
            .get_mut(&region_index)
            .expect("region exists");
        region.children.insert(kind, id);
        if entry {
            region.entry = Some(id);
        }
        self.by_kind.insert(kind, id);
        Ok(id)
    }

    /// Active-configuration chain check.
    ///
    /// The first kind may be any started state (the root kind included);
    /// every following kind must name a started direct child of the
    /// previous one. An empty chain is false, as is a stopped machine.
    pub(crate) fn check_chain(&self, kinds: &[TypeId]) -> bool {
        if !self.root_started() || kinds.is_empty() {
            return false;
        }

        let mut rest = kinds;
        let mut prev: Option<StateId> = None;
        if kinds[0] == self.nodes[0].kind {
            prev = Some(self.root());
            rest = &kinds[1..];
        }

        for kind in rest {
            let Some(id) = self.lookup(*kind) else {
                return false;
            };
            if !self.nodes[id.0].started {
                return false;
            }
            if let Some(p) = prev {
                if self.nodes[id.0].parent != Some(p) {
                    return false;
                }
            }
            prev = Some(id);
        }
        true
    }
}

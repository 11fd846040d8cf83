//! History modes and the rules that keep them consistent.
//!
//! Each region independently remembers its last visited child. A `Shallow`
//! region restores that child on re-entry; a `Deep` region additionally
//! propagates restoration into every nested region along the entered
//! branch. Deep history is exclusive: no other region above or below may
//! also be deep, and a shallow region may not sit under a deep one.

use crate::core::topology::{StateId, Topology};
use crate::error::TopologyError;

/// Restoration behavior of a region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum History {
    /// Restore the region's own last visited child only.
    Shallow,
    /// Restore the last visited child of every nested region on the branch.
    Deep,
}

impl Topology {
    /// Set the history mode of one region, enforcing exclusivity.
    ///
    /// On conflict the previous mode is kept and the call fails. A
    /// successful change clears the region's last-visited marker.
    pub(crate) fn set_region_history(
        &mut self,
        state: StateId,
        region_index: usize,
        mode: History,
    ) -> Result<(), TopologyError> {
        let conflict = match mode {
            History::Deep => self
                .deep_ancestor(state, region_index)
                .map(|found| ("ancestor", found))
                .or_else(|| {
                    self.deep_descendant(state, region_index)
                        .map(|found| ("descendant", found))
                }),
            History::Shallow => self
                .deep_ancestor(state, region_index)
                .map(|found| ("ancestor", found)),
        };

        if let Some((kin, (other, other_region))) = conflict {
            return Err(TopologyError::HistoryConflict {
                state: self.name_of(state).to_string(),
                region: region_index,
                requested: match mode {
                    History::Shallow => "shallow",
                    History::Deep => "deep",
                },
                kin,
                other: self.name_of(other).to_string(),
                other_region,
            });
        }

        let region = self.region_mut(state, region_index);
        region.history = Some(mode);
        region.last_visited = None;
        Ok(())
    }

    /// Remove the history mode (and marker) of one region, optionally of
    /// every region below it as well.
    pub(crate) fn reset_region_history(
        &mut self,
        state: StateId,
        region_index: usize,
        recursive: bool,
    ) {
        let region = self.region_mut(state, region_index);
        region.history = None;
        region.last_visited = None;
        if recursive {
            self.for_child_regions(state, region_index, |topo, child, index| {
                topo.reset_region_history(child, index, true);
            });
        }
    }

    /// Forget the last visited child of one region, optionally recursively.
    /// The history mode itself is untouched.
    pub(crate) fn clear_region_history(
        &mut self,
        state: StateId,
        region_index: usize,
        recursive: bool,
    ) {
        self.region_mut(state, region_index).last_visited = None;
        if recursive {
            self.for_child_regions(state, region_index, |topo, child, index| {
                topo.clear_region_history(child, index, true);
            });
        }
    }

    fn for_child_regions(
        &mut self,
        state: StateId,
        region_index: usize,
        mut apply: impl FnMut(&mut Self, StateId, usize),
    ) {
        let children: Vec<StateId> = self
            .region(state, region_index)
            .children
            .values()
            .copied()
            .collect();
        for child in children {
            for index in self.region_indices(child) {
                apply(self, child, index);
            }
        }
    }

    /// Nearest deep region at or above `(state, region_index)`.
    fn deep_ancestor(&self, state: StateId, region_index: usize) -> Option<(StateId, usize)> {
        if self.region(state, region_index).is_deep() {
            return Some((state, region_index));
        }
        let node = self.node(state);
        let parent = node.parent?;
        self.deep_ancestor(parent, node.region_index)
    }

    /// Any deep region strictly below `(state, region_index)`.
    fn deep_descendant(&self, state: StateId, region_index: usize) -> Option<(StateId, usize)> {
        for &child in self.region(state, region_index).children.values() {
            for index in self.region_indices(child) {
                if self.region(child, index).is_deep() {
                    return Some((child, index));
                }
                if let Some(found) = self.deep_descendant(child, index) {
                    return Some(found);
                }
            }
        }
        None
    }
}

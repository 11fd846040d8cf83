//! Event processing and the run-to-completion drain.
//!
//! Dispatch walks top-down from the root along the active chain; the
//! outermost state holding a transition for the event gets the first shot,
//! and orthogonal regions dispatch independently. Work queued by callbacks
//! (posted events, deferred events, transit requests) is drained to
//! quiescence before any processing entry point returns.

use std::any::TypeId;

use crate::core::topology::StateId;
use crate::event::Event;
use crate::machine::{Machine, PendingWork};

impl<St: 'static> Machine<St> {
    /// Dispatch one event through the active configuration and drain every
    /// queued follow-up. No-op on a stopped machine.
    pub fn process_event(&mut self, evt: impl Event) {
        if !self.started() || self.core.processing {
            return;
        }
        self.core.processing = true;
        let root = self.core.topo.root();
        self.dispatch(root, &evt, false);
        self.drain();
        self.core.processing = false;
    }

    /// From quiescence this is `process_event`; callbacks queue through
    /// their [`Context`](crate::Context) instead.
    pub fn post_event(&mut self, evt: impl Event) {
        self.process_event(evt);
    }

    /// Try the event now; if no transition consumes it, park it and replay
    /// it on every future drain pass until one does.
    pub fn defer_event(&mut self, evt: impl Event) {
        if !self.started() || self.core.processing {
            return;
        }
        self.core.processing = true;
        let root = self.core.topo.root();
        if self.dispatch(root, &evt, false) {
            self.drain();
        } else {
            self.core.pending.push_back(PendingWork::Event {
                evt: Box::new(evt),
                deferred: true,
            });
        }
        self.core.processing = false;
    }

    /// Anonymous transit to `D`, resolved against the current
    /// configuration and executed immediately.
    pub fn transit<D: 'static>(&mut self) {
        self.transit_entry(TypeId::of::<D>(), None);
    }

    /// Transit to `D` carrying `evt` as the triggering event.
    pub fn transit_with<D: 'static>(&mut self, evt: impl Event) {
        self.transit_entry(TypeId::of::<D>(), Some(&evt));
    }

    fn transit_entry(&mut self, dst: TypeId, evt: Option<&dyn Event>) {
        if !self.started() || self.core.processing {
            return;
        }
        self.core.processing = true;
        let root = self.core.topo.root();
        self.exec_transit(root, dst, evt);
        self.drain();
        self.core.processing = false;
    }

    /// Top-down search for a state willing to take the event.
    ///
    /// A state's own transition is tried first; a vetoing guard or a
    /// failed callback lets the search continue downward. Orthogonal
    /// regions each dispatch independently and the results are OR-joined.
    pub(crate) fn dispatch(&mut self, id: StateId, evt: &dyn Event, propagate: bool) -> bool {
        let kind = evt.as_any().type_id();
        if self.tables[id.index()].contains_key(&kind) && self.fire(id, evt) {
            return true;
        }

        let mut matched = false;
        for region in self.core.topo.region_indices(id) {
            let (current, deep) = {
                let region = self.core.topo.region(id, region);
                (region.current, region.is_deep())
            };
            if let Some(child) = current {
                matched |= self.dispatch(child, evt, propagate || deep);
            }
        }
        matched
    }

    /// Run the guard, the action and (for external transitions) the
    /// transit for the arc `id` holds for this event kind.
    fn fire(&mut self, id: StateId, evt: &dyn Event) -> bool {
        let kind = evt.as_any().type_id();
        let Some(arc) = self.tables[id.index()].get(&kind) else {
            return false;
        };
        let holder = arc.holder;
        let data = arc.data;

        if let Some(guard) = arc.guard.as_ref() {
            match self.core.run_guard(holder, evt, guard) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(fault) => {
                    self.core.report(id, Some(evt), fault);
                    return false;
                }
            }
        }

        if let Some(action) = arc.action.as_ref() {
            if let Err(fault) = self.core.run_action(holder, evt, action) {
                self.core.report(id, Some(evt), fault);
                return false;
            }
        }

        match data {
            Some(td) => self.core.transit_core(Some(evt), td, false),
            None => true,
        }
    }

    /// Execute a transit request: look the destination up, resolve the
    /// boundaries from the requesting state (or the root) and run the
    /// transit core. Silently ignored when the destination is unknown,
    /// already active, unreachable, or the machine stopped meanwhile.
    pub(crate) fn exec_transit(&mut self, src: StateId, dst: TypeId, evt: Option<&dyn Event>) {
        use crate::core::resolver::{resolve, resolve_from_root};

        if !self.started() {
            return;
        }
        let Some(dst_id) = self.core.topo.lookup(dst) else {
            return;
        };
        if self.core.topo.node(dst_id).started {
            return;
        }
        let td = if src == self.core.topo.root() {
            resolve_from_root(&self.core.topo, dst_id)
        } else {
            resolve(&self.core.topo, src, dst_id)
        };
        if let Some(td) = td {
            self.core.transit_core(evt, td, false);
        }
    }

    /// Run-to-completion loop: promote posted work into the pending set,
    /// walk it in FIFO order, repeat until nothing new was posted.
    /// Deferred events that still match nothing stay parked.
    pub(crate) fn drain(&mut self) {
        loop {
            while let Some(work) = self.core.posted.pop_front() {
                self.core.pending.push_back(work);
            }

            let mut index = 0;
            while index < self.core.pending.len() {
                let Some(work) = self.core.pending.remove(index) else {
                    break;
                };
                match work {
                    PendingWork::Event { evt, deferred } => {
                        let matched = if self.started() {
                            let root = self.core.topo.root();
                            self.dispatch(root, &*evt, false)
                        } else {
                            false
                        };
                        if deferred && !matched {
                            self.core
                                .pending
                                .insert(index, PendingWork::Event { evt, deferred });
                            index += 1;
                        }
                    }
                    PendingWork::Transit { src, dst, evt } => {
                        self.exec_transit(src, dst, evt.as_deref());
                    }
                }
            }

            if self.core.posted.is_empty() {
                break;
            }
        }
    }
}

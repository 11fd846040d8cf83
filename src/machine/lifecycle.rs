//! Enter/exit recursion and the transit core.
//!
//! Ordering contract: entries fire outermost-first down the destination
//! path, exits fire innermost-first up the source path, and orthogonal
//! sibling regions of any state crossed on the way in are started with
//! their own defaults or history. Every callback runs inside an error
//! boundary; a failure is routed to the failing state's `on_error` and the
//! cascade continues.

use crate::core::resolver::TransitionData;
use crate::core::topology::StateId;
use crate::core::transition::{ActionFn, GuardFn};
use crate::error::Fault;
use crate::event::Event;
use crate::machine::{Context, Core};
use crate::state::State;

impl<St: 'static> Core<St> {
    /// Run `f` against the handler of `id` with a fresh callback context.
    ///
    /// The handler is taken out of its slot for the duration so the
    /// context can borrow the rest of the machine freely. `None` when the
    /// slot is empty (a callback of the same state is already running).
    pub(crate) fn with_handler<R>(
        &mut self,
        id: StateId,
        trig: Option<&dyn Event>,
        f: impl FnOnce(&mut dyn State<St>, &mut Context<'_, St>) -> R,
    ) -> Option<R> {
        let mut handler = self.handlers[id.index()].take()?;
        let out = {
            let mut ctx = Context {
                topo: &self.topo,
                store: &mut self.store,
                posted: &mut self.posted,
                logger: self.logger.as_ref(),
                current: id,
                trig,
            };
            f(&mut *handler, &mut ctx)
        };
        self.handlers[id.index()] = Some(handler);
        Some(out)
    }

    /// Surface a callback failure through the state's `on_error`.
    /// Failures raised by `on_error` itself cannot happen: it is
    /// infallible by signature, which also rules out error regress.
    pub(crate) fn report(&mut self, id: StateId, trig: Option<&dyn Event>, fault: Fault) {
        self.with_handler(id, trig, |handler, ctx| handler.on_error(ctx, &fault));
    }

    pub(crate) fn run_guard(
        &mut self,
        holder: StateId,
        evt: &dyn Event,
        guard: &GuardFn<St>,
    ) -> Result<bool, Fault> {
        self.with_handler(holder, Some(evt), |handler, ctx| {
            guard(handler.as_any_mut(), ctx, evt)
        })
        .unwrap_or(Ok(false))
    }

    pub(crate) fn run_action(
        &mut self,
        holder: StateId,
        evt: &dyn Event,
        action: &ActionFn<St>,
    ) -> Result<(), Fault> {
        self.with_handler(holder, Some(evt), |handler, ctx| {
            action(handler.as_any_mut(), ctx, evt)
        })
        .unwrap_or(Ok(()))
    }

    /// Enter `id`: mark started, run `on_entry`, then start each region in
    /// index order (skipped when `recurse` is false, used for intermediate
    /// states on a transit path whose regions are started selectively).
    pub(crate) fn enter(
        &mut self,
        id: StateId,
        evt: Option<&dyn Event>,
        propagate: bool,
        recurse: bool,
    ) {
        self.topo.node_mut(id).started = true;
        if let Some(Err(fault)) = self.with_handler(id, evt, |handler, ctx| handler.on_entry(ctx)) {
            self.report(id, evt, fault);
        }
        if recurse {
            for region in self.topo.region_indices(id) {
                self.region_start(id, region, evt, propagate, None);
            }
        }
    }

    /// Exit `id`: stop each region (recursing into its current child and
    /// recording it as last visited), then run `on_exit`, then clear the
    /// started flag.
    pub(crate) fn exit(&mut self, id: StateId, evt: Option<&dyn Event>) {
        for region in self.topo.region_indices(id) {
            let current = self.topo.region(id, region).current;
            if let Some(child) = current {
                self.exit(child, evt);
            }
            let region = self.topo.region_mut(id, region);
            region.last_visited = region.current;
            region.current = None;
        }
        if let Some(Err(fault)) = self.with_handler(id, evt, |handler, ctx| handler.on_exit(ctx)) {
            self.report(id, evt, fault);
        }
        self.topo.node_mut(id).started = false;
    }

    /// Activate one region: pick the target child and enter it.
    ///
    /// A forced target (transit destination) is taken as-is when it is a
    /// direct child. Otherwise the last visited child wins when the region
    /// has history or restoration is being propagated; the entry child is
    /// the fallback. A region may legitimately end up with no child.
    pub(crate) fn region_start(
        &mut self,
        state: StateId,
        region_index: usize,
        evt: Option<&dyn Event>,
        propagate: bool,
        forced: Option<StateId>,
    ) {
        let region = self.topo.region(state, region_index);
        let target = match forced {
            Some(child) => region.has_child(child).then_some(child),
            None => {
                if region.last_visited.is_some() && (region.history.is_some() || propagate) {
                    region.last_visited
                } else {
                    region.entry
                }
            }
        };
        let deep = region.is_deep();
        self.topo.region_mut(state, region_index).current = target;
        if let Some(child) = target {
            self.enter(child, evt, propagate || deep, true);
        }
    }

    /// Perform an external transition described by `td`.
    ///
    /// Walks the active chain from the root down to the common ancestor,
    /// exits the source subtree there, then enters the destination chain.
    /// False when the common ancestor is not on the active chain (the
    /// source side was already gone).
    pub(crate) fn transit_core(
        &mut self,
        evt: Option<&dyn Event>,
        td: TransitionData,
        propagate: bool,
    ) -> bool {
        let root = self.topo.root();
        self.transit_at(root, evt, &td, propagate)
    }

    fn transit_at(
        &mut self,
        id: StateId,
        evt: Option<&dyn Event>,
        td: &TransitionData,
        propagate: bool,
    ) -> bool {
        if id == td.common_ancestor {
            if let Some(src_outermost) = td.src_outermost {
                if self.topo.node(src_outermost).started {
                    self.exit(src_outermost, evt);
                }
            }
            let dst_region = self.parent_region_of(td.dst_outermost);
            let prop = propagate || self.region_deep(dst_region);
            self.enter_path(evt, td, prop);
            return true;
        }

        for region in self.topo.region_indices(id) {
            let (current, deep) = {
                let region = self.topo.region(id, region);
                (region.current, region.is_deep())
            };
            if let Some(child) = current {
                if self.transit_at(child, evt, td, propagate || deep) {
                    return true;
                }
            }
        }
        false
    }

    /// Enter the destination chain from `dst_outermost` down to `dst`.
    ///
    /// Intermediate states are entered without their regions, the region
    /// towards the destination is marked current, and every other region
    /// starts with defaults or history according to the propagate flag
    /// accumulated so far.
    fn enter_path(&mut self, evt: Option<&dyn Event>, td: &TransitionData, mut propagate: bool) {
        let mut chain = vec![td.dst];
        let mut cursor = td.dst;
        while cursor != td.dst_outermost {
            match self.topo.node(cursor).parent {
                Some(parent) => cursor = parent,
                None => return,
            }
            chain.push(cursor);
        }
        chain.reverse();

        for (depth, &node) in chain.iter().enumerate() {
            let (parent, region_index) = self.parent_region_of(node);
            let prop = propagate || self.region_deep((parent, region_index));

            if node == td.dst {
                self.region_start(parent, region_index, evt, prop, Some(node));
                return;
            }

            self.topo.region_mut(parent, region_index).current = Some(node);
            self.enter(node, evt, false, false);

            let towards_dst = self.topo.node(chain[depth + 1]).region_index;
            for region in self.topo.region_indices(node) {
                if region != towards_dst {
                    self.region_start(node, region, evt, prop, None);
                }
            }
            propagate = prop;
        }
    }

    fn parent_region_of(&self, id: StateId) -> (StateId, usize) {
        let node = self.topo.node(id);
        let parent = node.parent.expect("non-root state has a parent");
        (parent, node.region_index)
    }

    fn region_deep(&self, (state, index): (StateId, usize)) -> bool {
        self.topo.region(state, index).is_deep()
    }
}

//! The machine: topology ownership, lifecycle and event processing.
//!
//! A [`Machine`] owns the state tree, one handler instance per state kind,
//! the per-state transition tables, the user store and the two
//! run-to-completion queues. Construction is done through the fluent
//! builders (or the declarative `setup` hooks); once `start` has run the
//! topology is frozen until `stop`.

mod context;
mod dispatch;
mod lifecycle;

pub use context::Context;

use std::any::TypeId;
use std::collections::VecDeque;

use crate::builder::{Decls, StateDef, TransitionDef};
use crate::core::history::History;
use crate::core::topology::{StateId, Topology};
use crate::core::transition::TransitionTable;
use crate::error::TopologyError;
use crate::event::{short_name, Event};
use crate::log::{LogLevel, LogSink, NullSink, LOG_MODULE};
use crate::state::State;
use crate::visit::{StateRef, StateSet, StateVisitor};

/// Work produced during processing, drained after the triggering step.
pub(crate) enum PendingWork {
    Event {
        evt: Box<dyn Event>,
        /// Deferred events are replayed until consumed; posted events get
        /// a single pass and are dropped if unmatched.
        deferred: bool,
    },
    Transit {
        /// State the request was made from; resolution starts there.
        src: StateId,
        dst: TypeId,
        evt: Option<Box<dyn Event>>,
    },
}

/// Everything the lifecycle engine mutates. Kept apart from the transition
/// tables so a table entry can stay borrowed while the tree changes.
pub(crate) struct Core<St: 'static> {
    pub(crate) topo: Topology,
    /// Handler instances, parallel to the arena. A slot is `None` only
    /// while its handler is running a callback.
    pub(crate) handlers: Vec<Option<Box<dyn State<St>>>>,
    pub(crate) store: St,
    /// Incoming queue: work queued by callbacks lands here.
    pub(crate) posted: VecDeque<PendingWork>,
    /// Drain working set; unconsumed deferred events stay here across
    /// processing calls.
    pub(crate) pending: VecDeque<PendingWork>,
    pub(crate) processing: bool,
    pub(crate) logger: Box<dyn LogSink>,
}

impl<St: 'static> Core<St> {
    pub(crate) fn log(&self, level: LogLevel, message: impl std::fmt::Display) {
        self.logger
            .write_log(LOG_MODULE, level, &message.to_string());
    }

    pub(crate) fn reject(&self, err: TopologyError) -> TopologyError {
        self.log(LogLevel::Error, &err);
        err
    }
}

/// A hierarchical state machine over user store `St`.
pub struct Machine<St: 'static = ()> {
    pub(crate) core: Core<St>,
    /// Transition tables, parallel to the arena.
    pub(crate) tables: Vec<TransitionTable<St>>,
}

impl<St: Default + 'static> Machine<St> {
    /// New machine whose root state is `R`, named after the type.
    pub fn new<R: State<St> + Default>() -> Self {
        Self::with_store::<R>(St::default())
    }

    /// New machine with an explicit root name.
    pub fn named<R: State<St> + Default>(name: impl Into<String>) -> Self {
        Self::assemble::<R>(name.into(), St::default())
    }
}

impl<St: 'static> Machine<St> {
    /// New machine seeded with a store value.
    pub fn with_store<R: State<St> + Default>(store: St) -> Self {
        let name = short_name(std::any::type_name::<R>()).to_string();
        Self::assemble::<R>(name, store)
    }

    fn assemble<R: State<St> + Default>(name: String, store: St) -> Self {
        Self {
            core: Core {
                topo: Topology::new(TypeId::of::<R>(), name),
                handlers: vec![Some(Box::new(R::default()))],
                store,
                posted: VecDeque::new(),
                pending: VecDeque::new(),
                processing: false,
                logger: Box::new(NullSink),
            },
            tables: vec![TransitionTable::new()],
        }
    }

    /// Replace the log sink. Default is a no-op sink.
    pub fn set_logger(&mut self, sink: impl LogSink + 'static) {
        self.core.logger = Box::new(sink);
    }

    /// Root state name.
    pub fn name(&self) -> &str {
        self.core.topo.name_of(self.core.topo.root())
    }

    pub fn started(&self) -> bool {
        self.core.topo.root_started()
    }

    pub fn store(&self) -> &St {
        &self.core.store
    }

    pub fn store_mut(&mut self) -> &mut St {
        &mut self.core.store
    }

    // ---- construction ----------------------------------------------------

    /// Begin adding a state of kind `C`; finish with `.add()`.
    pub fn state<C: State<St> + Default>(&mut self) -> StateDef<'_, St, C> {
        StateDef::new(self, None)
    }

    /// Begin adding a transition `Src --Evt--> Dst`; finish with `.add()`.
    pub fn transition<Src: State<St>, Evt: Event, Dst: State<St>>(
        &mut self,
    ) -> TransitionDef<'_, St, Src, Evt, Dst, Src> {
        TransitionDef::new(self)
    }

    /// Begin adding an internal transition on `Src` for `Evt`: the action
    /// runs in place, nothing is exited or entered.
    pub fn internal<Src: State<St>, Evt: Event>(
        &mut self,
    ) -> TransitionDef<'_, St, Src, Evt, Src, Src> {
        TransitionDef::new(self)
    }

    /// Consume the declarative hooks of every registered state, outermost
    /// first: `initial_states`, then `initial_transitions`, then
    /// `initial_history`. Individual failures are collected and logged but
    /// do not abort the pass.
    pub fn setup(&mut self) -> Vec<TopologyError> {
        let mut errors = Vec::new();
        if self.started() {
            errors.push(self.core.reject(TopologyError::WrongLifecyclePhase));
            return errors;
        }

        // States may add more states; the arena grows while we walk it.
        let mut index = 0;
        while index < self.core.topo.len() {
            if let Some(handler) = self.core.handlers[index].take() {
                let result = handler.initial_states(&mut Decls::new(self, StateId(index)));
                self.core.handlers[index] = Some(handler);
                if let Err(err) = result {
                    errors.push(self.core.reject(err));
                }
            }
            index += 1;
        }

        for index in 0..self.core.topo.len() {
            if let Some(handler) = self.core.handlers[index].take() {
                let result = handler.initial_transitions(&mut Decls::new(self, StateId(index)));
                self.core.handlers[index] = Some(handler);
                if let Err(err) = result {
                    errors.push(self.core.reject(err));
                }
            }
        }

        for index in 0..self.core.topo.len() {
            let id = StateId(index);
            if let Some(handler) = self.core.handlers[index].take() {
                for region in self.core.topo.region_indices(id) {
                    if let Some(mode) = handler.initial_history(region) {
                        if let Err(err) = self.core.topo.set_region_history(id, region, mode) {
                            errors.push(self.core.reject(err));
                        }
                    }
                }
                self.core.handlers[index] = Some(handler);
            }
        }

        errors
    }

    // ---- lifecycle -------------------------------------------------------

    /// Enter the root and cascade into every entry child. No-op when
    /// already started. Work queued by entry callbacks is drained before
    /// returning.
    pub fn start(&mut self) {
        if self.started() {
            return;
        }
        self.core.processing = true;
        let root = self.core.topo.root();
        self.core.enter(root, None, false, true);
        self.drain();
        self.core.processing = false;
    }

    /// Exit cascade symmetric to `start`, innermost first. Idempotent.
    pub fn stop(&mut self) {
        if !self.started() {
            return;
        }
        self.core.processing = true;
        let root = self.core.topo.root();
        self.core.exit(root, None);
        self.drain();
        self.core.processing = false;
    }

    // ---- history ---------------------------------------------------------

    /// Set the history mode on every region of `S`.
    pub fn set_history<S: State<St>>(&mut self, mode: History) -> Result<(), TopologyError> {
        let id = self.locate::<S>(true)?;
        let mut first_err = None;
        for region in self.core.topo.region_indices(id) {
            if let Err(err) = self.core.topo.set_region_history(id, region, mode) {
                let err = self.core.reject(err);
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Set the history mode on one region of `S`.
    pub fn set_history_in<S: State<St>>(
        &mut self,
        region: usize,
        mode: History,
    ) -> Result<(), TopologyError> {
        let id = self.locate::<S>(true)?;
        self.require_region(id, region)?;
        self.core
            .topo
            .set_region_history(id, region, mode)
            .map_err(|err| self.core.reject(err))
    }

    /// Current history mode of one region of `S`, if both exist.
    pub fn history_of<S: State<St>>(&self, region: usize) -> Option<History> {
        let id = self.core.topo.lookup(TypeId::of::<S>())?;
        self.core.topo.node(id).regions.get(&region)?.history
    }

    /// Drop mode and marker on every region of `S`.
    pub fn reset_history<S: State<St>>(&mut self, recursive: bool) -> Result<(), TopologyError> {
        let id = self.locate::<S>(true)?;
        for region in self.core.topo.region_indices(id) {
            self.core.topo.reset_region_history(id, region, recursive);
        }
        Ok(())
    }

    /// Drop mode and marker on one region of `S`.
    pub fn reset_history_in<S: State<St>>(
        &mut self,
        region: usize,
        recursive: bool,
    ) -> Result<(), TopologyError> {
        let id = self.locate::<S>(true)?;
        self.require_region(id, region)?;
        self.core.topo.reset_region_history(id, region, recursive);
        Ok(())
    }

    /// Forget last-visited markers on every region of `S`, keeping modes.
    /// Allowed while running.
    pub fn clear_history<S: State<St>>(&mut self, recursive: bool) -> Result<(), TopologyError> {
        let id = self.locate::<S>(false)?;
        for region in self.core.topo.region_indices(id) {
            self.core.topo.clear_region_history(id, region, recursive);
        }
        Ok(())
    }

    /// Forget the last-visited marker on one region of `S`.
    pub fn clear_history_in<S: State<St>>(
        &mut self,
        region: usize,
        recursive: bool,
    ) -> Result<(), TopologyError> {
        let id = self.locate::<S>(false)?;
        self.require_region(id, region)?;
        self.core.topo.clear_region_history(id, region, recursive);
        Ok(())
    }

    // ---- introspection ---------------------------------------------------

    /// Borrow the handler instance of state kind `S`.
    pub fn get<S: State<St>>(&self) -> Option<&S> {
        let id = self.core.topo.lookup(TypeId::of::<S>())?;
        let handler: &dyn State<St> = self.core.handlers[id.index()].as_deref()?;
        handler.as_any().downcast_ref()
    }

    /// Mutably borrow the handler instance of state kind `S`.
    pub fn get_mut<S: State<St>>(&mut self) -> Option<&mut S> {
        let id = self.core.topo.lookup(TypeId::of::<S>())?;
        let handler: &mut dyn State<St> = self.core.handlers[id.index()].as_deref_mut()?;
        handler.as_any_mut().downcast_mut()
    }

    /// True when the listed states form a started chain: the first may be
    /// any started state (or the root kind), each following one must be a
    /// started direct child of the previous. Always false on a stopped
    /// machine or for an empty tuple.
    pub fn check_states<Q: StateSet>(&self) -> bool {
        self.core.topo.check_chain(&Q::kinds())
    }

    /// Pre-order walk of the active configuration, region-index ordered.
    pub fn visit(&self, visitor: &mut dyn StateVisitor) {
        self.visit_from(self.core.topo.root(), visitor);
    }

    fn visit_from(&self, id: StateId, visitor: &mut dyn StateVisitor) {
        visitor.visit(StateRef::new(self.core.topo.node(id)));
        for region in self.core.topo.node(id).regions.values() {
            if let Some(current) = region.current {
                self.visit_from(current, visitor);
            }
        }
    }

    // ---- shared helpers --------------------------------------------------

    fn locate<S: State<St>>(&self, frozen_only: bool) -> Result<StateId, TopologyError> {
        if frozen_only && self.started() {
            return Err(self.core.reject(TopologyError::WrongLifecyclePhase));
        }
        self.core
            .topo
            .lookup(TypeId::of::<S>())
            .ok_or_else(|| {
                self.core.reject(TopologyError::MissingState(
                    short_name(std::any::type_name::<S>()).to_string(),
                ))
            })
    }

    fn require_region(&self, id: StateId, region: usize) -> Result<(), TopologyError> {
        if self.core.topo.node(id).regions.contains_key(&region) {
            Ok(())
        } else {
            Err(self.core.reject(TopologyError::MissingRegion {
                state: self.core.topo.name_of(id).to_string(),
                region,
            }))
        }
    }
}

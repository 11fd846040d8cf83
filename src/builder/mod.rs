//! Fluent construction API.
//!
//! States and transitions are declared through short builder chains on the
//! machine (or on [`Decls`] inside the declarative hooks) and committed
//! with `.add()`, which validates against the topology invariants and
//! rejects without side effects on failure:
//!
//! ```ignore
//! machine.state::<Idle>().entry().add()?;
//! machine.state::<Pump>().parent::<Idle>().region(1).add()?;
//! machine.transition::<Idle, Go, Pump>().guard(|s, _ctx, _e| Ok(s.armed)).add()?;
//! machine.internal::<Pump, Tick>().action(|s, ctx, e| s.pulse(ctx, e)).add()?;
//! ```

pub mod macros;

use std::any::TypeId;
use std::marker::PhantomData;

use crate::core::resolver::resolve;
use crate::core::topology::StateId;
use crate::core::transition::{ActionFn, GuardFn, Transition, TransitionTable};
use crate::error::{Fault, Outcome, TopologyError};
use crate::event::{short_name, Event};
use crate::machine::{Context, Machine};
use crate::state::State;

fn type_label<T: 'static>() -> String {
    short_name(std::any::type_name::<T>()).to_string()
}

/// Pending state declaration; commit with [`StateDef::add`].
pub struct StateDef<'m, St: 'static, C: State<St> + Default> {
    machine: &'m mut Machine<St>,
    /// Fixed parent (declarative hooks); wins over `parent_kind`.
    parent_id: Option<StateId>,
    parent_kind: Option<TypeId>,
    parent_label: Option<String>,
    region: usize,
    entry: bool,
    name: Option<String>,
    _marker: PhantomData<C>,
}

impl<'m, St: 'static, C: State<St> + Default> StateDef<'m, St, C> {
    pub(crate) fn new(machine: &'m mut Machine<St>, parent_id: Option<StateId>) -> Self {
        Self {
            machine,
            parent_id,
            parent_kind: None,
            parent_label: None,
            region: 0,
            entry: false,
            name: None,
            _marker: PhantomData,
        }
    }

    /// Parent state kind; the root when never called.
    pub fn parent<P: State<St>>(mut self) -> Self {
        self.parent_kind = Some(TypeId::of::<P>());
        self.parent_label = Some(type_label::<P>());
        self
    }

    /// Orthogonal region index within the parent. Defaults to 0.
    pub fn region(mut self, index: usize) -> Self {
        self.region = index;
        self
    }

    /// Make this the region's entry child.
    pub fn entry(mut self) -> Self {
        self.entry = true;
        self
    }

    /// Display name; the type name when never called.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Validate and attach the state.
    pub fn add(self) -> Result<StateId, TopologyError> {
        let machine = self.machine;
        if machine.core.topo.root_started() {
            return Err(machine.core.reject(TopologyError::WrongLifecyclePhase));
        }

        let parent = match (self.parent_id, self.parent_kind) {
            (Some(id), _) => id,
            (None, Some(kind)) => machine.core.topo.lookup(kind).ok_or_else(|| {
                machine.core.reject(TopologyError::MissingState(
                    self.parent_label.unwrap_or_default(),
                ))
            })?,
            (None, None) => machine.core.topo.root(),
        };

        let name = self.name.unwrap_or_else(type_label::<C>);
        let id = machine
            .core
            .topo
            .attach(TypeId::of::<C>(), name, parent, self.region, self.entry)
            .map_err(|err| machine.core.reject(err))?;
        machine.core.handlers.push(Some(Box::new(C::default())));
        machine.tables.push(TransitionTable::new());
        Ok(id)
    }
}

/// Pending transition declaration; commit with [`TransitionDef::add`].
///
/// `H` is the action holder: the state the guard and action run on, the
/// source itself unless [`TransitionDef::via`] names an ancestor. Set the
/// holder before attaching closures.
pub struct TransitionDef<'m, St: 'static, Src, Evt, Dst, H> {
    machine: &'m mut Machine<St>,
    guard: Option<GuardFn<St>>,
    action: Option<ActionFn<St>>,
    _marker: PhantomData<(Src, Evt, Dst, H)>,
}

impl<'m, St: 'static, Src, Evt, Dst, H> TransitionDef<'m, St, Src, Evt, Dst, H>
where
    Src: State<St>,
    Evt: Event,
    Dst: State<St>,
    H: State<St>,
{
    pub(crate) fn new(machine: &'m mut Machine<St>) -> Self {
        Self {
            machine,
            guard: None,
            action: None,
            _marker: PhantomData,
        }
    }

    /// Run guard and action on ancestor state `H2` instead of the source.
    pub fn via<H2: State<St>>(self) -> TransitionDef<'m, St, Src, Evt, Dst, H2> {
        debug_assert!(
            self.guard.is_none() && self.action.is_none(),
            "set the action holder before guard/action closures"
        );
        TransitionDef {
            machine: self.machine,
            guard: None,
            action: None,
            _marker: PhantomData,
        }
    }

    /// Predicate deciding whether the transition may run. A `false` veto
    /// leaves the configuration untouched and lets deeper states try.
    pub fn guard<F>(mut self, guard: F) -> Self
    where
        F: Fn(&mut H, &mut Context<'_, St>, &Evt) -> Result<bool, Fault> + 'static,
    {
        self.guard = Some(Box::new(move |holder, ctx, evt| {
            let (Some(holder), Some(evt)) =
                (holder.downcast_mut::<H>(), evt.as_any().downcast_ref::<Evt>())
            else {
                return Err(Fault::msg("guard invoked with mismatched types"));
            };
            guard(holder, ctx, evt)
        }));
        self
    }

    /// Callback invoked on the holder before the transit happens.
    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&mut H, &mut Context<'_, St>, &Evt) -> Outcome + 'static,
    {
        self.action = Some(Box::new(move |holder, ctx, evt| {
            let (Some(holder), Some(evt)) =
                (holder.downcast_mut::<H>(), evt.as_any().downcast_ref::<Evt>())
            else {
                return Err(Fault::msg("action invoked with mismatched types"));
            };
            action(holder, ctx, evt)
        }));
        self
    }

    /// Validate and store the transition on its source state.
    pub fn add(self) -> Result<(), TopologyError> {
        let machine = self.machine;
        if machine.core.topo.root_started() {
            return Err(machine.core.reject(TopologyError::WrongLifecyclePhase));
        }

        let topo = &machine.core.topo;
        let src = topo
            .lookup(TypeId::of::<Src>())
            .ok_or_else(|| machine.core.reject(TopologyError::MissingState(type_label::<Src>())))?;
        let dst = topo
            .lookup(TypeId::of::<Dst>())
            .ok_or_else(|| machine.core.reject(TopologyError::MissingState(type_label::<Dst>())))?;
        let holder = topo
            .lookup(TypeId::of::<H>())
            .ok_or_else(|| machine.core.reject(TopologyError::MissingState(type_label::<H>())))?;

        if !topo.contains(holder, src) {
            return Err(machine.core.reject(TopologyError::InvalidActionHolder {
                holder: topo.name_of(holder).to_string(),
                src: topo.name_of(src).to_string(),
            }));
        }

        let event_kind = TypeId::of::<Evt>();
        if machine.tables[src.index()].contains_key(&event_kind) {
            return Err(machine.core.reject(TopologyError::DuplicateTransition {
                state: topo.name_of(src).to_string(),
                event: type_label::<Evt>(),
            }));
        }

        // Same source and destination is an internal transition: the
        // action runs in place and no boundary data is needed.
        let data = if src != dst {
            let td = resolve(topo, src, dst).ok_or_else(|| {
                machine.core.reject(TopologyError::CrossingRegions {
                    src: topo.name_of(src).to_string(),
                    dst: topo.name_of(dst).to_string(),
                })
            })?;
            Some(td)
        } else {
            None
        };

        machine.tables[src.index()].insert(
            event_kind,
            Transition {
                dst,
                holder,
                data,
                guard: self.guard,
                action: self.action,
            },
        );
        Ok(())
    }
}

/// Construction surface handed to the declarative hooks during
/// `Machine::setup`. State declarations default to children of the hook's
/// own state.
pub struct Decls<'m, St: 'static> {
    machine: &'m mut Machine<St>,
    at: StateId,
}

impl<'m, St: 'static> Decls<'m, St> {
    pub(crate) fn new(machine: &'m mut Machine<St>, at: StateId) -> Self {
        Self { machine, at }
    }

    /// Declare a child of this state; finish with `.add()`.
    pub fn state<C: State<St> + Default>(&mut self) -> StateDef<'_, St, C> {
        StateDef::new(self.machine, Some(self.at))
    }

    /// Declare a transition anywhere in the machine; finish with `.add()`.
    pub fn transition<Src: State<St>, Evt: Event, Dst: State<St>>(
        &mut self,
    ) -> TransitionDef<'_, St, Src, Evt, Dst, Src> {
        TransitionDef::new(self.machine)
    }

    /// Declare an internal transition; finish with `.add()`.
    pub fn internal<Src: State<St>, Evt: Event>(
        &mut self,
    ) -> TransitionDef<'_, St, Src, Evt, Src, Src> {
        TransitionDef::new(self.machine)
    }
}

//! Type-erased transition records.
//!
//! A transition lives on its source state, keyed by the event's `TypeId`.
//! Guard and action are stored as erased closures that downcast the
//! action-holder state and the event back to their concrete types; the
//! typed wrapping happens in the builder, so the engine core never deals
//! with concrete state or event types.

use std::any::{Any, TypeId};
use std::collections::HashMap;

use crate::core::resolver::TransitionData;
use crate::core::topology::StateId;
use crate::error::{Fault, Outcome};
use crate::event::Event;
use crate::machine::Context;

/// Erased guard: may veto the transition, may fail.
pub(crate) type GuardFn<St> =
    Box<dyn Fn(&mut dyn Any, &mut Context<'_, St>, &dyn Event) -> Result<bool, Fault>>;

/// Erased action: runs on the action holder before the transit.
pub(crate) type ActionFn<St> =
    Box<dyn Fn(&mut dyn Any, &mut Context<'_, St>, &dyn Event) -> Outcome>;

/// One arc of the transition table. Immutable once added.
pub(crate) struct Transition<St: 'static> {
    pub(crate) dst: StateId,
    /// State the guard and action are invoked on: the source itself or one
    /// of its ancestors.
    pub(crate) holder: StateId,
    /// Exit/entry boundaries, precomputed at build time. `None` marks an
    /// internal transition: the action runs, nothing is exited or entered.
    pub(crate) data: Option<TransitionData>,
    pub(crate) guard: Option<GuardFn<St>>,
    pub(crate) action: Option<ActionFn<St>>,
}

/// Per-state transition map, event kind to arc.
pub(crate) type TransitionTable<St> = HashMap<TypeId, Transition<St>>;

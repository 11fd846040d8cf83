//! The `State` trait implemented by user state types.
//!
//! A state type is a plain struct (it may carry its own data) registered
//! with the machine once; the machine owns the instance and hands out
//! `&mut` access during callbacks and through typed lookup. The `St` type
//! parameter is the machine's shared store, `()` when unused.

use crate::builder::Decls;
use crate::core::History;
use crate::error::{Fault, Outcome, TopologyError};
use crate::event::AsAny;
use crate::log::LogLevel;
use crate::machine::Context;

/// Behavior of one state kind.
///
/// All methods have defaults; a unit struct with an empty impl is a valid
/// state. Entry and exit run inside an error boundary: a returned `Err`
/// is routed to [`State::on_error`] and the lifecycle continues as if the
/// callback had succeeded.
pub trait State<St: 'static = ()>: AsAny {
    /// Called when the state is entered, before its regions start.
    fn on_entry(&mut self, ctx: &mut Context<'_, St>) -> Outcome {
        ctx.log(
            LogLevel::Debug,
            format!(
                "entering state '{}' through event {}",
                ctx.state_name(),
                ctx.trig_name()
            ),
        );
        Ok(())
    }

    /// Called when the state is exited, after its regions stopped.
    fn on_exit(&mut self, ctx: &mut Context<'_, St>) -> Outcome {
        ctx.log(
            LogLevel::Debug,
            format!(
                "leaving state '{}' through event {}",
                ctx.state_name(),
                ctx.trig_name()
            ),
        );
        Ok(())
    }

    /// Called with any failure raised by this state's entry, exit, guard
    /// or action. Failures raised in here are swallowed.
    fn on_error(&mut self, ctx: &mut Context<'_, St>, fault: &Fault) {
        ctx.log(LogLevel::Error, fault);
    }

    /// Declarative children, consumed once by `Machine::setup`.
    fn initial_states(&self, decls: &mut Decls<'_, St>) -> Result<(), TopologyError> {
        let _ = decls;
        Ok(())
    }

    /// Declarative transitions, consumed once by `Machine::setup` after
    /// every state's `initial_states` ran.
    fn initial_transitions(&self, decls: &mut Decls<'_, St>) -> Result<(), TopologyError> {
        let _ = decls;
        Ok(())
    }

    /// Declarative history mode for the given region, consumed once by
    /// `Machine::setup`. `None` leaves the region unchanged.
    fn initial_history(&self, region_index: usize) -> Option<History> {
        let _ = region_index;
        None
    }
}

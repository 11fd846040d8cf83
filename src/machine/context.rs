//! Execution context handed to every callback.
//!
//! While a callback runs, the machine is mid-processing: anything the
//! callback wants the machine to do is queued and drained after the
//! current step completes, which is what keeps run-to-completion intact.
//! The context is also the callback's window into the store, the trigger
//! event and the active configuration.

use std::any::{Any, TypeId};
use std::fmt;

use crate::core::topology::{StateId, Topology};
use crate::event::{short_name, Event};
use crate::log::{LogLevel, LogSink, LOG_MODULE};
use crate::machine::PendingWork;
use crate::visit::StateSet;

pub struct Context<'a, St> {
    pub(crate) topo: &'a Topology,
    pub(crate) store: &'a mut St,
    pub(crate) posted: &'a mut std::collections::VecDeque<PendingWork>,
    pub(crate) logger: &'a dyn LogSink,
    /// State whose callback is running.
    pub(crate) current: StateId,
    pub(crate) trig: Option<&'a dyn Event>,
}

impl<'a, St> Context<'a, St> {
    /// The triggering event, if it is an `E`.
    ///
    /// `None` for anonymous lifecycle steps (start, stop, plain transits)
    /// and whenever the trigger is of a different kind.
    pub fn trig_event<E: Event>(&self) -> Option<&E> {
        self.trig.and_then(|evt| evt.as_any().downcast_ref::<E>())
    }

    /// Display name of the triggering event, `"anonymous"` if none.
    pub fn trig_name(&self) -> &str {
        match self.trig {
            Some(evt) => short_name(evt.kind_name()),
            None => "anonymous",
        }
    }

    /// Name of the state whose callback is running.
    pub fn state_name(&self) -> &str {
        self.topo.name_of(self.current)
    }

    /// Queue an event to be dispatched after the current step completes.
    /// Dropped silently if nothing matches it then.
    pub fn post_event(&mut self, evt: impl Event) {
        self.posted.push_back(PendingWork::Event {
            evt: Box::new(evt),
            deferred: false,
        });
    }

    /// Queue an event to be replayed on every drain pass until some
    /// transition consumes it.
    pub fn defer_event(&mut self, evt: impl Event) {
        self.posted.push_back(PendingWork::Event {
            evt: Box::new(evt),
            deferred: true,
        });
    }

    /// Queue an anonymous transit to `D`, resolved from this state when it
    /// executes.
    pub fn transit<D: Any>(&mut self) {
        self.posted.push_back(PendingWork::Transit {
            src: self.current,
            dst: TypeId::of::<D>(),
            evt: None,
        });
    }

    /// Queue a transit to `D` carrying `evt` as the triggering event.
    pub fn transit_with<D: Any>(&mut self, evt: impl Event) {
        self.posted.push_back(PendingWork::Transit {
            src: self.current,
            dst: TypeId::of::<D>(),
            evt: Some(Box::new(evt)),
        });
    }

    /// Shared user store.
    pub fn store(&self) -> &St {
        self.store
    }

    pub fn store_mut(&mut self) -> &mut St {
        self.store
    }

    /// Active-configuration check, usable mid-callback; see
    /// `Machine::check_states`.
    pub fn check_states<Q: StateSet>(&self) -> bool {
        self.topo.check_chain(&Q::kinds())
    }

    /// Write to the machine's log sink.
    pub fn log(&self, level: LogLevel, message: impl fmt::Display) {
        self.logger
            .write_log(LOG_MODULE, level, &message.to_string());
    }
}

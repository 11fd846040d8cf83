//! Statecraft: a hierarchical state machine engine
//!
//! Statecraft implements UML statechart semantics as a plain library:
//! composite states, orthogonal regions, shallow and deep history, guarded
//! transitions with actions, internal transitions, posted and deferred
//! events, and strict single-threaded run-to-completion processing.
//!
//! # Core Concepts
//!
//! - **State**: a plain type implementing the [`State`] trait; the machine
//!   owns one instance per kind, arranged in a tree of regions
//! - **Event**: a cloneable type implementing [`Event`], dispatched
//!   top-down through the active configuration
//! - **History**: per-region shallow or deep restoration of the last
//!   visited child
//! - **Run-to-completion**: work queued by callbacks is drained before any
//!   processing call returns
//!
//! # Example
//!
//! ```rust
//! use statecraft::{events, Machine, State};
//!
//! #[derive(Default)]
//! struct Player;
//! impl State for Player {}
//!
//! #[derive(Default)]
//! struct Stopped;
//! impl State for Stopped {}
//!
//! #[derive(Default)]
//! struct Playing;
//! impl State for Playing {}
//!
//! events! {
//!     struct Play;
//!     struct Stop;
//! }
//!
//! let mut machine = Machine::<()>::new::<Player>();
//! machine.state::<Stopped>().entry().add().unwrap();
//! machine.state::<Playing>().add().unwrap();
//! machine.transition::<Stopped, Play, Playing>().add().unwrap();
//! machine.transition::<Playing, Stop, Stopped>().add().unwrap();
//!
//! machine.start();
//! assert!(machine.check_states::<(Stopped,)>());
//!
//! machine.process_event(Play);
//! assert!(machine.check_states::<(Playing,)>());
//! ```
//!
//! Dispatch is strictly single-threaded: the machine is `!Sync` by
//! construction and must be driven from one logical thread.

pub mod builder;
pub mod core;
mod error;
mod event;
mod log;
mod machine;
mod state;
mod visit;

pub use crate::builder::{Decls, StateDef, TransitionDef};
pub use crate::core::{History, StateId};
pub use crate::error::{Fault, Outcome, TopologyError};
pub use crate::event::{AsAny, Event};
pub use crate::log::{LogLevel, LogSink, NullSink, StdLogger, LOG_MODULE};
pub use crate::machine::{Context, Machine};
pub use crate::state::State;
pub use crate::visit::{StateRef, StateSet, StateVisitor};

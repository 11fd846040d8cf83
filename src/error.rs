//! Build-time rejections and runtime callback failures.
//!
//! Topology mutations return [`TopologyError`] and leave the machine
//! untouched on failure. Failures raised by user callbacks travel as
//! [`Fault`] values and are delivered to the owning state's `on_error`;
//! they never cross the engine boundary.

use std::fmt;

use thiserror::Error;

/// Reasons a topology mutation is rejected.
///
/// Every variant aborts the triggering operation as a no-op: the machine is
/// never left half mutated.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("state '{name}' already exists under '{parent}'")]
    DuplicateState { name: String, parent: String },

    #[error("state '{0}' not found")]
    MissingState(String),

    #[error("transition for event '{event}' already defined on state '{state}'")]
    DuplicateTransition { state: String, event: String },

    #[error("state '{holder}' is neither source state '{src}' nor one of its ancestors")]
    InvalidActionHolder { holder: String, src: String },

    #[error("no transition path from '{src}' to '{dst}': crossing regions or nested states")]
    CrossingRegions { src: String, dst: String },

    #[error("region {region} of state '{state}' already has entry state '{entry}'")]
    MultipleEntries {
        state: String,
        region: usize,
        entry: String,
    },

    #[error("{requested} history on region {region} of '{state}' conflicts with deep history on {kin} region {other_region} of '{other}'")]
    HistoryConflict {
        state: String,
        region: usize,
        requested: &'static str,
        kin: &'static str,
        other: String,
        other_region: usize,
    },

    #[error("region {region} of state '{state}' not found")]
    MissingRegion { state: String, region: usize },

    #[error("machine is started; the topology is frozen")]
    WrongLifecyclePhase,
}

/// A failure raised by a user callback (entry, exit, guard or action).
///
/// Caught at the call site and surfaced through `on_error` on the relevant
/// state; the lifecycle proceeds as if the callback had returned normally.
#[derive(Debug)]
pub struct Fault(Box<dyn std::error::Error + Send + Sync + 'static>);

impl Fault {
    /// Wrap an existing error value.
    pub fn new(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self(Box::new(err))
    }

    /// Build a fault from a plain message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(message.to_string().into())
    }

    /// Borrow the underlying error.
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.0.as_ref()
    }

    /// Downcast to the concrete error type, if it matches.
    pub fn downcast_ref<E: std::error::Error + 'static>(&self) -> Option<&E> {
        self.0.downcast_ref::<E>()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Self(message.into())
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Self(message.to_string().into())
    }
}

/// Result type returned by entry/exit callbacks and transition actions.
pub type Outcome = Result<(), Fault>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topology_errors_render_context() {
        let err = TopologyError::DuplicateState {
            name: "Idle".into(),
            parent: "Machine".into(),
        };
        assert_eq!(err.to_string(), "state 'Idle' already exists under 'Machine'");

        let err = TopologyError::CrossingRegions {
            src: "A".into(),
            dst: "B".into(),
        };
        assert!(err.to_string().contains("crossing regions"));
    }

    #[test]
    fn fault_from_message() {
        let fault = Fault::msg("broken pump");
        assert_eq!(fault.to_string(), "broken pump");
    }

    #[test]
    fn fault_downcasts_to_source_type() {
        #[derive(Debug, Error, Clone, PartialEq)]
        #[error("sensor {0} offline")]
        struct Sensor(u8);

        let fault = Fault::new(Sensor(3));
        assert_eq!(fault.downcast_ref::<Sensor>(), Some(&Sensor(3)));
        assert!(fault.downcast_ref::<std::io::Error>().is_none());
    }

    #[test]
    fn outcome_composes_with_question_mark() {
        fn inner() -> Outcome {
            Err("nope")?
        }
        assert!(inner().is_err());
    }
}

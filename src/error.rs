//! Error taxonomy for scenario setup and the tick loop.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use crate::config::ConfigError;
use crate::network::NodeId;

/// Route planning failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanningError {
    /// A* exhausted its frontier without reaching the goal.
    NoPathFound { from: NodeId, to: NodeId },
    /// Stochastic generation hit its step cap or a dead end.
    RouteGenerationFailed {
        from: NodeId,
        to: NodeId,
        steps: usize,
    },
}

impl fmt::Display for PlanningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPathFound { from, to } => write!(f, "no path from {from} to {to}"),
            Self::RouteGenerationFailed { from, to, steps } => write!(
                f,
                "route generation from {from} to {to} failed after {steps} steps"
            ),
        }
    }
}

impl Error for PlanningError {}

/// Top-level simulation error.
#[derive(Debug)]
pub enum SimError {
    /// Invalid topology, counts or timing. Fatal at startup.
    Configuration(Vec<ConfigError>),
    /// A vehicle could not be routed during scenario setup.
    Planning(PlanningError),
    /// A broken invariant inside the tick loop. Never recovered.
    InternalConsistency(String),
    /// The co-simulation coordinator did not grant the time advance for
    /// `tick` within `waited`. Retrying resumes the same tick.
    StalledSynchronization { tick: usize, waited: Duration },
    /// The coordinator halted the run or went away while `tick` awaited a grant.
    SyncCancelled { tick: usize },
}

impl SimError {
    /// Whether calling `step`/`run` again may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StalledSynchronization { .. })
    }

    pub(crate) fn consistency(message: impl Into<String>) -> Self {
        Self::InternalConsistency(message.into())
    }
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration(errors) => {
                write!(f, "invalid configuration")?;
                for e in errors {
                    write!(f, "\n  {e}")?;
                }
                Ok(())
            }
            Self::Planning(e) => write!(f, "planning failure: {e}"),
            Self::InternalConsistency(msg) => write!(f, "internal consistency error: {msg}"),
            Self::StalledSynchronization { tick, waited } => write!(
                f,
                "time synchronization stalled at tick {tick} after {} ms",
                waited.as_millis()
            ),
            Self::SyncCancelled { tick } => {
                write!(f, "time synchronization cancelled at tick {tick}")
            }
        }
    }
}

impl Error for SimError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Planning(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PlanningError> for SimError {
    fn from(e: PlanningError) -> Self {
        Self::Planning(e)
    }
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        Self::Configuration(vec![e])
    }
}

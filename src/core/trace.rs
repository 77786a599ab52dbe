//! Execution trace for store activity.
//!
//! The trace is a chronological record of everything a store did:
//! dispatches, re-entrant dispatches, state merges, and effect calls.
//! Retention is chosen when the store is built, so long-running hosts
//! can cap the trace or switch it off entirely.

use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::VecDeque;

/// The four kinds of recorded execution.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionKind {
    /// A re-entrant dispatch that ran to completion.
    Action,
    /// An effect invocation.
    Effect,
    /// A state merge.
    State,
    /// A top-level dispatch entering the store.
    Dispatch,
}

/// Where an execution originated: the store itself, a case, or an effect.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Source {
    /// Name of the originator (`"store"`, a case's action name, or an
    /// effect name).
    pub name: String,
    /// What kind of originator it was.
    pub kind: ExecutionKind,
}

impl Source {
    pub(crate) fn store() -> Self {
        Self {
            name: "store".to_string(),
            kind: ExecutionKind::Dispatch,
        }
    }

    pub(crate) fn case(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ExecutionKind::Action,
        }
    }

    pub(crate) fn effect(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ExecutionKind::Effect,
        }
    }
}

/// One recorded execution.
///
/// State snapshots in [`Execution::State`] are full copies of the state
/// immediately before and after the merge, in call order.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(bound = "", tag = "kind", rename_all = "lowercase")]
pub enum Execution<S: State> {
    /// A top-level dispatch entered the store. Recorded before case
    /// resolution, so it is present even when no case was registered.
    Dispatch {
        name: String,
        payload: Value,
        source: Source,
        at: DateTime<Utc>,
    },
    /// A re-entrant dispatch (from a case or an effect) completed.
    Action {
        name: String,
        payload: Value,
        source: Source,
        at: DateTime<Utc>,
    },
    /// A `set_state` call merged a patch.
    State {
        name: String,
        previous: S,
        next: S,
        at: DateTime<Utc>,
    },
    /// An effect was invoked.
    Effect {
        name: String,
        payload: Value,
        at: DateTime<Utc>,
    },
}

impl<S: State> Execution<S> {
    /// The kind of this execution.
    pub fn kind(&self) -> ExecutionKind {
        match self {
            Self::Dispatch { .. } => ExecutionKind::Dispatch,
            Self::Action { .. } => ExecutionKind::Action,
            Self::State { .. } => ExecutionKind::State,
            Self::Effect { .. } => ExecutionKind::Effect,
        }
    }

    /// The name the execution was recorded under (an action name for
    /// dispatches and merges, an effect name for effect calls).
    pub fn name(&self) -> &str {
        match self {
            Self::Dispatch { name, .. }
            | Self::Action { name, .. }
            | Self::State { name, .. }
            | Self::Effect { name, .. } => name,
        }
    }
}

/// How much of the trace a store keeps.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Retention {
    /// Keep every execution for the store's lifetime.
    Unbounded,
    /// Keep at most this many executions, dropping the oldest first.
    Capped(usize),
    /// Record nothing.
    Disabled,
}

/// Append-only ordered log of executions.
///
/// # Example
///
/// ```rust
/// use patchbay::core::{Execution, Retention, TraceLog};
/// use chrono::Utc;
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// struct Flag(bool);
///
/// impl patchbay::core::State for Flag {
///     type Patch = Option<bool>;
///     fn apply(&mut self, patch: Self::Patch) {
///         if let Some(value) = patch {
///             self.0 = value;
///         }
///     }
/// }
///
/// let mut log: TraceLog<Flag> = TraceLog::new(Retention::Capped(1));
/// log.record(Execution::Effect { name: "first".into(), payload: json!(null), at: Utc::now() });
/// log.record(Execution::Effect { name: "second".into(), payload: json!(null), at: Utc::now() });
///
/// let executions = log.executions();
/// assert_eq!(executions.len(), 1);
/// assert_eq!(executions[0].name(), "second");
/// ```
#[derive(Clone, Debug)]
pub struct TraceLog<S: State> {
    executions: VecDeque<Execution<S>>,
    retention: Retention,
}

impl<S: State> TraceLog<S> {
    /// Create an empty log with the given retention.
    pub fn new(retention: Retention) -> Self {
        Self {
            executions: VecDeque::new(),
            retention,
        }
    }

    /// The retention this log was created with.
    pub fn retention(&self) -> Retention {
        self.retention
    }

    /// Whether this log records anything at all.
    pub fn is_enabled(&self) -> bool {
        !matches!(self.retention, Retention::Disabled)
    }

    /// Append an execution, evicting the oldest entries past the cap.
    pub fn record(&mut self, execution: Execution<S>) {
        match self.retention {
            Retention::Disabled => {}
            Retention::Unbounded => self.executions.push_back(execution),
            Retention::Capped(cap) => {
                self.executions.push_back(execution);
                while self.executions.len() > cap {
                    self.executions.pop_front();
                }
            }
        }
    }

    /// All recorded executions, oldest first.
    pub fn executions(&self) -> Vec<Execution<S>> {
        self.executions.iter().cloned().collect()
    }

    /// Number of recorded executions.
    pub fn len(&self) -> usize {
        self.executions.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.executions.is_empty()
    }
}

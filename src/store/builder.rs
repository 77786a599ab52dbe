//! Per-invocation view handed to case handlers.

use super::{dispatch_from, Shared, StoreError};
use crate::core::{Action, Source, State};
use std::rc::Rc;

/// The context a case handler receives.
///
/// `state()` is a snapshot taken when the handler was invoked; it does
/// not move as merges land. `set_state` and `dispatch` both return the
/// builder so a handler can chain them fluently.
pub struct Builder<S: State, P> {
    shared: Rc<Shared<S>>,
    action: String,
    state: S,
    payload: P,
}

impl<S: State, P> Builder<S, P> {
    pub(crate) fn new(shared: Rc<Shared<S>>, action: String, payload: P) -> Self {
        let state = shared.snapshot();
        Self {
            shared,
            action,
            state,
            payload,
        }
    }

    /// Snapshot of the state at handler invocation time.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// The decoded payload of the dispatched action.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Shallow-merge a patch into the store, recording the transition.
    pub fn set_state(&mut self, patch: S::Patch) -> &mut Self {
        self.shared.merge(&self.action, patch);
        self
    }

    /// Like [`set_state`](Builder::set_state), but the patch is derived
    /// from the store's live state and the payload.
    pub fn set_state_with<F>(&mut self, resolve: F) -> &mut Self
    where
        F: FnOnce(&S, &P) -> S::Patch,
    {
        let live = self.shared.snapshot();
        let patch = resolve(&live, &self.payload);
        self.shared.merge(&self.action, patch);
        self
    }

    /// Re-entrant dispatch, attributed to this case as its source. Runs
    /// the target case synchronously on the current call stack.
    pub fn dispatch(&mut self, action: Action) -> Result<&mut Self, StoreError> {
        dispatch_from(&self.shared, Some(Source::case(&self.action)), &action)?;
        Ok(self)
    }
}

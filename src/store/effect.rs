//! Named side-effecting callbacks.

use super::{dispatch_from, Shared, StoreError};
use crate::core::{Action, Execution, Source, State};
use chrono::Utc;
use serde::Serialize;
use std::rc::Rc;

/// A named, directly-invoked side-effecting callback.
///
/// Effects are not routed through dispatch; their creator calls them.
/// They are where impure work belongs — timers, prompts, logging — and
/// the dispatch they hand their body is attributed to the effect in the
/// trace, so re-entrant activity stays accountable.
pub struct Effect<S: State, P> {
    name: String,
    shared: Rc<Shared<S>>,
    body: Rc<dyn Fn(&mut Effector<S, P>) -> Result<(), StoreError>>,
}

impl<S: State, P> Clone for Effect<S, P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            shared: Rc::clone(&self.shared),
            body: Rc::clone(&self.body),
        }
    }
}

impl<S: State, P: Serialize> Effect<S, P> {
    pub(crate) fn new<F>(name: String, shared: Rc<Shared<S>>, body: F) -> Self
    where
        F: Fn(&mut Effector<S, P>) -> Result<(), StoreError> + 'static,
    {
        Self {
            name,
            shared,
            body: Rc::new(body),
        }
    }

    /// The effect's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record the invocation and run the body synchronously.
    ///
    /// The body's [`Effector`] carries a state snapshot taken here, at
    /// invocation time; it does not follow later merges.
    pub fn call(&self, payload: P) -> Result<(), StoreError> {
        if self.shared.trace_enabled() {
            let encoded =
                serde_json::to_value(&payload).map_err(|source| StoreError::PayloadEncode {
                    name: self.name.clone(),
                    source,
                })?;

            self.shared.record(Execution::Effect {
                name: self.name.clone(),
                payload: encoded,
                at: Utc::now(),
            });
        }

        let mut effector = Effector::new(Rc::clone(&self.shared), self.name.clone(), payload);
        (self.body)(&mut effector)
    }
}

/// The context an effect body receives.
pub struct Effector<S: State, P> {
    shared: Rc<Shared<S>>,
    effect: String,
    state: S,
    payload: P,
}

impl<S: State, P> Effector<S, P> {
    pub(crate) fn new(shared: Rc<Shared<S>>, effect: String, payload: P) -> Self {
        let state = shared.snapshot();
        Self {
            shared,
            effect,
            state,
            payload,
        }
    }

    /// Snapshot of the state at effect invocation time.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// The payload the effect was called with.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Re-entrant dispatch, attributed to this effect as its source.
    pub fn dispatch(&self, action: Action) -> Result<(), StoreError> {
        dispatch_from(&self.shared, Some(Source::effect(&self.effect)), &action)
    }
}

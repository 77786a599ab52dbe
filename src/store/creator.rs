//! Typed action creators.

use super::{Shared, StoreError};
use crate::core::{Action, State};
use serde::Serialize;
use std::marker::PhantomData;
use std::rc::Rc;

/// A pure factory for actions of one name and payload type.
///
/// Creators are handed out by [`Store::action`](crate::store::Store::action)
/// and hold a handle to the store they came from, which lets
/// [`from_state`](ActionCreator::from_state) resolve a payload against
/// the state at call time. Building an action never dispatches it.
pub struct ActionCreator<S: State, P> {
    name: String,
    shared: Rc<Shared<S>>,
    _payload: PhantomData<fn(P)>,
}

impl<S: State, P> Clone for ActionCreator<S, P> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            shared: Rc::clone(&self.shared),
            _payload: PhantomData,
        }
    }
}

impl<S: State, P> ActionCreator<S, P> {
    pub(crate) fn new(name: String, shared: Rc<Shared<S>>) -> Self {
        Self {
            name,
            shared,
            _payload: PhantomData,
        }
    }

    /// The action name this creator is bound to, usable as a map key.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S: State, P: Serialize> ActionCreator<S, P> {
    /// Build an action carrying `payload`.
    pub fn of(&self, payload: P) -> Result<Action, StoreError> {
        let payload =
            serde_json::to_value(payload).map_err(|source| StoreError::PayloadEncode {
                name: self.name.clone(),
                source,
            })?;

        Ok(Action::new(self.name.clone(), payload))
    }

    /// Build an action whose payload is derived from the store's state
    /// as it is right now.
    pub fn from_state<F>(&self, resolve: F) -> Result<Action, StoreError>
    where
        F: FnOnce(&S) -> P,
    {
        let snapshot = self.shared.snapshot();
        self.of(resolve(&snapshot))
    }
}

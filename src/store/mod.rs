//! The store: dispatch engine, case registry, and combination.
//!
//! A [`Store`] owns a state value, a map from action names to case
//! handlers, and an execution trace. All mutation flows through
//! dispatch: an [`Action`](crate::core::Action) is routed to the case
//! registered under its name, and the case merges patches through the
//! [`Builder`] it receives.
//!
//! The store is a cheap cloneable handle over a single shared cell.
//! Action creators and effects hold handle clones of their own, so a
//! host event loop can keep dispatching long after setup. Everything is
//! single-threaded and synchronous; re-entrant dispatch runs recursively
//! on the same call stack, and every internal borrow is released before
//! handler code runs.

mod builder;
mod creator;
mod effect;
mod error;

pub use builder::Builder;
pub use creator::ActionCreator;
pub use effect::{Effect, Effector};
pub use error::StoreError;

use crate::core::{Action, Execution, Retention, Source, State, TraceLog};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Type-erased case handler. The typed wrapper built at registration
/// decodes the payload before the user's handler runs. Handlers receive
/// the invoking store's cell as an argument rather than capturing one,
/// so a combined store re-drives shared handlers against its own state.
pub(crate) type CaseFn<S> = dyn Fn(&Rc<Shared<S>>, &Action) -> Result<(), StoreError>;

/// The one shared cell behind a store handle.
pub(crate) struct Shared<S: State> {
    state: RefCell<S>,
    cases: RefCell<HashMap<String, Rc<CaseFn<S>>>>,
    trace: RefCell<TraceLog<S>>,
}

impl<S: State> Shared<S> {
    /// Clone of the current state.
    pub(crate) fn snapshot(&self) -> S {
        self.state.borrow().clone()
    }

    pub(crate) fn trace_enabled(&self) -> bool {
        self.trace.borrow().is_enabled()
    }

    pub(crate) fn record(&self, execution: Execution<S>) {
        self.trace.borrow_mut().record(execution);
    }

    /// Shallow-merge a patch into the state, recording the transition
    /// under `name` when tracing is on.
    pub(crate) fn merge(&self, name: &str, patch: S::Patch) {
        if !self.trace_enabled() {
            self.state.borrow_mut().apply(patch);
            return;
        }

        let previous = self.snapshot();
        let mut state = self.state.borrow_mut();
        state.apply(patch);
        let next = state.clone();
        drop(state);

        self.record(Execution::State {
            name: name.to_string(),
            previous,
            next,
            at: Utc::now(),
        });
    }
}

/// Resolve and run the case for `action`. A `source` marks this as a
/// re-entrant dispatch; the completed call is then recorded as an
/// `action` execution attributed to that source.
///
/// The case handler is cloned out of the registry before it runs, so no
/// borrow is held while user code executes and handlers are free to
/// dispatch and register re-entrantly.
pub(crate) fn dispatch_from<S: State>(
    shared: &Rc<Shared<S>>,
    source: Option<Source>,
    action: &Action,
) -> Result<(), StoreError> {
    let case = shared
        .cases
        .borrow()
        .get(action.name())
        .cloned()
        .ok_or_else(|| StoreError::UnregisteredCase {
            action: action.name().to_string(),
        })?;

    case(shared, action)?;

    if let Some(source) = source {
        shared.record(Execution::Action {
            name: action.name().to_string(),
            payload: action.payload().clone(),
            source,
            at: Utc::now(),
        });
    }

    Ok(())
}

/// A unidirectional state container.
///
/// State changes only through dispatched actions; cases describe the
/// change as patches, effects host the impure edges, and the trace
/// records what ran.
///
/// # Example
///
/// ```rust
/// use patchbay::{state_struct, Store, StoreError};
///
/// state_struct! {
///     struct CounterState {
///         count: i64,
///     }
///     patch: CounterPatch
/// }
///
/// fn main() -> Result<(), StoreError> {
///     let store = Store::new(CounterState { count: 0 });
///     let increment = store.action::<i64>("increment");
///
///     store.case(&increment, |builder| {
///         builder.set_state_with(|state, payload| CounterPatch {
///             count: Some(state.count + payload),
///         });
///         Ok(())
///     });
///
///     store.dispatch(increment.of(3)?)?;
///     store.dispatch(increment.of(4)?)?;
///
///     assert_eq!(store.state().count, 7);
///     Ok(())
/// }
/// ```
pub struct Store<S: State> {
    shared: Rc<Shared<S>>,
}

impl<S: State> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
        }
    }
}

impl<S: State + Default> Default for Store<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: State> Store<S> {
    /// Create a store with an unbounded execution trace.
    pub fn new(initial: S) -> Self {
        Self::with_retention(initial, Retention::Unbounded)
    }

    /// Create a store with the given trace retention.
    ///
    /// [`Retention::Disabled`] skips all recording, including the state
    /// snapshots taken around merges.
    pub fn with_retention(initial: S, retention: Retention) -> Self {
        Self::from_parts(initial, HashMap::new(), retention)
    }

    fn from_parts(state: S, cases: HashMap<String, Rc<CaseFn<S>>>, retention: Retention) -> Self {
        Self {
            shared: Rc::new(Shared {
                state: RefCell::new(state),
                cases: RefCell::new(cases),
                trace: RefCell::new(TraceLog::new(retention)),
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> S {
        self.shared.snapshot()
    }

    /// Names of all registered cases, sorted.
    pub fn case_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.shared.cases.borrow().keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether a case is registered under `name`.
    pub fn has_case(&self, name: &str) -> bool {
        self.shared.cases.borrow().contains_key(name)
    }

    /// The trace retention this store was built with.
    pub fn retention(&self) -> Retention {
        self.shared.trace.borrow().retention()
    }

    /// Create an action creator bound to `name` and a payload type.
    ///
    /// Creators are pure factories: building an action never dispatches
    /// it. Dispatch is always explicit.
    pub fn action<P>(&self, name: impl Into<String>) -> ActionCreator<S, P> {
        ActionCreator::new(name.into(), Rc::clone(&self.shared))
    }

    /// Register the case for a creator's action name. Chainable.
    ///
    /// One case per name: registering again under the same name silently
    /// replaces the previous handler.
    pub fn case<P, F>(&self, creator: &ActionCreator<S, P>, handler: F) -> &Self
    where
        P: for<'de> Deserialize<'de> + 'static,
        F: Fn(&mut Builder<S, P>) -> Result<(), StoreError> + 'static,
    {
        let wrapped: Rc<CaseFn<S>> = Rc::new(move |shared, action| {
            let payload: P =
                serde_json::from_value(action.payload().clone()).map_err(|source| {
                    StoreError::PayloadDecode {
                        action: action.name().to_string(),
                        source,
                    }
                })?;

            let mut builder = Builder::new(Rc::clone(shared), action.name().to_string(), payload);
            handler(&mut builder)
        });

        self.shared
            .cases
            .borrow_mut()
            .insert(creator.name().to_string(), wrapped);
        self
    }

    /// Create a named effect: the sanctioned home for impure work.
    ///
    /// The body runs synchronously on [`Effect::call`] and receives an
    /// [`Effector`] exposing the payload, a state snapshot, and a
    /// dispatch attributed to this effect.
    pub fn effect<P, F>(&self, name: impl Into<String>, body: F) -> Effect<S, P>
    where
        P: Serialize,
        F: Fn(&mut Effector<S, P>) -> Result<(), StoreError> + 'static,
    {
        Effect::new(name.into(), Rc::clone(&self.shared), body)
    }

    /// Route an action to its case.
    ///
    /// The `dispatch` trace event is recorded before case resolution, so
    /// it is present even when resolution fails. Case handlers run
    /// synchronously; re-entrant dispatches from cases and effects
    /// recurse on the same call stack, and any error unwinds the whole
    /// chain.
    pub fn dispatch(&self, action: Action) -> Result<(), StoreError> {
        self.shared.record(Execution::Dispatch {
            name: action.name().to_string(),
            payload: action.payload().clone(),
            source: Source::store(),
            at: Utc::now(),
        });

        dispatch_from(&self.shared, None, &action)
    }

    /// Build a new store from this one and `other`, leaving both inputs
    /// untouched.
    ///
    /// The new state follows the replace-per-key merge rule, which for a
    /// single shared state type resolves to `other`'s snapshot. The case
    /// map is the union of both; `override_cases` alone decides name
    /// conflicts — `true` takes `other`'s handler, `false` keeps this
    /// store's. The new store starts with an empty trace and inherits
    /// this store's retention.
    pub fn combine(&self, other: &Store<S>, override_cases: bool) -> Store<S> {
        let mut cases: HashMap<String, Rc<CaseFn<S>>> = self.shared.cases.borrow().clone();

        for (name, case) in other.shared.cases.borrow().iter() {
            if override_cases || !cases.contains_key(name) {
                cases.insert(name.clone(), Rc::clone(case));
            }
        }

        Store::from_parts(other.state(), cases, self.retention())
    }

    /// All recorded executions, oldest first.
    pub fn executions(&self) -> Vec<Execution<S>> {
        self.shared.trace.borrow().executions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ExecutionKind;
    use crate::state_struct;
    use serde_json::json;

    state_struct! {
        struct CounterState {
            count: i64,
        }
        patch: CounterPatch
    }

    impl Default for CounterState {
        fn default() -> Self {
            Self { count: 0 }
        }
    }

    fn counter_store() -> Store<CounterState> {
        Store::new(CounterState { count: 0 })
    }

    #[test]
    fn dispatch_routes_to_registered_case() {
        let store = counter_store();
        let increment = store.action::<i64>("increment");

        store.case(&increment, |b| {
            b.set_state_with(|state, payload| CounterPatch {
                count: Some(state.count + payload),
            });
            Ok(())
        });

        store.dispatch(increment.of(3).unwrap()).unwrap();
        store.dispatch(increment.of(4).unwrap()).unwrap();

        assert_eq!(store.state().count, 7);
    }

    #[test]
    fn last_registration_wins() {
        let store = counter_store();
        let set = store.action::<i64>("set");

        store.case(&set, |b| {
            b.set_state(CounterPatch { count: Some(1) });
            Ok(())
        });
        store.case(&set, |b| {
            b.set_state(CounterPatch { count: Some(2) });
            Ok(())
        });

        store.dispatch(set.of(0).unwrap()).unwrap();

        assert_eq!(store.state().count, 2);
    }

    #[test]
    fn unregistered_action_fails_and_leaves_state_unchanged() {
        let store = counter_store();

        let result = store.dispatch(Action::new("missing", json!(null)));

        assert!(matches!(
            result,
            Err(StoreError::UnregisteredCase { ref action }) if action == "missing"
        ));
        assert_eq!(store.state().count, 0);

        // The dispatch event is recorded before resolution fails.
        let executions = store.executions();
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].kind(), ExecutionKind::Dispatch);
        assert_eq!(executions[0].name(), "missing");
    }

    #[test]
    fn mismatched_payload_fails_decode() {
        let store = counter_store();
        let rename = store.action::<String>("rename");

        store.case(&rename, |_b| Ok(()));

        let result = store.dispatch(Action::new("rename", json!(42)));

        assert!(matches!(
            result,
            Err(StoreError::PayloadDecode { ref action, .. }) if action == "rename"
        ));
    }

    #[test]
    fn registration_is_chainable() {
        let store = counter_store();
        let a = store.action::<i64>("a");
        let b = store.action::<i64>("b");

        store
            .case(&a, |builder| {
                builder.set_state(CounterPatch { count: Some(1) });
                Ok(())
            })
            .case(&b, |builder| {
                builder.set_state(CounterPatch { count: Some(2) });
                Ok(())
            });

        assert_eq!(store.case_names(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.has_case("a"));
        assert!(!store.has_case("c"));
    }

    #[test]
    fn reentrant_dispatch_runs_on_the_same_stack() {
        let store = counter_store();
        let outer = store.action::<i64>("outer");
        let inner = store.action::<i64>("inner");

        store.case(&inner, |b| {
            b.set_state_with(|state, payload| CounterPatch {
                count: Some(state.count + payload),
            });
            Ok(())
        });

        let inner_for_outer = inner.clone();
        store.case(&outer, move |b| {
            let doubled = *b.payload() * 2;
            b.dispatch(inner_for_outer.of(doubled)?)?;
            Ok(())
        });

        store.dispatch(outer.of(3).unwrap()).unwrap();

        // The nested dispatch fully unwound before the outer call returned.
        assert_eq!(store.state().count, 6);
    }

    #[test]
    fn errors_from_nested_dispatch_unwind_the_chain() {
        let store = counter_store();
        let outer = store.action::<()>("outer");

        store.case(&outer, |b| {
            b.set_state(CounterPatch { count: Some(1) });
            b.dispatch(Action::new("missing", json!(null)))?;
            Ok(())
        });

        let result = store.dispatch(outer.of(()).unwrap());

        assert!(matches!(
            result,
            Err(StoreError::UnregisteredCase { ref action }) if action == "missing"
        ));
        // Merges that ran before the failure stay applied.
        assert_eq!(store.state().count, 1);
    }

    #[test]
    fn trace_records_causal_order() {
        let store = counter_store();
        let a = store.action::<i64>("a");
        let b = store.action::<()>("b");

        store.case(&b, |_b| Ok(()));

        let b_for_a = b.clone();
        store.case(&a, move |builder| {
            builder
                .set_state(CounterPatch { count: Some(1) })
                .dispatch(b_for_a.of(())?)?;
            Ok(())
        });

        store.dispatch(a.of(9).unwrap()).unwrap();

        let kinds: Vec<ExecutionKind> = store.executions().iter().map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                ExecutionKind::Dispatch,
                ExecutionKind::State,
                ExecutionKind::Action,
            ]
        );

        let executions = store.executions();
        assert_eq!(executions[0].name(), "a");
        assert_eq!(executions[1].name(), "a");
        assert_eq!(executions[2].name(), "b");
        match &executions[2] {
            Execution::Action { source, .. } => {
                assert_eq!(source.name, "a");
                assert_eq!(source.kind, ExecutionKind::Action);
            }
            other => panic!("expected action execution, got {other:?}"),
        }
    }

    #[test]
    fn disabled_retention_records_nothing() {
        let store = Store::with_retention(CounterState { count: 0 }, Retention::Disabled);
        let bump = store.action::<i64>("bump");

        store.case(&bump, |b| {
            b.set_state(CounterPatch { count: Some(1) });
            Ok(())
        });

        store.dispatch(bump.of(1).unwrap()).unwrap();

        assert!(store.executions().is_empty());
        assert_eq!(store.state().count, 1);
    }

    #[test]
    fn capped_retention_keeps_most_recent() {
        let store = Store::with_retention(CounterState { count: 0 }, Retention::Capped(2));
        let bump = store.action::<i64>("bump");

        store.case(&bump, |b| {
            b.set_state_with(|state, payload| CounterPatch {
                count: Some(state.count + payload),
            });
            Ok(())
        });

        store.dispatch(bump.of(1).unwrap()).unwrap();
        store.dispatch(bump.of(1).unwrap()).unwrap();

        let executions = store.executions();
        assert_eq!(executions.len(), 2);
        // The oldest events were evicted; the tail of the second dispatch remains.
        assert_eq!(executions[0].kind(), ExecutionKind::Dispatch);
        assert_eq!(executions[1].kind(), ExecutionKind::State);
    }

    #[test]
    fn combine_with_override_takes_other_cases_and_state() {
        let s1 = Store::new(CounterState { count: 1 });
        let s2 = Store::new(CounterState { count: 2 });

        let a1 = s1.action::<()>("a");
        s1.case(&a1, |b| {
            b.set_state(CounterPatch { count: Some(10) });
            Ok(())
        });

        let a2 = s2.action::<()>("a");
        let b2 = s2.action::<()>("b");
        s2.case(&a2, |b| {
            b.set_state(CounterPatch { count: Some(20) });
            Ok(())
        });
        s2.case(&b2, |b| {
            b.set_state(CounterPatch { count: Some(30) });
            Ok(())
        });

        let combined = s1.combine(&s2, true);

        assert_eq!(combined.state().count, 2);
        assert_eq!(
            combined.case_names(),
            vec!["a".to_string(), "b".to_string()]
        );

        combined.dispatch(Action::new("a", json!(null))).unwrap();
        assert_eq!(combined.state().count, 20);
    }

    #[test]
    fn combine_without_override_keeps_own_cases() {
        let s1 = Store::new(CounterState { count: 1 });
        let s2 = Store::new(CounterState { count: 2 });

        let a1 = s1.action::<()>("a");
        s1.case(&a1, |b| {
            b.set_state(CounterPatch { count: Some(10) });
            Ok(())
        });

        let a2 = s2.action::<()>("a");
        s2.case(&a2, |b| {
            b.set_state(CounterPatch { count: Some(20) });
            Ok(())
        });

        let combined = s1.combine(&s2, false);

        combined.dispatch(Action::new("a", json!(null))).unwrap();
        assert_eq!(combined.state().count, 10);
    }

    #[test]
    fn combine_leaves_inputs_untouched() {
        let s1 = Store::new(CounterState { count: 1 });
        let s2 = Store::new(CounterState { count: 2 });

        let a1 = s1.action::<()>("a");
        s1.case(&a1, |b| {
            b.set_state(CounterPatch { count: Some(10) });
            Ok(())
        });

        let combined = s1.combine(&s2, true);

        // Dispatching on the combined store mutates only the new cell.
        combined.dispatch(Action::new("a", json!(null))).unwrap();
        assert_eq!(combined.state().count, 10);
        assert_eq!(s1.state().count, 1);
        assert_eq!(s2.state().count, 2);
        assert!(s2.case_names().is_empty());
    }

    #[test]
    fn combine_inherits_retention() {
        let s1 = Store::with_retention(CounterState { count: 1 }, Retention::Capped(4));
        let s2 = Store::new(CounterState { count: 2 });

        let combined = s1.combine(&s2, true);

        assert_eq!(combined.retention(), Retention::Capped(4));
        assert!(combined.executions().is_empty());
    }

    #[test]
    fn store_handles_share_one_cell() {
        let store = counter_store();
        let bump = store.action::<i64>("bump");

        store.case(&bump, |b| {
            b.set_state(CounterPatch { count: Some(5) });
            Ok(())
        });

        let handle = store.clone();
        handle.dispatch(bump.of(0).unwrap()).unwrap();

        assert_eq!(store.state().count, 5);
    }

    #[test]
    fn default_store_uses_default_state() {
        let store = Store::<CounterState>::default();
        assert_eq!(store.state().count, 0);
    }
}

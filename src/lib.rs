//! Patchbay: a small unidirectional state container
//!
//! A [`Store`] holds one state value and only ever changes it through
//! named actions routed to registered case handlers. Cases describe
//! changes as shallow patches; effects host the impure edges (timers,
//! prompts, output); and an execution trace records every dispatch,
//! merge, and effect call in causal order.
//!
//! # Core Concepts
//!
//! - **Action**: a named value describing an intended state change,
//!   built by a typed [`ActionCreator`](store::ActionCreator)
//! - **Case**: the one handler registered for an action name
//! - **Effect**: a named, directly-invoked side-effecting callback
//! - **Trace**: the ordered record of executions, with pluggable
//!   retention via [`Retention`](core::Retention)
//!
//! # Example
//!
//! ```rust
//! use patchbay::{state_struct, Store, StoreError};
//!
//! state_struct! {
//!     struct CounterState {
//!         count: i64,
//!     }
//!     patch: CounterPatch
//! }
//!
//! fn main() -> Result<(), StoreError> {
//!     let store = Store::new(CounterState { count: 0 });
//!
//!     let increment = store.action::<i64>("increment");
//!     let decrement = store.action::<i64>("decrement");
//!
//!     store
//!         .case(&increment, |builder| {
//!             builder.set_state_with(|state, payload| CounterPatch {
//!                 count: Some(state.count + payload),
//!             });
//!             Ok(())
//!         })
//!         .case(&decrement, |builder| {
//!             builder.set_state_with(|state, payload| CounterPatch {
//!                 count: Some(state.count - payload),
//!             });
//!             Ok(())
//!         });
//!
//!     store.dispatch(increment.of(10)?)?;
//!     store.dispatch(decrement.of(3)?)?;
//!
//!     assert_eq!(store.state().count, 7);
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod store;

// Re-export commonly used types
pub use crate::core::{Action, Execution, ExecutionKind, Retention, Source, State, TraceLog};
pub use crate::store::{ActionCreator, Builder, Effect, Effector, Store, StoreError};

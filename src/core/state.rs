//! Core State trait for store state types.
//!
//! Every value held by a [`Store`](crate::store::Store) implements this
//! trait, which defines the shape of partial updates and how they merge
//! into the full state.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for store state types.
///
/// A state is an ordinary owned value; the store never hands out live
/// references to it. Case handlers describe changes as a [`Patch`] — a
/// partial state with one optional slot per top-level field — and the
/// store merges the patch in with [`apply`].
///
/// The merge is shallow: each populated patch field wholly replaces the
/// corresponding state field. Nested structures are replaced, never
/// merged recursively.
///
/// # Required Traits
///
/// - `Clone`: states are snapshotted for handlers and the trace
/// - `PartialEq`: states must be comparable in tests and assertions
/// - `Debug`: states must be debuggable for diagnostics
/// - `Serialize` + `Deserialize`: trace snapshots are serializable
///
/// The [`state_struct!`](crate::state_struct) macro generates a struct,
/// its patch type, and this impl in one go.
///
/// # Example
///
/// ```rust
/// use patchbay::core::State;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
/// struct Counter {
///     count: i64,
///     label: String,
/// }
///
/// #[derive(Default)]
/// struct CounterPatch {
///     count: Option<i64>,
///     label: Option<String>,
/// }
///
/// impl State for Counter {
///     type Patch = CounterPatch;
///
///     fn apply(&mut self, patch: Self::Patch) {
///         if let Some(count) = patch.count {
///             self.count = count;
///         }
///         if let Some(label) = patch.label {
///             self.label = label;
///         }
///     }
/// }
///
/// let mut state = Counter { count: 1, label: "a".into() };
/// state.apply(CounterPatch { count: Some(2), ..Default::default() });
/// assert_eq!(state.count, 2);
/// assert_eq!(state.label, "a");
/// ```
///
/// [`Patch`]: State::Patch
/// [`apply`]: State::apply
pub trait State:
    Clone + PartialEq + Debug + Serialize + for<'de> Deserialize<'de> + 'static
{
    /// The partial-state type merged by [`apply`](State::apply).
    ///
    /// By convention one `Option` field per top-level state field.
    type Patch;

    /// Shallow-merge a patch into this state.
    ///
    /// Each populated patch field replaces the matching state field in
    /// full; absent fields leave the state untouched.
    fn apply(&mut self, patch: Self::Patch);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct Inner {
        x: i32,
        y: i32,
    }

    #[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
    struct TestState {
        a: Inner,
        b: i32,
    }

    #[derive(Default)]
    struct TestPatch {
        a: Option<Inner>,
        b: Option<i32>,
    }

    impl State for TestState {
        type Patch = TestPatch;

        fn apply(&mut self, patch: Self::Patch) {
            if let Some(a) = patch.a {
                self.a = a;
            }
            if let Some(b) = patch.b {
                self.b = b;
            }
        }
    }

    #[test]
    fn apply_replaces_populated_fields() {
        let mut state = TestState {
            a: Inner { x: 1, y: 1 },
            b: 2,
        };

        state.apply(TestPatch {
            b: Some(3),
            ..Default::default()
        });

        assert_eq!(state.a, Inner { x: 1, y: 1 });
        assert_eq!(state.b, 3);
    }

    #[test]
    fn apply_replaces_nested_fields_wholly() {
        let mut state = TestState {
            a: Inner { x: 1, y: 1 },
            b: 2,
        };

        state.apply(TestPatch {
            a: Some(Inner { x: 0, y: 9 }),
            ..Default::default()
        });

        // The nested value is replaced outright, not merged field by field.
        assert_eq!(state.a, Inner { x: 0, y: 9 });
        assert_eq!(state.b, 2);
    }

    #[test]
    fn empty_patch_leaves_state_unchanged() {
        let mut state = TestState {
            a: Inner { x: 1, y: 1 },
            b: 2,
        };
        let before = state.clone();

        state.apply(TestPatch::default());

        assert_eq!(state, before);
    }

    #[test]
    fn sequential_patches_apply_in_order() {
        let mut state = TestState {
            a: Inner { x: 1, y: 1 },
            b: 0,
        };

        state.apply(TestPatch {
            b: Some(1),
            ..Default::default()
        });
        state.apply(TestPatch {
            b: Some(2),
            ..Default::default()
        });

        assert_eq!(state.b, 2);
    }

    #[test]
    fn state_serializes_correctly() {
        let state = TestState {
            a: Inner { x: 1, y: 2 },
            b: 3,
        };

        let json = serde_json::to_string(&state).unwrap();
        let deserialized: TestState = serde_json::from_str(&json).unwrap();

        assert_eq!(state, deserialized);
    }
}

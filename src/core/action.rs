//! Action values routed through the store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named, immutable description of an intended state change.
///
/// Actions carry their payload as [`serde_json::Value`]; the typed edges
/// are [`ActionCreator`](crate::store::ActionCreator), which encodes a
/// payload when the action is built, and case registration, which decodes
/// it back before the handler runs. The name is the dispatch key.
///
/// Actions are usually built through a creator, but nothing stops a
/// caller from assembling one by hand:
///
/// ```rust
/// use patchbay::core::Action;
/// use serde_json::json;
///
/// let action = Action::new("check", json!(3));
/// assert_eq!(action.name(), "check");
/// ```
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Action {
    name: String,
    payload: Value,
}

impl Action {
    /// Build an action from a name and an already-encoded payload.
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            payload,
        }
    }

    /// The action's name, used as the dispatch key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The encoded payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }
}

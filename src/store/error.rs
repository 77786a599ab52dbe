//! Store error types.

use thiserror::Error;

/// Errors surfaced by dispatch and the typed payload edges.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Dispatch found no case registered for the action's name. The
    /// dispatch chain is abandoned; state keeps whatever merges already
    /// ran.
    #[error("no case for action '{action}'. Please add a case to the store")]
    UnregisteredCase { action: String },

    /// An action or effect payload could not be encoded for routing.
    #[error("could not encode payload for '{name}': {source}")]
    PayloadEncode {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    /// An action's payload did not match the shape its registered case
    /// expects.
    #[error("payload for action '{action}' does not match its case: {source}")]
    PayloadDecode {
        action: String,
        #[source]
        source: serde_json::Error,
    },
}

//! Device session states.

use serde::{Deserialize, Serialize};

/// State of a vendor device session (a begin/end handshake pair).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Begin has not been called.
    #[default]
    Uninitialized,
    /// Begin succeeded and end has not run yet.
    Active,
    /// End completed.
    Closed,
    /// End failed; the native side is in an unknown state.
    Faulted,
}

impl SessionState {
    /// Whether a new begin handshake may be issued from this state.
    pub fn can_begin(self) -> bool {
        matches!(self, Self::Uninitialized | Self::Closed)
    }
}

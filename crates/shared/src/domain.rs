use serde::{Deserialize, Serialize};

/// Lifecycle of the quote card modal. Exactly one state is active at a time.
///
/// `Opening` and `Processing` are indistinguishable to observers today
/// (generation starts immediately on open), but the states stay separate so a
/// confirmation step can be inserted later without a wire break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalState {
    #[default]
    Closed,
    Opening,
    Processing,
    Result,
    Failed,
}

impl ModalState {
    /// A generation request is outstanding (or about to be issued).
    pub fn is_busy(self) -> bool {
        matches!(self, ModalState::Opening | ModalState::Processing)
    }
}

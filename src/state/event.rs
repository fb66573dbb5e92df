use super::model::PhotoState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoEvent {
    /// Startup found no usable stored reference.
    NothingStored,
    /// A freshly acquired resource decoded and was persisted.
    Committed,
    /// A stored reference resolved and decoded.
    Reloaded,
    /// A stored reference failed to resolve or decode.
    ReloadFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: PhotoState,
    pub event: PhotoEvent,
    pub to: PhotoState,
}

impl StateTransition {
    pub const fn new(from: PhotoState, event: PhotoEvent, to: PhotoState) -> Self {
        Self { from, event, to }
    }
}

use super::{PhotoEvent, PhotoState, StateTransition};

const HISTORY_LIMIT: usize = 64;

/// Photo slot state with a bounded transition log for diagnostics.
#[derive(Debug)]
pub struct PhotoStateMachine {
    state: PhotoState,
    transition_history: Vec<StateTransition>,
}

impl PhotoStateMachine {
    pub fn new() -> Self {
        Self {
            state: PhotoState::default(),
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> PhotoState {
        self.state
    }

    pub fn history(&self) -> &[StateTransition] {
        &self.transition_history
    }

    pub fn next_state(&self, event: PhotoEvent) -> PhotoState {
        use PhotoEvent::*;
        match (self.state, event) {
            (_, Committed) | (_, Reloaded) => PhotoState::Loaded,
            (_, ReloadFailed) => PhotoState::Broken,
            // A cleared slot stays broken until something new is committed.
            (PhotoState::Broken, NothingStored) => PhotoState::Broken,
            (_, NothingStored) => PhotoState::Empty,
        }
    }

    pub fn transition(&mut self, event: PhotoEvent) -> PhotoState {
        let next = self.next_state(event);
        tracing::debug!(from = ?self.state, event = ?event, to = ?next, "photo state transition");

        if self.transition_history.len() == HISTORY_LIMIT {
            self.transition_history.remove(0);
        }
        self.transition_history
            .push(StateTransition::new(self.state, event, next));
        self.state = next;

        self.state
    }
}

impl Default for PhotoStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PhotoStateMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PhotoState::{:?}", self.state)
    }
}

pub mod event;
pub mod machine;
pub mod model;

pub use event::{PhotoEvent, StateTransition};
pub use machine::PhotoStateMachine;
pub use model::PhotoState;

mod gate;
mod stage;
mod transitions;

pub use gate::{SubmissionBlocked, SubmissionGate};
pub use stage::{stage_for_label, stage_index, stage_label, ApplicationProgress, STAGE_COUNT};
pub use transitions::{StatusChange, StatusTransition, TransitionError};

// Lifecycle state machines for batch execution
//
// Sub-requests move Pending -> Resolving -> Dispatching -> Recorded; a batch
// moves Running -> Committed | Aborted. Both machines live only for the
// duration of one `execute_batch` call.

pub mod batch_state_machine;
pub mod errors;
pub mod events;
pub mod states;
pub mod sub_request_state_machine;

// Re-export main types for convenient access
pub use batch_state_machine::BatchStateMachine;
pub use errors::{StateMachineError, StateMachineResult};
pub use events::{BatchEvent, SubRequestEvent};
pub use states::{BatchState, SubRequestState};
pub use sub_request_state_machine::SubRequestStateMachine;

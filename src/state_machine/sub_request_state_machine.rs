use super::{
    errors::{StateMachineError, StateMachineResult},
    events::SubRequestEvent,
    states::SubRequestState,
};
use crate::models::RequestId;
use tracing::debug;

/// In-memory lifecycle tracker for one sub-request.
///
/// Failures at any stage go straight to `Recorded`: an error-shaped response
/// is a recorded outcome like any other.
#[derive(Debug, Clone)]
pub struct SubRequestStateMachine {
    request_id: RequestId,
    state: SubRequestState,
}

impl SubRequestStateMachine {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            state: SubRequestState::default(),
        }
    }

    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    pub fn current_state(&self) -> SubRequestState {
        self.state
    }

    /// Apply `event`, returning the new state
    pub fn transition(&mut self, event: SubRequestEvent) -> StateMachineResult<SubRequestState> {
        let target = Self::determine_target_state(self.state, &event)?;
        debug!(
            request_id = self.request_id,
            from = %self.state,
            to = %target,
            event = event.event_type(),
            "Sub-request state transition"
        );
        self.state = target;
        Ok(target)
    }

    fn determine_target_state(
        current_state: SubRequestState,
        event: &SubRequestEvent,
    ) -> StateMachineResult<SubRequestState> {
        if current_state.is_terminal() {
            return Err(StateMachineError::InvalidTransition {
                from: Some(current_state.to_string()),
                to: format!("{event:?}"),
            });
        }

        let target = match (current_state, event) {
            (SubRequestState::Pending, SubRequestEvent::Resolve) => SubRequestState::Resolving,
            (SubRequestState::Resolving, SubRequestEvent::Dispatch) => SubRequestState::Dispatching,
            (SubRequestState::Resolving, SubRequestEvent::Record(_))
            | (SubRequestState::Dispatching, SubRequestEvent::Record(_)) => SubRequestState::Recorded,

            (from_state, _) => {
                return Err(StateMachineError::InvalidTransition {
                    from: Some(from_state.to_string()),
                    to: format!("{event:?}"),
                })
            }
        };

        Ok(target)
    }
}

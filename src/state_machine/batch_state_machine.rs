use super::{
    errors::{StateMachineError, StateMachineResult},
    events::BatchEvent,
    states::BatchState,
};
use tracing::debug;
use uuid::Uuid;

/// Lifecycle tracker for one batch run; a batch closes exactly once
#[derive(Debug, Clone)]
pub struct BatchStateMachine {
    batch_id: Uuid,
    state: BatchState,
}

impl BatchStateMachine {
    pub fn new(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            state: BatchState::default(),
        }
    }

    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    pub fn current_state(&self) -> BatchState {
        self.state
    }

    pub fn transition(&mut self, event: BatchEvent) -> StateMachineResult<BatchState> {
        let target = Self::determine_target_state(self.state, &event)?;
        debug!(
            batch_id = %self.batch_id,
            from = %self.state,
            to = %target,
            event = event.event_type(),
            "Batch state transition"
        );
        self.state = target;
        Ok(target)
    }

    fn determine_target_state(
        current_state: BatchState,
        event: &BatchEvent,
    ) -> StateMachineResult<BatchState> {
        match (current_state, event) {
            (BatchState::Running, BatchEvent::Commit) => Ok(BatchState::Committed),
            (BatchState::Running, BatchEvent::Abort(_)) => Ok(BatchState::Aborted),
            (from_state, _) => Err(StateMachineError::InvalidTransition {
                from: Some(from_state.to_string()),
                to: format!("{event:?}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_closes_once() {
        let mut machine = BatchStateMachine::new(Uuid::new_v4());
        assert_eq!(machine.transition(BatchEvent::Commit), Ok(BatchState::Committed));
        assert!(machine.transition(BatchEvent::Abort(Some(2))).is_err());
        assert!(machine.transition(BatchEvent::Commit).is_err());
        assert_eq!(machine.current_state(), BatchState::Committed);
    }

    #[test]
    fn test_abort() {
        let mut machine = BatchStateMachine::new(Uuid::new_v4());
        assert_eq!(machine.transition(BatchEvent::Abort(Some(2))), Ok(BatchState::Aborted));
        assert!(machine.current_state().is_terminal());
    }
}

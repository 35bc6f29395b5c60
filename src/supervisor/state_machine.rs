use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle status of a supervised instance.
///
/// `Starting` normally only exists inside `start`; callers observe it after
/// a cancelled readiness wait, when the process is running but was never
/// confirmed ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Stopped,
    Starting,
    Started,
    Stopping,
}

#[derive(Error, Debug)]
pub enum TransitionError {
    #[error("invalid transition: {0:?} -> {1:?}")]
    InvalidTransition(Status, Status),
}

/// Guarded status holder. All writes go through [`StateMachine::transition`]
/// so an invalid sequence is caught at the point it happens.
#[derive(Debug)]
pub struct StateMachine {
    state: Status,
}

impl Default for StateMachine {
    fn default() -> Self {
        Self {
            state: Status::Stopped,
        }
    }
}

impl StateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Status {
        self.state
    }

    pub fn can_transition(&self, to: Status) -> bool {
        matches!(
            (self.state, to),
            (Status::Stopped, Status::Starting)
                | (Status::Starting, Status::Started)
                | (Status::Starting, Status::Stopped)
                | (Status::Starting, Status::Stopping)
                | (Status::Started, Status::Stopping)
                | (Status::Stopping, Status::Stopped)
        )
    }

    pub fn transition(&mut self, to: Status) -> Result<(), TransitionError> {
        if self.can_transition(to) {
            tracing::info!("status transition: {:?} -> {:?}", self.state, to);
            self.state = to;
            Ok(())
        } else {
            Err(TransitionError::InvalidTransition(self.state, to))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_lifecycle_is_valid() {
        let mut sm = StateMachine::new();
        assert_eq!(sm.current(), Status::Stopped);
        assert!(sm.transition(Status::Starting).is_ok());
        assert!(sm.transition(Status::Started).is_ok());
        assert!(sm.transition(Status::Stopping).is_ok());
        assert!(sm.transition(Status::Stopped).is_ok());
    }

    #[test]
    fn cannot_jump_from_stopped_to_started() {
        let mut sm = StateMachine::new();
        assert!(sm.transition(Status::Started).is_err());
    }

    #[test]
    fn launch_failure_returns_to_stopped() {
        let mut sm = StateMachine::new();
        sm.transition(Status::Starting).unwrap();
        assert!(sm.transition(Status::Stopped).is_ok());
    }

    #[test]
    fn cancelled_start_can_be_stopped() {
        let mut sm = StateMachine::new();
        sm.transition(Status::Starting).unwrap();
        assert!(sm.transition(Status::Stopping).is_ok());
        assert!(sm.transition(Status::Stopped).is_ok());
    }
}

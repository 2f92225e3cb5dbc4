//! Runs authored actions step by step, one action at a time.
//!
//! The sequencer is single-flight: while an action is executing every other
//! request is rejected and the running one is left alone. The executing flag
//! and `last_triggered_action` are released by a drop guard, so a finished,
//! ended, failed or dropped sequence all leave the sequencer idle.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use nexus_core::{
    ActionDefinition, ActionId, ActorId, EngineError, ErrorKind, TriggeredAction,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::events::WorldEvent;
use crate::interpreter::{StepExecutor, StepOutcome};
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    #[error("{running} is still executing")]
    AlreadyExecuting { running: ActionId },

    #[error("{0} does not exist")]
    ActionNotFound(ActionId),
}

impl EngineError for SequenceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExecuting { .. } => ErrorKind::InvalidState,
            Self::ActionNotFound(_) => ErrorKind::NotFound,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyExecuting { .. } => "SEQUENCE_ALREADY_EXECUTING",
            Self::ActionNotFound(_) => "SEQUENCE_ACTION_NOT_FOUND",
        }
    }
}

/// How a sequence stopped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// Every step ran.
    Finished,
    /// An `End` step stopped it early.
    Ended,
    /// A step failed; the remaining steps were skipped.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceReport {
    pub action_id: ActionId,
    /// Steps started, including the one that ended or failed the sequence.
    pub steps_run: usize,
    pub completion: Completion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequencerState {
    Idle,
    Executing { action_id: ActionId, owner: ActorId },
}

pub struct ActionSequencer {
    session: Arc<Session>,
    executor: Arc<dyn StepExecutor>,
    state: Mutex<SequencerState>,
}

/// Returns the sequencer to idle when the running sequence ends or is dropped.
struct ExecutionGuard<'a> {
    sequencer: &'a ActionSequencer,
    action_id: ActionId,
}

impl Drop for ExecutionGuard<'_> {
    fn drop(&mut self) {
        *self.sequencer.state() = SequencerState::Idle;
        self.sequencer
            .session
            .with_world(|world| world.last_triggered_action = None);
        debug!(target: "nexus::action", action_id = %self.action_id, "sequencer idle");
    }
}

impl ActionSequencer {
    pub fn new(session: Arc<Session>, executor: Arc<dyn StepExecutor>) -> Self {
        Self {
            session,
            executor,
            state: Mutex::new(SequencerState::Idle),
        }
    }

    fn state(&self) -> MutexGuard<'_, SequencerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_executing(&self) -> bool {
        matches!(*self.state(), SequencerState::Executing { .. })
    }

    /// The action currently executing and its owner.
    pub fn current(&self) -> Option<(ActionId, ActorId)> {
        match *self.state() {
            SequencerState::Executing { action_id, owner } => Some((action_id, owner)),
            SequencerState::Idle => None,
        }
    }

    fn begin(
        &self,
        action_id: ActionId,
        owner: ActorId,
    ) -> Result<(ActionDefinition, ExecutionGuard<'_>), SequenceError> {
        let mut state = self.state();
        if let SequencerState::Executing { action_id: running, .. } = *state {
            warn!(target: "nexus::action", action_id = %action_id, running = %running, "sequence rejected; another action is executing");
            return Err(SequenceError::AlreadyExecuting { running });
        }
        let action = self
            .session
            .content()
            .action(action_id)
            .cloned()
            .ok_or(SequenceError::ActionNotFound(action_id))?;
        *state = SequencerState::Executing { action_id, owner };
        drop(state);

        self.session.with_world(|world| {
            world.last_triggered_action = Some(TriggeredAction { action_id, owner })
        });
        Ok((
            action,
            ExecutionGuard {
                sequencer: self,
                action_id,
            },
        ))
    }

    async fn run_steps(&self, action: &ActionDefinition, owner: ActorId) -> SequenceReport {
        let mut steps_run = 0;
        let mut completion = Completion::Finished;

        for step in &action.steps {
            steps_run += 1;
            match self.executor.run(step, owner).await {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::End) => {
                    completion = Completion::Ended;
                    break;
                }
                Err(error) => {
                    warn!(
                        target: "nexus::action",
                        action_id = %action.id,
                        step = steps_run,
                        code = error.error_code(),
                        "step failed; aborting sequence: {error}"
                    );
                    completion = Completion::Failed {
                        reason: error.to_string(),
                    };
                    break;
                }
            }
        }

        SequenceReport {
            action_id: action.id,
            steps_run,
            completion,
        }
    }

    /// Executes an action's steps in order and reports how it stopped.
    pub async fn execute(
        &self,
        action_id: ActionId,
        owner: ActorId,
    ) -> Result<SequenceReport, SequenceError> {
        let (action, _guard) = self.begin(action_id, owner)?;
        Ok(self.run_steps(&action, owner).await)
    }

    /// Like [`execute`](Self::execute), but also records the trigger in the
    /// debug log and announces start and finish on the world topic.
    pub async fn trigger(
        &self,
        action_id: ActionId,
        owner: ActorId,
    ) -> Result<SequenceReport, SequenceError> {
        let (action, guard) = self.begin(action_id, owner)?;

        let label = action.display_name();
        info!(target: "nexus::action", action_id = %action_id, owner = %owner, name = %label, "action triggered");
        self.session.log(format!("ACTION TRIGGERED: {label}"));
        self.session
            .publish(WorldEvent::SequenceStarted { action_id, owner });

        let report = self.run_steps(&action, owner).await;
        drop(guard);

        self.session.publish(WorldEvent::SequenceFinished {
            action_id,
            steps_run: report.steps_run,
            completion: report.completion.clone(),
        });
        Ok(report)
    }
}

impl std::fmt::Debug for ActionSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionSequencer")
            .field("state", &*self.state())
            .finish()
    }
}

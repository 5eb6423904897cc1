//! Run Episode use case
//!
//! Drives one task through the conversation state machine and scores it.
//!
//! | Phase | Work | Next |
//! |-------|------|------|
//! | Init | resolve task, persona, goals; activate first goal | UserTurn |
//! | UserTurn | persona engine speaks (voices a pending shift) | AgentTurn |
//! | AgentTurn | one adapter request, bounded by the agent timeout | ToolExchange |
//! | ToolExchange | mediate each requested call in order | ShiftCheck |
//! | ShiftCheck | resolve goals, note alignment, inject/settle, check budget | UserTurn / Resolved / Aborted |
//!
//! An episode never fails as a whole: every error becomes an
//! [`AbortReason`] and the partial evidence is still scored.

mod phases;
mod types;

pub use types::{EpisodeOutcome, RunEpisodeInput};

use types::{PreparedTask, TurnCarry};

use crate::config::EvaluationConfig;
use crate::ports::agent_adapter::AgentAdapter;
use crate::ports::conversation_logger::{ConversationEvent, ConversationLogger, NoConversationLogger};
use crate::ports::episode_progress::{EpisodeProgressNotifier, NoEpisodeProgress};
use crate::use_cases::score_episode::{ScoreEpisodeInput, ScoreEpisodeUseCase};
use crate::use_cases::shared::check_cancelled;
use crate::use_cases::tool_mediator::ToolMediator;
use changebench_domain::{
    AbortReason, ConversationState, DomainError, DomainPack, GoalSequencer, PersonaEngine, Phase, RecordOverlay,
    Termination, Transcript,
};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Use case for running one episode against the agent under test
pub struct RunEpisodeUseCase<A: AgentAdapter + 'static> {
    pub(super) adapter: Arc<A>,
    pub(super) pack: Arc<DomainPack>,
    pub(super) config: Arc<EvaluationConfig>,
    pub(super) logger: Arc<dyn ConversationLogger>,
    pub(super) progress: Arc<dyn EpisodeProgressNotifier>,
    pub(super) cancellation_token: Option<CancellationToken>,
}

impl<A: AgentAdapter + 'static> Clone for RunEpisodeUseCase<A> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            pack: self.pack.clone(),
            config: self.config.clone(),
            logger: self.logger.clone(),
            progress: self.progress.clone(),
            cancellation_token: self.cancellation_token.clone(),
        }
    }
}

/// Mutable pieces of one run
pub(super) struct Episode {
    pub task_id: String,
    pub trial: usize,
    pub turn_budget: usize,
    pub state: ConversationState,
    pub persona: PersonaEngine,
    pub mediator: ToolMediator,
    pub carry: TurnCarry,
}

impl<A: AgentAdapter + 'static> RunEpisodeUseCase<A> {
    pub fn new(adapter: Arc<A>, pack: Arc<DomainPack>, config: Arc<EvaluationConfig>) -> Self {
        Self {
            adapter,
            pack,
            config,
            logger: Arc::new(NoConversationLogger),
            progress: Arc::new(NoEpisodeProgress),
            cancellation_token: None,
        }
    }

    /// Set a structured conversation logger
    pub fn with_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_progress(mut self, progress: Arc<dyn EpisodeProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    /// Set a cancellation token for graceful interruption
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn pack(&self) -> &DomainPack {
        &self.pack
    }

    /// Run the task to termination and score it
    pub async fn execute(&self, input: RunEpisodeInput) -> EpisodeOutcome {
        info!(task = %input.task_id, trial = input.trial, seed = input.seed, "Episode started");

        let prepared = match self.prepare(&input) {
            Ok(prepared) => prepared,
            Err(e) => {
                warn!(task = %input.task_id, error = %e, "Task could not be prepared");
                return self.unstarted(input, AbortReason::DomainDataError(e.to_string()));
            }
        };

        self.log(
            "episode_start",
            json!({
                "task_id": input.task_id,
                "trial": input.trial,
                "seed": input.seed,
                "persona": prepared.persona.persona().id,
                "turn_budget": prepared.task.turn_budget,
            }),
        );

        let mut mediator = ToolMediator::new(Arc::clone(&self.pack));
        if let Some(token) = &self.cancellation_token {
            mediator = mediator.with_cancellation(token.clone());
        }

        let mut episode = Episode {
            task_id: input.task_id.clone(),
            trial: input.trial,
            turn_budget: prepared.task.turn_budget,
            state: ConversationState::new(input.task_id.clone(), prepared.sequencer),
            persona: prepared.persona,
            mediator,
            carry: TurnCarry::default(),
        };

        let termination = loop {
            if let Some(termination) = episode.state.phase.termination() {
                break termination;
            }
            if check_cancelled(&self.cancellation_token).is_err() {
                self.enter(&mut episode, Phase::Aborted(AbortReason::Cancelled));
                continue;
            }

            let next = match episode.state.phase.clone() {
                Phase::Init => self.init(&mut episode),
                Phase::UserTurn => self.user_turn(&mut episode),
                Phase::AgentTurn => self.agent_turn(&mut episode).await,
                Phase::ToolExchange => self.tool_exchange(&mut episode).await,
                Phase::ShiftCheck => self.shift_check(&mut episode),
                Phase::Resolved | Phase::Aborted(_) => continue,
            };
            self.enter(&mut episode, next);
        };

        self.finish(input, episode, termination)
    }

    fn prepare(&self, input: &RunEpisodeInput) -> Result<PreparedTask, DomainError> {
        let task = self.pack.task(&input.task_id).ok_or_else(|| {
            DomainError::DomainData(format!(
                "task '{}' is not present in pack '{}'",
                input.task_id, self.pack.name
            ))
        })?;
        let persona = self.pack.persona(&task.persona_id)?;
        let sequencer = task.sequencer()?;
        Ok(PreparedTask {
            task: task.clone(),
            persona: PersonaEngine::new(persona.clone(), input.seed),
            sequencer,
        })
    }

    pub(super) fn enter(&self, episode: &mut Episode, phase: Phase) {
        if let Phase::Aborted(reason) = &phase {
            warn!(task = %episode.task_id, trial = episode.trial, reason = %reason, "Episode aborted");
        }
        self.progress.on_phase_change(&episode.task_id, &phase);
        episode.state.set_phase(phase);
    }

    pub(super) fn log(&self, event_type: &'static str, payload: serde_json::Value) {
        self.logger.log(ConversationEvent::new(event_type, payload));
    }

    fn scorer(&self) -> ScoreEpisodeUseCase {
        ScoreEpisodeUseCase::from_config(Arc::clone(&self.pack), &self.config)
    }

    fn finish(&self, input: RunEpisodeInput, episode: Episode, termination: Termination) -> EpisodeOutcome {
        let turn_budget = episode.turn_budget;
        let shifts = episode.carry.shifts;
        let parts = episode.state.into_parts();
        let goal_timeline = parts.sequencer.finalize();

        let scorecard = self.scorer().execute(ScoreEpisodeInput {
            task_id: &input.task_id,
            termination: &termination,
            transcript: &parts.transcript,
            goals: &goal_timeline,
            tool_calls: &parts.tool_calls,
            overlay: &parts.overlay,
            turn_budget,
        });

        info!(
            task = %input.task_id,
            trial = input.trial,
            termination = termination.as_str(),
            turns = parts.transcript.len(),
            tsr = scorecard.tsr(),
            aggregate = scorecard.aggregate(),
            "Episode finished"
        );
        self.log(
            "episode_end",
            json!({
                "task_id": input.task_id,
                "trial": input.trial,
                "termination": termination,
                "turns": parts.transcript.len(),
                "aggregate": scorecard.aggregate(),
            }),
        );
        self.progress.on_episode_complete(&input.task_id, &scorecard);

        EpisodeOutcome {
            task_id: input.task_id,
            trial: input.trial,
            seed: input.seed,
            turn_budget,
            termination,
            transcript: parts.transcript,
            goal_timeline,
            shifts,
            tool_calls: parts.tool_calls,
            final_records: parts.overlay,
            scorecard,
        }
    }

    /// Outcome of a task that failed before its first turn
    pub(crate) fn unstarted(&self, input: RunEpisodeInput, reason: AbortReason) -> EpisodeOutcome {
        let goals = self
            .pack
            .task(&input.task_id)
            .map(|t| GoalSequencer::new(t.goals.iter().cloned()).finalize())
            .unwrap_or_default();
        let turn_budget = self.pack.task(&input.task_id).map_or(0, |t| t.turn_budget);
        let termination = Termination::Aborted(reason);
        let transcript = Transcript::default();
        let overlay = RecordOverlay::default();

        let scorecard = self.scorer().execute(ScoreEpisodeInput {
            task_id: &input.task_id,
            termination: &termination,
            transcript: &transcript,
            goals: &goals,
            tool_calls: &[],
            overlay: &overlay,
            turn_budget,
        });
        self.progress.on_episode_complete(&input.task_id, &scorecard);

        EpisodeOutcome {
            task_id: input.task_id,
            trial: input.trial,
            seed: input.seed,
            turn_budget,
            termination,
            transcript,
            goal_timeline: goals,
            shifts: Vec::new(),
            tool_calls: Vec::new(),
            final_records: overlay,
            scorecard,
        }
    }
}

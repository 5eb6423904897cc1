//! Phase steps of the episode state machine.
//!
//! Each step mutates the [`Episode`] and returns the phase to enter next.

use super::{Episode, RunEpisodeUseCase};
use crate::ports::agent_adapter::{AgentAdapter, AgentRequest, AgentResponse};
use changebench_domain::{
    AbortReason, ConversationState, DomainError, GoalId, PersonaContext, Phase, PredicateView, Role,
    ShiftKind, ShiftTrigger, TaskRecords, TriggerContext,
};
use changebench_domain::core::text::truncate;
use serde_json::json;
use tracing::{debug, info, warn};

impl<A: AgentAdapter + 'static> RunEpisodeUseCase<A> {
    pub(super) fn init(&self, episode: &mut Episode) -> Phase {
        episode.state.sequencer.activate_first(1);
        if episode.turn_budget < 2 {
            return Phase::Aborted(AbortReason::TurnBudgetExceeded);
        }
        Phase::UserTurn
    }

    pub(super) fn user_turn(&self, episode: &mut Episode) -> Phase {
        let utterance = {
            let state = &episode.state;
            let ctx = PersonaContext {
                active_goal: state.sequencer.current_goal(),
                last_agent_turn: state.last_agent_turn().map(|t| t.content.as_str()),
                history_len: state.turns().len(),
                pending_shift: episode.carry.pending_shift.as_ref(),
            };
            episode.persona.next_utterance(&ctx)
        };
        let voiced_shift = episode.carry.pending_shift.take();

        let index = episode
            .state
            .push_user(utterance.content.clone(), utterance.intent);
        if let Some(turn) = episode.state.turns().last() {
            self.progress.on_turn(&episode.task_id, turn);
        }
        debug!(
            task = %episode.task_id,
            turn = index,
            intent = utterance.intent.as_str(),
            "User: {}",
            truncate(&utterance.content, 80)
        );
        self.log(
            "user_turn",
            json!({
                "task_id": episode.task_id,
                "trial": episode.trial,
                "turn": index,
                "intent": utterance.intent,
                "content": utterance.content,
                "mood": episode.persona.mood(),
                "shift": voiced_shift,
            }),
        );
        Phase::AgentTurn
    }

    pub(super) async fn agent_turn(&self, episode: &mut Episode) -> Phase {
        let first = episode.state.last_agent_turn().is_none();
        let request = AgentRequest {
            task_id: episode.task_id.clone(),
            turn_index: episode.state.turn_index() + 1,
            role: Role::User,
            content: episode
                .state
                .turns()
                .last()
                .map(|t| t.content.clone())
                .unwrap_or_default(),
            prior_tool_results: std::mem::take(&mut episode.carry.pending_results),
            policy: first.then(|| self.pack.policy.clone()),
            tools: first.then(|| self.pack.tools.all().cloned().collect()),
        };

        let response = match self.request_agent(request).await {
            Ok(response) => response,
            Err(reason) => return Phase::Aborted(reason),
        };

        let index = episode.state.push_agent(response.content.clone());
        if let Some(turn) = episode.state.turns().last() {
            self.progress.on_turn(&episode.task_id, turn);
        }
        debug!(
            task = %episode.task_id,
            turn = index,
            tool_calls = response.tool_calls.len(),
            "Agent: {}",
            truncate(&response.content, 80)
        );
        self.log(
            "agent_turn",
            json!({
                "task_id": episode.task_id,
                "trial": episode.trial,
                "turn": index,
                "content": response.content,
                "tool_calls": response.tool_calls,
            }),
        );
        episode.carry.pending_calls = response.tool_calls;
        Phase::ToolExchange
    }

    /// One adapter round trip, raced against the timeout and cancellation.
    async fn request_agent(&self, request: AgentRequest) -> Result<AgentResponse, AbortReason> {
        let turn = request.turn_index;
        let call = tokio::time::timeout(self.config.agent_timeout, self.adapter.respond(request));

        let result = match &self.cancellation_token {
            Some(token) => {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return Err(AbortReason::Cancelled),
                    result = call => result,
                }
            }
            None => call.await,
        };

        match result {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => {
                warn!(turn, error = %e, "Agent adapter failed");
                Err(AbortReason::AdapterFailure(e.to_string()))
            }
            Err(_) => {
                warn!(turn, timeout = ?self.config.agent_timeout, "Agent did not answer in time");
                Err(AbortReason::AgentTimeout { turn })
            }
        }
    }

    pub(super) async fn tool_exchange(&self, episode: &mut Episode) -> Phase {
        let turn = episode.state.turn_index();
        let calls = std::mem::take(&mut episode.carry.pending_calls);

        for call in calls {
            let record = match episode
                .mediator
                .dispatch(call, turn, episode.state.overlay_mut())
                .await
            {
                Ok(record) => record,
                Err(DomainError::Cancelled) => return Phase::Aborted(AbortReason::Cancelled),
                Err(e) => return Phase::Aborted(AbortReason::DomainDataError(e.to_string())),
            };

            self.progress.on_tool_call(&episode.task_id, &record);
            self.log(
                "tool_call",
                json!({
                    "task_id": episode.task_id,
                    "trial": episode.trial,
                    "turn": turn,
                    "tool": record.call.tool_name,
                    "arguments": record.call.arguments,
                    "outcome": record.outcome,
                    "latency_ms": record.latency.as_millis() as u64,
                    "schema_valid": record.schema_valid,
                    "precondition_ok": record.precondition_ok,
                }),
            );
            episode.carry.pending_results.push(record.clone());
            episode.state.record_tool_call(record);
        }
        Phase::ShiftCheck
    }

    pub(super) fn shift_check(&self, episode: &mut Episode) -> Phase {
        let turn = episode.state.turn_index();

        let satisfied = match self.satisfied_goals(&episode.state) {
            Ok(ids) => ids,
            Err(e) => return Phase::Aborted(AbortReason::DomainDataError(e.to_string())),
        };
        let top = episode.state.sequencer.current_goal().map(|g| g.id().clone());
        for id in &satisfied {
            if episode.state.sequencer.mark_resolved(id, turn) {
                info!(task = %episode.task_id, goal = %id, turn, "Goal resolved");
                self.log(
                    "goal_resolved",
                    json!({"task_id": episode.task_id, "trial": episode.trial, "goal": id, "turn": turn}),
                );
            }
        }
        let mood = episode.persona.observe_agent_turn(!satisfied.is_empty());
        if top.as_ref().is_some_and(|id| satisfied.contains(id)) {
            episode.carry.unresolved_turns = 0;
        } else {
            episode.carry.unresolved_turns += 1;
        }

        self.note_alignment(episode, turn);

        if episode.state.sequencer.all_terminal() {
            return Phase::Resolved;
        }
        if turn + 2 > episode.turn_budget {
            return Phase::Aborted(AbortReason::TurnBudgetExceeded);
        }

        let sequencer = &mut episode.state.sequencer;
        let top_resolved = sequencer
            .current_goal()
            .is_some_and(|g| g.status.is_terminal());
        let ctx = TriggerContext {
            next_user_turn: turn + 1,
            top_resolved,
            unresolved_agent_turns: episode.carry.unresolved_turns,
            mood,
        };

        if sequencer.shift_due(&ctx) {
            if let Some(event) = sequencer.inject_shift(turn + 1, &self.pack.adjacency) {
                info!(
                    task = %episode.task_id,
                    from = %event.from,
                    to = %event.to,
                    kind = event.kind.as_str(),
                    trigger_turn = event.trigger_turn,
                    "Goal shift injected"
                );
                self.progress.on_shift(&episode.task_id, &event);
                self.log(
                    "goal_shift",
                    json!({"task_id": episode.task_id, "trial": episode.trial, "shift": event}),
                );
                episode.carry.shifts.push(event.clone());
                episode.carry.pending_shift = Some(event);
                episode.carry.unresolved_turns = 0;
            }
        } else if top_resolved {
            sequencer.settle();
            episode.carry.unresolved_turns = 0;
            let at_turn_pending = matches!(
                sequencer.next_pending().and_then(|g| g.spec.trigger.as_ref()),
                Some(ShiftTrigger::AtTurn { .. })
            );
            if sequencer.open_goals().next().is_none() && !at_turn_pending {
                debug!(task = %episode.task_id, "No goal left to pursue");
                return Phase::Resolved;
            }
        }

        Phase::UserTurn
    }

    /// Open goals whose success predicate holds on events since their activation
    fn satisfied_goals(&self, state: &ConversationState) -> Result<Vec<GoalId>, DomainError> {
        let records = TaskRecords::new(&self.pack.records, state.overlay());
        let mut satisfied = Vec::new();
        for goal in state.sequencer.open_goals() {
            let view = PredicateView {
                turns: state.turns(),
                tool_calls: state.tool_calls(),
                records: &records,
                since_turn: goal.activated_turn.unwrap_or(0),
            };
            if goal.spec.success.evaluate(&view)? {
                satisfied.push(goal.id().clone());
            }
        }
        Ok(satisfied)
    }

    /// Record the first agent turn after a shift that takes up the new goal.
    ///
    /// Resolving a soft-shifted goal counts as taking it up; a hard shift
    /// needs a turn that restates the new objective.
    fn note_alignment(&self, episode: &mut Episode, turn: usize) {
        let state = &episode.state;
        let Some(content) = state.last_agent_turn().map(|t| t.content.as_str()) else {
            return;
        };
        let aligned = state
            .sequencer
            .awaiting_alignment()
            .filter(|g| g.trigger_turn.is_some_and(|t| t < turn))
            .filter(|g| {
                (g.shift_kind == ShiftKind::Soft && g.resolved_turn.is_some())
                    || self.config.alignment.is_aligned(g, content)
            })
            .map(|g| g.id().clone());

        if let Some(id) = aligned {
            episode.state.sequencer.note_alignment(&id, turn);
            debug!(task = %episode.task_id, goal = %id, turn, "Agent aligned with shifted goal");
            self.log(
                "goal_aligned",
                json!({"task_id": episode.task_id, "trial": episode.trial, "goal": id, "turn": turn}),
            );
        }
    }
}

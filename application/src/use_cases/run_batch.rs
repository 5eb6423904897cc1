//! Run Batch use case
//!
//! Runs every selected task for the configured number of trials, up to
//! `max_parallel` episodes at a time. Each episode owns its state and tool
//! overlay; only the pack is shared, read-only. A failing episode aborts
//! alone and never disturbs its siblings.

use crate::config::BatchParams;
use crate::ports::agent_adapter::AgentAdapter;
use crate::use_cases::run_episode::{EpisodeOutcome, RunEpisodeInput, RunEpisodeUseCase};
use changebench_domain::{AbortReason, pass_hat_k};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Which tasks to run; trials, seeds and parallelism come from [`BatchParams`]
#[derive(Debug, Clone, Default)]
pub struct RunBatchInput {
    /// `None` runs every task of the pack
    pub task_ids: Option<Vec<String>>,
}

impl RunBatchInput {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn tasks(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            task_ids: Some(ids.into_iter().map(Into::into).collect()),
        }
    }
}

/// Aggregate view of a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub episodes: usize,
    /// Episodes whose score card is not complete (timeouts, adapter failures, ...)
    pub incomplete: usize,
    /// Means over complete episodes
    pub mean_tsr: f64,
    pub mean_action_exec: f64,
    pub mean_comm_quality: f64,
    /// Mean headline recovery time over complete episodes that had a shift
    pub mean_gsrt_turns: Option<f64>,
    pub mean_aggregate: f64,
    /// Termination counts keyed by abort reason
    pub abort_reasons: BTreeMap<String, usize>,
    /// pass^k for k = 1..=trials, averaged over tasks
    pub pass_hat_k: BTreeMap<usize, f64>,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[EpisodeOutcome]) -> Self {
        let complete: Vec<&EpisodeOutcome> = outcomes.iter().filter(|o| o.is_complete()).collect();
        let mean = |f: &dyn Fn(&EpisodeOutcome) -> f64| -> f64 {
            if complete.is_empty() {
                0.0
            } else {
                complete.iter().map(|o| f(*o)).sum::<f64>() / complete.len() as f64
            }
        };

        let gsrt: Vec<f64> = complete.iter().filter_map(|o| o.scorecard.gsrt_turns()).collect();
        let mean_gsrt_turns = (!gsrt.is_empty()).then(|| gsrt.iter().sum::<f64>() / gsrt.len() as f64);

        let mut abort_reasons = BTreeMap::new();
        for outcome in outcomes {
            if let Some(reason) = outcome.termination.abort_reason() {
                *abort_reasons.entry(reason.as_str().to_string()).or_insert(0) += 1;
            }
        }

        Self {
            episodes: outcomes.len(),
            incomplete: outcomes.len() - complete.len(),
            mean_tsr: mean(&|o| o.scorecard.tsr()),
            mean_action_exec: mean(&|o| o.scorecard.action_exec()),
            mean_comm_quality: mean(&|o| o.scorecard.comm_quality()),
            mean_gsrt_turns,
            mean_aggregate: mean(&|o| o.scorecard.aggregate()),
            abort_reasons,
            pass_hat_k: pass_hat_k_by_task(outcomes),
        }
    }
}

/// pass^k per k, averaged over tasks that ran at least k trials
fn pass_hat_k_by_task(outcomes: &[EpisodeOutcome]) -> BTreeMap<usize, f64> {
    let mut per_task: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for outcome in outcomes {
        let entry = per_task.entry(outcome.task_id.as_str()).or_default();
        entry.0 += 1;
        if outcome.scorecard.is_success() {
            entry.1 += 1;
        }
    }

    let max_trials = per_task.values().map(|(n, _)| *n).max().unwrap_or(0);
    let mut result = BTreeMap::new();
    for k in 1..=max_trials {
        let values: Vec<f64> = per_task
            .values()
            .filter_map(|&(n, c)| pass_hat_k(n, c, k))
            .collect();
        if !values.is_empty() {
            result.insert(k, values.iter().sum::<f64>() / values.len() as f64);
        }
    }
    result
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub pack: String,
    /// Sorted by task id, then trial
    pub outcomes: Vec<EpisodeOutcome>,
    pub summary: BatchSummary,
}

/// Use case for running many episodes concurrently
pub struct RunBatchUseCase<A: AgentAdapter + 'static> {
    episode: RunEpisodeUseCase<A>,
    params: BatchParams,
    cancellation_token: Option<CancellationToken>,
}

impl<A: AgentAdapter + 'static> RunBatchUseCase<A> {
    /// Batch over `episode`, using its config's batch parameters
    pub fn new(episode: RunEpisodeUseCase<A>) -> Self {
        let params = episode.config.batch.clone();
        Self {
            episode,
            params,
            cancellation_token: None,
        }
    }

    pub fn with_params(mut self, params: BatchParams) -> Self {
        self.params = params;
        self
    }

    /// Cancelling this token stops every running episode
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub async fn execute(&self, input: RunBatchInput) -> BatchReport {
        let pack = self.episode.pack();
        let task_ids: Vec<String> = match input.task_ids {
            Some(ids) => ids,
            None => pack.tasks.iter().map(|t| t.id.clone()).collect(),
        };
        let trials = self.params.trials.max(1);
        let semaphore = Arc::new(Semaphore::new(self.params.max_parallel.max(1)));

        info!(
            pack = %pack.name,
            tasks = task_ids.len(),
            trials,
            max_parallel = self.params.max_parallel,
            "Batch started"
        );

        let mut join_set = JoinSet::new();
        let mut inputs = HashMap::new();
        for task_id in &task_ids {
            for trial in 0..trials {
                let mut episode = self.episode.clone();
                if let Some(token) = &self.cancellation_token {
                    episode = episode.with_cancellation(token.child_token());
                }
                let semaphore = Arc::clone(&semaphore);
                let seed = self.params.base_seed.wrapping_add(trial as u64);
                let input = RunEpisodeInput::new(task_id.clone(), seed).with_trial(trial);

                let handle = join_set.spawn({
                    let input = input.clone();
                    async move {
                        let _permit = semaphore.acquire_owned().await.ok();
                        episode.execute(input).await
                    }
                });
                inputs.insert(handle.id(), input);
            }
        }

        let mut outcomes = Vec::with_capacity(task_ids.len() * trials);
        while let Some(result) = join_set.join_next_with_id().await {
            match result {
                Ok((_, outcome)) => outcomes.push(outcome),
                Err(e) => {
                    warn!("Episode task failed: {}", e);
                    if let Some(input) = inputs.remove(&e.id()) {
                        let reason = AbortReason::EpisodePanicked(e.to_string());
                        outcomes.push(self.episode.unstarted(input, reason));
                    }
                }
            }
        }
        outcomes.sort_by(|a, b| a.task_id.cmp(&b.task_id).then(a.trial.cmp(&b.trial)));

        let summary = BatchSummary::from_outcomes(&outcomes);
        info!(
            episodes = summary.episodes,
            incomplete = summary.incomplete,
            mean_aggregate = summary.mean_aggregate,
            "Batch finished"
        );

        BatchReport {
            pack: pack.name.clone(),
            outcomes,
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::use_cases::test_support::{ScriptedAdapter, Step, config, register_call, reply, reply_with, uni_pack};
    use changebench_domain::{AbortReason, Termination};

    fn batch(adapter: ScriptedAdapter) -> RunBatchUseCase<ScriptedAdapter> {
        RunBatchUseCase::new(RunEpisodeUseCase::new(Arc::new(adapter), uni_pack(), config()))
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_does_not_affect_sibling_task() {
        let adapter = ScriptedAdapter::default()
            .with_script("register", vec![reply_with("Done, you are registered.", register_call("e1"))])
            .with_script("shift", vec![reply("Let me look into that."), Step::Stall]);

        let report = batch(adapter).execute(RunBatchInput::all()).await;

        assert_eq!(report.pack, "uni");
        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].task_id, "register");
        assert_eq!(report.outcomes[0].termination, Termination::Resolved);
        assert_eq!(
            report.outcomes[1].termination,
            Termination::Aborted(AbortReason::AgentTimeout { turn: 4 })
        );

        let summary = &report.summary;
        assert_eq!(summary.episodes, 2);
        assert_eq!(summary.incomplete, 1);
        assert_eq!(summary.abort_reasons.get("agent_timeout"), Some(&1));
        assert_eq!(summary.mean_tsr, 1.0);
    }

    #[tokio::test]
    async fn test_trials_use_consecutive_seeds() {
        let adapter = ScriptedAdapter::default()
            .with_script("register", vec![reply_with("Done, you are registered.", register_call("e1"))]);
        let use_case = batch(adapter).with_params(BatchParams {
            max_parallel: 2,
            trials: 3,
            base_seed: 10,
        });

        let report = use_case.execute(RunBatchInput::tasks(["register"])).await;

        let seeds: Vec<u64> = report.outcomes.iter().map(|o| o.seed).collect();
        assert_eq!(seeds, vec![10, 11, 12]);
        let trials: Vec<usize> = report.outcomes.iter().map(|o| o.trial).collect();
        assert_eq!(trials, vec![0, 1, 2]);
        assert_eq!(report.summary.pass_hat_k.get(&3), Some(&1.0));
    }

    #[tokio::test]
    async fn test_seeds_wrap_at_the_top_of_the_range() {
        let use_case = batch(ScriptedAdapter::default()).with_params(BatchParams {
            max_parallel: 1,
            trials: 2,
            base_seed: u64::MAX,
        });

        let report = use_case.execute(RunBatchInput::tasks(["register"])).await;

        let seeds: Vec<u64> = report.outcomes.iter().map(|o| o.seed).collect();
        assert_eq!(seeds, vec![u64::MAX, 0]);
    }

    #[tokio::test]
    async fn test_panicking_episode_is_reported_as_aborted() {
        let adapter = ScriptedAdapter::default()
            .with_script("register", vec![reply_with("Done, you are registered.", register_call("e1"))])
            .with_script("shift", vec![Step::Panic]);

        let report = batch(adapter).execute(RunBatchInput::all()).await;

        assert_eq!(report.outcomes.len(), 2);
        assert_eq!(report.outcomes[0].termination, Termination::Resolved);
        assert_eq!(report.outcomes[1].task_id, "shift");
        assert!(matches!(
            report.outcomes[1].termination,
            Termination::Aborted(AbortReason::EpisodePanicked(_))
        ));
        assert_eq!(report.summary.episodes, 2);
        assert_eq!(report.summary.abort_reasons.get("episode_panicked"), Some(&1));
    }

    #[tokio::test]
    async fn test_cancelled_batch_aborts_every_episode() {
        let token = CancellationToken::new();
        token.cancel();
        let report = batch(ScriptedAdapter::default())
            .with_cancellation(token)
            .execute(RunBatchInput::all())
            .await;

        assert_eq!(report.summary.abort_reasons.get("cancelled"), Some(&2));
        assert_eq!(report.summary.incomplete, 2);
        assert_eq!(report.summary.mean_aggregate, 0.0);
    }
}

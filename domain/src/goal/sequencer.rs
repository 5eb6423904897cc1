//! Goal sequencer and shift detector
//!
//! Owns the declared goals (an indexed `Vec<Goal>`) and a runtime stack of
//! indices into that vector. The top of the stack is the goal the simulated
//! user currently pursues.
//!
//! ```text
//! declared: [g0, g1, g2]          stack: [0]      g0 active
//! inject_shift(3)                 stack: [0, 1]   g0 shifted, g1 active (soft/hard)
//! mark_resolved(g1) + settle()    stack: [0]      g0 active again (soft) or abandoned (hard)
//! finalize()                      every goal resolved or abandoned
//! ```

use super::adjacency::AdjacencyTable;
use super::entities::{Goal, GoalId, GoalSpec, GoalStatus, ShiftEvent, ShiftKind, TriggerContext};

#[derive(Debug, Clone)]
pub struct GoalSequencer {
    goals: Vec<Goal>,
    stack: Vec<usize>,
}

impl GoalSequencer {
    pub fn new(specs: impl IntoIterator<Item = GoalSpec>) -> Self {
        Self {
            goals: specs.into_iter().map(Goal::new).collect(),
            stack: Vec::new(),
        }
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    /// Activate the first declared goal. Returns `false` when no goals exist.
    pub fn activate_first(&mut self, turn: usize) -> bool {
        if !self.stack.is_empty() {
            return true;
        }
        let Some(goal) = self.goals.first_mut() else {
            return false;
        };
        goal.status = GoalStatus::Active;
        goal.activated_turn = Some(turn);
        self.stack.push(0);
        true
    }

    /// Top of the stack
    pub fn current_goal(&self) -> Option<&Goal> {
        self.stack.last().map(|&i| &self.goals[i])
    }

    pub fn get(&self, id: &GoalId) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id() == id)
    }

    fn get_mut(&mut self, id: &GoalId) -> Option<&mut Goal> {
        self.goals.iter_mut().find(|g| g.id() == id)
    }

    /// Next declared goal that has not been activated yet
    pub fn next_pending(&self) -> Option<&Goal> {
        self.goals.iter().find(|g| g.status == GoalStatus::Pending)
    }

    /// Whether the next pending goal's declared trigger fires now
    pub fn shift_due(&self, ctx: &TriggerContext) -> bool {
        self.next_pending()
            .and_then(|g| g.spec.trigger.as_ref())
            .is_some_and(|trigger| trigger.is_satisfied(ctx))
    }

    /// Push the next pending goal and demote the current one.
    ///
    /// The shift kind is classified here, once, from the categories of the
    /// outgoing and incoming goals.
    pub fn inject_shift(&mut self, trigger_turn: usize, adjacency: &AdjacencyTable) -> Option<ShiftEvent> {
        let next = self.goals.iter().position(|g| g.status == GoalStatus::Pending)?;
        let top = *self.stack.last()?;

        let kind = adjacency.classify(self.goals[top].category(), self.goals[next].category());
        let from = self.goals[top].id().clone();

        let outgoing = &mut self.goals[top];
        if outgoing.status == GoalStatus::Active {
            outgoing.status = GoalStatus::Shifted;
        }
        outgoing.displaced_by = Some(kind);

        let incoming = &mut self.goals[next];
        incoming.status = GoalStatus::Active;
        incoming.shift_kind = kind;
        incoming.trigger_turn = Some(trigger_turn);
        incoming.activated_turn = Some(trigger_turn);
        self.stack.push(next);

        Some(ShiftEvent {
            from,
            to: incoming.id().clone(),
            kind,
            trigger_turn,
        })
    }

    /// Resolve an open goal. Returns `true` if the status changed.
    pub fn mark_resolved(&mut self, id: &GoalId, turn: usize) -> bool {
        match self.get_mut(id) {
            Some(goal) if goal.status.is_open() => {
                goal.status = GoalStatus::Resolved;
                goal.resolved_turn = Some(turn);
                true
            }
            _ => false,
        }
    }

    pub fn mark_abandoned(&mut self, id: &GoalId) -> bool {
        match self.get_mut(id) {
            Some(goal) if !goal.status.is_terminal() => {
                goal.status = GoalStatus::Abandoned;
                true
            }
            _ => false,
        }
    }

    /// Record the first agent turn aligned with a shifted-into goal
    pub fn note_alignment(&mut self, id: &GoalId, turn: usize) {
        if let Some(goal) = self.get_mut(id)
            && goal.aligned_turn.is_none()
        {
            goal.aligned_turn = Some(turn);
        }
    }

    /// Most recent shifted-into goal that still awaits an aligned agent turn
    pub fn awaiting_alignment(&self) -> Option<&Goal> {
        self.stack
            .iter()
            .rev()
            .map(|&i| &self.goals[i])
            .find(|g| g.shift_kind != ShiftKind::None && g.aligned_turn.is_none())
    }

    /// Open goals (active or shifted), in declaration order
    pub fn open_goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.iter().filter(|g| g.status.is_open())
    }

    /// Pop a resolved top and return to the goal it displaced.
    ///
    /// A goal displaced by a soft shift is reactivated; one displaced by a
    /// hard shift was dropped by the user and is abandoned. The bottom
    /// entry is never popped, so the stack stays non-empty.
    pub fn settle(&mut self) {
        while self.stack.len() > 1 {
            let top = self.stack[self.stack.len() - 1];
            if !self.goals[top].status.is_terminal() {
                return;
            }
            self.stack.pop();
            let below = self.stack[self.stack.len() - 1];
            let goal = &mut self.goals[below];
            match goal.status {
                GoalStatus::Shifted if goal.displaced_by == Some(ShiftKind::Soft) => {
                    goal.status = GoalStatus::Active;
                    return;
                }
                GoalStatus::Shifted => goal.status = GoalStatus::Abandoned,
                _ => {}
            }
        }
    }

    /// Every declared goal is resolved or abandoned
    pub fn all_terminal(&self) -> bool {
        self.goals.iter().all(|g| g.status.is_terminal())
    }

    /// Force every unfinished goal to abandoned and return the goal timeline.
    pub fn finalize(mut self) -> Vec<Goal> {
        for goal in &mut self.goals {
            if !goal.status.is_terminal() {
                goal.status = GoalStatus::Abandoned;
            }
        }
        self.goals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::entities::ShiftTrigger;
    use crate::goal::predicate::SuccessPredicate;
    use crate::persona::mood::Mood;

    fn spec(id: &str, category: &str) -> GoalSpec {
        GoalSpec::new(id, category, format!("do {}", id), SuccessPredicate::tool_succeeded(id))
    }

    fn adjacency() -> AdjacencyTable {
        AdjacencyTable::new().with_class(["registration", "waitlist"])
    }

    fn sequencer() -> GoalSequencer {
        GoalSequencer::new([
            spec("g1", "registration"),
            spec("g2", "waitlist").with_trigger(ShiftTrigger::AtTurn { turn: 3 }),
            spec("g3", "refund").with_trigger(ShiftTrigger::OnPreviousResolved),
        ])
    }

    #[test]
    fn test_activate_first() {
        let mut seq = sequencer();
        assert!(seq.current_goal().is_none());
        assert!(seq.activate_first(1));
        let current = seq.current_goal().unwrap();
        assert_eq!(current.id().as_str(), "g1");
        assert_eq!(current.status, GoalStatus::Active);

        let mut empty = GoalSequencer::new(Vec::new());
        assert!(!empty.activate_first(1));
    }

    #[test]
    fn test_inject_shift_demotes_and_classifies() {
        let mut seq = sequencer();
        seq.activate_first(1);

        let event = seq.inject_shift(3, &adjacency()).unwrap();
        assert_eq!(event.kind, ShiftKind::Soft);
        assert_eq!(event.trigger_turn, 3);
        assert_eq!(seq.goals()[0].status, GoalStatus::Shifted);
        assert_eq!(seq.current_goal().unwrap().id().as_str(), "g2");
        assert_eq!(seq.current_goal().unwrap().trigger_turn, Some(3));

        let event = seq.inject_shift(7, &adjacency()).unwrap();
        assert_eq!(event.kind, ShiftKind::Hard);
        assert!(seq.inject_shift(9, &adjacency()).is_none());
    }

    #[test]
    fn test_resolved_goal_is_not_demoted() {
        let mut seq = sequencer();
        seq.activate_first(1);
        assert!(seq.mark_resolved(&GoalId::new("g1"), 2));
        seq.inject_shift(3, &adjacency());
        assert_eq!(seq.goals()[0].status, GoalStatus::Resolved);
    }

    #[test]
    fn test_settle_reactivates_after_soft_shift() {
        let mut seq = sequencer();
        seq.activate_first(1);
        seq.inject_shift(3, &adjacency());
        seq.mark_resolved(&GoalId::new("g2"), 4);
        seq.settle();
        assert_eq!(seq.stack_depth(), 1);
        assert_eq!(seq.current_goal().unwrap().id().as_str(), "g1");
        assert_eq!(seq.current_goal().unwrap().status, GoalStatus::Active);
    }

    #[test]
    fn test_settle_abandons_after_hard_shift() {
        let mut seq = GoalSequencer::new([
            spec("g1", "registration"),
            spec("g2", "refund").with_trigger(ShiftTrigger::AtTurn { turn: 3 }),
        ]);
        seq.activate_first(1);
        let event = seq.inject_shift(3, &adjacency()).unwrap();
        assert_eq!(event.kind, ShiftKind::Hard);
        seq.mark_resolved(&GoalId::new("g2"), 6);
        seq.settle();
        assert_eq!(seq.goals()[0].status, GoalStatus::Abandoned);
        assert_eq!(seq.stack_depth(), 1);
        assert!(seq.all_terminal());
    }

    #[test]
    fn test_settle_never_empties_stack() {
        let mut seq = sequencer();
        seq.activate_first(1);
        seq.mark_resolved(&GoalId::new("g1"), 2);
        seq.settle();
        assert_eq!(seq.stack_depth(), 1);
    }

    #[test]
    fn test_shift_due_uses_next_pending_trigger() {
        let mut seq = sequencer();
        seq.activate_first(1);
        let mut ctx = TriggerContext {
            next_user_turn: 2,
            top_resolved: false,
            unresolved_agent_turns: 0,
            mood: Mood::Calm,
        };
        assert!(!seq.shift_due(&ctx));
        ctx.next_user_turn = 3;
        assert!(seq.shift_due(&ctx));
    }

    #[test]
    fn test_alignment_is_recorded_once() {
        let mut seq = sequencer();
        seq.activate_first(1);
        seq.inject_shift(3, &adjacency());
        assert_eq!(seq.awaiting_alignment().unwrap().id().as_str(), "g2");
        seq.note_alignment(&GoalId::new("g2"), 4);
        seq.note_alignment(&GoalId::new("g2"), 6);
        assert_eq!(seq.get(&GoalId::new("g2")).unwrap().aligned_turn, Some(4));
        assert!(seq.awaiting_alignment().is_none());
    }

    #[test]
    fn test_finalize_abandons_unfinished_goals() {
        let mut seq = sequencer();
        seq.activate_first(1);
        seq.inject_shift(3, &adjacency());
        seq.mark_resolved(&GoalId::new("g2"), 4);

        let timeline = seq.finalize();
        assert_eq!(timeline.len(), 3);
        assert!(timeline.iter().all(|g| g.status.is_terminal()));
        assert_eq!(timeline[0].status, GoalStatus::Abandoned);
        assert_eq!(timeline[1].status, GoalStatus::Resolved);
        assert_eq!(timeline[2].status, GoalStatus::Abandoned);
    }
}

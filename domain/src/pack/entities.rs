//! Domain pack and task definitions

use crate::core::error::DomainError;
use crate::goal::adjacency::AdjacencyTable;
use crate::goal::entities::GoalSpec;
use crate::goal::sequencer::GoalSequencer;
use crate::persona::entities::Persona;
use crate::tool::entities::{ToolDefinition, ToolSpec};
use crate::tool::records::RecordStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One evaluation task inside a pack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    /// Name of the pack this task belongs to; filled in by the loader when absent
    #[serde(default)]
    pub pack: String,
    #[serde(alias = "persona")]
    pub persona_id: String,
    #[serde(default)]
    pub description: String,
    pub goals: Vec<GoalSpec>,
    /// Maximum number of turns (user and agent messages combined)
    pub turn_budget: usize,
}

impl TaskDefinition {
    pub fn new(id: impl Into<String>, persona_id: impl Into<String>, turn_budget: usize) -> Self {
        Self {
            id: id.into(),
            pack: String::new(),
            persona_id: persona_id.into(),
            description: String::new(),
            goals: Vec::new(),
            turn_budget,
        }
    }

    pub fn with_goal(mut self, goal: GoalSpec) -> Self {
        self.goals.push(goal);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Build the goal sequencer for a run of this task.
    ///
    /// A task without goals cannot be run and aborts with a domain data error.
    pub fn sequencer(&self) -> Result<GoalSequencer, DomainError> {
        if self.goals.is_empty() {
            return Err(DomainError::DomainData(format!(
                "task '{}' declares no goals",
                self.id
            )));
        }
        Ok(GoalSequencer::new(self.goals.iter().cloned()))
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.turn_budget == 0 {
            return Err(DomainError::InvalidTask(format!(
                "task '{}' has a zero turn budget",
                self.id
            )));
        }
        let mut seen = std::collections::HashSet::new();
        for goal in &self.goals {
            if !seen.insert(goal.id.as_str()) {
                return Err(DomainError::InvalidTask(format!(
                    "task '{}' declares goal '{}' twice",
                    self.id, goal.id
                )));
            }
        }
        Ok(())
    }
}

/// Data-only description of one evaluation domain
#[derive(Debug, Clone, Default)]
pub struct DomainPack {
    pub name: String,
    /// Policy document handed to the agent with its first request
    pub policy: String,
    pub records: RecordStore,
    pub tools: ToolSpec,
    pub tasks: Vec<TaskDefinition>,
    pub personas: HashMap<String, Persona>,
    pub adjacency: AdjacencyTable,
}

impl DomainPack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_policy(mut self, policy: impl Into<String>) -> Self {
        self.policy = policy.into();
        self
    }

    pub fn with_records(mut self, records: RecordStore) -> Self {
        self.records = records;
        self
    }

    pub fn with_tool(mut self, tool: ToolDefinition) -> Self {
        self.tools = self.tools.register(tool);
        self
    }

    pub fn with_task(mut self, mut task: TaskDefinition) -> Self {
        if task.pack.is_empty() {
            task.pack = self.name.clone();
        }
        self.tasks.push(task);
        self
    }

    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.personas.insert(persona.id.clone(), persona);
        self
    }

    pub fn with_adjacency(mut self, adjacency: AdjacencyTable) -> Self {
        self.adjacency = adjacency;
        self
    }

    pub fn task(&self, id: &str) -> Option<&TaskDefinition> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Persona referenced by a task; absence is fatal to that task only
    pub fn persona(&self, id: &str) -> Result<&Persona, DomainError> {
        self.personas.get(id).ok_or_else(|| {
            DomainError::DomainData(format!("persona '{}' is not present in pack '{}'", id, self.name))
        })
    }

    /// Pack-wide structural checks.
    ///
    /// Missing personas, records or goals are left to surface per task.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.tools.check()?;
        for persona in self.personas.values() {
            persona.validate()?;
        }
        for task in &self.tasks {
            task.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal::predicate::SuccessPredicate;
    use crate::persona::entities::TraitVector;
    use crate::tool::entities::{ToolAccess, ToolEffect, ToolParameter};

    fn goal(id: &str) -> GoalSpec {
        GoalSpec::new(id, "registration", "Register me", SuccessPredicate::tool_succeeded("register"))
    }

    #[test]
    fn test_task_without_goals_is_domain_data_error() {
        let task = TaskDefinition::new("t1", "p1", 10);
        assert!(task.sequencer().unwrap_err().is_domain_data());
        let task = task.with_goal(goal("g1"));
        assert_eq!(task.sequencer().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_persona() {
        let pack = DomainPack::new("uni").with_persona(Persona::new("p1", TraitVector::neutral()));
        assert!(pack.persona("p1").is_ok());
        assert!(pack.persona("p2").unwrap_err().is_domain_data());
    }

    #[test]
    fn test_validate_rejects_read_tool_with_write_effect() {
        let pack = DomainPack::new("uni").with_tool(
            ToolDefinition::new(
                "drop_course",
                ToolAccess::Read,
                ToolEffect::Update {
                    collection: "enrollments".to_string(),
                    key_arg: "id".to_string(),
                    fields: vec![],
                },
            )
            .with_parameter(ToolParameter::new("id", true)),
        );
        assert!(matches!(pack.validate(), Err(DomainError::InvalidToolSchema(_))));
    }

    #[test]
    fn test_task_inherits_pack_name_and_validates() {
        let pack = DomainPack::new("uni").with_task(
            TaskDefinition::new("t1", "p1", 10)
                .with_goal(goal("g1"))
                .with_goal(goal("g1")),
        );
        assert_eq!(pack.task("t1").unwrap().pack, "uni");
        assert!(matches!(pack.validate(), Err(DomainError::InvalidTask(_))));
    }

    #[test]
    fn test_task_deserializes_persona_alias() {
        let task: TaskDefinition = serde_json::from_str(
            r#"{
                "id": "t1",
                "persona": "p1",
                "turn_budget": 12,
                "goals": [
                    {"id": "g1", "category": "registration", "description": "Register me",
                     "success": {"kind": "tool_succeeded", "tool": "register"}},
                    {"id": "g2", "category": "waitlist", "description": "Waitlist me",
                     "success": {"kind": "tool_succeeded", "tool": "waitlist"},
                     "trigger": {"kind": "at_turn", "turn": 3}}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(task.persona_id, "p1");
        assert_eq!(task.goals.len(), 2);
        assert!(task.goals[1].trigger.is_some());
    }
}

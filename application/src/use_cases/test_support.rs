//! Fixtures shared by the use case tests.

use crate::config::EvaluationConfig;
use crate::ports::agent_adapter::{AdapterError, AgentAdapter, AgentRequest, AgentResponse};
use async_trait::async_trait;
use changebench_domain::{
    AdjacencyTable, DomainPack, GoalSpec, Persona, RecordStore, ScoreWeights, ShiftTrigger, SuccessPredicate,
    TaskDefinition, ToolAccess, ToolCall, ToolDefinition, ToolEffect, ToolParameter, TraitVector,
};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One scripted agent turn
#[derive(Clone)]
pub(crate) enum Step {
    Reply(AgentResponse),
    Stall,
    Fail(String),
    Panic,
}

pub(crate) fn reply(content: &str) -> Step {
    Step::Reply(AgentResponse::new(content))
}

pub(crate) fn reply_with(content: &str, call: ToolCall) -> Step {
    Step::Reply(AgentResponse::new(content).with_tool_call(call))
}

/// Agent that answers from a per-task script, indexed by its own turn ordinal
#[derive(Default)]
pub(crate) struct ScriptedAdapter {
    scripts: HashMap<String, Vec<Step>>,
    pub requests: Mutex<Vec<AgentRequest>>,
}

impl ScriptedAdapter {
    pub fn with_script(mut self, task_id: &str, steps: Vec<Step>) -> Self {
        self.scripts.insert(task_id.to_string(), steps);
        self
    }

    pub fn requests_for(&self, task_id: &str) -> Vec<AgentRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.task_id == task_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl AgentAdapter for ScriptedAdapter {
    async fn respond(&self, request: AgentRequest) -> Result<AgentResponse, AdapterError> {
        let ordinal = request.turn_index / 2 - 1;
        let step = self
            .scripts
            .get(&request.task_id)
            .and_then(|steps| steps.get(ordinal))
            .cloned()
            .unwrap_or_else(|| reply("Is there anything else I can do?"));
        self.requests.lock().unwrap().push(request);
        match step {
            Step::Reply(response) => Ok(response),
            Step::Stall => std::future::pending().await,
            Step::Fail(message) => Err(AdapterError::RequestFailed(message)),
            Step::Panic => panic!("scripted adapter crashed"),
        }
    }
}

pub(crate) fn register_call(enrollment: &str) -> ToolCall {
    ToolCall::new("register")
        .with_arg("enrollment_id", enrollment)
        .with_arg("course_id", "CS101")
}

pub(crate) fn waitlist_call() -> ToolCall {
    ToolCall::new("join_waitlist")
        .with_arg("student_id", "s1")
        .with_arg("course_id", "CS101")
}

fn register_goal() -> GoalSpec {
    GoalSpec::new(
        "enroll",
        "registration",
        "I want to register for CS101.",
        SuccessPredicate::tool_succeeded("register"),
    )
    .with_keywords(["register", "cs101"])
}

/// University pack with a single-goal task and a soft-shift task
pub(crate) fn uni_pack() -> Arc<DomainPack> {
    uni_pack_with(AdjacencyTable::new().with_class(["registration", "waitlist"]))
}

/// Same pack where registration and waitlist are unrelated, so "shift" is hard
pub(crate) fn hard_shift_pack() -> Arc<DomainPack> {
    uni_pack_with(AdjacencyTable::new())
}

fn uni_pack_with(adjacency: AdjacencyTable) -> Arc<DomainPack> {
    let records = RecordStore::from_json(json!({
        "courses": {"CS101": {"title": "Intro", "seats": 0}},
        "enrollments": {},
        "waitlist": {}
    }))
    .unwrap();

    Arc::new(
        DomainPack::new("uni")
            .with_policy("Only registered students may enroll.")
            .with_records(records)
            .with_adjacency(adjacency)
            .with_persona(Persona::new("calm", TraitVector::neutral()))
            .with_tool(
                ToolDefinition::new(
                    "get_course",
                    ToolAccess::Read,
                    ToolEffect::Lookup {
                        collection: "courses".to_string(),
                        key_arg: "course_id".to_string(),
                    },
                )
                .with_parameter(ToolParameter::new("course_id", true)),
            )
            .with_tool(
                ToolDefinition::new(
                    "register",
                    ToolAccess::Write,
                    ToolEffect::Create {
                        collection: "enrollments".to_string(),
                        key_arg: "enrollment_id".to_string(),
                    },
                )
                .with_parameter(ToolParameter::new("enrollment_id", true))
                .with_parameter(ToolParameter::new("course_id", true)),
            )
            .with_tool(
                ToolDefinition::new(
                    "join_waitlist",
                    ToolAccess::Write,
                    ToolEffect::Create {
                        collection: "waitlist".to_string(),
                        key_arg: "student_id".to_string(),
                    },
                )
                .with_parameter(ToolParameter::new("student_id", true))
                .with_parameter(ToolParameter::new("course_id", true)),
            )
            .with_task(TaskDefinition::new("register", "calm", 8).with_goal(register_goal()))
            .with_task(
                TaskDefinition::new("shift", "calm", 12)
                    .with_goal(register_goal())
                    .with_goal(
                        GoalSpec::new(
                            "waitlist",
                            "waitlist",
                            "Please put me on the waitlist too.",
                            SuccessPredicate::tool_succeeded("join_waitlist"),
                        )
                        .with_keywords(["waitlist"])
                        .with_trigger(ShiftTrigger::AtTurn { turn: 3 }),
                    ),
            ),
    )
}

pub(crate) fn config() -> Arc<EvaluationConfig> {
    Arc::new(EvaluationConfig::new(ScoreWeights::uniform()).with_agent_timeout(Duration::from_millis(50)))
}

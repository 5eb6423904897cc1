//! Tool domain entities

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Whether a tool reads or writes task data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolAccess {
    /// Read-designated: must be idempotent within a task
    #[default]
    Read,
    /// Stateful: may change the task-local data overlay
    Write,
}

impl ToolAccess {
    pub fn as_str(&self) -> &str {
        match self {
            ToolAccess::Read => "read",
            ToolAccess::Write => "write",
        }
    }

    pub fn is_read(&self) -> bool {
        matches!(self, ToolAccess::Read)
    }
}

impl std::fmt::Display for ToolAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JSON type a parameter must carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    #[default]
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl ParamType {
    pub fn as_str(&self) -> &str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Number => "number",
            ParamType::Boolean => "boolean",
            ParamType::Array => "array",
            ParamType::Object => "object",
        }
    }

    pub fn accepts(&self, value: &serde_json::Value) -> bool {
        match self {
            ParamType::String => value.is_string(),
            ParamType::Integer => value.is_i64() || value.is_u64(),
            ParamType::Number => value.is_number(),
            ParamType::Boolean => value.is_boolean(),
            ParamType::Array => value.is_array(),
            ParamType::Object => value.is_object(),
        }
    }
}

impl std::fmt::Display for ParamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What executing a tool does to the pack's backing records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolEffect {
    /// Return `collection[args[key_arg]]`
    Lookup { collection: String, key_arg: String },
    /// Return every record whose fields equal the provided `match_args`
    Search {
        collection: String,
        match_args: Vec<String>,
    },
    /// Copy the provided `fields` args onto `collection[args[key_arg]]`
    Update {
        collection: String,
        key_arg: String,
        fields: Vec<String>,
    },
    /// Insert a record built from the remaining args under `args[key_arg]`
    Create { collection: String, key_arg: String },
}

impl ToolEffect {
    pub fn collection(&self) -> &str {
        match self {
            ToolEffect::Lookup { collection, .. }
            | ToolEffect::Search { collection, .. }
            | ToolEffect::Update { collection, .. }
            | ToolEffect::Create { collection, .. } => collection,
        }
    }

    pub fn is_write(&self) -> bool {
        matches!(self, ToolEffect::Update { .. } | ToolEffect::Create { .. })
    }
}

/// Schema of a tool declared by a domain pack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool (e.g., "get_course")
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub access: ToolAccess,
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    pub effect: ToolEffect,
    /// Tools that must have succeeded earlier in the same task
    #[serde(default)]
    pub preconditions: Vec<String>,
    /// Rejected as unauthorized before an authenticating tool succeeds
    #[serde(default)]
    pub requires_auth: bool,
    /// A successful call authenticates the simulated customer
    #[serde(default)]
    pub authenticates: bool,
    /// Simulated execution latency
    #[serde(default)]
    pub latency_ms: u64,
}

/// Parameter specification for a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, rename = "type")]
    pub param_type: ParamType,
    /// Permitted value domain, when restricted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<serde_json::Value>>,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, access: ToolAccess, effect: ToolEffect) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            access,
            parameters: Vec::new(),
            effect,
            preconditions: Vec::new(),
            requires_auth: false,
            authenticates: false,
            latency_ms: 0,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_parameter(mut self, param: ToolParameter) -> Self {
        self.parameters.push(param);
        self
    }

    pub fn with_precondition(mut self, tool: impl Into<String>) -> Self {
        self.preconditions.push(tool.into());
        self
    }

    pub fn with_auth_required(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn authenticating(mut self) -> Self {
        self.authenticates = true;
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ToolParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Structural consistency: read tools must not write, and effect
    /// arguments must be declared parameters.
    pub fn check(&self) -> Result<(), DomainError> {
        if self.access.is_read() && self.effect.is_write() {
            return Err(DomainError::InvalidToolSchema(format!(
                "read tool '{}' declares a write effect",
                self.name
            )));
        }
        let referenced: Vec<&str> = match &self.effect {
            ToolEffect::Lookup { key_arg, .. } | ToolEffect::Create { key_arg, .. } => vec![key_arg],
            ToolEffect::Search { match_args, .. } => match_args.iter().map(String::as_str).collect(),
            ToolEffect::Update { key_arg, fields, .. } => std::iter::once(key_arg.as_str())
                .chain(fields.iter().map(String::as_str))
                .collect(),
        };
        for arg in referenced {
            if self.parameter(arg).is_none() {
                return Err(DomainError::InvalidToolSchema(format!(
                    "tool '{}' effect uses undeclared parameter '{}'",
                    self.name, arg
                )));
            }
        }
        Ok(())
    }
}

impl ToolParameter {
    pub fn new(name: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            required,
            param_type: ParamType::String,
            allowed_values: None,
        }
    }

    pub fn with_type(mut self, param_type: ParamType) -> Self {
        self.param_type = param_type;
        self
    }

    pub fn with_allowed(mut self, values: impl IntoIterator<Item = impl Into<serde_json::Value>>) -> Self {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Registry of the tools a pack declares
#[derive(Debug, Clone, Default)]
pub struct ToolSpec {
    tools: HashMap<String, ToolDefinition>,
}

impl ToolSpec {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(mut self, tool: ToolDefinition) -> Self {
        self.tools.insert(tool.name.clone(), tool);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.get(name)
    }

    pub fn all(&self) -> impl Iterator<Item = &ToolDefinition> {
        self.tools.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn check(&self) -> Result<(), DomainError> {
        self.tools.values().try_for_each(ToolDefinition::check)
    }
}

impl FromIterator<ToolDefinition> for ToolSpec {
    fn from_iter<I: IntoIterator<Item = ToolDefinition>>(iter: I) -> Self {
        iter.into_iter().fold(ToolSpec::new(), ToolSpec::register)
    }
}

/// A call to a tool with arguments, as emitted by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub tool_name: String,
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,
}

impl ToolCall {
    pub fn new(tool_name: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }

    /// Key identifying "the same call": name plus canonical argument JSON
    pub fn identity(&self) -> (String, String) {
        (self.tool_name.clone(), normalized_args(&self.arguments))
    }
}

/// Canonical string for an argument map: keys sorted at every depth, arrays
/// of scalars sorted so that reordered lists compare equal.
pub fn normalized_args(args: &HashMap<String, serde_json::Value>) -> String {
    let object: serde_json::Map<String, serde_json::Value> = args
        .iter()
        .map(|(k, v)| (k.clone(), normalize_value(v)))
        .collect();
    canonical(&serde_json::Value::Object(object))
}

fn normalize_value(value: &serde_json::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), normalize_value(v)))
                .collect(),
        ),
        Value::Array(items) => {
            let mut items: Vec<Value> = items.iter().map(normalize_value).collect();
            items.sort_by_key(canonical);
            Value::Array(items)
        }
        other => other.clone(),
    }
}

fn canonical(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let parts: Vec<String> = keys
                .into_iter()
                .map(|k| format!("{:?}:{}", k, canonical(&map[k])))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(canonical).collect();
            format!("[{}]", parts.join(","))
        }
        other => other.to_string(),
    }
}

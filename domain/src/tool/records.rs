//! Backing records and the task-local overlay
//!
//! The pack's [`RecordStore`] is immutable and shared by every running task.
//! Writes made by stateful tools land in a per-task [`RecordOverlay`];
//! reads see the overlay first, then the store.

use super::entities::{ToolCall, ToolEffect};
use super::value_objects::{ToolError, ToolOutcome};
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

type Collection = BTreeMap<String, Value>;

/// Read access to task data, used by tools and success predicates
pub trait RecordView {
    fn has_collection(&self, collection: &str) -> bool;

    fn get(&self, collection: &str, key: &str) -> Option<&Value>;

    /// Every record of a collection, keyed and sorted by record key
    fn records(&self, collection: &str) -> Vec<(&str, &Value)>;
}

/// Structured backing records of a domain pack
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordStore {
    collections: BTreeMap<String, Collection>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `{ "collection": { "key": record, ... }, ... }`
    pub fn from_json(value: Value) -> Result<Self, DomainError> {
        serde_json::from_value(value)
            .map_err(|e| DomainError::DomainData(format!("malformed records: {}", e)))
    }

    pub fn with_record(mut self, collection: impl Into<String>, key: impl Into<String>, record: Value) -> Self {
        self.collections
            .entry(collection.into())
            .or_default()
            .insert(key.into(), record);
        self
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collections.entry(collection.into()).or_default();
        self
    }
}

impl RecordView for RecordStore {
    fn has_collection(&self, collection: &str) -> bool {
        self.collections.contains_key(collection)
    }

    fn get(&self, collection: &str, key: &str) -> Option<&Value> {
        self.collections.get(collection)?.get(key)
    }

    fn records(&self, collection: &str) -> Vec<(&str, &Value)> {
        self.collections
            .get(collection)
            .map(|c| c.iter().map(|(k, v)| (k.as_str(), v)).collect())
            .unwrap_or_default()
    }
}

/// Writes made during one task
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordOverlay {
    writes: BTreeMap<String, Collection>,
    #[serde(skip)]
    versions: HashMap<String, u64>,
}

impl RecordOverlay {
    fn put(&mut self, collection: &str, key: String, record: Value) {
        self.writes
            .entry(collection.to_string())
            .or_default()
            .insert(key, record);
        *self.versions.entry(collection.to_string()).or_default() += 1;
    }

    /// Number of writes applied to a collection so far
    pub fn version(&self, collection: &str) -> u64 {
        self.versions.get(collection).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }
}

/// Store + overlay as seen by one task
pub struct TaskRecords<'a> {
    base: &'a RecordStore,
    overlay: &'a RecordOverlay,
}

impl<'a> TaskRecords<'a> {
    pub fn new(base: &'a RecordStore, overlay: &'a RecordOverlay) -> Self {
        Self { base, overlay }
    }
}

impl RecordView for TaskRecords<'_> {
    fn has_collection(&self, collection: &str) -> bool {
        self.base.has_collection(collection)
    }

    fn get(&self, collection: &str, key: &str) -> Option<&Value> {
        self.overlay
            .writes
            .get(collection)
            .and_then(|c| c.get(key))
            .or_else(|| self.base.get(collection, key))
    }

    fn records(&self, collection: &str) -> Vec<(&str, &Value)> {
        let mut merged: BTreeMap<&str, &Value> = self.base.records(collection).into_iter().collect();
        if let Some(written) = self.overlay.writes.get(collection) {
            for (key, value) in written {
                merged.insert(key.as_str(), value);
            }
        }
        merged.into_iter().collect()
    }
}

fn key_of(call: &ToolCall, key_arg: &str) -> Result<String, ToolError> {
    match call.arguments.get(key_arg) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ToolError::invalid_args(format!(
            "Missing key argument '{}'",
            key_arg
        ))),
    }
}

/// Apply a tool effect to task data.
///
/// Tool-level problems come back as a failed [`ToolOutcome`]; an effect that
/// names a collection the pack lacks is a [`DomainError::DomainData`].
pub fn execute_effect(
    effect: &ToolEffect,
    call: &ToolCall,
    base: &RecordStore,
    overlay: &mut RecordOverlay,
) -> Result<ToolOutcome, DomainError> {
    let collection = effect.collection();
    if !base.has_collection(collection) {
        return Err(DomainError::missing_collection(collection));
    }

    let outcome = match effect {
        ToolEffect::Lookup { key_arg, .. } => {
            let view = TaskRecords::new(base, overlay);
            match key_of(call, key_arg) {
                Ok(key) => match view.get(collection, &key) {
                    Some(record) => ToolOutcome::Success(record.clone()),
                    None => ToolError::not_found(format!("{} '{}'", collection, key)).into(),
                },
                Err(e) => e.into(),
            }
        }
        ToolEffect::Search { match_args, .. } => {
            let view = TaskRecords::new(base, overlay);
            let criteria: Vec<(&String, &Value)> = match_args
                .iter()
                .filter_map(|field| call.arguments.get(field).map(|v| (field, v)))
                .collect();
            let hits: Map<String, Value> = view
                .records(collection)
                .into_iter()
                .filter(|(_, record)| {
                    criteria
                        .iter()
                        .all(|(field, expected)| record.get(field.as_str()) == Some(*expected))
                })
                .map(|(key, record)| (key.to_string(), record.clone()))
                .collect();
            ToolOutcome::Success(Value::Object(hits))
        }
        ToolEffect::Update { key_arg, fields, .. } => match key_of(call, key_arg) {
            Ok(key) => {
                let existing = TaskRecords::new(base, overlay).get(collection, &key).cloned();
                match existing {
                    Some(Value::Object(mut record)) => {
                        for field in fields {
                            if let Some(value) = call.arguments.get(field) {
                                record.insert(field.clone(), value.clone());
                            }
                        }
                        let record = Value::Object(record);
                        overlay.put(collection, key, record.clone());
                        ToolOutcome::Success(record)
                    }
                    Some(_) => {
                        return Err(DomainError::DomainData(format!(
                            "record {}['{}'] is not an object",
                            collection, key
                        )));
                    }
                    None => ToolError::not_found(format!("{} '{}'", collection, key)).into(),
                }
            }
            Err(e) => e.into(),
        },
        ToolEffect::Create { key_arg, .. } => match key_of(call, key_arg) {
            Ok(key) => {
                if TaskRecords::new(base, overlay).get(collection, &key).is_some() {
                    ToolError::invalid_args(format!("{} '{}' already exists", collection, key)).into()
                } else {
                    let record: Map<String, Value> = call
                        .arguments
                        .iter()
                        .filter(|(name, _)| name.as_str() != key_arg)
                        .map(|(name, value)| (name.clone(), value.clone()))
                        .collect();
                    let record = Value::Object(record);
                    overlay.put(collection, key, record.clone());
                    ToolOutcome::Success(record)
                }
            }
            Err(e) => e.into(),
        },
    };
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> RecordStore {
        RecordStore::new()
            .with_record("courses", "CS101", json!({"title": "Intro", "dept": "CS", "seats": 3}))
            .with_record("courses", "MA201", json!({"title": "Calculus", "dept": "MA", "seats": 0}))
            .with_collection("enrollments")
    }

    fn lookup() -> ToolEffect {
        ToolEffect::Lookup {
            collection: "courses".to_string(),
            key_arg: "course_id".to_string(),
        }
    }

    #[test]
    fn test_lookup_found_and_missing() {
        let store = store();
        let mut overlay = RecordOverlay::default();
        let call = ToolCall::new("get_course").with_arg("course_id", "CS101");
        let outcome = execute_effect(&lookup(), &call, &store, &mut overlay).unwrap();
        assert_eq!(outcome, ToolOutcome::Success(json!({"title": "Intro", "dept": "CS", "seats": 3})));

        let call = ToolCall::new("get_course").with_arg("course_id", "XX999");
        let outcome = execute_effect(&lookup(), &call, &store, &mut overlay).unwrap();
        assert_eq!(outcome.error_kind(), Some(crate::tool::ToolErrorKind::NotFound));
    }

    #[test]
    fn test_missing_collection_is_domain_data_error() {
        let store = RecordStore::new();
        let mut overlay = RecordOverlay::default();
        let call = ToolCall::new("get_course").with_arg("course_id", "CS101");
        let err = execute_effect(&lookup(), &call, &store, &mut overlay).unwrap_err();
        assert!(err.is_domain_data());
    }

    #[test]
    fn test_search_filters_by_provided_args() {
        let store = store();
        let mut overlay = RecordOverlay::default();
        let effect = ToolEffect::Search {
            collection: "courses".to_string(),
            match_args: vec!["dept".to_string()],
        };
        let call = ToolCall::new("search_courses").with_arg("dept", "MA");
        let ToolOutcome::Success(Value::Object(hits)) =
            execute_effect(&effect, &call, &store, &mut overlay).unwrap()
        else {
            panic!("expected object result");
        };
        assert_eq!(hits.len(), 1);
        assert!(hits.contains_key("MA201"));
    }

    #[test]
    fn test_create_then_update_goes_to_overlay() {
        let store = store();
        let mut overlay = RecordOverlay::default();
        let create = ToolEffect::Create {
            collection: "enrollments".to_string(),
            key_arg: "enrollment_id".to_string(),
        };
        let call = ToolCall::new("register")
            .with_arg("enrollment_id", "e1")
            .with_arg("course_id", "CS101");
        assert!(execute_effect(&create, &call, &store, &mut overlay).unwrap().is_success());
        assert_eq!(overlay.version("enrollments"), 1);

        let duplicate = execute_effect(&create, &call, &store, &mut overlay).unwrap();
        assert_eq!(duplicate.error_kind(), Some(crate::tool::ToolErrorKind::InvalidArgs));

        let update = ToolEffect::Update {
            collection: "enrollments".to_string(),
            key_arg: "enrollment_id".to_string(),
            fields: vec!["status".to_string()],
        };
        let call = ToolCall::new("set_status")
            .with_arg("enrollment_id", "e1")
            .with_arg("status", "waitlisted");
        execute_effect(&update, &call, &store, &mut overlay).unwrap();

        let view = TaskRecords::new(&store, &overlay);
        assert_eq!(
            view.get("enrollments", "e1"),
            Some(&json!({"course_id": "CS101", "status": "waitlisted"}))
        );
        // the shared store is untouched
        assert!(store.get("enrollments", "e1").is_none());
    }
}

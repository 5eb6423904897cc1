//! Domain pack loader
//!
//! Reads a pack directory:
//!
//! | File | Content | Required |
//! |------|---------|----------|
//! | `policy.md` | policy document for the agent | no |
//! | `tools.json` | list of tool definitions | yes |
//! | `records.json` | `{ collection: { key: record } }` | yes |
//! | `tasks.json` | list of tasks, or `{ "tasks": [...] }` | yes |
//! | `personas.json` | `{ persona_id: persona }` | yes |
//! | `adjacency.json` | `{ "classes": [[category, ...], ...] }` | no |
//!
//! Only JSON shape and tool read/write consistency are checked here. A task
//! that references a missing persona or collection fails on its own at run
//! time.

use changebench_domain::{
    AdjacencyTable, DomainError, DomainPack, Persona, RecordStore, TaskDefinition, ToolDefinition,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum PackLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid pack: {0}")]
    Invalid(#[from] DomainError),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TasksFile {
    List(Vec<TaskDefinition>),
    Wrapped { tasks: Vec<TaskDefinition> },
}

impl TasksFile {
    fn into_tasks(self) -> Vec<TaskDefinition> {
        match self {
            TasksFile::List(tasks) | TasksFile::Wrapped { tasks } => tasks,
        }
    }
}

pub struct PackLoader;

impl PackLoader {
    /// Load the pack stored in `dir`; the pack is named after the directory
    pub fn load(dir: impl AsRef<Path>) -> Result<DomainPack, PackLoadError> {
        let dir = dir.as_ref();
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "pack".to_string());

        let policy = match read_optional(&dir.join("policy.md"))? {
            Some(text) => text,
            None => String::new(),
        };
        let tools: Vec<ToolDefinition> = read_json(&dir.join("tools.json"))?;
        let records: RecordStore = read_json(&dir.join("records.json"))?;
        let tasks: TasksFile = read_json(&dir.join("tasks.json"))?;
        let personas = read_personas(&dir.join("personas.json"))?;
        let adjacency_path = dir.join("adjacency.json");
        let adjacency: AdjacencyTable = match read_optional(&adjacency_path)? {
            Some(text) => parse(&adjacency_path, &text)?,
            None => AdjacencyTable::new(),
        };

        let pack = tools.into_iter().fold(
            DomainPack::new(name)
                .with_policy(policy)
                .with_records(records)
                .with_adjacency(adjacency),
            DomainPack::with_tool,
        );
        let pack = personas.into_iter().fold(pack, DomainPack::with_persona);
        let pack = tasks.into_tasks().into_iter().fold(pack, DomainPack::with_task);
        pack.validate()?;

        info!(
            pack = %pack.name,
            tools = pack.tools.len(),
            tasks = pack.tasks.len(),
            personas = pack.personas.len(),
            "Domain pack loaded"
        );
        Ok(pack)
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, PackLoadError> {
    if !path.exists() {
        debug!("Optional pack file {} not present", path.display());
        return Ok(None);
    }
    read_text(path).map(Some)
}

fn read_text(path: &Path) -> Result<String, PackLoadError> {
    std::fs::read_to_string(path).map_err(|source| PackLoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse<T: DeserializeOwned>(path: &Path, text: &str) -> Result<T, PackLoadError> {
    serde_json::from_str(text).map_err(|source| PackLoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, PackLoadError> {
    parse(path, &read_text(path)?)
}

/// Personas keyed by id; an entry without an `id` field takes its key
fn read_personas(path: &Path) -> Result<Vec<Persona>, PackLoadError> {
    let raw: BTreeMap<String, Value> = read_json(path)?;
    raw.into_iter()
        .map(|(id, mut value)| {
            if let Value::Object(map) = &mut value {
                map.entry("id").or_insert_with(|| Value::String(id));
            }
            serde_json::from_value(value).map_err(|source| PackLoadError::Parse {
                path: path.to_path_buf(),
                source,
            })
        })
        .collect()
}

//! Shift classification by category adjacency
//!
//! A pack declares adjacency classes: groups of goal categories that are
//! close enough that moving between them is a soft shift.

use super::entities::ShiftKind;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category → adjacency class lookup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "AdjacencyFile", into = "AdjacencyFile")]
pub struct AdjacencyTable {
    classes: Vec<Vec<String>>,
    class_of: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
struct AdjacencyFile {
    #[serde(default)]
    classes: Vec<Vec<String>>,
}

impl From<AdjacencyFile> for AdjacencyTable {
    fn from(file: AdjacencyFile) -> Self {
        file.classes
            .into_iter()
            .fold(AdjacencyTable::new(), |table, class| table.with_class(class))
    }
}

impl From<AdjacencyTable> for AdjacencyFile {
    fn from(table: AdjacencyTable) -> Self {
        AdjacencyFile {
            classes: table.classes,
        }
    }
}

impl AdjacencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class (builder pattern). A category listed twice keeps its first class.
    pub fn with_class(mut self, categories: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let index = self.classes.len();
        let class: Vec<String> = categories.into_iter().map(Into::into).collect();
        for category in &class {
            self.class_of.entry(category.clone()).or_insert(index);
        }
        self.classes.push(class);
        self
    }

    pub fn class_of(&self, category: &str) -> Option<usize> {
        self.class_of.get(category).copied()
    }

    /// Same category or same class is soft; anything else, including
    /// categories the table does not know, is hard.
    pub fn classify(&self, from: &str, to: &str) -> ShiftKind {
        if from == to {
            return ShiftKind::Soft;
        }
        match (self.class_of(from), self.class_of(to)) {
            (Some(a), Some(b)) if a == b => ShiftKind::Soft,
            _ => ShiftKind::Hard,
        }
    }
}

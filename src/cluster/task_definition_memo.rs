// Process-lifetime memo of task definitions.
// Definitions are immutable once registered, so entries never expire.
use std::sync::Arc;

use dashmap::DashMap;

use super::ecs_types::TaskDefinition;

#[derive(Default)]
pub struct TaskDefinitionMemo {
    definitions: DashMap<String, Arc<TaskDefinition>>,
}

impl TaskDefinitionMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, reference: &str) -> Option<Arc<TaskDefinition>> {
        self.definitions.get(reference).map(|entry| entry.value().clone())
    }

    /// Stores `definition` under `reference`. A reference already present
    /// keeps its first value.
    pub fn put(&self, reference: &str, definition: TaskDefinition) -> Arc<TaskDefinition> {
        self.definitions
            .entry(reference.to_string())
            .or_insert_with(|| Arc::new(definition))
            .value()
            .clone()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }
}

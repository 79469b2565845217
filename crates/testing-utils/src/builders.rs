//! Test data builders for creating migration tasks
//!
//! This module provides builder patterns for creating test data with
//! sensible defaults and easy customization.

use std::sync::Arc;

use migrator_domain::{AuthCredential, DestinationEndpoint, MigrationTask, SourceEndpoint};

/// Builder for creating test MigrationTask entities
pub struct MigrationTaskBuilder {
    task: MigrationTask,
}

impl MigrationTaskBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            task: MigrationTask::new(
                name,
                SourceEndpoint::new(format!("https://source.example.com/org/{name}.git")),
                DestinationEndpoint::new(format!("https://dest.example.com/org/{name}.git")),
            ),
        }
    }

    pub fn with_source_url(mut self, url: &str) -> Self {
        self.task.source.url = url.to_string();
        self
    }

    pub fn with_destination_url(mut self, url: &str) -> Self {
        self.task.destination.url = url.to_string();
        self
    }

    pub fn with_source_auth(mut self, auth: AuthCredential) -> Self {
        self.task.source.auth = auth;
        self
    }

    pub fn with_destination_auth(mut self, auth: AuthCredential) -> Self {
        self.task.destination.auth = auth;
        self
    }

    pub fn with_option(mut self, key: &str, value: serde_json::Value) -> Self {
        self.task.options.insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> MigrationTask {
        self.task
    }

    pub fn build_arc(self) -> Arc<MigrationTask> {
        Arc::new(self.task)
    }
}

/// Create `count` tasks named `repo-1` .. `repo-N`
pub fn numbered_tasks(count: usize) -> Vec<Arc<MigrationTask>> {
    (1..=count)
        .map(|i| MigrationTaskBuilder::new(&format!("repo-{i}")).build_arc())
        .collect()
}

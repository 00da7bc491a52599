//! Shared scaffolding for the integration suite.

use treeline::{EngineConfig, ProjectId, ProjectScope, TreeEngine};

pub fn engine() -> TreeEngine {
    TreeEngine::in_memory(EngineConfig::default())
}

pub fn scope() -> ProjectScope {
    ProjectScope::new(ProjectId(1), "org/p1/ws")
}

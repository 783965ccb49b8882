//! # Workspace Stores
//!
//! External collaborators the engine reads workspace state from.

pub mod in_memory;
pub mod traits;

pub use in_memory::InMemoryWorkspaceStore;
pub use traits::{
    AgentStore, ContextProvider, ExecutionLog, GoalStore, TaskStore, WorkspaceDirectory,
    WorkspaceStores,
};

mod layout_registry;
mod project_context;
mod source_tree;

pub use layout_registry::{ContextCandidates, FileLayoutRegistry, ModelSettings, ProjectLayout};
pub use project_context::{ContextEntry, ContextKind, ProjectContext};
pub use source_tree::{DiskSourceTree, SourceTree};

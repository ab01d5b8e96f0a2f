//! Per-project workspace trees: two namespace roots (`model` and
//! `templates`) of folders and files, the structural operations on them, and
//! a store that persists them and serializes writers per project.

pub mod engine;
pub mod error;
pub mod events;
pub mod path;
pub mod project;
pub mod store;
pub mod tree;

pub use error::{Result, WorkspaceError};
pub use events::{EventBus, WorkspaceEvent};
pub use project::{Project, ProjectLookup, ProjectRegistry};
pub use store::{DocumentStore, FsDocumentStore, MemoryDocumentStore, WorkspaceStore};
pub use tree::{File, Folder, Namespace, Workspace};

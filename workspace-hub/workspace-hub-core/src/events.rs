use serde::Serialize;
use tokio::sync::broadcast;

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum WorkspaceEvent {
    FolderCreated { project_id: String, path: String },
    FileCreated { project_id: String, path: String },
    FolderDeleted { project_id: String, path: String },
    FileDeleted { project_id: String, path: String },
    FolderRenamed { project_id: String, path: String, name: String },
    FileRenamed { project_id: String, path: String, name: String },
    FolderMoved { project_id: String, path: String, destination: String },
    FileMoved { project_id: String, path: String, destination: String },
    ContentUpdated { project_id: String, path: String },
}

impl WorkspaceEvent {
    pub fn project_id(&self) -> &str {
        match self {
            WorkspaceEvent::FolderCreated { project_id, .. }
            | WorkspaceEvent::FileCreated { project_id, .. }
            | WorkspaceEvent::FolderDeleted { project_id, .. }
            | WorkspaceEvent::FileDeleted { project_id, .. }
            | WorkspaceEvent::FolderRenamed { project_id, .. }
            | WorkspaceEvent::FileRenamed { project_id, .. }
            | WorkspaceEvent::FolderMoved { project_id, .. }
            | WorkspaceEvent::FileMoved { project_id, .. }
            | WorkspaceEvent::ContentUpdated { project_id, .. } => project_id,
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorkspaceEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(100);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkspaceEvent> {
        self.tx.subscribe()
    }

    /// Publish an event; dropped silently when nobody is listening.
    pub fn send(&self, event: WorkspaceEvent) {
        let _ = self.tx.send(event);
    }
}

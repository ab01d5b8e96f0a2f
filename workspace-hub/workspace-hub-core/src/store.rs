//! Per-project workspace persistence.
//!
//! Every operation that touches a project's tree holds that project's guard:
//! writers (structural mutations and content updates) take it exclusively,
//! readers take it shared. Different projects never wait on each other.

use crate::error::{Result, WorkspaceError};
use crate::events::{EventBus, WorkspaceEvent};
use crate::project::ProjectLookup;
use crate::tree::{File, Folder, Namespace, Workspace};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Key-value document storage keyed by project id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn load(&self, project_id: &str) -> anyhow::Result<Option<Workspace>>;
    async fn save(&self, project_id: &str, workspace: &Workspace) -> anyhow::Result<()>;
    async fn delete(&self, project_id: &str) -> anyhow::Result<()>;
}

/// Keeps workspaces in process memory. Loads hand out copies, so a caller
/// mutating its copy never affects the stored one until it saves.
#[derive(Default)]
pub struct MemoryDocumentStore {
    docs: tokio::sync::Mutex<HashMap<String, Workspace>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn load(&self, project_id: &str) -> anyhow::Result<Option<Workspace>> {
        Ok(self.docs.lock().await.get(project_id).cloned())
    }

    async fn save(&self, project_id: &str, workspace: &Workspace) -> anyhow::Result<()> {
        self.docs
            .lock()
            .await
            .insert(project_id.to_string(), workspace.clone());
        Ok(())
    }

    async fn delete(&self, project_id: &str) -> anyhow::Result<()> {
        self.docs.lock().await.remove(project_id);
        Ok(())
    }
}

/// One JSON document per project under a data directory.
pub struct FsDocumentStore {
    dir: PathBuf,
}

impl FsDocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Directory where workspace documents are persisted.
    pub fn data_dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, project_id: &str) -> anyhow::Result<PathBuf> {
        anyhow::ensure!(
            !project_id.is_empty()
                && project_id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
            "invalid project id '{}'",
            project_id
        );
        Ok(self.dir.join(format!("{}.json", project_id)))
    }
}

#[async_trait]
impl DocumentStore for FsDocumentStore {
    async fn load(&self, project_id: &str) -> anyhow::Result<Option<Workspace>> {
        let path = self.path(project_id)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(data) => Ok(Some(Workspace::from_json(&data)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, project_id: &str, workspace: &Workspace) -> anyhow::Result<()> {
        let path = self.path(project_id)?;
        // write then rename so readers only ever see a complete document
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, workspace.to_json()?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn delete(&self, project_id: &str) -> anyhow::Result<()> {
        let path = self.path(project_id)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

pub struct WorkspaceStore {
    docs: Arc<dyn DocumentStore>,
    projects: Arc<dyn ProjectLookup>,
    guards: Mutex<HashMap<String, Arc<RwLock<()>>>>,
    events: EventBus,
}

impl WorkspaceStore {
    pub fn new(docs: Arc<dyn DocumentStore>, projects: Arc<dyn ProjectLookup>) -> Self {
        Self {
            docs,
            projects,
            guards: Mutex::new(HashMap::new()),
            events: EventBus::new(),
        }
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    fn guard(&self, project_id: &str) -> Arc<RwLock<()>> {
        self.guards
            .lock()
            .entry(project_id.to_string())
            .or_default()
            .clone()
    }

    async fn ensure_project(&self, project_id: &str) -> Result<()> {
        if self.projects.exists(project_id).await? {
            Ok(())
        } else {
            Err(WorkspaceError::ProjectNotFound(project_id.to_string()))
        }
    }

    /// Stored workspace, or a fresh one when nothing has been saved yet.
    async fn load(&self, project_id: &str) -> Result<Workspace> {
        match self.docs.load(project_id).await? {
            Some(workspace) => Ok(workspace),
            None => {
                debug!("no workspace stored for {}, starting empty", project_id);
                Ok(Workspace::new())
            }
        }
    }

    pub async fn get_workspace(&self, project_id: &str) -> Result<Workspace> {
        self.ensure_project(project_id).await?;
        let guard = self.guard(project_id);
        let _read = guard.read().await;
        self.load(project_id).await
    }

    /// Persist an empty workspace for a newly created project. Existing
    /// documents are left alone.
    pub async fn create_workspace(&self, project_id: &str) -> Result<Workspace> {
        self.ensure_project(project_id).await?;
        let guard = self.guard(project_id);
        let _write = guard.write().await;
        if let Some(existing) = self.docs.load(project_id).await? {
            return Ok(existing);
        }
        let workspace = Workspace::new();
        self.docs.save(project_id, &workspace).await?;
        info!("initialized workspace for project {}", project_id);
        Ok(workspace)
    }

    /// Drop the stored workspace, and its guard once nobody else holds it.
    /// Does not consult the project lookup, so it can run after the project
    /// itself is gone.
    pub async fn delete_workspace(&self, project_id: &str) -> Result<()> {
        let guard = self.guard(project_id);
        {
            let _write = guard.write().await;
            self.docs.delete(project_id).await?;
        }
        drop(guard);
        // a task still waiting on the guard must keep sharing it with later callers
        let mut guards = self.guards.lock();
        if guards
            .get(project_id)
            .is_some_and(|g| Arc::strong_count(g) == 1)
        {
            guards.remove(project_id);
        }
        drop(guards);
        info!("deleted workspace for project {}", project_id);
        Ok(())
    }

    /// Run `op` against the namespace root `path` lives in while holding the
    /// project's guard exclusively, then persist and publish `event`.
    async fn write<T, F>(
        &self,
        project_id: &str,
        path: &str,
        event: WorkspaceEvent,
        op: F,
    ) -> Result<T>
    where
        F: FnOnce(&mut Folder) -> Result<T>,
    {
        self.ensure_project(project_id).await?;
        let namespace = Namespace::of_path(path)?;
        let guard = self.guard(project_id);
        let _write = guard.write().await;
        debug!("acquired guard for project {}", project_id);
        // the project may have been deleted while we waited
        self.ensure_project(project_id).await?;

        let mut workspace = self.load(project_id).await?;
        let out = match op(workspace.root_mut(namespace)) {
            Ok(out) => out,
            Err(err) => {
                warn!("rejected change to {} in project {}: {}", path, project_id, err);
                return Err(err);
            }
        };
        if let Err(err) = self.docs.save(project_id, &workspace).await {
            warn!("failed to persist workspace for project {}: {}", project_id, err);
            return Err(err.into());
        }
        info!("applied {:?}", event);
        self.events.send(event);
        Ok(out)
    }

    async fn read<T, F>(&self, project_id: &str, path: &str, op: F) -> Result<T>
    where
        F: FnOnce(&Folder) -> Result<T>,
    {
        self.ensure_project(project_id).await?;
        let namespace = Namespace::of_path(path)?;
        let guard = self.guard(project_id);
        let _read = guard.read().await;
        let workspace = self.load(project_id).await?;
        op(workspace.root(namespace))
    }

    pub async fn create_folder(&self, project_id: &str, path: &str) -> Result<Folder> {
        let event = WorkspaceEvent::FolderCreated {
            project_id: project_id.to_string(),
            path: path.to_string(),
        };
        self.write(project_id, path, event, |root| root.create_folder(path).cloned())
            .await
    }

    pub async fn create_file(&self, project_id: &str, path: &str, content: &str) -> Result<Folder> {
        let event = WorkspaceEvent::FileCreated {
            project_id: project_id.to_string(),
            path: path.to_string(),
        };
        self.write(project_id, path, event, |root| {
            root.create_file(path, content).cloned()
        })
        .await
    }

    pub async fn delete_folder(&self, project_id: &str, path: &str) -> Result<Folder> {
        let event = WorkspaceEvent::FolderDeleted {
            project_id: project_id.to_string(),
            path: path.to_string(),
        };
        self.write(project_id, path, event, |root| root.delete_folder(path).cloned())
            .await
    }

    pub async fn delete_file(&self, project_id: &str, path: &str) -> Result<Folder> {
        let event = WorkspaceEvent::FileDeleted {
            project_id: project_id.to_string(),
            path: path.to_string(),
        };
        self.write(project_id, path, event, |root| root.delete_file(path).cloned())
            .await
    }

    pub async fn rename_folder(&self, project_id: &str, path: &str, name: &str) -> Result<Folder> {
        let event = WorkspaceEvent::FolderRenamed {
            project_id: project_id.to_string(),
            path: path.to_string(),
            name: name.to_string(),
        };
        self.write(project_id, path, event, |root| {
            root.rename_folder(path, name).cloned()
        })
        .await
    }

    pub async fn rename_file(&self, project_id: &str, path: &str, name: &str) -> Result<Folder> {
        let event = WorkspaceEvent::FileRenamed {
            project_id: project_id.to_string(),
            path: path.to_string(),
            name: name.to_string(),
        };
        self.write(project_id, path, event, |root| {
            root.rename_file(path, name).cloned()
        })
        .await
    }

    pub async fn move_folder(
        &self,
        project_id: &str,
        path: &str,
        destination: &str,
    ) -> Result<Folder> {
        same_namespace(path, destination)?;
        let event = WorkspaceEvent::FolderMoved {
            project_id: project_id.to_string(),
            path: path.to_string(),
            destination: destination.to_string(),
        };
        self.write(project_id, path, event, |root| {
            root.move_folder(path, destination).cloned()
        })
        .await
    }

    pub async fn move_file(
        &self,
        project_id: &str,
        path: &str,
        destination: &str,
    ) -> Result<Folder> {
        same_namespace(path, destination)?;
        let event = WorkspaceEvent::FileMoved {
            project_id: project_id.to_string(),
            path: path.to_string(),
            destination: destination.to_string(),
        };
        self.write(project_id, path, event, |root| {
            root.move_file(path, destination).cloned()
        })
        .await
    }

    pub async fn get_file_content(&self, project_id: &str, path: &str) -> Result<File> {
        self.read(project_id, path, |root| root.file(path).cloned())
            .await
    }

    pub async fn update_file_content(
        &self,
        project_id: &str,
        path: &str,
        content: &str,
    ) -> Result<File> {
        let event = WorkspaceEvent::ContentUpdated {
            project_id: project_id.to_string(),
            path: path.to_string(),
        };
        self.write(project_id, path, event, |root| {
            root.update_file_content(path, content).cloned()
        })
        .await
    }
}

fn same_namespace(path: &str, destination: &str) -> Result<()> {
    if Namespace::of_path(path)? != Namespace::of_path(destination)? {
        return Err(WorkspaceError::InvalidPath(format!(
            "cannot move '{}' to another namespace ('{}')",
            path, destination
        )));
    }
    Ok(())
}

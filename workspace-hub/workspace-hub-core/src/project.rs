//! Project metadata. Only existence matters to the workspace store; the
//! registry keeps enough around for the HTTP layer to list and delete
//! projects.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

const REGISTRY_FILE: &str = "projects.json";

/// Answers whether a project exists, so the store can tell "no such
/// project" apart from "no such path".
#[async_trait]
pub trait ProjectLookup: Send + Sync {
    async fn exists(&self, project_id: &str) -> Result<bool>;
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub owner: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct ProjectRegistry {
    projects: RwLock<HashMap<String, Project>>,
    file: Option<PathBuf>,
}

impl ProjectRegistry {
    pub fn in_memory() -> Self {
        Self {
            projects: RwLock::new(HashMap::new()),
            file: None,
        }
    }

    /// Registry persisted as `projects.json` inside `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let file = dir.join(REGISTRY_FILE);
        let projects = if file.exists() {
            let data = std::fs::read_to_string(&file)?;
            serde_json::from_str(&data)?
        } else {
            HashMap::new()
        };
        Ok(Self {
            projects: RwLock::new(projects),
            file: Some(file),
        })
    }

    /// Write `projects` out before it replaces the live map, so a failed
    /// save leaves the registry as it was. The write is small and blocking
    /// and runs under the registry lock to keep concurrent changes ordered.
    fn persist(&self, projects: &HashMap<String, Project>) -> Result<()> {
        if let Some(file) = &self.file {
            let tmp = file.with_extension("json.tmp");
            std::fs::write(&tmp, serde_json::to_string(projects)?)
                .with_context(|| format!("failed to write {}", tmp.display()))?;
            std::fs::rename(&tmp, file)
                .with_context(|| format!("failed to replace {}", file.display()))?;
        }
        Ok(())
    }

    pub fn create(&self, name: impl Into<String>, owner: Option<String>) -> Result<Project> {
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            owner,
            created_at: Utc::now(),
        };
        let mut projects = self.projects.write();
        let mut next = projects.clone();
        next.insert(project.id.clone(), project.clone());
        self.persist(&next)?;
        *projects = next;
        info!("created project {} ({})", project.id, project.name);
        Ok(project)
    }

    pub fn get(&self, id: &str) -> Option<Project> {
        self.projects.read().get(id).cloned()
    }

    /// All projects, oldest first.
    pub fn list(&self) -> Vec<Project> {
        let mut out: Vec<Project> = self.projects.read().values().cloned().collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.name.cmp(&b.name)));
        out
    }

    pub fn find_by_owner(&self, owner: &str) -> Vec<Project> {
        self.list()
            .into_iter()
            .filter(|p| p.owner.as_deref() == Some(owner))
            .collect()
    }

    pub fn find_by_owner_and_name(&self, owner: &str, name: &str) -> Vec<Project> {
        self.find_by_owner(owner)
            .into_iter()
            .filter(|p| p.name == name)
            .collect()
    }

    /// Remove a project; returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut projects = self.projects.write();
        if !projects.contains_key(id) {
            return Ok(false);
        }
        let mut next = projects.clone();
        next.remove(id);
        self.persist(&next)?;
        *projects = next;
        info!("deleted project {}", id);
        Ok(true)
    }
}

#[async_trait]
impl ProjectLookup for ProjectRegistry {
    async fn exists(&self, project_id: &str) -> Result<bool> {
        Ok(self.projects.read().contains_key(project_id))
    }
}

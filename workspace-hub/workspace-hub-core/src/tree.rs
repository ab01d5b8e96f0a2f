//! Folder/file tree stored per project.
//!
//! Children are owned by their parent folder and carry no back-reference;
//! anything that needs a parent re-resolves it from the namespace root.

use crate::error::{Result, WorkspaceError};
use crate::path;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The two independent trees every project carries.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Namespace {
    Model,
    Templates,
}

impl Namespace {
    pub const ALL: [Namespace; 2] = [Namespace::Model, Namespace::Templates];

    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Model => "model",
            Namespace::Templates => "templates",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "model" => Some(Namespace::Model),
            "templates" => Some(Namespace::Templates),
            _ => None,
        }
    }

    /// Pick the namespace a full workspace path lives in from its first
    /// segment.
    pub fn of_path(full_path: &str) -> Result<Self> {
        let segments = path::split(full_path)?;
        let first = segments
            .first()
            .ok_or_else(|| WorkspaceError::invalid("path must name a namespace"))?;
        Self::parse(first).ok_or_else(|| WorkspaceError::not_found(full_path))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub name: String,
    pub absolute_path: String,
    #[serde(default)]
    pub content: String,
}

impl File {
    pub fn new(name: impl Into<String>, absolute_path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            absolute_path: absolute_path.into(),
            content: content.into(),
        }
    }

    /// Encoded map key of this file within its parent.
    pub fn key(&self) -> String {
        path::encode(&self.name)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub name: String,
    pub absolute_path: String,
    #[serde(default)]
    pub files: BTreeMap<String, File>,
    #[serde(default)]
    pub folders: BTreeMap<String, Folder>,
}

impl Folder {
    pub fn new(name: impl Into<String>, absolute_path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            absolute_path: absolute_path.into(),
            files: BTreeMap::new(),
            folders: BTreeMap::new(),
        }
    }

    /// Empty namespace root; its absolute path is its own name.
    pub fn root(namespace: Namespace) -> Self {
        Self::new(namespace.as_str(), namespace.as_str())
    }

    pub fn key(&self) -> String {
        path::encode(&self.name)
    }

    /// Whether `key` is taken by either a file or a folder in this folder.
    pub fn has_key(&self, key: &str) -> bool {
        self.files.contains_key(key) || self.folders.contains_key(key)
    }

    /// Move this folder to `absolute_path` and rewrite the absolute path of
    /// every descendant to match. Names and structure are untouched.
    pub fn relocate(&mut self, absolute_path: String) {
        let mut stack: Vec<(&mut Folder, String)> = vec![(self, absolute_path)];
        while let Some((folder, new_path)) = stack.pop() {
            let Folder {
                absolute_path: current,
                files,
                folders,
                ..
            } = folder;
            for file in files.values_mut() {
                file.absolute_path = path::join(&new_path, &file.name);
            }
            for child in folders.values_mut() {
                let child_path = path::join(&new_path, &child.name);
                stack.push((child, child_path));
            }
            *current = new_path;
        }
    }

    /// Number of files and folders below this one.
    pub fn descendant_count(&self) -> usize {
        self.files.len()
            + self
                .folders
                .values()
                .map(|f| 1 + f.descendant_count())
                .sum::<usize>()
    }
}

/// Both namespace roots of one project.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Workspace {
    pub model: Folder,
    pub templates: Folder,
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            model: Folder::root(Namespace::Model),
            templates: Folder::root(Namespace::Templates),
        }
    }

    pub fn root(&self, namespace: Namespace) -> &Folder {
        match namespace {
            Namespace::Model => &self.model,
            Namespace::Templates => &self.templates,
        }
    }

    pub fn root_mut(&mut self, namespace: Namespace) -> &mut Folder {
        match namespace {
            Namespace::Model => &mut self.model,
            Namespace::Templates => &mut self.templates,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(data: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

//! Structural operations on a namespace root.
//!
//! Every path is a full workspace path whose first segment is the root's own
//! name (`templates/a/b.txt`); the empty path and the bare namespace name both
//! denote the root. All checks run before anything is mutated, so a failed
//! call leaves the tree exactly as it was.

use crate::error::{Result, WorkspaceError};
use crate::path;
use crate::tree::{File, Folder};

impl Folder {
    /// Segments of `full_path` below this root.
    fn relative<'p>(&self, full_path: &'p str) -> Result<Vec<&'p str>> {
        let mut segments = path::split(full_path)?;
        if segments.is_empty() {
            return Ok(segments);
        }
        if segments[0] != self.name {
            return Err(WorkspaceError::not_found(full_path));
        }
        segments.remove(0);
        for segment in &segments {
            path::validate_name(segment)?;
        }
        Ok(segments)
    }

    /// Parent segments and leaf name of a path that must not be the root.
    fn target<'p>(&self, full_path: &'p str) -> Result<(Vec<&'p str>, &'p str)> {
        let mut segments = self.relative(full_path)?;
        let name = segments.pop().ok_or_else(|| {
            WorkspaceError::invalid(format!("'{}' is a namespace root", full_path))
        })?;
        Ok((segments, name))
    }

    fn walk(&self, segments: &[&str], full_path: &str) -> Result<&Folder> {
        let mut current = self;
        for segment in segments {
            current = current
                .folders
                .get(&path::encode(segment))
                .ok_or_else(|| WorkspaceError::not_found(full_path))?;
        }
        Ok(current)
    }

    fn walk_mut(&mut self, segments: &[&str], full_path: &str) -> Result<&mut Folder> {
        let mut current = self;
        for segment in segments {
            current = current
                .folders
                .get_mut(&path::encode(segment))
                .ok_or_else(|| WorkspaceError::not_found(full_path))?;
        }
        Ok(current)
    }

    pub fn resolve_folder(&self, path: &str) -> Result<&Folder> {
        let segments = self.relative(path)?;
        self.walk(&segments, path)
    }

    pub fn file(&self, path: &str) -> Result<&File> {
        let (parent, name) = self.target(path)?;
        self.walk(&parent, path)?
            .files
            .get(&path::encode(name))
            .ok_or_else(|| WorkspaceError::not_found(path))
    }

    fn file_mut(&mut self, path: &str) -> Result<&mut File> {
        let (parent, name) = self.target(path)?;
        self.walk_mut(&parent, path)?
            .files
            .get_mut(&path::encode(name))
            .ok_or_else(|| WorkspaceError::not_found(path))
    }

    /// Create an empty folder at `path`. Returns the namespace root.
    pub fn create_folder(&mut self, path: &str) -> Result<&Folder> {
        let (parent_segments, name) = self.target(path)?;
        let parent = self.walk_mut(&parent_segments, path)?;
        let key = path::encode(name);
        if parent.has_key(&key) {
            return Err(WorkspaceError::conflict(path));
        }
        let folder = Folder::new(name, path::join(&parent.absolute_path, name));
        parent.folders.insert(key, folder);
        Ok(&*self)
    }

    /// Create a file holding `content` at `path`. Returns the namespace root.
    pub fn create_file(&mut self, path: &str, content: &str) -> Result<&Folder> {
        let (parent_segments, name) = self.target(path)?;
        let parent = self.walk_mut(&parent_segments, path)?;
        let key = path::encode(name);
        if parent.has_key(&key) {
            return Err(WorkspaceError::conflict(path));
        }
        let file = File::new(name, path::join(&parent.absolute_path, name), content);
        parent.files.insert(key, file);
        Ok(&*self)
    }

    /// Remove the folder at `path` together with its whole subtree.
    pub fn delete_folder(&mut self, path: &str) -> Result<&Folder> {
        let (parent_segments, name) = self.target(path)?;
        self.walk_mut(&parent_segments, path)?
            .folders
            .remove(&path::encode(name))
            .ok_or_else(|| WorkspaceError::not_found(path))?;
        Ok(&*self)
    }

    pub fn delete_file(&mut self, path: &str) -> Result<&Folder> {
        let (parent_segments, name) = self.target(path)?;
        self.walk_mut(&parent_segments, path)?
            .files
            .remove(&path::encode(name))
            .ok_or_else(|| WorkspaceError::not_found(path))?;
        Ok(&*self)
    }

    /// Rename the folder at `path` to `new_name`, rewriting the absolute path
    /// of everything below it.
    pub fn rename_folder(&mut self, path: &str, new_name: &str) -> Result<&Folder> {
        path::validate_name(new_name)?;
        let (parent_segments, name) = self.target(path)?;
        let parent = self.walk_mut(&parent_segments, path)?;
        let old_key = path::encode(name);
        let new_key = path::encode(new_name);
        if !parent.folders.contains_key(&old_key) {
            return Err(WorkspaceError::not_found(path));
        }
        if new_key != old_key && parent.has_key(&new_key) {
            return Err(WorkspaceError::conflict(path::join(
                &parent.absolute_path,
                new_name,
            )));
        }
        let mut folder = parent
            .folders
            .remove(&old_key)
            .ok_or_else(|| WorkspaceError::not_found(path))?;
        folder.name = new_name.to_string();
        folder.relocate(path::join(&parent.absolute_path, new_name));
        parent.folders.insert(new_key, folder);
        Ok(&*self)
    }

    /// Rename the file at `path`; its content moves with it.
    pub fn rename_file(&mut self, path: &str, new_name: &str) -> Result<&Folder> {
        path::validate_name(new_name)?;
        let (parent_segments, name) = self.target(path)?;
        let parent = self.walk_mut(&parent_segments, path)?;
        let old_key = path::encode(name);
        let new_key = path::encode(new_name);
        if !parent.files.contains_key(&old_key) {
            return Err(WorkspaceError::not_found(path));
        }
        if new_key != old_key && parent.has_key(&new_key) {
            return Err(WorkspaceError::conflict(path::join(
                &parent.absolute_path,
                new_name,
            )));
        }
        let mut file = parent
            .files
            .remove(&old_key)
            .ok_or_else(|| WorkspaceError::not_found(path))?;
        file.absolute_path = path::join(&parent.absolute_path, new_name);
        file.name = new_name.to_string();
        parent.files.insert(new_key, file);
        Ok(&*self)
    }

    /// Move the folder at `path` into the folder at `destination`.
    pub fn move_folder(&mut self, path: &str, destination: &str) -> Result<&Folder> {
        let (parent_segments, name) = self.target(path)?;
        let dest_segments = self.relative(destination)?;
        let key = path::encode(name);

        let source_keys: Vec<String> = parent_segments
            .iter()
            .chain(std::iter::once(&name))
            .map(|s| path::encode(s))
            .collect();
        let dest_keys: Vec<String> = dest_segments.iter().map(|s| path::encode(s)).collect();
        if dest_keys.starts_with(&source_keys) {
            return Err(WorkspaceError::invalid(format!(
                "cannot move '{}' into itself",
                path
            )));
        }
        if !self.walk(&parent_segments, path)?.folders.contains_key(&key) {
            return Err(WorkspaceError::not_found(path));
        }
        let dest = self.walk(&dest_segments, destination)?;
        if dest.has_key(&key) {
            return Err(WorkspaceError::conflict(path::join(&dest.absolute_path, name)));
        }

        let mut folder = self
            .walk_mut(&parent_segments, path)?
            .folders
            .remove(&key)
            .ok_or_else(|| WorkspaceError::not_found(path))?;
        let dest = self.walk_mut(&dest_segments, destination)?;
        folder.relocate(path::join(&dest.absolute_path, name));
        dest.folders.insert(key, folder);
        Ok(&*self)
    }

    /// Move the file at `path` into the folder at `destination`.
    pub fn move_file(&mut self, path: &str, destination: &str) -> Result<&Folder> {
        let (parent_segments, name) = self.target(path)?;
        let dest_segments = self.relative(destination)?;
        let key = path::encode(name);

        if !self.walk(&parent_segments, path)?.files.contains_key(&key) {
            return Err(WorkspaceError::not_found(path));
        }
        let dest = self.walk(&dest_segments, destination)?;
        if dest.has_key(&key) {
            return Err(WorkspaceError::conflict(path::join(&dest.absolute_path, name)));
        }

        let mut file = self
            .walk_mut(&parent_segments, path)?
            .files
            .remove(&key)
            .ok_or_else(|| WorkspaceError::not_found(path))?;
        let dest = self.walk_mut(&dest_segments, destination)?;
        file.absolute_path = path::join(&dest.absolute_path, name);
        dest.files.insert(key, file);
        Ok(&*self)
    }

    /// Replace the content of the file at `path`.
    pub fn update_file_content(&mut self, path: &str, content: &str) -> Result<&File> {
        let file = self.file_mut(path)?;
        file.content = content.to_string();
        Ok(&*file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{Namespace, Workspace};

    fn templates() -> Folder {
        Folder::root(Namespace::Templates)
    }

    /// templates/rename/{testParent.txt, test/{test.txt}}
    fn rename_fixture() -> Folder {
        let mut root = templates();
        root.create_folder("templates/rename").unwrap();
        root.create_folder("templates/rename/test").unwrap();
        root.create_file("templates/rename/test/test.txt", "content")
            .unwrap();
        root.create_file("templates/rename/testParent.txt", "")
            .unwrap();
        root
    }

    #[test]
    fn root_paths_resolve_to_root() {
        let root = templates();
        assert_eq!(root.resolve_folder("").unwrap().absolute_path, "templates");
        assert_eq!(
            root.resolve_folder("templates").unwrap().absolute_path,
            "templates"
        );
    }

    #[test]
    fn missing_paths_are_not_found() {
        let root = rename_fixture();
        for p in [
            "templates/nope",
            "templates/rename/nope",
            "templates/rename/test/test.txt",
            "model/rename",
        ] {
            assert!(
                matches!(root.resolve_folder(p), Err(WorkspaceError::PathNotFound(_))),
                "{}",
                p
            );
        }
        assert!(matches!(
            root.file("templates/rename/missing.txt"),
            Err(WorkspaceError::PathNotFound(_))
        ));
        assert!(matches!(
            root.file("templates/missing/test.txt"),
            Err(WorkspaceError::PathNotFound(_))
        ));
    }

    #[test]
    fn create_then_resolve_has_matching_path() {
        let mut root = templates();
        let returned = root.create_folder("templates/test").unwrap();
        assert_eq!(returned.absolute_path, "templates");
        assert_eq!(returned.folders["test"].absolute_path, "templates/test");

        root.create_folder("templates/test/createFolder").unwrap();
        assert_eq!(
            root.resolve_folder("templates/test/createFolder")
                .unwrap()
                .absolute_path,
            "templates/test/createFolder"
        );

        root.create_file("templates/test/a.txt", "x").unwrap();
        let file = root.file("templates/test/a.txt").unwrap();
        assert_eq!(file.absolute_path, "templates/test/a.txt");
        assert_eq!(file.content, "x");
    }

    #[test]
    fn create_file_uses_encoded_key() {
        let mut ws = Workspace::new();
        let root = ws.model.create_file("model/model_1.xml", "data").unwrap();
        assert!(root.files.contains_key("model_1+xml"));
        assert_eq!(root.files["model_1+xml"].absolute_path, "model/model_1.xml");
    }

    #[test]
    fn create_twice_conflicts_without_change() {
        let mut root = templates();
        root.create_folder("templates/test").unwrap();
        root.create_file("templates/test/a.txt", "one").unwrap();
        let before = root.clone();

        assert!(matches!(
            root.create_folder("templates/test"),
            Err(WorkspaceError::Conflict(_))
        ));
        assert!(matches!(
            root.create_file("templates/test/a.txt", "two"),
            Err(WorkspaceError::Conflict(_))
        ));
        assert_eq!(root, before);
    }

    #[test]
    fn key_separator_in_paths_is_invalid() {
        let mut root = templates();
        assert!(matches!(
            root.create_file("templates/a+b", ""),
            Err(WorkspaceError::InvalidPath(_))
        ));
        assert!(matches!(
            root.create_folder("templates/x+y"),
            Err(WorkspaceError::InvalidPath(_))
        ));

        root.create_file("templates/a.b", "dotted").unwrap();
        assert_eq!(root.file("templates/a.b").unwrap().absolute_path, "templates/a.b");
        assert!(matches!(root.file("templates/a+b"), Err(WorkspaceError::InvalidPath(_))));
        assert!(matches!(
            root.rename_file("templates/a.b", "c+d"),
            Err(WorkspaceError::InvalidPath(_))
        ));
        assert_eq!(root.files["a+b"].content, "dotted");
    }

    #[test]
    fn create_under_missing_parent_fails() {
        let mut root = Folder::root(Namespace::Model);
        assert!(matches!(
            root.create_file("model/folder1/model_1.xml", ""),
            Err(WorkspaceError::PathNotFound(_))
        ));
        assert!(matches!(
            root.create_folder("model/a/b"),
            Err(WorkspaceError::PathNotFound(_))
        ));
        assert!(root.files.is_empty());
        assert!(root.folders.is_empty());
    }

    #[test]
    fn file_and_folder_keys_are_exclusive() {
        let mut root = templates();
        root.create_file("templates/shared", "").unwrap();
        assert!(matches!(
            root.create_folder("templates/shared"),
            Err(WorkspaceError::Conflict(_))
        ));

        root.create_folder("templates/dir").unwrap();
        assert!(matches!(
            root.create_file("templates/dir", ""),
            Err(WorkspaceError::Conflict(_))
        ));

        // folder names are keyed the same way as file names
        root.create_file("templates/notes.md", "").unwrap();
        assert!(matches!(
            root.create_folder("templates/notes.md"),
            Err(WorkspaceError::Conflict(_))
        ));
        assert!(matches!(
            root.rename_folder("templates/dir", "shared"),
            Err(WorkspaceError::Conflict(_))
        ));
        assert!(matches!(
            root.rename_file("templates/shared", "dir"),
            Err(WorkspaceError::Conflict(_))
        ));
    }

    #[test]
    fn delete_folder_keeps_siblings() {
        let mut root = templates();
        root.create_folder("templates/test").unwrap();
        root.create_folder("templates/test/remove").unwrap();
        root.create_file("templates/test/remove/test.txt", "")
            .unwrap();
        root.create_file("templates/test/testParent.txt", "")
            .unwrap();

        let returned = root.delete_folder("templates/test/remove").unwrap();
        let test = &returned.folders["test"];
        assert!(test.files.contains_key("testParent+txt"));
        assert!(test.folders.is_empty());
        assert!(matches!(
            root.file("templates/test/remove/test.txt"),
            Err(WorkspaceError::PathNotFound(_))
        ));
    }

    #[test]
    fn delete_file_keeps_siblings() {
        let mut root = templates();
        root.create_folder("templates/test").unwrap();
        root.create_folder("templates/test/remove").unwrap();
        root.create_file("templates/test/remove/test.txt", "")
            .unwrap();
        root.create_file("templates/test/remove/test2.txt", "")
            .unwrap();

        root.delete_file("templates/test/remove/test.txt").unwrap();
        let remove = root.resolve_folder("templates/test/remove").unwrap();
        assert!(remove.files.contains_key("test2+txt"));
        assert!(!remove.files.contains_key("test+txt"));

        assert!(matches!(
            root.delete_file("templates/test/remove/test.txt"),
            Err(WorkspaceError::PathNotFound(_))
        ));
        assert!(matches!(
            root.delete_folder("templates/test/gone"),
            Err(WorkspaceError::PathNotFound(_))
        ));
    }

    #[test]
    fn root_cannot_be_deleted_or_renamed() {
        let mut root = templates();
        for p in ["", "templates"] {
            assert!(matches!(root.delete_folder(p), Err(WorkspaceError::InvalidPath(_))));
            assert!(matches!(
                root.rename_folder(p, "other"),
                Err(WorkspaceError::InvalidPath(_))
            ));
        }
        assert!(matches!(
            root.create_folder("templates//x"),
            Err(WorkspaceError::InvalidPath(_))
        ));
    }

    #[test]
    fn rename_folder_rewrites_descendants() {
        let mut root = rename_fixture();
        let returned = root.rename_folder("templates/rename", "foo").unwrap();

        assert!(!returned.folders.contains_key("rename"));
        let foo = &returned.folders["foo"];
        assert_eq!(foo.name, "foo");
        assert_eq!(foo.absolute_path, "templates/foo");
        assert_eq!(foo.files["testParent+txt"].absolute_path, "templates/foo/testParent.txt");
        assert_eq!(foo.folders["test"].absolute_path, "templates/foo/test");
        let file = &foo.folders["test"].files["test+txt"];
        assert_eq!(file.name, "test.txt");
        assert_eq!(file.absolute_path, "templates/foo/test/test.txt");
        assert_eq!(root.file("templates/foo/test/test.txt").unwrap().content, "content");
    }

    #[test]
    fn rename_nested_folder_rewrites_deep_descendants() {
        let mut root = templates();
        root.create_folder("templates/a").unwrap();
        root.create_folder("templates/a/b").unwrap();
        root.create_folder("templates/a/b/c").unwrap();
        root.create_folder("templates/a/b/c/d").unwrap();
        root.create_file("templates/a/b/c/d/leaf.txt", "leaf").unwrap();
        root.create_file("templates/a/b/mid.txt", "mid").unwrap();

        root.rename_folder("templates/a/b", "renamed.v2").unwrap();

        let b = root.resolve_folder("templates/a/renamed.v2").unwrap();
        assert_eq!(b.absolute_path, "templates/a/renamed.v2");
        assert!(root.folders["a"].folders.contains_key("renamed+v2"));
        assert_eq!(
            root.file("templates/a/renamed.v2/c/d/leaf.txt").unwrap().absolute_path,
            "templates/a/renamed.v2/c/d/leaf.txt"
        );
        assert_eq!(
            root.resolve_folder("templates/a/renamed.v2/c/d").unwrap().absolute_path,
            "templates/a/renamed.v2/c/d"
        );
        assert_eq!(
            root.file("templates/a/renamed.v2/mid.txt").unwrap().absolute_path,
            "templates/a/renamed.v2/mid.txt"
        );
        assert_eq!(root.descendant_count(), 6);
    }

    #[test]
    fn rename_folder_errors() {
        let mut root = rename_fixture();
        root.create_folder("templates/other").unwrap();
        let before = root.clone();

        assert!(matches!(
            root.rename_folder("templates/missing", "x"),
            Err(WorkspaceError::PathNotFound(_))
        ));
        assert!(matches!(
            root.rename_folder("templates/rename", "other"),
            Err(WorkspaceError::Conflict(_))
        ));
        assert!(matches!(
            root.rename_folder("templates/rename", "a/b"),
            Err(WorkspaceError::InvalidPath(_))
        ));
        assert!(matches!(
            root.rename_folder("templates/rename", ""),
            Err(WorkspaceError::InvalidPath(_))
        ));
        assert_eq!(root, before);
    }

    #[test]
    fn rename_file_keeps_content() {
        let mut root = rename_fixture();
        let returned = root
            .rename_file("templates/rename/test/test.txt", "renamedFile.pdf")
            .unwrap();
        let test = &returned.folders["rename"].folders["test"];
        assert!(test.files.contains_key("renamedFile+pdf"));
        assert!(!test.files.contains_key("test+txt"));
        assert_eq!(
            test.files["renamedFile+pdf"].absolute_path,
            "templates/rename/test/renamedFile.pdf"
        );
        assert_eq!(
            root.file("templates/rename/test/renamedFile.pdf").unwrap().content,
            "content"
        );
    }

    #[test]
    fn rename_file_errors() {
        let mut root = rename_fixture();
        root.create_file("templates/rename/test/other.txt", "").unwrap();
        let before = root.clone();
        assert!(matches!(
            root.rename_file("templates/rename/test/missing.txt", "x.txt"),
            Err(WorkspaceError::PathNotFound(_))
        ));
        assert!(matches!(
            root.rename_file("templates/rename/test/test.txt", "other.txt"),
            Err(WorkspaceError::Conflict(_))
        ));
        assert_eq!(root, before);
    }

    #[test]
    fn move_folder_relocates_subtree() {
        let mut root = rename_fixture();
        root.create_folder("templates/dest").unwrap();
        root.move_folder("templates/rename/test", "templates/dest")
            .unwrap();

        assert!(root.folders["rename"].folders.is_empty());
        assert_eq!(
            root.file("templates/dest/test/test.txt").unwrap().absolute_path,
            "templates/dest/test/test.txt"
        );

        root.move_folder("templates/dest/test", "templates").unwrap();
        assert_eq!(
            root.resolve_folder("templates/test").unwrap().absolute_path,
            "templates/test"
        );
    }

    #[test]
    fn move_folder_into_itself_is_rejected() {
        let mut root = rename_fixture();
        let before = root.clone();
        assert!(matches!(
            root.move_folder("templates/rename", "templates/rename/test"),
            Err(WorkspaceError::InvalidPath(_))
        ));
        assert!(matches!(
            root.move_folder("templates/rename", "templates/rename"),
            Err(WorkspaceError::InvalidPath(_))
        ));
        assert!(matches!(
            root.move_folder("templates/rename/test", "templates/nowhere"),
            Err(WorkspaceError::PathNotFound(_))
        ));
        assert_eq!(root, before);
    }

    #[test]
    fn move_file_between_folders() {
        let mut root = rename_fixture();
        root.move_file("templates/rename/test/test.txt", "templates")
            .unwrap();
        let file = root.file("templates/test.txt").unwrap();
        assert_eq!(file.absolute_path, "templates/test.txt");
        assert_eq!(file.content, "content");

        root.create_file("templates/rename/test.txt", "").unwrap();
        assert!(matches!(
            root.move_file("templates/rename/test.txt", "templates"),
            Err(WorkspaceError::Conflict(_))
        ));
    }

    #[test]
    fn update_file_content_in_place() {
        let mut root = Folder::root(Namespace::Model);
        root.create_file("model/model_2.xml", "").unwrap();
        let file = root.update_file_content("model/model_2.xml", "content").unwrap();
        assert_eq!(file.content, "content");
        assert_eq!(root.file("model/model_2.xml").unwrap().content, "content");
        assert!(matches!(
            root.update_file_content("model/missing.xml", "x"),
            Err(WorkspaceError::PathNotFound(_))
        ));
    }
}

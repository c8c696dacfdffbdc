use std::collections::HashSet;
use std::path::{Component, Path};

/// One file to be written: a project-relative path and its full content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEdit {
    pub path: String,
    pub content: String,
}

impl FileEdit {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Maps a path to its dedup key.
///
/// Separators are unified, `./` and the `@/` alias are dropped, everything up
/// to and including the `source_root` segment is stripped, and the result is
/// case-folded. Two spellings of the same file always share a key.
pub fn normalize_path(path: &str, source_root: &str) -> String {
    let unified = path.trim().trim_matches('`').replace('\\', "/").to_lowercase();
    let mut rest = unified.as_str();
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("@/") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix('/') {
            rest = stripped;
        } else {
            break;
        }
    }

    let root = source_root.trim_matches('/').to_lowercase();
    if !root.is_empty() {
        let prefix = format!("{}/", root);
        let segment = format!("/{}/", root);
        if let Some(stripped) = rest.strip_prefix(&prefix) {
            rest = stripped;
        } else if let Some(idx) = rest.find(&segment) {
            rest = &rest[idx + segment.len()..];
        }
    }

    rest.to_string()
}

/// Whether `path` stays under the project root once joined to it: relative,
/// no `..` segment, no drive prefix.
pub fn is_contained(path: &str) -> bool {
    let unified = path.trim().replace('\\', "/");
    if unified.is_empty() || unified.starts_with('/') {
        return false;
    }
    if unified.split('/').next().is_some_and(|first| first.contains(':')) {
        return false;
    }
    Path::new(&unified)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// Ordered set of edits where each normalized path appears at most once.
///
/// The first edit pushed for a key wins; later ones are dropped.
#[derive(Debug, Clone)]
pub struct FilePlan {
    source_root: String,
    edits: Vec<FileEdit>,
    seen: HashSet<String>,
}

impl FilePlan {
    pub fn new(source_root: impl Into<String>) -> Self {
        Self {
            source_root: source_root.into(),
            edits: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn key(&self, path: &str) -> String {
        normalize_path(path, &self.source_root)
    }

    /// Adds the edit unless its normalized path was already seen.
    /// Returns whether it was kept.
    pub fn push(&mut self, edit: FileEdit) -> bool {
        let key = self.key(&edit.path);
        if !self.seen.insert(key) {
            tracing::debug!("Dropping duplicate edit for {}", edit.path);
            return false;
        }
        self.edits.push(edit);
        true
    }

    pub fn contains(&self, path: &str) -> bool {
        self.seen.contains(&self.key(path))
    }

    pub fn get(&self, path: &str) -> Option<&FileEdit> {
        let key = self.key(path);
        self.edits.iter().find(|e| self.key(&e.path) == key)
    }

    pub fn get_mut(&mut self, path: &str) -> Option<&mut FileEdit> {
        let key = self.key(path);
        let root = self.source_root.clone();
        self.edits
            .iter_mut()
            .find(|e| normalize_path(&e.path, &root) == key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileEdit> {
        self.edits.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut FileEdit> {
        self.edits.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    pub fn into_edits(self) -> Vec<FileEdit> {
        self.edits
    }
}

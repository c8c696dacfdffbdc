use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// Read access to the project the plan is built against.
///
/// Reads never fail loudly: a missing or unreadable file is `None`.
pub trait SourceTree {
    fn read_file(&self, path: &str) -> Option<String>;

    /// Names of the immediate subdirectories of `dir`, sorted.
    fn list_dirs(&self, dir: &str) -> Vec<String>;
}

/// The project on disk, rooted at `root`.
#[derive(Debug, Clone)]
pub struct DiskSourceTree {
    root: PathBuf,
}

impl DiskSourceTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }
}

impl SourceTree for DiskSourceTree {
    fn read_file(&self, path: &str) -> Option<String> {
        let full = self.root.join(path);
        match fs::read_to_string(&full) {
            Ok(content) => Some(content),
            Err(e) => {
                tracing::trace!("{} unreadable: {}", full.display(), e);
                None
            }
        }
    }

    fn list_dirs(&self, dir: &str) -> Vec<String> {
        let Ok(entries) = fs::read_dir(self.root.join(dir)) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .filter_map(|entry| entry.file_name().to_str().map(|s| s.to_string()))
            .collect();
        names.sort();
        names
    }
}

/// In-memory project keyed by project-relative path.
impl SourceTree for BTreeMap<String, String> {
    fn read_file(&self, path: &str) -> Option<String> {
        self.get(path).cloned()
    }

    fn list_dirs(&self, dir: &str) -> Vec<String> {
        let prefix = format!("{}/", dir.trim_end_matches('/'));
        let mut names: Vec<String> = self
            .keys()
            .filter_map(|key| key.strip_prefix(&prefix))
            .filter_map(|rest| rest.split_once('/').map(|(first, _)| first.to_string()))
            .collect();
        names.dedup();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_tree_reads_and_lists() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("src/app/api/b")).expect("mkdir");
        fs::create_dir_all(dir.path().join("src/app/api/a")).expect("mkdir");
        fs::write(dir.path().join("src/app/api/a/route.ts"), "export {}").expect("write");

        let tree = DiskSourceTree::new(dir.path());
        assert_eq!(tree.read_file("src/app/api/a/route.ts").as_deref(), Some("export {}"));
        assert_eq!(tree.read_file("src/missing.ts"), None);
        assert_eq!(tree.list_dirs("src/app/api"), vec!["a", "b"]);
        assert!(tree.list_dirs("src/nowhere").is_empty());
    }

    #[test]
    fn memory_tree_lists_child_dirs() {
        let mut tree = BTreeMap::new();
        tree.insert("src/app/api/a/route.ts".to_string(), String::new());
        tree.insert("src/app/api/a/extra.ts".to_string(), String::new());
        tree.insert("src/app/api/b/route.ts".to_string(), String::new());
        tree.insert("src/app/api/loose.ts".to_string(), String::new());

        assert_eq!(tree.list_dirs("src/app/api"), vec!["a", "b"]);
    }
}

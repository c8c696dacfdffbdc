use crate::error::AgentError;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

const DEFAULT_LAYOUT_FILE: &str = "dbagent.yml";

/// Where the generated project keeps each well-known file, plus the model
/// settings. Every field may be omitted from `dbagent.yml`.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProjectLayout {
    pub source_root: String,
    pub schema_path: String,
    pub connection_path: String,
    pub seed_path: String,
    pub sync_path: String,
    pub api_dir: String,
    pub components_dir: String,
    pub composition_path: String,
    pub manifest_path: String,
    pub database_file: String,
    pub import_extension: String,
    pub known_folders: Vec<String>,
    pub candidates: ContextCandidates,
    pub model: ModelSettings,
}

/// Lookup order for each context file; first hit wins.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ContextCandidates {
    pub schema: Vec<String>,
    pub connection: Vec<String>,
    pub seed: Vec<String>,
    pub sync: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelSettings {
    pub name: String,
    pub endpoint: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            source_root: "src".to_string(),
            schema_path: "src/db/schema.ts".to_string(),
            connection_path: "src/db/connection.ts".to_string(),
            seed_path: "src/db/seed.ts".to_string(),
            sync_path: "src/db/sync.ts".to_string(),
            api_dir: "src/app/api".to_string(),
            components_dir: "src/components".to_string(),
            composition_path: "src/components/spotify-main-content.tsx".to_string(),
            manifest_path: "package.json".to_string(),
            database_file: "sqlite.db".to_string(),
            import_extension: ".ts".to_string(),
            known_folders: ["db", "app", "api", "components", "lib", "hooks"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            candidates: ContextCandidates::default(),
            model: ModelSettings::default(),
        }
    }
}

impl Default for ContextCandidates {
    fn default() -> Self {
        let list = |paths: &[&str]| paths.iter().map(|s| s.to_string()).collect();
        Self {
            schema: list(&["src/db/schema.ts", "db/schema.ts", "src/lib/db/schema.ts"]),
            connection: list(&["src/db/connection.ts", "db/connection.ts", "src/lib/db/index.ts"]),
            seed: list(&["src/db/seed.ts", "db/seed.ts"]),
            sync: list(&["src/db/sync.ts", "db/sync.ts"]),
        }
    }
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            name: "gemini-2.0-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta/models".to_string(),
        }
    }
}

impl ProjectLayout {
    /// Rewrites a path as written by the model into a project-relative path.
    ///
    /// Paths containing the source-root segment are cut to start at it, the
    /// `@/` alias maps onto the source root, bare `api/` maps onto the api
    /// directory, and other known top-level folders get the source root
    /// prepended. Anything else passes through.
    pub fn resolve_path(&self, raw: &str) -> String {
        let unified = raw.trim().trim_matches('`').replace('\\', "/");
        let mut p = unified.as_str();
        while let Some(stripped) = p.strip_prefix("./") {
            p = stripped;
        }

        let root = self.source_root.trim_matches('/');
        if let Some(rest) = p.strip_prefix("@/") {
            return format!("{}/{}", root, rest);
        }

        let root_prefix = format!("{}/", root);
        if p.starts_with(&root_prefix) {
            return p.to_string();
        }
        let root_segment = format!("/{}/", root);
        if let Some(idx) = p.find(&root_segment) {
            return p[idx + 1..].to_string();
        }

        let p = p.trim_start_matches('/');
        let first = p.split('/').next().unwrap_or("");
        if first == "api" {
            let rest = &p["api".len()..];
            return format!("{}{}", self.api_dir.trim_end_matches('/'), rest);
        }
        if p.contains('/') && self.known_folders.iter().any(|f| f == first) {
            return format!("{}/{}", root, p);
        }
        p.to_string()
    }

    /// Route handler path for a kebab-case route name.
    pub fn route_path(&self, route_name: &str) -> String {
        format!("{}/{}/route.ts", self.api_dir.trim_end_matches('/'), route_name)
    }

    /// Path with the source-root prefix dropped, as shown in context headers.
    pub fn display_path(&self, path: &str) -> String {
        let resolved = self.resolve_path(path);
        let root_prefix = format!("{}/", self.source_root.trim_matches('/'));
        resolved
            .strip_prefix(&root_prefix)
            .unwrap_or(&resolved)
            .to_string()
    }
}

/// Loads `ProjectLayout` from a YAML file, falling back to defaults when the
/// file is absent.
#[derive(Clone)]
pub struct FileLayoutRegistry {
    layout_path: PathBuf,
}

impl FileLayoutRegistry {
    /// Creates a new FileLayoutRegistry
    ///
    /// # Arguments
    /// * `layout_path` - Optional path to the layout file (defaults to "dbagent.yml")
    pub fn new(layout_path: Option<PathBuf>) -> Self {
        Self {
            layout_path: layout_path.unwrap_or_else(|| PathBuf::from(DEFAULT_LAYOUT_FILE)),
        }
    }

    pub fn for_project(root: &std::path::Path) -> Self {
        Self::new(Some(root.join(DEFAULT_LAYOUT_FILE)))
    }

    pub fn load(&self) -> Result<ProjectLayout, AgentError> {
        if !self.layout_path.exists() {
            tracing::debug!(
                "No layout file at {}, using defaults",
                self.layout_path.display()
            );
            return Ok(ProjectLayout::default());
        }

        let content = fs::read_to_string(&self.layout_path).map_err(|e| AgentError::Config {
            path: self.layout_path.clone(),
            reason: e.to_string(),
        })?;

        parse_layout(&content).map_err(|reason| AgentError::Config {
            path: self.layout_path.clone(),
            reason,
        })
    }
}

fn parse_layout(yaml_content: &str) -> Result<ProjectLayout, String> {
    if yaml_content.trim().is_empty() {
        return Ok(ProjectLayout::default());
    }
    serde_yaml::from_str(yaml_content).map_err(|e| format!("Invalid layout YAML: {}", e))
}

use super::{ProjectLayout, SourceTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Schema,
    Connection,
    Seed,
    Sync,
    Manifest,
    Composition,
}

impl ContextKind {
    pub const ALL: [ContextKind; 6] = [
        ContextKind::Schema,
        ContextKind::Connection,
        ContextKind::Seed,
        ContextKind::Sync,
        ContextKind::Manifest,
        ContextKind::Composition,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ContextKind::Schema => "schema",
            ContextKind::Connection => "connection",
            ContextKind::Seed => "seed",
            ContextKind::Sync => "sync",
            ContextKind::Manifest => "manifest",
            ContextKind::Composition => "composition",
        }
    }

    fn candidates(self, layout: &ProjectLayout) -> Vec<String> {
        match self {
            ContextKind::Schema => layout.candidates.schema.clone(),
            ContextKind::Connection => layout.candidates.connection.clone(),
            ContextKind::Seed => layout.candidates.seed.clone(),
            ContextKind::Sync => layout.candidates.sync.clone(),
            ContextKind::Manifest => vec![layout.manifest_path.clone()],
            ContextKind::Composition => vec![layout.composition_path.clone()],
        }
    }
}

/// One context lookup: where the file was found (if anywhere) and its text.
#[derive(Debug, Clone)]
pub struct ContextEntry {
    pub kind: ContextKind,
    pub path: Option<String>,
    pub content: String,
}

impl ContextEntry {
    pub fn found(&self) -> bool {
        self.path.is_some()
    }
}

/// Snapshot of the project taken once at the start of a run.
///
/// `description()` is the text handed to the model and the text scaffold
/// presence checks search.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    entries: Vec<ContextEntry>,
    routes: Vec<String>,
    description: String,
    layout: ProjectLayout,
}

impl ProjectContext {
    pub fn gather(tree: &impl SourceTree, layout: &ProjectLayout) -> Self {
        let mut entries = Vec::new();
        let mut description = String::new();

        for kind in ContextKind::ALL {
            let hit = kind
                .candidates(layout)
                .into_iter()
                .find_map(|path| tree.read_file(&path).map(|content| (path, content)));

            match hit {
                Some((path, content)) => {
                    tracing::info!("✓ {} found at {}", kind.label(), path);
                    description.push_str(&format!(
                        "\n---\n[{}]\n{}",
                        layout.display_path(&path),
                        content
                    ));
                    entries.push(ContextEntry {
                        kind,
                        path: Some(path),
                        content,
                    });
                }
                None => {
                    tracing::info!("✗ {} not found", kind.label());
                    description.push_str(&format!("\n---\n(not found: {})", kind.label()));
                    entries.push(ContextEntry {
                        kind,
                        path: None,
                        content: String::new(),
                    });
                }
            }
        }

        let mut routes = Vec::new();
        for name in tree.list_dirs(&layout.api_dir) {
            let path = layout.route_path(&name);
            if let Some(content) = tree.read_file(&path) {
                description.push_str(&format!(
                    "\n---\n[{}]\n{}",
                    layout.display_path(&path),
                    content
                ));
                routes.push(path);
            }
        }
        if !routes.is_empty() {
            tracing::info!("✓ {} existing route handler(s)", routes.len());
        }

        Self {
            entries,
            routes,
            description,
            layout: layout.clone(),
        }
    }

    pub fn entry(&self, kind: ContextKind) -> Option<&ContextEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Text of the file if it was found.
    pub fn content(&self, kind: ContextKind) -> Option<&str> {
        self.entry(kind)
            .filter(|e| e.found())
            .map(|e| e.content.as_str())
    }

    pub fn entries(&self) -> &[ContextEntry] {
        &self.entries
    }

    pub fn routes(&self) -> &[String] {
        &self.routes
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Whether the description carries a found-file header for `path`.
    pub fn mentions(&self, path: &str) -> bool {
        let header = format!("[{}]", self.layout.display_path(path));
        self.description.contains(&header)
    }
}

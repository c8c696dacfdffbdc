//! Splices newly generated components into the composition file by editing
//! a small markup tree instead of the raw text.

mod markup;
mod scanner;

pub use markup::{Document, Element, ImportDecl, Node, Segment};

use super::identifier_deriver::{pascal_case, split_camel};
use crate::data::{FileEdit, FilePlan};
use crate::registries::{ProjectLayout, SourceTree};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MarkupError {
    #[error("unterminated {0} starting at byte {1}")]
    Unterminated(&'static str, usize),

    #[error("closing tag </{found}> does not match <{expected}>")]
    MismatchedClose { expected: String, found: String },

    #[error("no markup returned from the default export")]
    NoRootMarkup,

    #[error("root element <{0} /> is self-closing")]
    SelfClosingRoot(String),
}

fn default_export_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"export\s+default\s+(?:async\s+)?function\s+([A-Z][\w$]*)").expect("valid regex")
    })
}

fn named_export_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"export\s+(?:async\s+)?(?:function|const)\s+([A-Z][\w$]*)").expect("valid regex")
    })
}

#[derive(Debug, Clone, PartialEq)]
enum ComponentExport {
    Default(String),
    Named(String),
}

impl ComponentExport {
    fn detect(content: &str, stem: &str) -> Self {
        if let Some(cap) = default_export_re().captures(content) {
            return ComponentExport::Default(cap[1].to_string());
        }
        if let Some(cap) = named_export_re().captures(content) {
            return ComponentExport::Named(cap[1].to_string());
        }
        ComponentExport::Default(pascal_case(stem))
    }

    fn name(&self) -> &str {
        match self {
            ComponentExport::Default(n) | ComponentExport::Named(n) => n,
        }
    }

    fn clause(&self) -> String {
        match self {
            ComponentExport::Default(n) => n.clone(),
            ComponentExport::Named(n) => format!("{{ {} }}", n),
        }
    }
}

/// Heading text a section for `component` is expected to carry:
/// `TopTracks` → `Top tracks`.
pub fn section_title(component: &str) -> String {
    let words = split_camel(component);
    let mut chars = words.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn strip_extension(path: &str) -> &str {
    match path.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') => stem,
        _ => path,
    }
}

/// Whether `edit` is a new leaf component that should be referenced from the
/// composition file.
fn is_new_component(edit: &FileEdit, plan: &FilePlan, tree: &impl SourceTree, layout: &ProjectLayout) -> bool {
    let display = layout.display_path(&edit.path);
    let components = format!("{}/", layout.display_path(&layout.components_dir));
    (display.ends_with(".tsx") || display.ends_with(".jsx"))
        && display.starts_with(&components)
        && plan.key(&edit.path) != plan.key(&layout.composition_path)
        && tree.read_file(&layout.resolve_path(&edit.path)).is_none()
}

/// Module specifiers under which the composition file may import the
/// component at `path`: the relative one used for new imports first.
fn import_sources(path: &str, layout: &ProjectLayout) -> Vec<String> {
    let display = layout.display_path(path);
    let composition = layout.display_path(&layout.composition_path);
    let dir = composition.rsplit_once('/').map(|(d, _)| d).unwrap_or("");
    let target = strip_extension(&display);

    let relative = match target.strip_prefix(&format!("{}/", dir)) {
        Some(rest) if !dir.is_empty() => format!("./{}", rest),
        _ => format!("@/{}", target),
    };
    let alias = format!("@/{}", target);
    vec![
        relative.clone(),
        format!("@/{}", display),
        format!("./{}", display.rsplit('/').next().unwrap_or(&display)),
        alias,
    ]
    .into_iter()
    .fold(Vec::new(), |mut acc, s| {
        if !acc.contains(&s) {
            acc.push(s);
        }
        acc
    })
}

/// Applies the import, stale-section and reference edits for one component.
pub fn splice_component(
    doc: &mut Document,
    path: &str,
    content: &str,
    layout: &ProjectLayout,
) -> Result<(), MarkupError> {
    let file = path.rsplit('/').next().unwrap_or(path);
    let export = ComponentExport::detect(content, strip_extension(file));
    let name = export.name().to_string();
    let sources = import_sources(path, layout);

    if doc.find_import(&sources).is_none() {
        let (quote, semicolon) = doc.import_style();
        let raw = format!(
            "import {} from {q}{}{q}{}",
            export.clause(),
            sources[0],
            if semicolon { ";" } else { "" },
            q = quote
        );
        tracing::info!("+ import {} into composition", name);
        doc.insert_import(&raw, &sources[0]);
    }

    let title = section_title(&name);
    if doc.remove_section_by_heading(&title) {
        tracing::info!("- removed stale \"{}\" section", title);
    }

    if !doc.contains_element(&name) {
        doc.append_to_root(Element::self_closing(&name))?;
    }
    Ok(())
}

/// Rewrites the composition file to reference every new component in the
/// plan. The result replaces a pending composition edit or is appended as a
/// new one. Returns whether the plan changed.
///
/// A missing or unparsable composition file leaves the plan untouched.
pub fn patch_composition(plan: &mut FilePlan, tree: &impl SourceTree, layout: &ProjectLayout) -> bool {
    let components: Vec<(String, String)> = plan
        .iter()
        .filter(|e| is_new_component(e, plan, tree, layout))
        .map(|e| (e.path.clone(), e.content.clone()))
        .collect();
    if components.is_empty() {
        return false;
    }

    let (base, pending) = match plan.get(&layout.composition_path) {
        Some(edit) => (edit.content.clone(), true),
        None => match tree.read_file(&layout.composition_path) {
            Some(content) => (content, false),
            None => {
                tracing::info!(
                    "composition file {} not found, components stay standalone",
                    layout.composition_path
                );
                return false;
            }
        },
    };

    let mut doc = match Document::parse(&base) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!("✗ could not parse {}: {}", layout.composition_path, e);
            return false;
        }
    };
    for (path, content) in &components {
        if let Err(e) = splice_component(&mut doc, path, content, layout) {
            tracing::warn!("✗ could not splice {} into {}: {}", path, layout.composition_path, e);
            return false;
        }
    }

    let rendered = doc.render();
    if rendered == base {
        return false;
    }
    if pending {
        if let Some(edit) = plan.get_mut(&layout.composition_path) {
            edit.content = rendered;
        }
    } else {
        plan.push(FileEdit::new(layout.composition_path.clone(), rendered));
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    const COMPOSITION: &str = r#""use client"

import { Play } from "lucide-react"
import { useEffect, useState } from "react"

function Card({ title }: { title: string }) {
  return <div className="card">{title}</div>
}

export default function MainContent() {
  const [albums, setAlbums] = useState<any[]>([]);

  useEffect(() => {
    fetch("/api/popular-albums").then((res) => res.json()).then((data) => setAlbums(data || []));
  }, []);

  return (
    <div className="min-h-screen">
      {/* Header */}
      <h1 className="text-2xl">Good afternoon, it's {"you"}</h1>

      <section className="px-6 py-8">
        <div className="flex">
          <h2 className="text-xl font-bold">Top tracks</h2>
        </div>
        <p>Coming soon</p>
      </section>

      <section className="px-6 py-8">
        <h2 className="text-xl font-bold">Popular albums</h2>
        {albums.map((a, i) => (
          <Card key={i} title={a.title} />
        ))}
      </section>

      <style jsx>{`
        .hide { display: none; }
      `}</style>
    </div>
  )
}
"#;

    const COMPONENT: &str = "export default function TopTracks() {\n  return <section>tracks</section>\n}\n";

    fn layout() -> ProjectLayout {
        ProjectLayout {
            composition_path: "src/components/main-content.tsx".to_string(),
            ..ProjectLayout::default()
        }
    }

    fn tree_with(composition: Option<&str>) -> BTreeMap<String, String> {
        let mut tree = BTreeMap::new();
        if let Some(c) = composition {
            tree.insert("src/components/main-content.tsx".to_string(), c.to_string());
        }
        tree
    }

    #[test]
    fn unmodified_document_renders_exactly() {
        let doc = Document::parse(COMPOSITION).unwrap();
        assert_eq!(doc.render(), COMPOSITION);
        assert_eq!(doc.imports().count(), 2);
        assert_eq!(doc.root().map(|r| r.name.as_str()), Some("div"));
    }

    #[test]
    fn non_ascii_top_level_code_parses() {
        let src = "const π = 3.14;\nconst naïve = \"crème\";\n\nexport default function A() {\n  return <div>héllo {π}</div>\n}\n";
        let doc = Document::parse(src).unwrap();
        assert_eq!(doc.render(), src);
        assert_eq!(doc.root().map(|r| r.name.as_str()), Some("div"));
    }

    #[test]
    fn new_component_is_imported_and_appended() {
        let layout = layout();
        let tree = tree_with(Some(COMPOSITION));
        let mut plan = FilePlan::new(&layout.source_root);
        plan.push(FileEdit::new("src/components/top-tracks.tsx", COMPONENT));

        assert!(patch_composition(&mut plan, &tree, &layout));
        assert_eq!(plan.len(), 2);

        let patched = &plan.get("src/components/main-content.tsx").unwrap().content;
        let expected = COMPOSITION
            .replace(
                "import { useEffect, useState } from \"react\"\n",
                "import { useEffect, useState } from \"react\"\nimport TopTracks from \"./top-tracks\"\n",
            )
            .replace(
                "\n\n      <section className=\"px-6 py-8\">\n        <div className=\"flex\">\n          <h2 className=\"text-xl font-bold\">Top tracks</h2>\n        </div>\n        <p>Coming soon</p>\n      </section>",
                "",
            )
            .replace("`}</style>\n", "`}</style>\n      <TopTracks />\n");
        assert_eq!(patched, &expected);
    }

    #[test]
    fn already_wired_component_is_left_alone() {
        let wired = COMPOSITION
            .replace(
                "import { Play } from \"lucide-react\"\n",
                "import { Play } from \"lucide-react\"\nimport TopTracks from \"@/components/top-tracks\"\n",
            )
            .replace("<p>Coming soon</p>", "<TopTracks />")
            .replace("Top tracks</h2>", "Charts</h2>");
        let layout = layout();
        let tree = tree_with(Some(&wired));
        let mut plan = FilePlan::new(&layout.source_root);
        plan.push(FileEdit::new("src/components/top-tracks.tsx", COMPONENT));

        assert!(!patch_composition(&mut plan, &tree, &layout));
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn named_export_gets_named_import() {
        let layout = layout();
        let tree = tree_with(Some(COMPOSITION));
        let mut plan = FilePlan::new(&layout.source_root);
        plan.push(FileEdit::new(
            "src/components/listening-history.tsx",
            "export function ListeningHistory() { return null }",
        ));

        patch_composition(&mut plan, &tree, &layout);

        let patched = &plan.get("src/components/main-content.tsx").unwrap().content;
        assert!(patched.contains("import { ListeningHistory } from \"./listening-history\"\n"));
        assert!(patched.contains("<ListeningHistory />\n    </div>"));
    }

    #[test]
    fn missing_composition_is_skipped() {
        let layout = layout();
        let tree = tree_with(None);
        let mut plan = FilePlan::new(&layout.source_root);
        plan.push(FileEdit::new("src/components/top-tracks.tsx", COMPONENT));

        assert!(!patch_composition(&mut plan, &tree, &layout));
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn unparsable_composition_is_skipped() {
        let layout = layout();
        let tree = tree_with(Some("export default function X() {\n  return (\n    <div><span></div>\n  )\n}\n"));
        let mut plan = FilePlan::new(&layout.source_root);
        plan.push(FileEdit::new("src/components/top-tracks.tsx", COMPONENT));

        assert!(!patch_composition(&mut plan, &tree, &layout));
    }

    #[test]
    fn existing_component_files_do_not_trigger_patch() {
        let layout = layout();
        let mut tree = tree_with(Some(COMPOSITION));
        tree.insert("src/components/top-tracks.tsx".to_string(), COMPONENT.to_string());
        let mut plan = FilePlan::new(&layout.source_root);
        plan.push(FileEdit::new("src/components/top-tracks.tsx", COMPONENT));

        assert!(!patch_composition(&mut plan, &tree, &layout));
    }

    #[test]
    fn pending_composition_edit_is_patched_in_place() {
        let layout = layout();
        let tree = tree_with(None);
        let mut plan = FilePlan::new(&layout.source_root);
        plan.push(FileEdit::new("src/components/main-content.tsx", COMPOSITION));
        plan.push(FileEdit::new("src/components/top-tracks.tsx", COMPONENT));

        assert!(patch_composition(&mut plan, &tree, &layout));
        assert_eq!(plan.len(), 2);
        assert!(plan.get("src/components/main-content.tsx").unwrap().content.contains("<TopTracks />"));
    }

    #[test]
    fn semicolon_style_is_copied() {
        let src = "import React from 'react';\n\nexport default function A() {\n  return (\n    <main>\n      <p>hi</p>\n    </main>\n  );\n}\n";
        let mut doc = Document::parse(src).unwrap();
        splice_component(&mut doc, "src/components/b-list.tsx", "export default function BList() {}", &layout()).unwrap();

        assert_eq!(
            doc.render(),
            "import React from 'react';\nimport BList from './b-list';\n\nexport default function A() {\n  return (\n    <main>\n      <p>hi</p>\n      <BList />\n    </main>\n  );\n}\n"
        );
    }

    #[test]
    fn section_title_is_sentence_case() {
        assert_eq!(section_title("TopTracks"), "Top tracks");
        assert_eq!(section_title("MadeForYou"), "Made for you");
    }

    #[test]
    fn markup_without_default_export_is_an_error() {
        assert_eq!(Document::parse("const a = 1;\n"), Err(MarkupError::NoRootMarkup));
    }
}

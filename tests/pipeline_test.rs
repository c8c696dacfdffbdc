use dbagent::AgentError;
use dbagent::contexts::{camel_case, extract_file_edits, kebab_case, resolve_features, synthesize_plan};
use dbagent::data::FileEdit;
use dbagent::registries::{DiskSourceTree, ProjectContext, ProjectLayout};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const SCHEMA: &str = "\
import { sqliteTable, text, integer } from 'drizzle-orm/sqlite-core';

export const madeForYou = sqliteTable('made_for_you', {
  id: integer('id').primaryKey({ autoIncrement: true }),
  title: text('title').notNull(),
});
";

const COMPOSITION: &str = r#""use client"

import { Play } from "lucide-react"
import { useEffect, useState } from "react"

export default function SpotifyMainContent() {
  const [madeForYou, setMadeForYou] = useState<any[]>([]);

  useEffect(() => {
    fetch("/api/made-for-you").then((res) => res.json()).then((data) => setMadeForYou(data || []));
  }, []);

  return (
    <div className="min-h-screen">
      <section className="px-6 py-8">
        <h2 className="text-xl font-bold">Made For You</h2>
        {madeForYou.map((item, index) => (
          <div key={index}>{item.title}</div>
        ))}
      </section>
    </div>
  )
}
"#;

fn write(root: &Path, path: &str, content: &str) {
    let full = root.join(path);
    fs::create_dir_all(full.parent().unwrap()).unwrap();
    fs::write(full, content).unwrap();
}

/// A project that already has every shared scaffold plus a top-tracks route.
fn fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(root, "src/db/schema.ts", SCHEMA);
    write(
        root,
        "src/db/connection.ts",
        "import path from 'path';\nimport { drizzle } from 'drizzle-orm/better-sqlite3';\nimport Database from 'better-sqlite3';\n\nconst sqlite = new Database(path.join(process.cwd(), 'sqlite.db'));\nexport const db = drizzle(sqlite);\n",
    );
    write(root, "src/db/seed.ts", "// seed\n");
    write(root, "src/db/sync.ts", "// sync\n");
    write(root, "src/app/api/made-for-you/route.ts", "export async function GET() {}\n");
    write(root, "src/app/api/top-tracks/route.ts", "export async function GET() {}\n");
    write(root, "src/components/spotify-main-content.tsx", COMPOSITION);
    write(root, "package.json", "{ \"name\": \"fixture\" }\n");
    dir
}

fn plan_for(root: &Path, query: &str, response: &str) -> Result<dbagent::contexts::SynthesizedPlan, AgentError> {
    let layout = ProjectLayout::default();
    let tree = DiskSourceTree::new(root);
    let context = ProjectContext::gather(&tree, &layout);
    synthesize_plan(query, response, &context, &tree, &layout)
}

fn edit<'a>(edits: &'a [FileEdit], path: &str) -> &'a FileEdit {
    edits
        .iter()
        .find(|e| e.path == path)
        .unwrap_or_else(|| panic!("no edit for {}", path))
}

#[test]
fn two_quoted_features_resolve_in_order() {
    let routes: Vec<String> = resolve_features("I want to track 'listening history' and 'top tracks'")
        .into_iter()
        .map(|f| f.route_name)
        .collect();
    assert_eq!(routes, vec!["listening-history", "top-tracks"]);
}

#[test]
fn case_conversions_are_idempotent_on_examples() {
    for input in ["Top Tracks", "listening_history", "made-for-you", "recentlyPlayed"] {
        let kebab = kebab_case(input);
        assert_eq!(kebab_case(&kebab), kebab);
        let camel = camel_case(input);
        assert_eq!(camel_case(&camel), camel);
    }
}

#[test]
fn untagged_create_table_block_targets_sync_file() {
    let response = "Run this once:\n\n```sql\nCREATE TABLE IF NOT EXISTS top_tracks (\n  id INTEGER PRIMARY KEY AUTOINCREMENT\n);\n```\n";
    let edits = extract_file_edits(response, "top tracks", &ProjectLayout::default()).into_edits();
    assert_eq!(edits.len(), 1);
    assert_eq!(edits[0].path, "src/db/sync.ts");
}

#[test]
fn differently_cased_or_rooted_paths_keep_first_edit() {
    let response = "\
// src/db/schema.ts
```ts
export const first = 1;
```

### DB/Schema.ts
```ts
export const second = 2;
```
";
    let edits = extract_file_edits(response, "", &ProjectLayout::default()).into_edits();
    assert_eq!(edits, vec![FileEdit::new("src/db/schema.ts", "export const first = 1;")]);
}

#[test]
fn schema_merge_keeps_existing_and_appends_new() {
    let dir = fixture();
    let response = "\
// db/schema.ts
```typescript
import { sqliteTable, text, integer } from 'drizzle-orm/sqlite-core';

export const madeForYou = sqliteTable('made_for_you', {
  id: integer('id').primaryKey(),
});

export const topTracks = sqliteTable('top_tracks', {
  id: integer('id').primaryKey({ autoIncrement: true }),
  title: text('title').notNull(),
});
```
";
    let plan = plan_for(dir.path(), "Add a 'top tracks' table", response).unwrap();

    assert!(plan.schema_merged);
    assert_eq!(plan.scaffolded, 0);
    let merged = &edit(&plan.edits, "src/db/schema.ts").content;
    assert_eq!(merged.matches("export const madeForYou").count(), 1);
    assert!(merged.starts_with(SCHEMA.trim()));
    assert!(merged.contains("export const topTracks = sqliteTable('top_tracks', {"));

    write(dir.path(), "src/db/schema.ts", merged);
    let again = plan_for(dir.path(), "Add a 'top tracks' table", response).unwrap();
    assert_eq!(&edit(&again.edits, "src/db/schema.ts").content, merged);
}

#[test]
fn new_component_rewrites_composition_too() {
    let dir = fixture();
    let response = "\
// components/top-tracks.tsx
```tsx
\"use client\"

import { useEffect, useState } from \"react\"

export default function TopTracks() {
  const [tracks, setTracks] = useState<any[]>([])
  useEffect(() => {
    fetch(\"/api/top-tracks\").then((res) => res.json()).then((data) => setTracks(data || []))
  }, [])
  return (
    <section className=\"px-6 py-8\">
      <h2 className=\"text-xl font-bold\">Top tracks</h2>
    </section>
  )
}
```
";
    let plan = plan_for(dir.path(), "Add a 'top tracks' section", response).unwrap();

    assert_eq!(plan.extracted, 1);
    assert_eq!(plan.scaffolded, 0);
    assert!(plan.composition_patched);
    assert_eq!(plan.edits.len(), 2);

    let composition = &edit(&plan.edits, "src/components/spotify-main-content.tsx").content;
    let expected = COMPOSITION
        .replace(
            "import { useEffect, useState } from \"react\"\n",
            "import { useEffect, useState } from \"react\"\nimport TopTracks from \"./top-tracks\"\n",
        )
        .replace("      </section>\n    </div>", "      </section>\n      <TopTracks />\n    </div>");
    assert_eq!(composition, &expected);
}

#[test]
fn empty_project_gets_scaffolds_for_each_feature() {
    let dir = TempDir::new().unwrap();
    let response = "\
// db/schema.ts
```ts
export const listeningHistory = sqliteTable('listening_history', {
  id: integer('id').primaryKey(),
  playedAt: integer('played_at', { mode: 'timestamp' }),
});
export const topTracks = sqliteTable('top_tracks', {
  id: integer('id').primaryKey(),
});
```
";
    let plan = plan_for(dir.path(), "I want to track 'listening history' and 'top tracks'", response).unwrap();

    let paths: Vec<&str> = plan.edits.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec![
            "src/db/schema.ts",
            "src/db/connection.ts",
            "src/db/sync.ts",
            "src/db/seed.ts",
            "src/app/api/listening-history/route.ts",
            "src/app/api/top-tracks/route.ts",
        ]
    );
    assert!(!plan.schema_merged);
    let seed = &edit(&plan.edits, "src/db/seed.ts").content;
    assert!(seed.contains("await db.delete(listeningHistory);"));
    assert!(seed.contains("playedAt: new Date()"));
}

#[test]
fn component_only_response_still_gets_a_route() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "src/db/schema.ts", SCHEMA);
    let response = "\
// components/top-tracks.tsx
```tsx
export default function TopTracks() {
  return <section>Top tracks</section>
}
```
";
    let plan = plan_for(dir.path(), "Add a 'top tracks' section", response).unwrap();

    let paths: Vec<&str> = plan.edits.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(paths[0], "src/components/top-tracks.tsx");
    assert!(paths.contains(&"src/app/api/top-tracks/route.ts"));
}

#[test]
fn response_without_blocks_is_an_extraction_miss() {
    let dir = fixture();
    let err = plan_for(dir.path(), "add likes", "I am not sure what you mean.").unwrap_err();
    assert!(matches!(err, AgentError::ExtractionMiss { .. }));
}

use super::content_classifier::infer_path;
use crate::data::{is_contained, FileEdit, FilePlan};
use crate::registries::ProjectLayout;
use regex::Regex;
use std::sync::OnceLock;

const PATH: &str = r"([A-Za-z0-9_@~./\\-]*[A-Za-z0-9_-]\.[A-Za-z0-9]+)";
const FENCE: &str = r"[ \t]*\r?\n(?:[ \t]*\r?\n)*[ \t]*```[A-Za-z0-9_+-]*[ \t]*\r?\n((?s:.*?))```";

/// Path markers in fixed precedence order: `//`, `#`, bold, `File:`.
fn tagged_block_patterns() -> &'static [(&'static str, Regex)] {
    static RES: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            ("//", format!(r"(?m)^[ \t]*//[ \t]*{}{}", PATH, FENCE)),
            ("#", format!(r"(?m)^[ \t]*#{{1,6}}[ \t]*`?{}`?{}", PATH, FENCE)),
            (
                "bold",
                format!(r"\*\*(?:File:[ \t]*)?`?{}`?:?\*\*:?{}", PATH, FENCE),
            ),
            ("File:", format!(r"(?i)\bFile:[ \t]*`?{}`?{}", PATH, FENCE)),
        ]
        .into_iter()
        .map(|(name, pattern)| (name, Regex::new(&pattern).expect("valid regex")))
        .collect()
    })
}

fn any_fence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"```[A-Za-z0-9_+-]*[ \t]*\r?\n((?s:.*?))```").expect("valid regex")
    })
}

/// Pulls `(path, content)` pairs out of a model response.
///
/// Every marker pattern is run over the whole text in precedence order and
/// each normalized path is kept once, first occurrence winning. Only when no
/// tagged block exists anywhere are bare fenced blocks classified by content;
/// blocks that cannot be classified are dropped.
pub fn extract_file_edits(response: &str, query: &str, layout: &ProjectLayout) -> FilePlan {
    let mut plan = FilePlan::new(layout.source_root.clone());

    for (marker, re) in tagged_block_patterns() {
        for cap in re.captures_iter(response) {
            let (Some(path), Some(code)) = (cap.get(1), cap.get(2)) else {
                continue;
            };
            let resolved = layout.resolve_path(path.as_str());
            if !is_contained(&resolved) {
                tracing::warn!("Rejecting {} block for {}: path leaves the project root", marker, path.as_str());
                continue;
            }
            if plan.push(FileEdit::new(resolved.clone(), code.as_str().trim())) {
                tracing::debug!("{} marker → {}", marker, resolved);
            }
        }
    }

    if !plan.is_empty() {
        tracing::info!("Extracted {} tagged file(s)", plan.len());
        return plan;
    }

    for cap in any_fence_re().captures_iter(response) {
        let Some(code) = cap.get(1).map(|m| m.as_str().trim()) else {
            continue;
        };
        match infer_path(code, query, layout) {
            Some(path) => {
                tracing::info!("Untagged block classified as {}", path);
                plan.push(FileEdit::new(path, code));
            }
            None => tracing::warn!("Discarding untagged block with no recognizable target"),
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(response: &str) -> Vec<FileEdit> {
        extract_file_edits(response, "", &ProjectLayout::default()).into_edits()
    }

    #[test]
    fn slash_marker_with_language_tag() {
        let edits = extract("Here you go:\n\n// db/schema.ts\n```typescript\nexport const a = 1;\n```\n");
        assert_eq!(edits, vec![FileEdit::new("src/db/schema.ts", "export const a = 1;")]);
    }

    #[test]
    fn all_marker_styles_are_recognized() {
        let response = "\
### src/db/seed.ts
```ts
seed();
```

**`src/app/api/top-tracks/route.ts`**
```ts
export async function GET() {}
```

File: components/top-tracks.tsx
```tsx
export default function TopTracks() { return <div/> }
```
";
        let paths: Vec<String> = extract(response).into_iter().map(|e| e.path).collect();
        assert_eq!(
            paths,
            vec![
                "src/db/seed.ts",
                "src/app/api/top-tracks/route.ts",
                "src/components/top-tracks.tsx",
            ]
        );
    }

    #[test]
    fn paths_leaving_the_root_are_rejected() {
        let response = "\
// ../../outside.ts
```ts
escape();
```
// src/../../../etc/cron.ts
```ts
escape();
```
// db/schema.ts
```ts
export const a = 1;
```
";
        let paths: Vec<String> = extract(response).into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["src/db/schema.ts"]);
    }

    #[test]
    fn first_occurrence_of_a_path_wins() {
        let response = "\
// src/db/schema.ts
```ts
first
```
// DB/schema.ts
```ts
second
```
";
        let edits = extract(response);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].content, "first");
    }

    #[test]
    fn earlier_pattern_wins_over_earlier_position() {
        let response = "\
**src/db/sync.ts**
```ts
from bold
```
// src/db/sync.ts
```ts
from slashes
```
";
        let edits = extract(response);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].content, "from slashes");
    }

    #[test]
    fn later_pattern_adds_unseen_paths() {
        let response = "\
// src/db/schema.ts
```ts
schema
```
File: src/db/seed.ts
```ts
seed
```
";
        let paths: Vec<String> = extract(response).into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["src/db/schema.ts", "src/db/seed.ts"]);
    }

    #[test]
    fn untagged_blocks_are_classified() {
        let response = "```sql\nCREATE TABLE top_tracks (id INTEGER PRIMARY KEY);\n```\n\n```\nconsole.log('noise');\n```";
        let edits = extract(response);
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].path, "src/db/sync.ts");
    }

    #[test]
    fn nothing_found_is_empty() {
        assert!(extract("I cannot help with that.").is_empty());
    }
}

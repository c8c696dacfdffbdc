use crate::data::normalize_path;
use crate::registries::ProjectLayout;
use regex::{Captures, Regex};
use std::sync::OnceLock;

const PATH_IMPORT: &str = "import path from 'path';";
const DRIVER_IMPORT: &str = "import Database from 'better-sqlite3';";

fn import_specifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(\bfrom\s*|\bimport\s*\(?\s*)(['"])([^'"\n]+)(['"])"#).expect("valid regex")
    })
}

fn driver_construction_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"new\s+Database\s*\(").expect("valid regex"))
}

fn driver_binding_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*((?:export\s+)?(?:const|let|var)\s+[A-Za-z_$][\w$]*)\s*=\s*new\s+Database\s*\(")
            .expect("valid regex")
    })
}

fn path_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*import\s+(?:\*\s+as\s+)?path\s+from\s+['"](?:node:)?path['"];?\s*$"#)
            .expect("valid regex")
    })
}

fn canonical_construction(layout: &ProjectLayout) -> String {
    format!("new Database(path.join(process.cwd(), '{}'))", layout.database_file)
}

/// The single database-handle construction every connection file ends up with.
pub fn canonical_driver_line(binding: &str, layout: &ProjectLayout) -> String {
    format!("{} = {};", binding, canonical_construction(layout))
}

/// Swaps only the `new Database(...)` expression in `line`, keeping the
/// statement around it. `None` when the call does not close on this line.
fn replace_inline_construction(line: &str, layout: &ProjectLayout) -> Option<String> {
    let m = driver_construction_re().find(line)?;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (offset, c) in line[m.end() - 1..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' | '`' => quote = Some(c),
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let end = m.end() - 1 + offset + 1;
                    return Some(format!("{}{}{}", &line[..m.start()], canonical_construction(layout), &line[end..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Applies both content normalizations to one planned file.
pub fn normalize_content(path: &str, content: &str, layout: &ProjectLayout) -> String {
    let rewritten = rewrite_imports(path, content, layout);
    if normalize_path(path, &layout.source_root)
        == normalize_path(&layout.connection_path, &layout.source_root)
    {
        normalize_connection(&rewritten, layout)
    } else {
        rewritten
    }
}

/// Adds the canonical extension to extensionless `./name` imports (outside
/// JSX files, whose local imports are components) and to `@/db/...` imports.
pub fn rewrite_imports(path: &str, content: &str, layout: &ProjectLayout) -> String {
    let jsx_file = path.ends_with(".tsx") || path.ends_with(".jsx");
    import_specifier_re()
        .replace_all(content, |cap: &Captures| {
            let specifier = &cap[3];
            let local = specifier.starts_with("./") && !jsx_file;
            let db_alias = specifier.starts_with("@/db/");
            let last_segment = specifier.rsplit('/').next().unwrap_or(specifier);
            if (local || db_alias) && !last_segment.contains('.') {
                format!(
                    "{}{}{}{}{}",
                    &cap[1], &cap[2], specifier, layout.import_extension, &cap[4]
                )
            } else {
                cap[0].to_string()
            }
        })
        .into_owned()
}

/// Makes the connection bootstrap use exactly one canonical handle
/// construction rooted at the working directory, with the `path` import on
/// the first line.
pub fn normalize_connection(content: &str, layout: &ProjectLayout) -> String {
    let mut lines: Vec<String> = content.lines().map(|l| l.to_string()).collect();

    let construction_lines: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, line)| driver_construction_re().is_match(line))
        .map(|(i, _)| i)
        .collect();

    if let Some(&first) = construction_lines.first() {
        let binding = driver_binding_re()
            .captures(&lines[first])
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().to_string());
        match binding {
            Some(binding) => lines[first] = canonical_driver_line(&binding, layout),
            None => {
                if let Some(line) = replace_inline_construction(&lines[first], layout) {
                    lines[first] = line;
                }
            }
        }
        for &extra in construction_lines.iter().skip(1).rev() {
            lines.remove(extra);
        }
    } else {
        let mut at = last_import_end(&lines).map(|i| i + 1).unwrap_or(0);
        if !lines.iter().any(|l| l.trim_start().starts_with("import Database")) {
            lines.insert(at, DRIVER_IMPORT.to_string());
            at += 1;
        }
        lines.insert(at, canonical_driver_line("const sqlite", layout));
    }

    lines.retain(|line| !path_import_re().is_match(line));
    lines.insert(0, PATH_IMPORT.to_string());

    let mut out = lines.join("\n");
    if content.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Index of the line that ends the last import statement.
fn last_import_end(lines: &[String]) -> Option<usize> {
    let mut last = None;
    let mut i = 0;
    while i < lines.len() {
        if lines[i].trim_start().starts_with("import ") || lines[i].trim_start().starts_with("import{") {
            let mut end = i;
            while end < lines.len() && !closes_import(&lines[end]) {
                end += 1;
            }
            let end = end.min(lines.len() - 1);
            last = Some(end);
            i = end + 1;
        } else {
            i += 1;
        }
    }
    last
}

fn closes_import(line: &str) -> bool {
    line.contains('\'') || line.contains('"')
}

use crate::data::{DeclarationBlock, DeclarationKind};
use regex::Regex;
use std::sync::OnceLock;

fn declaration_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*export\s+(const|type)\s+([A-Za-z_$][\w$]*)").expect("valid regex")
    })
}

fn table_declaration_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[ \t]*export\s+const\s+([A-Za-z_$][\w$]*)\s*=\s*(?:sqlite|pg|mysql)Table\s*\(")
            .expect("valid regex")
    })
}

fn column_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^\s*([A-Za-z_$][\w$]*)\s*:\s*(text|integer|int|real|numeric|blob|boolean|varchar|serial|timestamp)\s*\(\s*['"]\w+['"](.*)$"#)
            .expect("valid regex")
    })
}

/// Splits schema text into its `export const` / `export type` blocks.
/// Anything before the first declaration (imports, comments) is not part of
/// any block.
pub fn split_declarations(content: &str) -> Vec<DeclarationBlock> {
    let starts: Vec<(usize, DeclarationKind, String)> = declaration_start_re()
        .captures_iter(content)
        .filter_map(|cap| {
            let whole = cap.get(0)?;
            let kind = match cap.get(1)?.as_str() {
                "type" => DeclarationKind::Type,
                _ => DeclarationKind::Value,
            };
            Some((whole.start(), kind, cap.get(2)?.as_str().to_string()))
        })
        .collect();

    starts
        .iter()
        .enumerate()
        .map(|(i, (start, kind, name))| {
            let end = starts.get(i + 1).map(|next| next.0).unwrap_or(content.len());
            DeclarationBlock {
                name: name.clone(),
                kind: *kind,
                raw_text: content[*start..end].trim().to_string(),
            }
        })
        .collect()
}

/// Whether `text` already declares `name` with the given kind.
pub fn is_declared(text: &str, kind: DeclarationKind, name: &str) -> bool {
    let pattern = format!(
        r"(?m)^[ \t]*export\s+{}\s+{}\b",
        kind.keyword(),
        regex::escape(name)
    );
    Regex::new(&pattern)
        .map(|re| re.is_match(text))
        .unwrap_or(false)
}

/// Appends every declaration of `incoming` whose kind+name is not yet in
/// `existing`. Existing text is never reordered or truncated, and merging
/// the same content twice is a no-op the second time.
pub fn merge_schema(existing: &str, incoming: &str) -> String {
    let mut merged = existing.to_string();
    for block in split_declarations(incoming) {
        if is_declared(&merged, block.kind, &block.name) {
            tracing::debug!("Schema already declares {} {}, skipping", block.kind, block.name);
            continue;
        }
        tracing::info!("Appending {} {} to schema", block.kind, block.name);
        merged = if merged.trim().is_empty() {
            format!("{}\n", block.raw_text)
        } else {
            format!("{}\n\n{}\n", merged.trim(), block.raw_text)
        };
    }
    merged
}

/// Names of the table declarations in schema text, in file order.
pub fn table_symbols(content: &str) -> Vec<String> {
    table_declaration_re()
        .captures_iter(content)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: String,
    pub timestamp: bool,
    pub primary_key: bool,
}

/// Columns of one table declaration, best effort, one column per line.
pub fn table_columns(content: &str, symbol: &str) -> Vec<Column> {
    let Some(block) = split_declarations(content)
        .into_iter()
        .find(|b| b.kind == DeclarationKind::Value && b.name == symbol)
    else {
        return Vec::new();
    };

    block
        .raw_text
        .lines()
        .filter_map(|line| {
            let cap = column_re().captures(line)?;
            let column_type = cap.get(2)?.as_str().to_string();
            let rest = cap.get(3).map(|m| m.as_str()).unwrap_or("");
            Some(Column {
                name: cap.get(1)?.as_str().to_string(),
                timestamp: column_type == "timestamp" || rest.contains("timestamp"),
                primary_key: rest.contains("primaryKey"),
                column_type,
            })
        })
        .collect()
}

use super::identifier_deriver::{derive_identifier, feature_from_phrase};
use crate::registries::ProjectLayout;
use regex::Regex;
use std::sync::OnceLock;

/// What an untagged code block looks like it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Schema,
    Connection,
    Sync,
    Seed,
    RouteHandler,
}

struct Rule {
    class: ContentClass,
    matches: fn(&str) -> bool,
}

/// Evaluated top to bottom; the first rule that matches decides.
const RULES: [Rule; 5] = [
    Rule {
        class: ContentClass::Schema,
        matches: declares_table,
    },
    Rule {
        class: ContentClass::Connection,
        matches: constructs_driver,
    },
    Rule {
        class: ContentClass::Sync,
        matches: has_create_table_ddl,
    },
    Rule {
        class: ContentClass::Seed,
        matches: seeds_rows,
    },
    Rule {
        class: ContentClass::RouteHandler,
        matches: exports_http_handlers,
    },
];

fn re(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("valid regex"))
}

pub fn declares_table(code: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    re(&RE, r"\b(?:sqlite|pg|mysql)Table\s*\(").is_match(code)
}

pub fn constructs_driver(code: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    re(&RE, r"new\s+Database\s*\(|\bdrizzle\s*\(|\bcreateClient\s*\(").is_match(code)
}

pub fn has_create_table_ddl(code: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    re(&RE, r"(?i)\bCREATE\s+TABLE\b").is_match(code)
}

pub fn seeds_rows(code: &str) -> bool {
    static WRITE: OnceLock<Regex> = OnceLock::new();
    static INTENT: OnceLock<Regex> = OnceLock::new();
    re(&WRITE, r"\.(?:insert|delete)\s*\(").is_match(code)
        && re(&INTENT, r"(?i)seed|sample|mock|dummy|fixture").is_match(code)
}

pub fn exports_http_handlers(code: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    re(
        &RE,
        r"export\s+(?:async\s+)?function\s+(?:GET|POST|PUT|PATCH|DELETE)\b|export\s+const\s+(?:GET|POST|PUT|PATCH|DELETE)\s*=",
    )
    .is_match(code)
}

pub fn classify_content(code: &str) -> Option<ContentClass> {
    RULES
        .iter()
        .find(|rule| (rule.matches)(code))
        .map(|rule| rule.class)
}

/// Target path for an untagged block, or `None` when nothing matches.
///
/// Route handlers are named after the identifier derived from the code and
/// the user query.
pub fn infer_path(code: &str, query: &str, layout: &ProjectLayout) -> Option<String> {
    let path = match classify_content(code)? {
        ContentClass::Schema => layout.schema_path.clone(),
        ContentClass::Connection => layout.connection_path.clone(),
        ContentClass::Sync => layout.sync_path.clone(),
        ContentClass::Seed => layout.seed_path.clone(),
        ContentClass::RouteHandler => {
            let feature = feature_from_phrase(&derive_identifier(query, Some(code)));
            layout.route_path(&feature.route_name)
        }
    };
    Some(path)
}

use crate::data::FeatureRequest;
use regex::Regex;
use std::sync::OnceLock;

/// Identifier used when nothing specific can be derived.
pub const FALLBACK_IDENTIFIER: &str = "items";
/// Identifier used when a phrase quotes several terms at once.
pub const MULTI_QUOTE_IDENTIFIER: &str = "collections";

const MAX_PATTERN_WORDS: usize = 3;
const MAX_FALLBACK_WORDS: usize = 2;

const CONNECTIVE_WORDS: &[&str] = &[
    "a", "an", "the", "my", "our", "their", "your", "all", "some", "of", "and", "or", "for",
    "to", "with", "new", "each", "every", "any",
];

const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "we", "our", "you", "your", "it", "its", "this", "that", "these", "those",
    "want", "wants", "would", "like", "need", "needs", "please", "can", "could", "should", "will",
    "let", "lets", "to", "a", "an", "the", "and", "or", "of", "for", "with", "in", "on", "into",
    "from", "by", "is", "are", "be", "so", "add", "create", "make", "build", "implement", "set",
    "up", "new", "feature", "features", "table", "tables", "database", "db", "data", "store",
    "save", "track", "manage", "show", "display", "some", "all", "page", "section", "api",
    "route", "endpoint", "app", "also", "get", "see", "keep", "support",
];

/// Lower-cases, drops everything but ASCII letters and digits, and joins the
/// remaining words with single hyphens.
///
/// Hyphens, underscores and whitespace all separate words, so the output is
/// a fixed point: `kebab_case(kebab_case(x)) == kebab_case(x)`.
pub fn kebab_case(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut words: Vec<String> = Vec::new();
    for raw in lowered.split(|c: char| c.is_whitespace() || c == '-' || c == '_') {
        let word: String = raw.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
        if !word.is_empty() {
            words.push(word);
        }
    }
    words.join("-")
}

/// Joins words so each one after the first starts upper-case, then
/// lower-cases the very first character.
///
/// Letters inside a word keep their case, so an already camelCased
/// identifier passes through untouched.
pub fn camel_case(input: &str) -> String {
    let mut out = String::new();
    for word in input
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            if out.is_empty() {
                out.push(first.to_ascii_lowercase());
            } else {
                out.push(first.to_ascii_uppercase());
            }
            out.push_str(chars.as_str());
        }
    }
    out
}

/// `top-tracks` / `top_tracks` / `top tracks` → `TopTracks`
pub fn pascal_case(input: &str) -> String {
    let camel = camel_case(input);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// `topTracks` → `top tracks`
pub fn split_camel(identifier: &str) -> String {
    let mut out = String::new();
    let mut prev_lower = false;
    for c in identifier.chars() {
        if c == '_' || c == '-' {
            out.push(' ');
            prev_lower = false;
            continue;
        }
        if c.is_ascii_uppercase() && prev_lower {
            out.push(' ');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        out.push(c.to_ascii_lowercase());
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Quoted substrings in order of appearance.
///
/// A quote only opens after a non-alphanumeric character and only closes
/// before one, so apostrophes inside words ("I'd", "user's") are ignored.
pub fn quoted_terms(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut terms = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let opens = matches!(c, '\'' | '"' | '‘' | '“')
            && (i == 0 || !chars[i - 1].is_alphanumeric());
        if !opens {
            i += 1;
            continue;
        }
        let closer = match c {
            '‘' => '’',
            '“' => '”',
            other => other,
        };
        let mut j = i + 1;
        let mut closed_at = None;
        while j < chars.len() && chars[j] != '\n' {
            if chars[j] == closer
                && (j + 1 == chars.len() || !chars[j + 1].is_alphanumeric())
            {
                closed_at = Some(j);
                break;
            }
            j += 1;
        }
        match closed_at {
            Some(end) => {
                let term: String = chars[i + 1..end].iter().collect();
                if !term.trim().is_empty() {
                    terms.push(term.trim().to_string());
                }
                i = end + 1;
            }
            None => i += 1,
        }
    }
    terms
}

/// Case-folds and turns every non-alphanumeric run into a single space.
pub fn clean_phrase(phrase: &str) -> String {
    phrase
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn schema_import_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"import\s*\{\s*([A-Za-z_$][\w$]*)[^}]*\}\s*from\s*['"][^'"]*schema[^'"]*['"]"#)
            .expect("valid regex")
    })
}

fn from_call_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\.from\(\s*([A-Za-z_$][\w$]*)\s*\)").expect("valid regex"))
}

fn extraction_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"\b(?:store|save|track|manage|record|log)\s+(?:of\s+)?([a-z0-9][a-z0-9' ]*?)(?:\s+(?:in|into|to|for|with|from|on|using|so|that|which|when)\b|[.,;:!?]|$)",
            r"\b(?:create|add|make|build|set up)\s+(?:a\s+|an\s+|the\s+)?(?:new\s+)?(?:database\s+)?(?:table|model|schema|collection)\s+(?:for|of|to store|to hold|called|named)\s+([a-z0-9][a-z0-9' ]*?)(?:\s+(?:in|with|so|that|which|when)\b|[.,;:!?]|$)",
            r"\b([a-z0-9]+(?:\s+[a-z0-9]+)?)\s+(?:management|tracking|tracker)(?:\s+system)?\b",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    })
}

/// Derives an identifier phrase (lower-case words separated by spaces) for a
/// feature request. First successful rule wins:
///
/// 1. a schema import or `.from(x)` call in `code`
/// 2. exactly one quoted term in the phrase
/// 3. several quoted terms → [`MULTI_QUOTE_IDENTIFIER`]
/// 4. the ordered extraction patterns, capped at three words
/// 5. the first two non-stop-words of the phrase
/// 6. [`FALLBACK_IDENTIFIER`]
pub fn derive_identifier(phrase: &str, code: Option<&str>) -> String {
    if let Some(code) = code {
        let symbol = schema_import_re()
            .captures(code)
            .or_else(|| from_call_re().captures(code))
            .and_then(|cap| cap.get(1))
            .map(|m| split_camel(m.as_str()));
        if let Some(symbol) = symbol.filter(|s| !s.is_empty()) {
            return symbol;
        }
    }

    let quoted = quoted_terms(phrase);
    match quoted.len() {
        0 => {}
        1 => {
            let term = clean_phrase(&quoted[0]);
            if !term.is_empty() {
                return term;
            }
        }
        _ => return MULTI_QUOTE_IDENTIFIER.to_string(),
    }

    let lowered = phrase.to_lowercase();
    for re in extraction_patterns() {
        if let Some(cap) = re.captures(&lowered) {
            let captured = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let words = strip_words(&clean_phrase(captured), CONNECTIVE_WORDS, MAX_PATTERN_WORDS);
            if !words.is_empty() {
                return words;
            }
        }
    }

    let words = strip_words(&clean_phrase(phrase), STOP_WORDS, MAX_FALLBACK_WORDS);
    if !words.is_empty() {
        return words;
    }

    FALLBACK_IDENTIFIER.to_string()
}

/// Builds the route/symbol pair for an identifier phrase.
pub fn feature_from_phrase(phrase: &str) -> FeatureRequest {
    let cleaned = clean_phrase(phrase);
    FeatureRequest::new(kebab_case(&cleaned), camel_case(&cleaned))
}

/// Drops `excluded` words and keeps at most `cap` of the rest.
pub(crate) fn strip_words(phrase: &str, excluded: &[&str], cap: usize) -> String {
    phrase
        .split_whitespace()
        .filter(|w| !excluded.contains(w))
        .take(cap)
        .collect::<Vec<_>>()
        .join(" ")
}

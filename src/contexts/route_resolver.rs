use super::identifier_deriver::{
    clean_phrase, derive_identifier, feature_from_phrase, quoted_terms, strip_words,
    FALLBACK_IDENTIFIER,
};
use crate::data::FeatureRequest;
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

const MAX_ITEM_WORDS: usize = 3;

const ITEM_CONNECTIVES: &[&str] = &[
    "a", "an", "the", "my", "our", "their", "your", "all", "some", "of", "and", "new", "each",
];

/// A list item is cut at the first of these; an item that starts with one is
/// not a feature at all.
const ITEM_BREAKERS: &[&str] = &[
    "to", "in", "into", "for", "with", "so", "that", "which", "on", "using", "when", "from",
];

fn multi_feature_patterns() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)\b(?:track|store|save|manage|add|create|build|show|display|support)\s+(?:tables?\s+for\s+|sections?\s+for\s+|support\s+for\s+|apis?\s+for\s+|routes?\s+for\s+)?([^.!?\n]+)",
            r"(?i)\b(?:tables?|sections?|features?|routes?|endpoints?)\s+(?:for|of)\s+([^.!?\n]+)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("valid regex"))
        .collect()
    })
}

/// Ordered, deduplicated features requested by a query.
///
/// Two or more quoted terms always win. Otherwise the multi-feature patterns
/// are tried, and finally the single derived identifier is used unless it is
/// the generic fallback.
pub fn resolve_features(query: &str) -> Vec<FeatureRequest> {
    let quoted = quoted_terms(query);
    if quoted.len() >= 2 {
        return dedup(quoted.iter().map(|term| feature_from_phrase(term)));
    }

    for re in multi_feature_patterns() {
        for cap in re.captures_iter(query) {
            let tail = cap.get(1).map(|m| m.as_str()).unwrap_or("");
            let items = split_feature_list(tail);
            if items.len() >= 2 {
                return dedup(items.iter().map(|item| feature_from_phrase(item)));
            }
        }
    }

    let single = derive_identifier(query, None);
    if single == FALLBACK_IDENTIFIER {
        return Vec::new();
    }
    vec![feature_from_phrase(&single)]
}

/// Splits `a, b, c and d` into its items. A list without a comma counts only
/// when it carries an `and` clause.
fn split_feature_list(tail: &str) -> Vec<String> {
    let mut pieces: Vec<String> = tail.split(',').map(|p| p.trim().to_string()).collect();
    if let Some(last) = pieces.pop() {
        let last = last.strip_prefix("and ").unwrap_or(&last).to_string();
        match split_and_clause(&last) {
            Some((head, and_term)) => {
                pieces.push(head);
                pieces.push(and_term);
            }
            None => pieces.push(last),
        }
    }

    pieces
        .iter()
        .map(|p| p.strip_prefix("and ").unwrap_or(p))
        .map(clean_item)
        .filter(|item| !item.is_empty())
        .collect()
}

fn and_clause_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s+and\s+").expect("valid regex"))
}

/// Splits at the last ` and `, matched on the piece itself so offsets stay on
/// char boundaries.
fn split_and_clause(piece: &str) -> Option<(String, String)> {
    let m = and_clause_re().find_iter(piece).last()?;
    Some((piece[..m.start()].to_string(), piece[m.end()..].to_string()))
}

fn clean_item(item: &str) -> String {
    let cleaned = clean_phrase(item);
    let kept: Vec<&str> = cleaned
        .split_whitespace()
        .take_while(|w| !ITEM_BREAKERS.contains(w))
        .collect();
    strip_words(&kept.join(" "), ITEM_CONNECTIVES, MAX_ITEM_WORDS)
}

fn dedup(features: impl Iterator<Item = FeatureRequest>) -> Vec<FeatureRequest> {
    let mut seen = HashSet::new();
    features
        .filter(|f| !f.route_name.is_empty())
        .filter(|f| seen.insert(f.route_name.clone()))
        .collect()
}

use super::block_extractor::extract_file_edits;
use super::route_resolver::resolve_features;
use super::scaffold_synthesizer::ScaffoldSynthesizer;
use super::schema_merger::merge_schema;
use super::text_patcher::normalize_content;
use super::tree_patcher::patch_composition;
use crate::data::{FeatureRequest, FileEdit};
use crate::error::AgentError;
use crate::registries::{ProjectContext, ProjectLayout, SourceTree};

/// Everything a run decided to write, in write order.
#[derive(Debug, Clone)]
pub struct SynthesizedPlan {
    pub features: Vec<FeatureRequest>,
    pub edits: Vec<FileEdit>,
    /// Edits taken from the model response.
    pub extracted: usize,
    /// Scaffold files added because nothing provided them.
    pub scaffolded: usize,
    pub schema_merged: bool,
    pub composition_patched: bool,
}

/// Turns one model response into the final list of file edits.
///
/// Steps run in a fixed order: feature resolution, block extraction, scaffold
/// synthesis, content normalization, schema merge, composition patch. Only
/// an extraction miss is an error; the merge and patch steps fall back to the
/// content they were given.
pub fn synthesize_plan(
    query: &str,
    response: &str,
    context: &ProjectContext,
    tree: &impl SourceTree,
    layout: &ProjectLayout,
) -> Result<SynthesizedPlan, AgentError> {
    let features = resolve_features(query);
    if features.is_empty() {
        tracing::info!("No feature names derived from query");
    } else {
        let names: Vec<&str> = features.iter().map(|f| f.route_name.as_str()).collect();
        tracing::info!("Features: {}", names.join(", "));
    }

    let mut plan = extract_file_edits(response, query, layout);
    if plan.is_empty() {
        return Err(AgentError::ExtractionMiss {
            raw_response: response.to_string(),
        });
    }
    let extracted = plan.len();
    tracing::info!("Extracted {} file(s) from model response", extracted);

    let scaffolded = ScaffoldSynthesizer::new(layout, context).fill(&mut plan, &features);

    for edit in plan.iter_mut() {
        edit.content = normalize_content(&edit.path, &edit.content, layout);
    }

    let mut schema_merged = false;
    if let Some(existing) = tree.read_file(&layout.schema_path) {
        if let Some(edit) = plan.get_mut(&layout.schema_path) {
            edit.content = merge_schema(&existing, &edit.content);
            schema_merged = true;
            tracing::info!("Merged new declarations into {}", layout.schema_path);
        }
    }

    let composition_patched = patch_composition(&mut plan, tree, layout);

    Ok(SynthesizedPlan {
        features,
        edits: plan.into_edits(),
        extracted,
        scaffolded,
        schema_merged,
        composition_patched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn response_without_code_is_an_extraction_miss() {
        let layout = ProjectLayout::default();
        let tree: BTreeMap<String, String> = BTreeMap::new();
        let context = ProjectContext::gather(&tree, &layout);

        let err = synthesize_plan("add likes", "Sorry, I can't help.", &context, &tree, &layout).unwrap_err();

        assert!(matches!(err, AgentError::ExtractionMiss { raw_response } if raw_response == "Sorry, I can't help."));
    }

    #[test]
    fn extracted_edits_come_before_scaffolds() {
        let layout = ProjectLayout::default();
        let tree: BTreeMap<String, String> = BTreeMap::new();
        let context = ProjectContext::gather(&tree, &layout);
        let response = "// db/schema.ts\n```ts\nexport const likes = sqliteTable('likes', {\n  id: integer('id').primaryKey(),\n});\n```\n";

        let plan = synthesize_plan("track 'likes'", response, &context, &tree, &layout).unwrap();

        assert_eq!(plan.extracted, 1);
        assert_eq!(plan.edits[0].path, "src/db/schema.ts");
        assert_eq!(plan.scaffolded, 4);
        assert!(!plan.schema_merged);
        assert!(!plan.composition_patched);
    }
}

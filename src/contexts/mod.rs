mod block_extractor;
mod content_classifier;
mod identifier_deriver;
mod model_client;
mod plan_builder;
mod prompt;
mod route_resolver;
mod scaffold_synthesizer;
mod schema_merger;
mod text_patcher;
pub mod tree_patcher;

pub use block_extractor::extract_file_edits;
pub use content_classifier::{classify_content, infer_path, ContentClass};
pub use identifier_deriver::{
    camel_case, derive_identifier, feature_from_phrase, kebab_case, pascal_case, quoted_terms,
    FALLBACK_IDENTIFIER, MULTI_QUOTE_IDENTIFIER,
};
pub use model_client::{GeminiClient, ModelClient, API_KEY_VAR};
pub use plan_builder::{synthesize_plan, SynthesizedPlan};
pub use prompt::{build_prompt, populate, PromptError, PROMPT_TEMPLATE};
pub use route_resolver::resolve_features;
pub use scaffold_synthesizer::ScaffoldSynthesizer;
pub use schema_merger::{merge_schema, split_declarations, table_columns, table_symbols, Column};
pub use text_patcher::{normalize_connection, normalize_content, rewrite_imports};
pub use tree_patcher::{patch_composition, Document, MarkupError};

use crate::data::FeatureRequest;
use serde::Serialize;
use thiserror::Error;

/// Prompt sent to the model. `{{input.x}}` placeholders are mandatory,
/// `{{input.x?}}` ones are dropped when the value is missing.
pub const PROMPT_TEMPLATE: &str = "PROJECT CONTEXT:
{{input.context}}

USER QUERY:
{{input.query}}
{{input.features?}}
INSTRUCTIONS:
Please output your response in the following format for each file you modify or create:

// path/to/file.ts
```typescript
// ...full contents of the file...
```

Do not use diff or patch format. Output the full, updated contents of each file. Only use one file per code block. Do not include explanations or extra text.";

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("Required placeholder '{0}' could not be resolved")]
    MissingPlaceholder(String),

    #[error("Invalid path '{0}' in placeholder")]
    InvalidPlaceholderPath(String),

    #[error("Prompt input could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
pub struct PromptInput<'a> {
    pub context: &'a str,
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
}

impl<'a> PromptInput<'a> {
    pub fn new(query: &'a str, context: &'a str, features: &[FeatureRequest]) -> Self {
        let features = (!features.is_empty()).then(|| {
            let lines: Vec<String> = features
                .iter()
                .map(|f| format!("- route /api/{} backed by table `{}`", f.route_name, f.symbol_name))
                .collect();
            format!("\nREQUESTED FEATURES:\n{}\n", lines.join("\n"))
        });
        Self {
            context,
            query,
            features,
        }
    }
}

/// Builds the full prompt for one run.
pub fn build_prompt(query: &str, context: &str, features: &[FeatureRequest]) -> Result<String, PromptError> {
    populate(PROMPT_TEMPLATE, &PromptInput::new(query, context, features))
}

/// Replaces `{{input.path}}` placeholders in `template` with values from
/// `input`. Nested paths (`input.a.b`) are supported.
pub fn populate<T: Serialize>(template: &str, input: &T) -> Result<String, PromptError> {
    let input_json = serde_json::to_value(input)?;

    let mut result = template.to_string();
    let mut offset = 0;

    while let Some(start) = result[offset..].find("{{") {
        let start = offset + start;
        let Some(end_pos) = result[start..].find("}}") else {
            break;
        };
        let end = start + end_pos;

        let placeholder = &result[start + 2..end];
        let (path, is_optional) = match placeholder.strip_suffix('?') {
            Some(p) => (p, true),
            None => (placeholder, false),
        };

        match resolve_path(&input_json, path)? {
            Some(v) => {
                let replacement = match v {
                    serde_json::Value::String(s) => s.clone(),
                    serde_json::Value::Null => String::new(),
                    other => other.to_string(),
                };
                result.replace_range(start..end + 2, &replacement);
                offset = start + replacement.len();
            }
            None if is_optional => {
                result.replace_range(start..end + 2, "");
                offset = start;
            }
            None => return Err(PromptError::MissingPlaceholder(path.to_string())),
        }
    }

    Ok(result)
}

fn resolve_path<'a>(
    value: &'a serde_json::Value,
    path: &str,
) -> Result<Option<&'a serde_json::Value>, PromptError> {
    let parts: Vec<&str> = path.split('.').collect();
    if parts.first() != Some(&"input") {
        return Err(PromptError::InvalidPlaceholderPath(path.to_string()));
    }

    let mut current = value;
    for part in &parts[1..] {
        match current.get(part) {
            Some(v) => current = v,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};

use dbagent::AgentError;
use dbagent::contexts::{GeminiClient, ModelClient, build_prompt, resolve_features, synthesize_plan};
use dbagent::registries::{DiskSourceTree, FileLayoutRegistry, ProjectContext, ProjectLayout, SourceTree};

mod plan_executor;
mod progress;

pub use plan_executor::{ExecutionReport, PlanExecutor};

const RESPONSES_DIR: &str = ".dbagent/responses";

pub struct Config {
    pub verbose: bool,
    pub dry_run: bool,
    pub auto_yes: bool,
    pub root: PathBuf,
    pub model: Option<String>,
}

/// One full run against the project at `config.root`.
pub async fn run(query: &str, config: &Config) -> Result<()> {
    let mut layout = FileLayoutRegistry::for_project(&config.root)
        .load()
        .context("Failed to load project layout")?;
    if let Some(model) = &config.model {
        layout.model.name = model.clone();
    }

    let client = GeminiClient::from_env(layout.model.clone())?;
    let tree = DiskSourceTree::new(&config.root);
    run_with_client(query, &client, &tree, &layout, config).await?;
    Ok(())
}

/// The run loop with the model and project supplied by the caller.
/// Returns the execution report, or `None` when nothing could be extracted.
pub async fn run_with_client<C: ModelClient>(
    query: &str,
    client: &C,
    tree: &impl SourceTree,
    layout: &ProjectLayout,
    config: &Config,
) -> Result<Option<ExecutionReport>> {
    println!("Received query: \"{}\"", query);
    println!("Gathering project context...");
    let context = ProjectContext::gather(tree, layout);

    let features = resolve_features(query);
    let prompt = build_prompt(query, context.description(), &features)
        .context("Failed to build prompt")?;

    println!("Calling {}...", layout.model.name);
    let response = client.generate(&prompt).await.map_err(|e| {
        tracing::error!("Model call failed: {}", e);
        e
    })?;
    if config.verbose {
        println!("\nModel response:\n{}", response);
    }

    let plan = match synthesize_plan(query, &response, &context, tree, layout) {
        Ok(plan) => plan,
        Err(AgentError::ExtractionMiss { raw_response }) => {
            println!("\nNo file/code pairs found in the model response:\n");
            println!("{}", raw_response);
            let saved = save_response(&config.root, &raw_response)?;
            println!("\nResponse saved to {}", saved.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    println!(
        "\nPlan: {} extracted, {} scaffolded{}{}",
        plan.extracted,
        plan.scaffolded,
        if plan.schema_merged { ", schema merged" } else { "" },
        if plan.composition_patched { ", composition patched" } else { "" },
    );

    let report = PlanExecutor::new(config).execute(&plan.edits)?;
    Ok(Some(report))
}

/// Keeps an unusable response around for inspection.
fn save_response(root: &Path, response: &str) -> Result<PathBuf> {
    let dir = root.join(RESPONSES_DIR);
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(format!("{}.md", Utc::now().format("%Y%m%dT%H%M%S%.3fZ")));
    fs::write(&path, response)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

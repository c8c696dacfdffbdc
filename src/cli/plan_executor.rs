use anyhow::{Context, Result};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use dbagent::AgentError;
use dbagent::data::{is_contained, FileEdit};

use super::Config;
use super::progress::{Outcome, ProgressIndicator};

/// Counts reported once every edit has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecutionReport {
    pub written: usize,
    pub previewed: usize,
    pub declined: usize,
    pub failed: usize,
}

/// Shows each planned edit, asks for confirmation, and writes it under the
/// project root. A failed write is reported and the next edit proceeds.
pub struct PlanExecutor {
    root: PathBuf,
    auto_yes: bool,
    dry_run: bool,
}

impl PlanExecutor {
    pub fn new(config: &Config) -> Self {
        Self {
            root: config.root.clone(),
            auto_yes: config.auto_yes,
            dry_run: config.dry_run,
        }
    }

    pub fn execute(&self, edits: &[FileEdit]) -> Result<ExecutionReport> {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        self.execute_with(edits, &mut input)
    }

    /// Same as `execute`, reading confirmations from `input`.
    pub fn execute_with<R: BufRead>(&self, edits: &[FileEdit], input: &mut R) -> Result<ExecutionReport> {
        let mut progress = ProgressIndicator::new(edits.len());

        for edit in edits {
            progress.start_item(&edit.path);
            println!("{}", "=".repeat(60));
            println!("{}", edit.content);
            println!("{}", "=".repeat(60));

            if self.dry_run {
                println!("(dry run) {} not written", edit.path);
                progress.complete_item(Outcome::Previewed);
                continue;
            }

            let accepted = if self.auto_yes {
                tracing::info!("--yes given, writing {} without asking", edit.path);
                true
            } else {
                confirm(&edit.path, input)?
            };
            if !accepted {
                println!("Skipped. {} was not changed.", edit.path);
                progress.complete_item(Outcome::Declined);
                continue;
            }

            match write_edit(&self.root, edit) {
                Ok(path) => {
                    println!("✓ Written {}", path.display());
                    progress.complete_item(Outcome::Written);
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    eprintln!("✗ {}", e);
                    progress.complete_item(Outcome::Failed);
                }
            }
        }

        progress.finish(self.dry_run);
        Ok(ExecutionReport {
            written: progress.written(),
            previewed: progress.previewed(),
            declined: progress.declined(),
            failed: progress.failed(),
        })
    }
}

/// Asks until the answer is `y` or `n`. End of input counts as `n`.
fn confirm<R: BufRead>(path: &str, input: &mut R) -> Result<bool> {
    loop {
        print!("Proceed to write {}? (y/n): ", path);
        io::stdout().flush().context("Failed to flush stdout")?;

        let mut answer = String::new();
        let read = input
            .read_line(&mut answer)
            .context("Failed to read user input")?;
        if read == 0 {
            println!();
            return Ok(false);
        }
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("Please answer y or n."),
        }
    }
}

fn write_edit(root: &Path, edit: &FileEdit) -> Result<PathBuf, AgentError> {
    if !is_contained(&edit.path) {
        return Err(AgentError::OutsideRoot(edit.path.clone()));
    }
    let path = root.join(&edit.path);
    let wrap = |source| AgentError::Write {
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(wrap)?;
    }
    let mut content = edit.content.clone();
    if !content.ends_with('\n') {
        content.push('\n');
    }
    fs::write(&path, content).map_err(wrap)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn config(root: &Path, auto_yes: bool, dry_run: bool) -> Config {
        Config {
            verbose: false,
            dry_run,
            auto_yes,
            root: root.to_path_buf(),
            model: None,
        }
    }

    fn edits() -> Vec<FileEdit> {
        vec![
            FileEdit::new("src/db/schema.ts", "export const a = 1;"),
            FileEdit::new("src/app/api/a/route.ts", "export async function GET() {}\n"),
        ]
    }

    #[test]
    fn auto_yes_writes_everything_with_parents() {
        let dir = TempDir::new().unwrap();
        let executor = PlanExecutor::new(&config(dir.path(), true, false));

        let report = executor.execute_with(&edits(), &mut Cursor::new("")).unwrap();

        assert_eq!(report, ExecutionReport { written: 2, previewed: 0, declined: 0, failed: 0 });
        assert_eq!(
            fs::read_to_string(dir.path().join("src/db/schema.ts")).unwrap(),
            "export const a = 1;\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("src/app/api/a/route.ts")).unwrap(),
            "export async function GET() {}\n"
        );
    }

    #[test]
    fn answers_are_asked_per_file_until_valid() {
        let dir = TempDir::new().unwrap();
        let executor = PlanExecutor::new(&config(dir.path(), false, false));

        let report = executor
            .execute_with(&edits(), &mut Cursor::new("maybe\nY\nn\n"))
            .unwrap();

        assert_eq!(report, ExecutionReport { written: 1, previewed: 0, declined: 1, failed: 0 });
        assert!(dir.path().join("src/db/schema.ts").exists());
        assert!(!dir.path().join("src/app/api/a/route.ts").exists());
    }

    #[test]
    fn end_of_input_declines() {
        let dir = TempDir::new().unwrap();
        let executor = PlanExecutor::new(&config(dir.path(), false, false));

        let report = executor.execute_with(&edits(), &mut Cursor::new("")).unwrap();

        assert_eq!(report.declined, 2);
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let executor = PlanExecutor::new(&config(dir.path(), false, true));

        let report = executor.execute_with(&edits(), &mut Cursor::new("")).unwrap();

        assert_eq!(report, ExecutionReport { written: 0, previewed: 2, declined: 0, failed: 0 });
        assert!(!dir.path().join("src").exists());
    }

    #[test]
    fn failed_write_does_not_stop_the_rest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("src"), "a file where a directory should be").unwrap();
        let mut plan = edits();
        plan.push(FileEdit::new("package-notes.md", "ok"));
        let executor = PlanExecutor::new(&config(dir.path(), true, false));

        let report = executor.execute_with(&plan, &mut Cursor::new("")).unwrap();

        assert_eq!(report, ExecutionReport { written: 1, previewed: 0, declined: 0, failed: 2 });
        assert!(dir.path().join("package-notes.md").exists());
    }

    #[test]
    fn edit_outside_root_is_refused_even_with_yes() {
        let parent = TempDir::new().unwrap();
        let root = parent.path().join("project");
        fs::create_dir(&root).unwrap();
        let plan = vec![
            FileEdit::new("../escaped.ts", "bad"),
            FileEdit::new("src/db/schema.ts", "ok"),
        ];
        let executor = PlanExecutor::new(&config(&root, true, false));

        let report = executor.execute_with(&plan, &mut Cursor::new("")).unwrap();

        assert_eq!(report, ExecutionReport { written: 1, previewed: 0, declined: 0, failed: 1 });
        assert!(!parent.path().join("escaped.ts").exists());
        assert!(root.join("src/db/schema.ts").exists());
    }
}

use std::io;
use std::path::PathBuf;

/// Failures surfaced by a synthesis run.
///
/// Only `MissingApiKey`, `Upstream`, `EmptyResponse` and `Config` abort a run.
/// `ExtractionMiss` ends it cleanly after the raw response is dumped, and
/// `Write` and `OutsideRoot` are reported per file while the executor moves on.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("GEMINI_API_KEY not set")]
    MissingApiKey,

    #[error("model call failed: {0}")]
    Upstream(String),

    #[error("model returned no usable text")]
    EmptyResponse,

    #[error("no file/code pairs found in model response")]
    ExtractionMiss { raw_response: String },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("refusing to write {0}: path leaves the project root")]
    OutsideRoot(String),

    #[error("invalid project layout {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },
}

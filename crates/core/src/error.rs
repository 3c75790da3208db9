use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotesError {
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("transcript not found at {}: {reason}", .path.display())]
    NotFound { path: PathBuf, reason: String },
    #[error("{tool} failed: {detail}")]
    ExternalTool { tool: &'static str, detail: String },
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0} produced an empty transcript")]
    EmptyTranscript(String),
}

impl NotesError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn external(tool: &'static str, detail: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool,
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::NotFound { .. } => "NotFound",
            Self::ExternalTool { .. } => "ExternalToolError",
            Self::Write { .. } => "WriteError",
            Self::EmptyTranscript(_) => "EmptyTranscript",
        }
    }
}

/// Steps of a `generate_notes` run, in the order they execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    PathResolved,
    Acquired,
    Persisted,
    Delegated,
    Completed,
}

impl Stage {
    /// The work that moves a request into this stage.
    pub fn step(&self) -> &'static str {
        match self {
            Self::Received => "request intake",
            Self::Validated => "validation",
            Self::PathResolved => "path resolution",
            Self::Acquired => "transcript acquisition",
            Self::Persisted => "transcript persistence",
            Self::Delegated => "note rendering",
            Self::Completed => "completion",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.step())
    }
}

/// A request that stopped before `Completed`. `stage` is the one it
/// failed to reach.
#[derive(Debug, Error)]
#[error("{kind} during {stage}: {source}", kind = .source.kind())]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: NotesError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: NotesError) -> Self {
        Self { stage, source }
    }
}

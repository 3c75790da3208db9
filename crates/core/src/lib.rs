pub mod acquire;
pub mod artifact;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod render;
pub mod request;
#[cfg(test)]
mod testutils;

pub use acquire::{
    resolve_local_path, AcquisitionResult, HttpFetcher, SourceAcquirer, VideoTranscriptFetcher,
};
pub use artifact::persist;
pub use collaborator::{Collaborator, CommandCollaborator, ProcessOutput};
pub use config::{CommandSpec, Config, ConfigError, CourseDirs, CourseMapping, CourseTable};
pub use error::{NotesError, PipelineError, Stage};
pub use pipeline::{Collaborators, NoteService, NoteSummary};
pub use render::{output_dir, NoteBundle, NoteDelegate, NoteOutcome};
pub use request::{
    course_slug, ApiBody, ApiHeaders, FormattingHints, HttpMethod, HttpRequestSpec, NoteRequest,
    SourceType,
};

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::collaborator::Collaborator;
use crate::error::NotesError;
use crate::request::{FormattingHints, SourceType};

/// Parameters handed to the note renderer as a single JSON argument.
#[derive(Debug, Clone, Serialize)]
pub struct NoteBundle {
    pub course_name: String,
    pub lecture_number: String,
    pub lecture_topic: String,
    pub source_type: SourceType,
    pub transcript_dir: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript_path: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub output_filename: String,
    pub output_path: PathBuf,
    #[serde(flatten)]
    pub hints: FormattingHints,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteOutcome {
    pub path: PathBuf,
    /// Whether the file was seen on disk after the renderer exited.
    pub verified: bool,
}

/// `output_directory` overrides the notes dir; relative overrides are
/// taken relative to it.
pub fn output_dir(notes_dir: &Path, override_dir: Option<&Path>) -> PathBuf {
    match override_dir {
        Some(dir) if dir.is_absolute() => dir.to_path_buf(),
        Some(dir) => notes_dir.join(dir),
        None => notes_dir.to_path_buf(),
    }
}

pub struct NoteDelegate {
    collaborator: Arc<dyn Collaborator>,
    verify_output: bool,
}

impl NoteDelegate {
    pub fn new(collaborator: Arc<dyn Collaborator>, verify_output: bool) -> Self {
        Self {
            collaborator,
            verify_output,
        }
    }

    pub fn render(&self, bundle: &NoteBundle, transcript: &str) -> Result<NoteOutcome, NotesError> {
        let tool = self.collaborator.name();
        let arg = serde_json::to_string(bundle)
            .map_err(|e| NotesError::external(tool, format!("could not encode parameters: {}", e)))?;

        let output = self
            .collaborator
            .invoke(&[arg], Some(transcript))
            .map_err(|e| NotesError::external(tool, format!("could not start: {}", e)))?;

        if !output.success() {
            return Err(NotesError::external(tool, output.status_description()));
        }

        let exists = bundle.output_path.is_file();
        if !exists {
            if self.verify_output {
                return Err(NotesError::external(
                    tool,
                    format!(
                        "exited successfully but no note exists at {}",
                        bundle.output_path.display()
                    ),
                ));
            }
            log::warn!(
                "{} reported success but {} does not exist",
                tool,
                bundle.output_path.display()
            );
        }

        Ok(NoteOutcome {
            path: bundle.output_path.clone(),
            verified: exists,
        })
    }
}

use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use crate::acquire::SourceAcquirer;
use crate::artifact::persist;
use crate::collaborator::{Collaborator, CommandCollaborator};
use crate::config::{Config, ConfigError, CourseTable};
use crate::error::{NotesError, PipelineError, Stage};
use crate::render::{output_dir, NoteBundle, NoteDelegate, NoteOutcome};
use crate::request::{NoteRequest, SourceType};

pub struct Collaborators {
    pub video_transcript: Arc<dyn Collaborator>,
    pub http_fetch: Arc<dyn Collaborator>,
    pub note_renderer: Arc<dyn Collaborator>,
}

impl Collaborators {
    pub fn from_config(config: &Config) -> Self {
        let c = &config.collaborators;
        Self {
            video_transcript: Arc::new(CommandCollaborator::new(
                "video transcript fetcher",
                c.video_transcript.clone(),
            )),
            http_fetch: Arc::new(CommandCollaborator::new("http fetcher", c.http_fetch.clone())),
            note_renderer: Arc::new(CommandCollaborator::new(
                "note renderer",
                c.note_renderer.clone(),
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NoteSummary {
    pub course_name: String,
    pub lecture_number: String,
    pub lecture_topic: String,
    pub source_type: SourceType,
    pub source: String,
    pub transcript_path: Option<PathBuf>,
    pub save_warning: Option<String>,
    pub note: NoteOutcome,
    pub transcript_chars: usize,
}

impl NoteSummary {
    pub fn render(&self) -> String {
        let mut output = format!(
            "Generated notes for {} lecture {}: {}\n\n",
            self.course_name, self.lecture_number, self.lecture_topic
        );
        output.push_str(&format!("Source ({}): {}\n", self.source_type, self.source));
        if let Some(path) = &self.transcript_path {
            output.push_str(&format!("Transcript file: {}\n", path.display()));
        }
        if let Some(warning) = &self.save_warning {
            output.push_str(&format!("Warning: transcript was not saved: {}\n", warning));
        }
        output.push_str(&format!("Notes: {}", self.note.path.display()));
        if !self.note.verified {
            output.push_str(" (expected; renderer did not create it)");
        }
        output.push_str(&format!(
            "\nTranscript length: {} characters",
            self.transcript_chars
        ));
        output
    }
}

/// Runs one request through resolve, acquire, persist and render.
pub struct NoteService {
    courses: CourseTable,
    acquirer: SourceAcquirer,
    delegate: NoteDelegate,
}

impl NoteService {
    pub fn new(courses: CourseTable, collaborators: Collaborators, verify_output: bool) -> Self {
        Self {
            courses,
            acquirer: SourceAcquirer::new(collaborators.video_transcript, collaborators.http_fetch),
            delegate: NoteDelegate::new(collaborators.note_renderer, verify_output),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            CourseTable::from_config(config)?,
            Collaborators::from_config(config),
            config.verify_output,
        ))
    }

    pub fn courses(&self) -> &CourseTable {
        &self.courses
    }

    pub fn list_courses(&self) -> String {
        self.courses.render()
    }

    pub fn generate_from_arguments(&self, arguments: Value) -> Result<NoteSummary, PipelineError> {
        let request = NoteRequest::from_arguments(arguments)
            .map_err(|e| PipelineError::new(Stage::Validated, e))?;
        self.generate_notes(&request)
    }

    pub fn generate_notes(&self, request: &NoteRequest) -> Result<NoteSummary, PipelineError> {
        let at = |stage: Stage| move |e: NotesError| PipelineError::new(stage, e);

        request.validate().map_err(at(Stage::Validated))?;

        let dirs = self.courses.resolve(&request.course_name);
        log::info!(
            "generating notes for {} lecture {} from {} source",
            request.course_name,
            request.lecture_number,
            request.source_type
        );

        let acquired = self
            .acquirer
            .acquire(
                request.source_type,
                &request.source_location,
                &dirs.transcript_dir,
                &request.http_spec(),
            )
            .map_err(at(Stage::Acquired))?;

        let mut transcript_path = match request.source_type {
            SourceType::LocalFile => Some(PathBuf::from(&acquired.source)),
            _ => None,
        };
        let mut save_warning = None;

        if request.persists_transcript() {
            match persist(
                &dirs.transcript_dir,
                &request.transcript_file_name(),
                &acquired.text,
            ) {
                Ok(path) => transcript_path = Some(path),
                Err(e) => {
                    log::warn!("continuing without a saved transcript: {}", e);
                    save_warning = Some(e.to_string());
                }
            }
        }

        let output_dir = output_dir(&dirs.notes_dir, request.output_directory.as_deref());
        let output_filename = request.note_file_name();
        let bundle = NoteBundle {
            course_name: request.course_name.clone(),
            lecture_number: request.lecture_number.clone(),
            lecture_topic: request.lecture_topic.clone(),
            source_type: request.source_type,
            transcript_dir: dirs.transcript_dir.clone(),
            transcript_path: transcript_path.clone(),
            output_path: output_dir.join(&output_filename),
            output_dir,
            output_filename,
            hints: request.hints(),
        };

        let note = self
            .delegate
            .render(&bundle, &acquired.text)
            .map_err(at(Stage::Delegated))?;

        log::info!("notes ready at {}", note.path.display());

        Ok(NoteSummary {
            course_name: request.course_name.clone(),
            lecture_number: request.lecture_number.clone(),
            lecture_topic: request.lecture_topic.clone(),
            source_type: request.source_type,
            source: acquired.source,
            transcript_path,
            save_warning,
            note,
            transcript_chars: acquired.text.chars().count(),
        })
    }
}

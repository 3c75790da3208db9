use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::collaborator::Collaborator;
use crate::error::NotesError;
use crate::request::{HttpRequestSpec, SourceType};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquisitionResult {
    pub text: String,
    /// Resolved file path for local sources, the locator otherwise.
    pub source: String,
}

/// Wraps the helper that prints a video's transcript to stdout.
pub struct VideoTranscriptFetcher {
    collaborator: Arc<dyn Collaborator>,
}

impl VideoTranscriptFetcher {
    pub fn new(collaborator: Arc<dyn Collaborator>) -> Self {
        Self { collaborator }
    }

    pub fn fetch(&self, locator: &str) -> Result<String, NotesError> {
        let tool = self.collaborator.name();
        let output = self
            .collaborator
            .invoke(&[locator.to_string()], None)
            .map_err(|e| NotesError::external(tool, format!("could not start: {}", e)))?;

        if !output.success() {
            return Err(NotesError::external(tool, output.status_description()));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| NotesError::external(tool, "transcript output is not valid UTF-8"))
    }
}

/// Wraps the helper that performs an HTTP request and prints
/// `{"data": ...}` to stdout.
pub struct HttpFetcher {
    collaborator: Arc<dyn Collaborator>,
}

impl HttpFetcher {
    pub fn new(collaborator: Arc<dyn Collaborator>) -> Self {
        Self { collaborator }
    }

    pub fn arguments(url: &str, spec: &HttpRequestSpec) -> Vec<String> {
        let mut args = vec![
            url.to_string(),
            spec.method.to_string(),
            spec.headers.to_json(),
        ];
        if let Some(body) = &spec.body {
            args.push(body.to_arg());
        }
        args
    }

    pub fn fetch(&self, url: &str, spec: &HttpRequestSpec) -> Result<String, NotesError> {
        let tool = self.collaborator.name();
        let output = self
            .collaborator
            .invoke(&Self::arguments(url, spec), None)
            .map_err(|e| NotesError::external(tool, format!("could not start: {}", e)))?;

        if !output.success() {
            return Err(NotesError::external(tool, output.status_description()));
        }

        let response: Value = serde_json::from_slice(&output.stdout)
            .map_err(|e| NotesError::external(tool, format!("malformed JSON output: {}", e)))?;

        match response.get("data") {
            Some(Value::String(text)) => Ok(text.clone()),
            Some(Value::Null) | None => {
                Err(NotesError::external(tool, "response has no 'data' field"))
            }
            Some(other) => serde_json::to_string_pretty(other)
                .map_err(|e| NotesError::external(tool, e.to_string())),
        }
    }
}

pub struct SourceAcquirer {
    video: VideoTranscriptFetcher,
    http: HttpFetcher,
}

impl SourceAcquirer {
    pub fn new(video: Arc<dyn Collaborator>, http: Arc<dyn Collaborator>) -> Self {
        Self {
            video: VideoTranscriptFetcher::new(video),
            http: HttpFetcher::new(http),
        }
    }

    pub fn acquire(
        &self,
        source_type: SourceType,
        location: &str,
        transcript_dir: &Path,
        http: &HttpRequestSpec,
    ) -> Result<AcquisitionResult, NotesError> {
        let location = location.trim();
        let result = match source_type {
            SourceType::LocalFile => {
                let path = resolve_local_path(location, transcript_dir);
                AcquisitionResult {
                    text: read_transcript(&path)?,
                    source: path.display().to_string(),
                }
            }
            SourceType::RemoteVideo => AcquisitionResult {
                text: self.video.fetch(location)?,
                source: location.to_string(),
            },
            SourceType::HttpApi => AcquisitionResult {
                text: self.http.fetch(location, http)?,
                source: format!("{} {}", http.method, location),
            },
        };

        if result.text.trim().is_empty() {
            return Err(NotesError::EmptyTranscript(result.source));
        }

        log::info!(
            "acquired {} characters from {} ({})",
            result.text.chars().count(),
            result.source,
            source_type
        );
        Ok(result)
    }
}

/// Absolute locations are used as-is; relative ones live under the
/// course's transcript directory.
pub fn resolve_local_path(location: &str, transcript_dir: &Path) -> PathBuf {
    let path = Path::new(location);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        transcript_dir.join(path)
    }
}

fn read_transcript(path: &Path) -> Result<String, NotesError> {
    let bytes = std::fs::read(path).map_err(|e| NotesError::NotFound {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    String::from_utf8(bytes).map_err(|_| NotesError::NotFound {
        path: path.to_path_buf(),
        reason: "file is not valid UTF-8".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ApiBody, HttpMethod};
    use crate::testutils::{create_course_dirs, RecordingCollaborator};
    use std::fs;

    fn acquirer(
        video: &Arc<RecordingCollaborator>,
        http: &Arc<RecordingCollaborator>,
    ) -> SourceAcquirer {
        SourceAcquirer::new(video.clone(), http.clone())
    }

    #[test]
    fn reads_relative_local_file() {
        let dirs = create_course_dirs();
        fs::write(dirs.transcripts().join("lec1.txt"), "héllo wörld").unwrap();
        let video = RecordingCollaborator::succeeding("video", "");
        let http = RecordingCollaborator::succeeding("http", "");

        let result = acquirer(&video, &http)
            .acquire(
                SourceType::LocalFile,
                "lec1.txt",
                &dirs.transcripts(),
                &HttpRequestSpec::default(),
            )
            .unwrap();

        assert_eq!(result.text, "héllo wörld");
        assert!(result.source.ends_with("lec1.txt"));
        assert!(video.calls().is_empty());
        assert!(http.calls().is_empty());
    }

    #[test]
    fn reads_absolute_local_file() {
        let dirs = create_course_dirs();
        let elsewhere = dirs.root().join("elsewhere.txt");
        fs::write(&elsewhere, "absolute").unwrap();
        let stub = RecordingCollaborator::succeeding("stub", "");

        let result = acquirer(&stub, &stub)
            .acquire(
                SourceType::LocalFile,
                elsewhere.to_str().unwrap(),
                &dirs.transcripts(),
                &HttpRequestSpec::default(),
            )
            .unwrap();

        assert_eq!(result.text, "absolute");
    }

    #[test]
    fn missing_local_file_is_not_found() {
        let dirs = create_course_dirs();
        let stub = RecordingCollaborator::succeeding("stub", "");

        let err = acquirer(&stub, &stub)
            .acquire(
                SourceType::LocalFile,
                "nope.txt",
                &dirs.transcripts(),
                &HttpRequestSpec::default(),
            )
            .unwrap_err();

        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn non_utf8_local_file_is_not_found() {
        let dirs = create_course_dirs();
        fs::write(dirs.transcripts().join("bin.txt"), [0xff, 0xfe, 0x00]).unwrap();
        let stub = RecordingCollaborator::succeeding("stub", "");

        let err = acquirer(&stub, &stub)
            .acquire(
                SourceType::LocalFile,
                "bin.txt",
                &dirs.transcripts(),
                &HttpRequestSpec::default(),
            )
            .unwrap_err();

        assert_eq!(err.kind(), "NotFound");
    }

    #[test]
    fn empty_local_file_is_rejected() {
        let dirs = create_course_dirs();
        fs::write(dirs.transcripts().join("empty.txt"), "  \n").unwrap();
        let stub = RecordingCollaborator::succeeding("stub", "");

        let err = acquirer(&stub, &stub)
            .acquire(
                SourceType::LocalFile,
                "empty.txt",
                &dirs.transcripts(),
                &HttpRequestSpec::default(),
            )
            .unwrap_err();

        assert!(matches!(err, NotesError::EmptyTranscript(_)));
    }

    #[test]
    fn video_passes_locator_and_returns_stdout() {
        let dirs = create_course_dirs();
        let video = RecordingCollaborator::succeeding("video", "the transcript");
        let http = RecordingCollaborator::succeeding("http", "");

        let result = acquirer(&video, &http)
            .acquire(
                SourceType::RemoteVideo,
                " https://youtu.be/abc ",
                &dirs.transcripts(),
                &HttpRequestSpec::default(),
            )
            .unwrap();

        assert_eq!(result.text, "the transcript");
        assert_eq!(result.source, "https://youtu.be/abc");
        assert_eq!(video.calls()[0].args, vec!["https://youtu.be/abc"]);
        assert!(http.calls().is_empty());
    }

    #[test]
    fn video_nonzero_exit_is_external_error() {
        let dirs = create_course_dirs();
        let video = RecordingCollaborator::failing("video", 1, "no captions");

        let err = acquirer(&video, &video)
            .acquire(
                SourceType::RemoteVideo,
                "abc",
                &dirs.transcripts(),
                &HttpRequestSpec::default(),
            )
            .unwrap_err();

        assert_eq!(err.kind(), "ExternalToolError");
        assert!(err.to_string().contains("no captions"));
    }

    #[test]
    fn http_extracts_data_field() {
        let dirs = create_course_dirs();
        let http = RecordingCollaborator::succeeding("http", r#"{"status": 200, "data": "api text"}"#);
        let spec = HttpRequestSpec {
            method: HttpMethod::Post,
            headers: Default::default(),
            body: Some(ApiBody::Text("q=1".to_string())),
        };

        let result = acquirer(&http, &http)
            .acquire(
                SourceType::HttpApi,
                "https://api.example.com/t",
                &dirs.transcripts(),
                &spec,
            )
            .unwrap();

        assert_eq!(result.text, "api text");
        assert_eq!(
            http.calls()[0].args,
            vec!["https://api.example.com/t", "POST", "{}", "q=1"]
        );
    }

    #[test]
    fn http_structured_data_is_pretty_printed() {
        let dirs = create_course_dirs();
        let http = RecordingCollaborator::succeeding("http", r#"{"data": {"segments": [1]}}"#);

        let result = acquirer(&http, &http)
            .acquire(
                SourceType::HttpApi,
                "https://api.example.com/t",
                &dirs.transcripts(),
                &HttpRequestSpec::default(),
            )
            .unwrap();

        assert!(result.text.contains("\"segments\""));
    }

    #[test]
    fn http_output_failures_are_external_errors() {
        let dirs = create_course_dirs();
        for stdout in ["not json", r#"{"status": 200}"#, r#"{"data": null}"#] {
            let http = RecordingCollaborator::succeeding("http", stdout);
            let err = acquirer(&http, &http)
                .acquire(
                    SourceType::HttpApi,
                    "https://api.example.com/t",
                    &dirs.transcripts(),
                    &HttpRequestSpec::default(),
                )
                .unwrap_err();
            assert_eq!(err.kind(), "ExternalToolError", "stdout: {}", stdout);
        }
    }
}

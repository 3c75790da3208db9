use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use crate::collaborator::{Collaborator, ProcessOutput};
use crate::config::CourseDirs;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

/// Collaborator double that records every invocation and replies with a
/// canned result. `renderer()` additionally writes the note file named in
/// the bundle, like a well-behaved note renderer would.
pub struct RecordingCollaborator {
    name: &'static str,
    exit_code: i32,
    stdout: String,
    stderr: String,
    writes_note: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingCollaborator {
    fn build(name: &'static str, exit_code: i32, stdout: &str, stderr: &str) -> Self {
        Self {
            name,
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            writes_note: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding(name: &'static str, stdout: &str) -> Arc<Self> {
        Arc::new(Self::build(name, 0, stdout, ""))
    }

    pub fn failing(name: &'static str, exit_code: i32, stderr: &str) -> Arc<Self> {
        Arc::new(Self::build(name, exit_code, "", stderr))
    }

    pub fn renderer() -> Arc<Self> {
        Arc::new(Self {
            writes_note: true,
            ..Self::build("note renderer", 0, "", "")
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

impl Collaborator for RecordingCollaborator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn invoke(&self, args: &[String], stdin: Option<&str>) -> io::Result<ProcessOutput> {
        self.calls.lock().unwrap().push(Call {
            args: args.to_vec(),
            stdin: stdin.map(str::to_string),
        });

        if self.writes_note {
            let bundle: serde_json::Value = serde_json::from_str(args.last().unwrap()).unwrap();
            let path = PathBuf::from(bundle["output_path"].as_str().unwrap());
            fs::create_dir_all(path.parent().unwrap())?;
            fs::write(&path, format!("# {}\n", bundle["lecture_topic"]))?;
        }

        Ok(ProcessOutput {
            exit_code: Some(self.exit_code),
            stdout: self.stdout.clone().into_bytes(),
            stderr: self.stderr.clone(),
        })
    }
}

pub struct TestDirs {
    dir: TempDir,
}

impl TestDirs {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn notes(&self) -> PathBuf {
        self.dir.path().join("notes")
    }

    pub fn transcripts(&self) -> PathBuf {
        self.dir.path().join("transcripts")
    }

    pub fn dirs(&self) -> CourseDirs {
        CourseDirs {
            notes_dir: self.notes(),
            transcript_dir: self.transcripts(),
        }
    }
}

/// A temp dir with empty `notes/` and `transcripts/` subdirectories.
pub fn create_course_dirs() -> TestDirs {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("notes")).unwrap();
    fs::create_dir(dir.path().join("transcripts")).unwrap();
    TestDirs { dir }
}

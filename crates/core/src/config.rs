use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot make {} absolute: {source}", .path.display())]
    Path {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("course '{0}' is defined more than once")]
    DuplicateCourse(String),
    #[error("course name must not be empty")]
    EmptyCourseName,
    #[error("collaborator '{0}' has no program configured")]
    MissingProgram(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseDirs {
    pub notes_dir: PathBuf,
    pub transcript_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseMapping {
    pub name: String,
    pub notes_dir: PathBuf,
    pub transcript_dir: PathBuf,
}

/// How to launch one external helper. Request-specific arguments are
/// appended after `args`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaboratorsConfig {
    #[serde(default = "default_video_transcript")]
    pub video_transcript: CommandSpec,
    #[serde(default = "default_http_fetch")]
    pub http_fetch: CommandSpec,
    #[serde(default = "default_note_renderer")]
    pub note_renderer: CommandSpec,
}

impl Default for CollaboratorsConfig {
    fn default() -> Self {
        Self {
            video_transcript: default_video_transcript(),
            http_fetch: default_http_fetch(),
            note_renderer: default_note_renderer(),
        }
    }
}

fn default_video_transcript() -> CommandSpec {
    CommandSpec::new("yt-transcript")
}

fn default_http_fetch() -> CommandSpec {
    CommandSpec::new("http-fetch")
}

fn default_note_renderer() -> CommandSpec {
    CommandSpec::new("render-note")
}

fn default_dirs() -> CourseDirs {
    CourseDirs {
        notes_dir: PathBuf::from("notes"),
        transcript_dir: PathBuf::from("transcripts"),
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_dirs")]
    pub defaults: CourseDirs,
    #[serde(default)]
    pub courses: Vec<CourseMapping>,
    #[serde(default)]
    pub collaborators: CollaboratorsConfig,
    #[serde(default = "default_true")]
    pub verify_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            defaults: default_dirs(),
            courses: Vec::new(),
            collaborators: CollaboratorsConfig::default(),
            verify_output: true,
        }
    }
}

impl Config {
    /// Load from a `.yaml`/`.yml` file, or JSON for any other extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        if is_yaml {
            Ok(serde_yaml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let collaborators = [
            ("video_transcript", &self.collaborators.video_transcript),
            ("http_fetch", &self.collaborators.http_fetch),
            ("note_renderer", &self.collaborators.note_renderer),
        ];
        if let Some((name, _)) = collaborators
            .iter()
            .find(|(_, spec)| spec.program.trim().is_empty())
        {
            return Err(ConfigError::MissingProgram(*name));
        }

        CourseTable::new(self.defaults.clone(), self.courses.clone()).map(|_| ())
    }
}

impl CourseDirs {
    /// Both directories made absolute against the current directory, so
    /// helpers running elsewhere see the same locations the server checks.
    pub fn absolute(&self) -> Result<Self, ConfigError> {
        Ok(Self {
            notes_dir: absolute(&self.notes_dir)?,
            transcript_dir: absolute(&self.transcript_dir)?,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path).map_err(|source| ConfigError::Path {
        path: path.to_path_buf(),
        source,
    })
}

/// Read-only course name lookup built once at startup. All directories are
/// stored absolute.
#[derive(Debug, Clone)]
pub struct CourseTable {
    defaults: CourseDirs,
    courses: BTreeMap<String, CourseDirs>,
}

impl CourseTable {
    pub fn new(defaults: CourseDirs, mappings: Vec<CourseMapping>) -> Result<Self, ConfigError> {
        let mut courses = BTreeMap::new();
        for mapping in mappings {
            if mapping.name.trim().is_empty() {
                return Err(ConfigError::EmptyCourseName);
            }
            let dirs = CourseDirs {
                notes_dir: mapping.notes_dir,
                transcript_dir: mapping.transcript_dir,
            }
            .absolute()?;
            if courses.insert(mapping.name.clone(), dirs).is_some() {
                return Err(ConfigError::DuplicateCourse(mapping.name));
            }
        }
        Ok(Self {
            defaults: defaults.absolute()?,
            courses,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Self::new(config.defaults.clone(), config.courses.clone())
    }

    /// Exact-match lookup; unknown names get the default directories.
    pub fn resolve(&self, course_name: &str) -> CourseDirs {
        match self.courses.get(course_name) {
            Some(dirs) => dirs.clone(),
            None => {
                log::warn!(
                    "course '{}' has no path mapping, using defaults ({}, {})",
                    course_name,
                    self.defaults.notes_dir.display(),
                    self.defaults.transcript_dir.display()
                );
                self.defaults.clone()
            }
        }
    }

    pub fn defaults(&self) -> &CourseDirs {
        &self.defaults
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn render(&self) -> String {
        let mut output = if self.courses.is_empty() {
            "No courses configured.\n".to_string()
        } else {
            format!("Configured courses ({}):\n\n", self.courses.len())
        };

        for (name, dirs) in &self.courses {
            output.push_str(&format!("## {}\n", name));
            output.push_str(&format!("  Notes: {}\n", dirs.notes_dir.display()));
            output.push_str(&format!(
                "  Transcripts: {}\n",
                dirs.transcript_dir.display()
            ));
        }

        output.push_str(&format!(
            "\nDefaults for unmapped courses:\n  Notes: {}\n  Transcripts: {}\n",
            self.defaults.notes_dir.display(),
            self.defaults.transcript_dir.display()
        ));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mapping(name: &str) -> CourseMapping {
        CourseMapping {
            name: name.to_string(),
            notes_dir: PathBuf::from(format!("/notes/{}", name)),
            transcript_dir: PathBuf::from(format!("/transcripts/{}", name)),
        }
    }

    #[test]
    fn resolves_mapped_course() {
        let table = CourseTable::new(default_dirs(), vec![mapping("Math")]).unwrap();
        let dirs = table.resolve("Math");
        assert_eq!(dirs.notes_dir, PathBuf::from("/notes/Math"));
        assert_eq!(dirs.transcript_dir, PathBuf::from("/transcripts/Math"));
    }

    #[test]
    fn unmapped_course_gets_defaults() {
        let table = CourseTable::new(default_dirs(), vec![mapping("Math")]).unwrap();
        for name in ["", "math", "Physics 101", "Math "] {
            assert_eq!(&table.resolve(name), table.defaults());
        }
    }

    #[test]
    fn relative_dirs_are_made_absolute() {
        let cwd = std::env::current_dir().unwrap();
        let relative = CourseMapping {
            name: "Math".to_string(),
            notes_dir: PathBuf::from("math/notes"),
            transcript_dir: PathBuf::from("math/transcripts"),
        };
        let table = CourseTable::new(default_dirs(), vec![relative]).unwrap();

        let math = table.resolve("Math");
        assert_eq!(math.notes_dir, cwd.join("math/notes"));
        assert_eq!(math.transcript_dir, cwd.join("math/transcripts"));
        assert_eq!(table.defaults().notes_dir, cwd.join("notes"));
        assert_eq!(table.defaults().transcript_dir, cwd.join("transcripts"));
    }

    #[test]
    fn rejects_duplicate_course_names() {
        let err = CourseTable::new(default_dirs(), vec![mapping("Math"), mapping("Math")])
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateCourse(name) if name == "Math"));
    }

    #[test]
    fn render_is_stable() {
        let table =
            CourseTable::new(default_dirs(), vec![mapping("Physics"), mapping("Math")]).unwrap();
        let first = table.render();
        assert_eq!(first, table.render());
        assert!(first.find("## Math").unwrap() < first.find("## Physics").unwrap());
        assert!(first.contains("Transcripts: /transcripts/Physics"));
    }

    #[test]
    fn loads_partial_json_with_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"courses": [{"name": "Math", "notes_dir": "/n", "transcript_dir": "/t"}],
                "collaborators": {"note_renderer": {"program": "python3", "args": ["render.py"]}}}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.courses.len(), 1);
        assert_eq!(config.defaults, default_dirs());
        assert_eq!(config.collaborators.note_renderer.args, vec!["render.py"]);
        assert_eq!(config.collaborators.video_transcript.program, "yt-transcript");
        assert!(config.verify_output);
    }

    #[test]
    fn loads_yaml_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "defaults:\n  notes_dir: /n\n  transcript_dir: /t\nverify_output: false\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.defaults.notes_dir, PathBuf::from("/n"));
        assert!(!config.verify_output);
    }

    #[test]
    fn validate_rejects_duplicate_courses() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"courses": [
                {"name": "Math", "notes_dir": "/a", "transcript_dir": "/b"},
                {"name": "Math", "notes_dir": "/c", "transcript_dir": "/d"}]}"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateCourse(name)) if name == "Math"
        ));
    }

    #[test]
    fn validate_rejects_blank_program() {
        let mut config = Config::default();
        config.collaborators.http_fetch.program = "  ".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingProgram("http_fetch"))
        ));
    }
}

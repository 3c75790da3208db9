use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::NotesError;

/// Extensions that mark an `outputFilename` as already complete.
const NOTE_EXTENSIONS: &[&str] = &["md", "markdown", "mdx", "txt"];

static SLUG_SEPARATOR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s/\\]+").unwrap());
static HEADER_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[!#$%&'*+.^_`|~0-9A-Za-z-]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    LocalFile,
    RemoteVideo,
    HttpApi,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LocalFile => "local-file",
            Self::RemoteVideo => "remote-video",
            Self::HttpApi => "http-api",
        }
    }

    /// Suffix used in derived transcript filenames.
    pub fn file_tag(&self) -> &'static str {
        match self {
            Self::LocalFile => "Local",
            Self::RemoteVideo => "YT",
            Self::HttpApi => "API",
        }
    }

    /// Local transcripts already live on disk and are never re-saved.
    pub fn is_remote(&self) -> bool {
        !matches!(self, Self::LocalFile)
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
        }
    }

    pub fn allows_body(&self) -> bool {
        !matches!(self, Self::Get | Self::Head)
    }
}

impl FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            "HEAD" => Ok(Self::Head),
            other => Err(format!("unsupported http method '{}'", other)),
        }
    }
}

impl TryFrom<String> for HttpMethod {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HttpMethod> for String {
    fn from(method: HttpMethod) -> Self {
        method.as_str().to_string()
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accepted shapes of `apiHeaders`: an object, or that object JSON-encoded
/// in a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HeadersInput {
    Map(BTreeMap<String, String>),
    Encoded(String),
}

/// Request headers with names restricted to HTTP token characters and
/// values free of control line breaks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "HeadersInput")]
pub struct ApiHeaders(BTreeMap<String, String>);

impl ApiHeaders {
    pub fn new(headers: BTreeMap<String, String>) -> Result<Self, String> {
        for (name, value) in &headers {
            if !HEADER_NAME_RE.is_match(name) {
                return Err(format!("invalid header name '{}'", name));
            }
            if value.contains(['\r', '\n', '\0']) {
                return Err(format!("header '{}' contains a line break", name));
            }
        }
        Ok(Self(headers))
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl TryFrom<HeadersInput> for ApiHeaders {
    type Error = String;

    fn try_from(input: HeadersInput) -> Result<Self, Self::Error> {
        match input {
            HeadersInput::Map(map) => Self::new(map),
            HeadersInput::Encoded(s) if s.trim().is_empty() => Ok(Self::default()),
            HeadersInput::Encoded(s) => {
                let map: BTreeMap<String, String> = serde_json::from_str(&s)
                    .map_err(|e| format!("apiHeaders is not a JSON object of strings: {}", e))?;
                Self::new(map)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiBody {
    Text(String),
    Json(Value),
}

impl ApiBody {
    pub fn to_arg(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Json(value) => value.to_string(),
        }
    }
}

/// Everything the HTTP-fetch helper needs beyond the URL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HttpRequestSpec {
    pub method: HttpMethod,
    pub headers: ApiHeaders,
    pub body: Option<ApiBody>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormattingHints {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub special_formatting: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_to_emphasize: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub other_instructions: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(u64),
    Text(String),
}

fn lecture_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n.to_string(),
        NumberOrText::Text(s) => s.trim().to_string(),
    })
}

fn trimmed_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.map(|s| s.trim().to_string()))
}

fn default_true() -> bool {
    true
}

/// Arguments of `generate-notes-from-source`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRequest {
    pub course_name: String,
    #[serde(deserialize_with = "lecture_number")]
    pub lecture_number: String,
    pub lecture_topic: String,
    pub source_type: SourceType,
    pub source_location: String,
    pub api_method: Option<HttpMethod>,
    pub api_headers: Option<ApiHeaders>,
    pub api_body: Option<ApiBody>,
    pub output_directory: Option<PathBuf>,
    #[serde(default, deserialize_with = "trimmed_name")]
    pub output_filename: Option<String>,
    #[serde(default = "default_true")]
    pub save_transcript: bool,
    #[serde(default, deserialize_with = "trimmed_name")]
    pub transcript_filename: Option<String>,
    pub special_formatting: Option<String>,
    pub content_to_emphasize: Option<String>,
    pub other_instructions: Option<String>,
}

impl NoteRequest {
    /// Deserialize and validate tool arguments. Nothing touches the
    /// filesystem or spawns a process before this succeeds.
    pub fn from_arguments(arguments: Value) -> Result<Self, NotesError> {
        let request: Self = serde_json::from_value(arguments)
            .map_err(|e| NotesError::validation(e.to_string()))?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), NotesError> {
        require_non_empty("courseName", &self.course_name)?;
        require_non_empty("lectureNumber", &self.lecture_number)?;
        require_non_empty("lectureTopic", &self.lecture_topic)?;
        require_non_empty("sourceLocation", &self.source_location)?;

        if !is_plain_file_name(&self.lecture_number) {
            return Err(NotesError::validation(format!(
                "lectureNumber '{}' cannot be used in a file name",
                self.lecture_number
            )));
        }

        for (field, name) in [
            ("outputFilename", &self.output_filename),
            ("transcriptFilename", &self.transcript_filename),
        ] {
            if let Some(name) = name {
                if !is_plain_file_name(name) {
                    return Err(NotesError::validation(format!(
                        "{} '{}' must be a bare file name",
                        field, name
                    )));
                }
            }
        }

        // The locator is passed positionally; keep it from parsing as a flag.
        let location = self.source_location.trim();
        if self.source_type == SourceType::RemoteVideo && location.starts_with('-') {
            return Err(NotesError::validation(format!(
                "sourceLocation '{}' must not start with '-'",
                location
            )));
        }

        if self.source_type == SourceType::HttpApi {
            if !(location.starts_with("http://") || location.starts_with("https://")) {
                return Err(NotesError::validation(format!(
                    "sourceLocation '{}' must be an http(s) URL for http-api sources",
                    location
                )));
            }
            let method = self.api_method.unwrap_or_default();
            if self.api_body.is_some() && !method.allows_body() {
                return Err(NotesError::validation(format!(
                    "apiBody is not allowed with {}",
                    method
                )));
            }
        }

        Ok(())
    }

    pub fn http_spec(&self) -> HttpRequestSpec {
        HttpRequestSpec {
            method: self.api_method.unwrap_or_default(),
            headers: self.api_headers.clone().unwrap_or_default(),
            body: self.api_body.clone(),
        }
    }

    pub fn hints(&self) -> FormattingHints {
        FormattingHints {
            special_formatting: non_blank(&self.special_formatting),
            content_to_emphasize: non_blank(&self.content_to_emphasize),
            other_instructions: non_blank(&self.other_instructions),
        }
    }

    /// Whether acquired text should be written to the transcript directory.
    pub fn persists_transcript(&self) -> bool {
        self.save_transcript && self.source_type.is_remote()
    }

    pub fn transcript_file_name(&self) -> String {
        self.transcript_filename.clone().unwrap_or_else(|| {
            format!(
                "{}-Lecture-{}-{}.txt",
                course_slug(&self.course_name),
                self.lecture_number,
                self.source_type.file_tag()
            )
        })
    }

    pub fn note_file_name(&self) -> String {
        match &self.output_filename {
            Some(name) if has_note_extension(name) => name.clone(),
            Some(name) => format!("{}.md", name),
            None => format!(
                "{}-Lecture-{}.md",
                course_slug(&self.course_name),
                self.lecture_number
            ),
        }
    }
}

/// Course name with each run of whitespace or path separators replaced by
/// a single hyphen.
pub fn course_slug(course_name: &str) -> String {
    SLUG_SEPARATOR_RE
        .replace_all(course_name.trim(), "-")
        .into_owned()
}

fn require_non_empty(field: &str, value: &str) -> Result<(), NotesError> {
    if value.trim().is_empty() {
        return Err(NotesError::validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn has_note_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| {
            NOTE_EXTENSIONS
                .iter()
                .any(|known| e.eq_ignore_ascii_case(known))
        })
}

fn is_plain_file_name(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\', '\0'])
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

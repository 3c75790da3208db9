use std::fs;
use std::path::{Path, PathBuf};

use crate::error::NotesError;

/// Write `content` to `transcript_dir/file_name`, creating the directory
/// when needed. Existing files are overwritten.
pub fn persist(transcript_dir: &Path, file_name: &str, content: &str) -> Result<PathBuf, NotesError> {
    let path = transcript_dir.join(file_name);

    fs::create_dir_all(transcript_dir).map_err(|source| NotesError::Write {
        path: transcript_dir.to_path_buf(),
        source,
    })?;

    fs::write(&path, content).map_err(|source| NotesError::Write {
        path: path.clone(),
        source,
    })?;

    log::info!("saved transcript to {}", path.display());
    Ok(path)
}

//! Writes downloaded artifacts to disk.
//!
//! Every helper writes `<dir>/<artifact_id>.<ext>` and reports where the file
//! went. An empty directory means the current working directory.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SavedFile {
    pub message: String,
    pub file_path: PathBuf,
}

pub fn save_json_file(artifact_id: &str, content: &str, dir: &Path) -> Result<SavedFile> {
    write_artifact(artifact_id, "json", "Json", content.as_bytes(), dir)
}

pub fn save_pdf_file(artifact_id: &str, content: &[u8], dir: &Path) -> Result<SavedFile> {
    write_artifact(artifact_id, "pdf", "PDF", content, dir)
}

pub fn save_csv_file(artifact_id: &str, content: &str, dir: &Path) -> Result<SavedFile> {
    write_artifact(artifact_id, "csv", "CSV", content.as_bytes(), dir)
}

pub fn save_text_file(artifact_id: &str, content: &str, dir: &Path) -> Result<SavedFile> {
    write_artifact(artifact_id, "txt", "Text", content.as_bytes(), dir)
}

fn write_artifact(
    artifact_id: &str,
    extension: &str,
    label: &str,
    content: &[u8],
    dir: &Path,
) -> Result<SavedFile> {
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    let file_path = dir.join(format!("{artifact_id}.{extension}"));
    fs::write(&file_path, content)
        .with_context(|| format!("writing {}", file_path.display()))?;
    info!(path = %file_path.display(), "saved artifact");
    Ok(SavedFile {
        message: format!("{label} file saved to {}", file_path.display()),
        file_path,
    })
}

//! Resume reading: the request-scoped resume file handle.
//!
//! Inline content is written to a uniquely named temp file so concurrent runs
//! never share a path. `release()` removes it explicitly; the temp file's own
//! drop is only the fallback for unwinding.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use super::ToolError;

/// Where the candidate's resume comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeSource {
    Path(PathBuf),
    Inline(String),
}

pub struct ResumeFile {
    path: PathBuf,
    transient: Option<NamedTempFile>,
}

impl ResumeFile {
    pub fn provision(source: ResumeSource, scratch_dir: Option<&Path>) -> Result<Self, ToolError> {
        match source {
            ResumeSource::Path(path) => {
                if !path.exists() {
                    warn!("Resume file {} does not exist yet", path.display());
                }
                Ok(Self {
                    path,
                    transient: None,
                })
            }
            ResumeSource::Inline(content) => {
                let mut builder = tempfile::Builder::new();
                builder.prefix("resume-").suffix(".md");
                let mut file = match scratch_dir {
                    Some(dir) => builder.tempfile_in(dir)?,
                    None => builder.tempfile()?,
                };
                file.write_all(content.as_bytes())?;
                file.flush()?;

                let path = file.path().to_path_buf();
                info!("Persisted inline resume to {}", path.display());
                Ok(Self {
                    path,
                    transient: Some(file),
                })
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn is_transient(&self) -> bool {
        self.transient.is_some()
    }

    /// Reads the resume as text. PDFs are extracted; anything else is read as UTF-8.
    pub async fn read(&self) -> Result<String, ToolError> {
        let is_pdf = self
            .path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            let path = self.path.clone();
            return tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text(&path).map_err(|e| e.to_string())
            })
            .await
            .map_err(|e| ToolError::Pdf(format!("extraction task failed: {e}")))?
            .map_err(ToolError::Pdf);
        }

        Ok(tokio::fs::read_to_string(&self.path).await?)
    }

    /// Removes the transient file, if any. Errors are logged, never returned.
    pub fn release(self) {
        let Some(file) = self.transient else {
            return;
        };
        let path = file.path().to_path_buf();
        match file.close() {
            Ok(()) => debug!("Removed transient resume {}", path.display()),
            Err(e) => warn!(
                "Failed to remove transient resume {}: {e}",
                path.display()
            ),
        }
    }
}

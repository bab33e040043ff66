//! Document export
//!
//! Lays a [`BlogContent`] out onto pages, renders it to PDF in memory and
//! persists it atomically: either the finished document lands at the target
//! path or nothing there changes.

mod fonts;
mod layout;
mod pdf;

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ExportConfig;
use crate::synthesis::BlogContent;

pub use fonts::{FontFace, sanitize};
pub use layout::{LayoutConfig, PageLayout, PlacedLine, layout_document, wrap_text};
pub use pdf::render_pdf;

/// The document could not be written
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("refusing to export a post without a title")]
    EmptyTitle,

    #[error("refusing to export a post without paragraphs")]
    NoParagraphs,

    #[error("invalid page layout: {0}")]
    Layout(String),

    #[error("failed to render PDF: {0}")]
    Render(String),

    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one export attempt
#[derive(Debug)]
pub struct ExportResult {
    pub file_path: PathBuf,
    pub success: bool,
    pub error: Option<ExportError>,
}

impl ExportResult {
    fn ok(file_path: PathBuf) -> Self {
        Self {
            file_path,
            success: true,
            error: None,
        }
    }

    fn failed(file_path: PathBuf, error: ExportError) -> Self {
        Self {
            file_path,
            success: false,
            error: Some(error),
        }
    }

    /// Path on success, the error otherwise
    pub fn into_result(self) -> Result<PathBuf, ExportError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.file_path),
        }
    }
}

/// `<output-dir>/<file-prefix>_<YYYYMMDD_HHMMSS>.pdf`
pub fn default_output_path<Tz: TimeZone>(config: &ExportConfig, now: DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let name = format!("{}_{}.pdf", config.file_prefix, now.format("%Y%m%d_%H%M%S"));
    config.output_dir.join(name)
}

/// Renders blog content into a paginated PDF file
#[derive(Debug, Clone, Default)]
pub struct DocumentExporter {
    layout: LayoutConfig,
}

impl DocumentExporter {
    pub fn new(layout: LayoutConfig) -> Self {
        Self { layout }
    }

    /// Render `content` and write it to `file_path`
    ///
    /// Creates or overwrites the file. On failure any existing file at
    /// `file_path` is left as it was.
    pub fn export(&self, content: &BlogContent, file_path: &Path) -> ExportResult {
        debug!(?file_path, paragraphs = content.paragraphs.len(), "DocumentExporter::export: called");
        match self.try_export(content, file_path) {
            Ok(()) => {
                info!(?file_path, "Exported PDF");
                ExportResult::ok(file_path.to_path_buf())
            }
            Err(e) => {
                warn!(?file_path, error = %e, "Export failed");
                ExportResult::failed(file_path.to_path_buf(), e)
            }
        }
    }

    fn try_export(&self, content: &BlogContent, file_path: &Path) -> Result<(), ExportError> {
        if content.paragraphs.iter().all(|p| p.trim().is_empty()) {
            return Err(ExportError::NoParagraphs);
        }
        if content.title.trim().is_empty() {
            return Err(ExportError::EmptyTitle);
        }

        let pages = layout_document(content, &self.layout)?;
        let bytes = render_pdf(&sanitize(&content.title), &pages, &self.layout)?;
        write_atomically(file_path, &bytes)
    }
}

fn write_atomically(file_path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    debug!(?file_path, len = bytes.len(), "write_atomically: called");
    let io_err = |source| ExportError::Io {
        path: file_path.to_path_buf(),
        source,
    };

    let parent = match file_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    // The temp file is removed on drop unless persisted
    let mut tmp = tempfile::Builder::new()
        .prefix(".elderstory-")
        .suffix(".pdf.tmp")
        .tempfile_in(parent)
        .map_err(io_err)?;
    tmp.write_all(bytes).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(file_path).map_err(|e| io_err(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use tempfile::TempDir;

    fn story() -> BlogContent {
        BlogContent {
            title: "Summers on the Farm".to_string(),
            paragraphs: vec![
                "Every June the family packed the truck and drove north.".to_string(),
                "The barn smelled of hay and engine oil.".to_string(),
            ],
        }
    }

    #[test]
    fn test_export_writes_pdf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story.pdf");

        let result = DocumentExporter::default().export(&story(), &path);

        assert!(result.success, "{:?}", result.error);
        assert_eq!(result.file_path, path);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_export_overwrites_existing_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story.pdf");
        std::fs::write(&path, "old").unwrap();

        let result = DocumentExporter::default().export(&story(), &path);

        assert!(result.success);
        assert!(std::fs::read(&path).unwrap().starts_with(b"%PDF"));
    }

    #[test]
    fn test_zero_paragraphs_leaves_existing_file_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story.pdf");
        std::fs::write(&path, "previous story").unwrap();
        let content = BlogContent {
            title: "Title".to_string(),
            paragraphs: vec![],
        };

        let result = DocumentExporter::default().export(&content, &path);

        assert!(!result.success);
        assert!(matches!(result.error, Some(ExportError::NoParagraphs)));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous story");
        // No stray temp files either
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_empty_title_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("story.pdf");
        let content = BlogContent {
            title: "  ".to_string(),
            paragraphs: vec!["text".to_string()],
        };

        let result = DocumentExporter::default().export(&content, &path);

        assert!(matches!(result.into_result(), Err(ExportError::EmptyTitle)));
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_directory_fails_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("no/such/dir/story.pdf");

        let result = DocumentExporter::default().export(&story(), &path);

        assert!(!result.success);
        assert!(matches!(result.error, Some(ExportError::Io { .. })));
        assert!(!path.exists());
    }

    #[test]
    fn test_default_output_path() {
        let config = ExportConfig {
            output_dir: PathBuf::from("/tmp/stories"),
            file_prefix: "elder_story".to_string(),
            ..ExportConfig::default()
        };
        let now = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();

        assert_eq!(
            default_output_path(&config, now),
            PathBuf::from("/tmp/stories/elder_story_20240309_140507.pdf")
        );
    }
}

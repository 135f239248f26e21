use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::document::{DocumentContent, EditableDocument, TemplateDocument};
use crate::error::{ClaimFormError, Result};

/// A scoped connection to whatever environment owns the documents: opened
/// once per run, used for the template/save/export trio, and released when
/// dropped.
///
/// Implementations that wrap an external editor process must release it in
/// their `Drop` impl so a failure mid-fill never leaves the editor resident.
pub trait DocumentSession {
    type Document: EditableDocument;

    /// Load the template at `path` into an editable document.
    fn open_template(&mut self, path: &Path) -> Result<Self::Document>;

    /// Persist the (filled) document to `path`. Must not leave a half-written
    /// file at `path` on failure.
    fn save_document(&mut self, document: &Self::Document, path: &Path) -> Result<()>;

    /// Produce the host's fixed-format rendering of the document at `path`.
    fn export_fixed_format(&mut self, document: &Self::Document, path: &Path) -> Result<()>;
}

/// Reference host: templates are [`DocumentContent`] JSON files, saving
/// writes the same JSON shape back, and the fixed-format export is a plain
/// text rendering. Useful for tests, demos and any caller that post-processes
/// the filled document with a separate converter.
#[derive(Debug, Default)]
pub struct JsonDocumentHost;

impl JsonDocumentHost {
    pub fn open() -> Self {
        debug!("JSON document host opened");
        Self
    }
}

impl Drop for JsonDocumentHost {
    fn drop(&mut self) {
        debug!("JSON document host released");
    }
}

impl DocumentSession for JsonDocumentHost {
    type Document = TemplateDocument;

    fn open_template(&mut self, path: &Path) -> Result<TemplateDocument> {
        if !path.exists() {
            return Err(ClaimFormError::TemplateNotFound(path.to_path_buf()));
        }
        let raw = fs::read_to_string(path)?;
        let content: DocumentContent = serde_json::from_str(&raw)?;
        Ok(TemplateDocument::from_content(content))
    }

    fn save_document(&mut self, document: &TemplateDocument, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&document.to_content())?;
        write_atomic(path, &json)?;
        debug!("Saved filled document to {}", path.display());
        Ok(())
    }

    fn export_fixed_format(&mut self, document: &TemplateDocument, path: &Path) -> Result<()> {
        write_atomic(path, &document.to_plain_text()).map_err(|e| {
            ClaimFormError::ExportFailed {
                path: path.to_path_buf(),
                details: e.to_string(),
            }
        })?;
        debug!("Exported fixed-format rendering to {}", path.display());
        Ok(())
    }
}

/// Write via a sibling `.tmp` file and rename into place, so a prior output
/// at `path` is never overwritten with partial content.
fn write_atomic(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut tmp_name = path.as_os_str().to_os_string();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);
    fs::write(&tmp, contents)?;
    fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Paragraph};

    fn template_json() -> String {
        let content = DocumentContent {
            body: vec![Block::Paragraph(Paragraph::from_text("{{PATIENT_NAME}}"))],
            headers: vec![],
            footers: vec![],
        };
        serde_json::to_string(&content).unwrap()
    }

    #[test]
    fn test_missing_template_is_a_distinct_error() {
        let mut host = JsonDocumentHost::open();
        let err = host
            .open_template(Path::new("/nonexistent/claim_template.json"))
            .unwrap_err();
        assert!(matches!(err, ClaimFormError::TemplateNotFound(_)));
    }

    #[test]
    fn test_malformed_template_surfaces_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let mut host = JsonDocumentHost::open();
        let err = host.open_template(&path).unwrap_err();
        assert!(matches!(err, ClaimFormError::SerializationError(_)));
    }

    #[test]
    fn test_open_save_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.json");
        fs::write(&template, template_json()).unwrap();

        let mut host = JsonDocumentHost::open();
        let doc = host.open_template(&template).unwrap();
        assert_eq!(doc.main_story_len(), 1);

        let out = dir.path().join("filled.json");
        host.save_document(&doc, &out).unwrap();

        let reloaded = host.open_template(&out).unwrap();
        assert_eq!(reloaded.to_content(), doc.to_content());
        // No stray temp file once the rename has happened.
        assert!(!dir.path().join("filled.json.tmp").exists());
    }

    #[test]
    fn test_export_writes_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = JsonDocumentHost::open();

        let mut doc = TemplateDocument::new();
        doc.push_text("line one");
        doc.push_text("line two");

        let out = dir.path().join("claim.txt");
        host.export_fixed_format(&doc, &out).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), "line one\nline two");
    }

    #[test]
    fn test_failed_export_keeps_prior_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("claim.txt");
        fs::write(&out, "previous successful export").unwrap();

        let mut host = JsonDocumentHost::open();
        let mut doc = TemplateDocument::new();
        doc.push_text("new content");

        // Writing into a directory that does not exist fails before any
        // rename can touch the real output.
        let unwritable = dir.path().join("no_dir").join("claim.txt");
        let err = host.export_fixed_format(&doc, &unwritable).unwrap_err();
        assert!(matches!(err, ClaimFormError::ExportFailed { .. }));

        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "previous successful export"
        );
    }
}

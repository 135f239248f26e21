use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fields::{FieldMap, RawFields};
use crate::filler::{FillConfig, FillReport, TemplateFiller};
use crate::host::DocumentSession;
use crate::normalizer;

/// One fill request: template, extracted values, and the two output paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillJob {
    pub template: PathBuf,
    /// Flat JSON object of raw field values, as the extraction step writes it.
    pub values: PathBuf,
    /// Destination of the filled document itself.
    pub output_document: PathBuf,
    /// Destination of the host's fixed-format rendering of that document.
    pub output_export: PathBuf,
}

impl FillJob {
    pub fn new(
        template: impl Into<PathBuf>,
        values: impl Into<PathBuf>,
        output_document: impl Into<PathBuf>,
        output_export: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template: template.into(),
            values: values.into(),
            output_document: output_document.into(),
            output_export: output_export.into(),
        }
    }
}

/// Run the whole pipeline for a job: read the values JSON, normalize, fill
/// the template, persist the document, export it.
pub fn run_fill_job<S: DocumentSession>(
    session: &mut S,
    job: &FillJob,
    config: &FillConfig,
) -> Result<FillReport> {
    let raw = load_raw_fields(&job.values)?;
    fill_and_export(
        session,
        &raw,
        &job.template,
        &job.output_document,
        &job.output_export,
        config,
    )
}

/// Same as [`run_fill_job`] for callers that already hold the raw mapping.
/// The mapping may have missing or null values throughout; normalization
/// fills in the blanks.
///
/// Outputs are written only after the fill succeeded, document before export,
/// so an abort never leaves a half-filled file over a prior successful run.
pub fn fill_and_export<S: DocumentSession>(
    session: &mut S,
    raw: &RawFields,
    template: &Path,
    output_document: &Path,
    output_export: &Path,
    config: &FillConfig,
) -> Result<FillReport> {
    // 1. Normalize the provider output
    let fields = normalizer::normalize(raw);

    // 2. Load and fill the template
    let mut document = session.open_template(template)?;
    let report = TemplateFiller::new(config.clone()).fill(&mut document, &fields);

    // 3. Persist the document, then its export
    session.save_document(&document, output_document)?;
    session.export_fixed_format(&document, output_export)?;

    info!(
        "Filled {} -> {} (+ export {})",
        template.display(),
        output_document.display(),
        output_export.display()
    );
    Ok(report)
}

/// Read a raw field mapping from a JSON object on disk. Values may be strings
/// or null; anything the extractor chose not to emit is simply absent.
pub fn load_raw_fields(path: &Path) -> Result<RawFields> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Persist a normalized mapping next to the filled document, pretty-printed
/// the way the extraction step writes its own payload.
pub fn write_fields_json(fields: &FieldMap, path: &Path) -> Result<()> {
    fs::write(path, fields.to_json_pretty()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, DocumentContent, Paragraph};
    use crate::error::ClaimFormError;
    use crate::host::JsonDocumentHost;

    fn write_template(path: &Path) {
        let content = DocumentContent {
            body: vec![
                Block::Paragraph(Paragraph::from_text("Patient: {{PATIENT_NAME}}")),
                Block::Paragraph(Paragraph::from_text("{{MED_1}}{{QTY_MED_1}}")),
                Block::Paragraph(Paragraph::from_text("{{MED_3}}{{QTY_MED_3}}")),
                Block::Paragraph(Paragraph::from_text("Total: {{TOTAL_AMOUNT}}")),
            ],
            headers: vec![],
            footers: vec![],
        };
        fs::write(path, serde_json::to_string(&content).unwrap()).unwrap();
    }

    fn raw_fields() -> RawFields {
        [
            ("PATIENT_NAME", Some("A Sharma")),
            ("MED_1", Some("Paracetamol")),
            ("QTY_MED_1", Some("30")),
            ("MED_3", None),
            ("TOTAL_AMOUNT", Some("₹1,234.50")),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
        .collect()
    }

    #[test]
    fn test_end_to_end_job() {
        let dir = tempfile::tempdir().unwrap();
        let job = FillJob::new(
            dir.path().join("template.json"),
            dir.path().join("claim_data.json"),
            dir.path().join("filled.json"),
            dir.path().join("filled.txt"),
        );
        write_template(&job.template);
        fs::write(
            &job.values,
            serde_json::to_string(&raw_fields()).unwrap(),
        )
        .unwrap();

        let mut session = JsonDocumentHost::open();
        let report = run_fill_job(&mut session, &job, &FillConfig::default()).unwrap();

        assert_eq!(report.deleted_paragraphs, 1);
        assert!(report.is_clean());

        let text = fs::read_to_string(&job.output_export).unwrap();
        assert!(text.contains("Patient: A Sharma"));
        assert!(text.contains("Paracetamol, Qty – 30"));
        assert!(text.contains("Total: ₹ 1234 /-"));
        assert!(!text.contains("MED_3"));
        assert!(job.output_document.exists());
    }

    #[test]
    fn test_missing_template_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("absent.json");
        let out_doc = dir.path().join("filled.json");
        let out_export = dir.path().join("filled.txt");

        let mut session = JsonDocumentHost::open();
        let err = fill_and_export(
            &mut session,
            &raw_fields(),
            &template,
            &out_doc,
            &out_export,
            &FillConfig::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ClaimFormError::TemplateNotFound(_)));
        assert!(!out_doc.exists());
        assert!(!out_export.exists());
    }

    #[test]
    fn test_failed_run_preserves_prior_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("template.json");
        write_template(&template);
        let out_doc = dir.path().join("filled.json");
        let out_export = dir.path().join("filled.txt");

        let mut session = JsonDocumentHost::open();
        fill_and_export(
            &mut session,
            &raw_fields(),
            &template,
            &out_doc,
            &out_export,
            &FillConfig::default(),
        )
        .unwrap();
        let first_export = fs::read_to_string(&out_export).unwrap();

        // A later run against a template that has gone missing leaves both
        // earlier outputs exactly as they were.
        fs::remove_file(&template).unwrap();
        fill_and_export(
            &mut session,
            &raw_fields(),
            &template,
            &out_doc,
            &out_export,
            &FillConfig::default(),
        )
        .unwrap_err();

        assert_eq!(fs::read_to_string(&out_export).unwrap(), first_export);
    }

    #[test]
    fn test_raw_fields_round_trip_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claim_data.json");
        fs::write(
            &path,
            r#"{"PATIENT_NAME": "A Sharma", "MED_3": null, "AMT_1": "192"}"#,
        )
        .unwrap();

        let raw = load_raw_fields(&path).unwrap();
        assert_eq!(raw.get("PATIENT_NAME"), Some(&Some("A Sharma".to_string())));
        assert_eq!(raw.get("MED_3"), Some(&None));

        let fields = normalizer::normalize(&raw);
        let out = dir.path().join("normalized.json");
        write_fields_json(&fields, &out).unwrap();
        assert!(fs::read_to_string(&out).unwrap().contains("\"192.00\""));
    }
}

//! # Claim Form Filler
//!
//! A library for filling fixed-layout medical reimbursement claim forms with
//! field values extracted from a pharmacy bill and its prescription.
//!
//! ## Core Concepts
//!
//! - **Raw fields**: a flat name→value mapping straight from the extraction
//!   step; values may be missing or null throughout
//! - **Normalization**: best-effort reformatting into the form's display
//!   conventions (dates, `₹ 1234 /-` payable amounts, two-decimal line
//!   amounts, quantity fragments); never fails, degrades to empty strings
//! - **Template**: a host document whose text carries `{{FIELD_NAME}}`
//!   placeholders, edited through the [`EditableDocument`] capability trait
//! - **Three-phase fill**: delete paragraphs of unused medicine slots,
//!   substitute placeholders longest-token-first, renumber the certified
//!   statements
//! - **Host session**: scoped acquisition of the document environment with
//!   release on every exit path
//!
//! ## Example
//!
//! ```rust
//! use claim_form_filler::*;
//!
//! let mut raw = RawFields::new();
//! raw.insert("PATIENT_NAME".to_string(), Some("A Sharma".to_string()));
//! raw.insert("TOTAL_AMOUNT".to_string(), Some("₹1,234.50".to_string()));
//!
//! let fields = normalize(&raw);
//! assert_eq!(fields.get("TOTAL_AMOUNT"), "₹ 1234 /-");
//!
//! let mut doc = TemplateDocument::new();
//! doc.push_text("Payable: {{TOTAL_AMOUNT}}");
//!
//! let report = fill_document(&mut doc, &fields);
//! assert!(report.is_clean());
//! assert_eq!(doc.to_plain_text(), "Payable: ₹ 1234 /-");
//! ```

pub mod document;
pub mod error;
pub mod fields;
pub mod filler;
pub mod host;
pub mod normalizer;
pub mod pipeline;
pub mod schema;

#[cfg(feature = "gemini")]
pub mod llm;

pub use document::{
    Block, DocumentContent, EditBlocked, EditableDocument, ParaId, Paragraph, Run, Table,
    TableCell, TableRow, TemplateDocument,
};
pub use error::{ClaimFormError, Result};
pub use fields::{FieldMap, RawFields};
pub use filler::{fill_document, FillConfig, FillReport, SkippedEdit, TemplateFiller};
pub use host::{DocumentSession, JsonDocumentHost};
pub use normalizer::{normalize, normalize_at};
pub use pipeline::{fill_and_export, load_raw_fields, run_fill_job, write_fields_json, FillJob};
pub use schema::{ClaimExtraction, MedicineLine};

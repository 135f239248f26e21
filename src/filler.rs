use std::collections::BTreeSet;

use log::{debug, info, warn};
use serde::Serialize;

use crate::document::{EditableDocument, Run};
use crate::fields::{self, FieldMap};

/// Tuning knobs for the filler. The defaults reproduce the claim form's
/// standard behavior.
#[derive(Debug, Clone)]
pub struct FillConfig {
    /// Fields rendered as a single bold+underline run when a paragraph's
    /// entire text is exactly their placeholder.
    pub emphasized_fields: BTreeSet<String>,
    /// Left indent applied to renumbered certified statements, in inches.
    pub statement_indent_inches: f32,
}

impl Default for FillConfig {
    fn default() -> Self {
        Self {
            emphasized_fields: fields::default_emphasized_fields(),
            statement_indent_inches: 0.5,
        }
    }
}

/// An edit the host refused. These are collected rather than raised; a single
/// uneditable paragraph must not abort the run.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedEdit {
    pub paragraph: String,
    pub reason: String,
}

impl SkippedEdit {
    fn new(paragraph_text: &str, reason: impl Into<String>) -> Self {
        Self {
            paragraph: paragraph_text.chars().take(80).collect(),
            reason: reason.into(),
        }
    }
}

/// What a fill run did to the document.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FillReport {
    pub deleted_paragraphs: usize,
    pub replaced_tokens: usize,
    pub emphasized_paragraphs: usize,
    pub renumbered_statements: usize,
    pub skipped: Vec<SkippedEdit>,
}

impl FillReport {
    /// True when no edit had to be skipped.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}

/// Fills a claim template in three strictly ordered phases:
///
/// 1. Delete main-story paragraphs belonging to unused medicine slots, while
///    their placeholder tokens are still textually intact.
/// 2. Substitute every placeholder with its normalized value, longest token
///    first, emphasizing the designated identity/amount fields.
/// 3. Renumber the two certified statements and indent them.
pub struct TemplateFiller {
    config: FillConfig,
}

impl TemplateFiller {
    pub fn new(config: FillConfig) -> Self {
        Self { config }
    }

    pub fn fill(&self, document: &mut impl EditableDocument, fields: &FieldMap) -> FillReport {
        let mut report = FillReport::default();

        // 1. Conditional slot deletion
        self.delete_blank_slot_paragraphs(document, fields, &mut report);

        // 2. Placeholder substitution
        self.substitute_placeholders(document, fields, &mut report);

        // 3. Cosmetic statement renumbering
        self.renumber_certified_statements(document, &mut report);

        info!(
            "Fill complete: {} paragraphs deleted, {} tokens replaced, {} emphasized, {} statements renumbered, {} edits skipped",
            report.deleted_paragraphs,
            report.replaced_tokens,
            report.emphasized_paragraphs,
            report.renumbered_statements,
            report.skipped.len()
        );
        report
    }

    fn delete_blank_slot_paragraphs(
        &self,
        document: &mut impl EditableDocument,
        fields: &FieldMap,
        report: &mut FillReport,
    ) {
        let tokens = deletion_tokens(fields);
        if tokens.is_empty() {
            return;
        }
        debug!("Blank-slot deletion set: {:?}", tokens);

        for id in document.main_story_paragraphs() {
            let Some(text) = document.paragraph_text(id) else {
                continue;
            };
            if !tokens.iter().any(|token| text.contains(token.as_str())) {
                continue;
            }
            match document.delete_paragraph(id) {
                Ok(()) => report.deleted_paragraphs += 1,
                Err(blocked) => {
                    warn!("Could not delete paragraph {:?}: {}", text, blocked.reason);
                    report.skipped.push(SkippedEdit::new(&text, blocked.reason));
                }
            }
        }
    }

    fn substitute_placeholders(
        &self,
        document: &mut impl EditableDocument,
        fields: &FieldMap,
        report: &mut FillReport,
    ) {
        let pairs = substitution_pairs(fields);

        for id in document.replaceable_paragraphs() {
            let Some(text) = document.paragraph_text(id) else {
                continue;
            };
            if !text.contains("{{") {
                continue;
            }

            if let Some(value) = self.emphasized_value(&text, fields) {
                document.set_paragraph_runs(id, vec![Run::emphasized(value)]);
                report.emphasized_paragraphs += 1;
                continue;
            }

            for (token, value) in &pairs {
                if text.contains(token.as_str()) {
                    report.replaced_tokens += document.replace_in_paragraph(id, token, value);
                }
            }
        }
    }

    /// When the paragraph's entire trimmed text is exactly one emphasized
    /// field's placeholder, returns that field's value.
    fn emphasized_value(&self, paragraph_text: &str, fields: &FieldMap) -> Option<String> {
        let trimmed = paragraph_text.trim();
        self.config
            .emphasized_fields
            .iter()
            .find(|field| trimmed == fields::placeholder(field))
            .map(|field| fields.get(field).to_string())
    }

    fn renumber_certified_statements(
        &self,
        document: &mut impl EditableDocument,
        report: &mut FillReport,
    ) {
        const MARKERS: [(&str, &str); 2] = [("(1)", "(a)"), ("(2)", "(b)")];

        for id in document.main_story_paragraphs() {
            let Some(text) = document.paragraph_text(id) else {
                continue;
            };
            let trimmed = text.trim();
            for (old, new) in MARKERS {
                if trimmed.starts_with(old) {
                    document.set_paragraph_runs(id, vec![Run::plain(trimmed.replacen(old, new, 1))]);
                    document.set_left_indent(id, self.config.statement_indent_inches);
                    report.renumbered_statements += 1;
                }
            }
        }
    }
}

/// Placeholder tokens whose paragraphs must be removed for this mapping.
///
/// A blank medicine name empties the whole slot (name, form, quantity and
/// amount tokens); a blank amount drops just the amount token, since an
/// amount can be missing even when the rest of the slot is present.
fn deletion_tokens(fields: &FieldMap) -> BTreeSet<String> {
    let mut tokens = BTreeSet::new();
    for slot in fields::OPTIONAL_SLOTS {
        if fields.is_blank(&fields::medicine_key(slot)) {
            for key in fields::slot_keys(slot) {
                tokens.insert(fields::placeholder(&key));
            }
        }
        if fields.is_blank(&fields::amount_key(slot)) {
            tokens.insert(fields::placeholder(&fields::amount_key(slot)));
        }
    }
    tokens
}

/// All (token, value) pairs of the mapping, longest token first so a token
/// that is a textual prefix of another can never clobber the longer one.
fn substitution_pairs(fields: &FieldMap) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = fields
        .iter()
        .map(|(key, value)| (fields::placeholder(key), value.clone()))
        .collect();
    pairs.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
    pairs
}

/// One-shot fill with the default configuration.
pub fn fill_document(document: &mut impl EditableDocument, fields: &FieldMap) -> FillReport {
    TemplateFiller::new(FillConfig::default()).fill(document, fields)
}

use anyhow::{Context, Result};
use claim_form_filler::{run_fill_job, FillConfig, FillJob, JsonDocumentHost};
use std::fs;

// A small stand-in for the real claim form: the bill line, a particulars
// table, three medicine slots and the certified statements.
const CLAIM_TEMPLATE: &str = r#"{
  "body": [
    {"Paragraph": {"runs": [{"text": "MEDICINE REIMBURSEMENT CLAIM FORM"}]}},
    {"Paragraph": {"runs": [{"text": "Bill No {{INVOICE_NO.}} dated {{DATE}}"}]}},
    {"Table": {"rows": [
      {"cells": [
        {"paragraphs": [{"runs": [{"text": "Name of Patient"}]}]},
        {"paragraphs": [{"runs": [{"text": "{{PATIENT_NAME}}"}]}]}
      ]},
      {"cells": [
        {"paragraphs": [{"runs": [{"text": "ECHS Card No"}]}]},
        {"paragraphs": [{"runs": [{"text": "{{ECHS_CARD_NO}}"}]}]}
      ]}
    ]}},
    {"Paragraph": {"runs": [{"text": "{{MED_1}} ({{FORM_MED_1}}){{QTY_MED_1}} ... {{AMT_1}}"}]}},
    {"Paragraph": {"runs": [{"text": "{{MED_2}} ({{FORM_MED_2}}){{QTY_MED_2}} ... {{AMT_2}}"}]}},
    {"Paragraph": {"runs": [{"text": "{{MED_3}} ({{FORM_MED_3}}){{QTY_MED_3}} ... {{AMT_3}}"}]}},
    {"Paragraph": {"runs": [{"text": "Net amount claimed:"}]}},
    {"Paragraph": {"runs": [{"text": "{{TOTAL_AMOUNT}}"}]}},
    {"Paragraph": {"runs": [{"text": "(1) Certified that the medicines were purchased for the bona fide use of the patient."}]}},
    {"Paragraph": {"runs": [{"text": "(2) Certified that the cost has not been claimed from any other source."}]}}
  ],
  "headers": [{"runs": [{"text": "ECHS Polyclinic - {{CURRENT_MONTH_YEAR}}"}]}]
}"#;

// What the extraction step hands over for a two-medicine bill. Slot 3 is
// unused, so its paragraph will be deleted rather than rendered half empty.
const CLAIM_DATA: &str = r#"{
  "PATIENT_NAME": "Sunita Devi",
  "ECHS_CARD_NO": "EC 123 456 789",
  "INVOICE_NO.": "INV-2024-0117",
  "DATE": "17-01-2024",
  "TOTAL_AMOUNT": "₹2,450.00",
  "MED_1": "Metformin 500mg",
  "FORM_MED_1": "Tab",
  "QTY_MED_1": "60",
  "AMT_1": "384",
  "MED_2": "Glimepiride 2mg",
  "FORM_MED_2": "Tab",
  "QTY_MED_2": "30",
  "AMT_2": "2066.40",
  "MED_3": null
}"#;

fn main() -> Result<()> {
    fs::write("claim_template.json", CLAIM_TEMPLATE).context("writing the template fixture")?;
    fs::write("claim_data.json", CLAIM_DATA).context("writing the claim data")?;

    let job = FillJob::new(
        "claim_template.json",
        "claim_data.json",
        "claim_filled.json",
        "claim_filled.txt",
    );

    let mut session = JsonDocumentHost::open();
    let report = run_fill_job(&mut session, &job, &FillConfig::default())?;

    println!(
        "Deleted {} paragraphs, replaced {} tokens, emphasized {}, renumbered {} statements",
        report.deleted_paragraphs,
        report.replaced_tokens,
        report.emphasized_paragraphs,
        report.renumbered_statements
    );
    for skip in &report.skipped {
        println!("Skipped edit: {:?} ({})", skip.paragraph, skip.reason);
    }

    let rendered = fs::read_to_string(&job.output_export).context("reading the export back")?;
    println!("\nFilled claim form:\n{}", rendered);
    println!(
        "Generated: {} and {}",
        job.output_document.display(),
        job.output_export.display()
    );
    Ok(())
}

use claim_form_filler::llm::{ClaimExtractor, ExtractionEvent, GeminiClient};
use claim_form_filler::{fill_and_export, normalize, write_fields_json, FillConfig, JsonDocumentHost};
use dotenv::dotenv;
use std::error::Error;
use std::path::{Path, PathBuf};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv().ok();
    println!("🚀 Starting Gemini claim extraction example...");

    // 1. Resolve inputs: bill image, prescription image, template fixture
    let mut args = std::env::args().skip(1);
    let bill = PathBuf::from(args.next().unwrap_or_else(|| "bill.jpg".to_string()));
    let prescription = PathBuf::from(args.next().unwrap_or_else(|| "prescription.jpg".to_string()));
    let template = PathBuf::from(args.next().unwrap_or_else(|| "claim_template.json".to_string()));

    // 2. Initialize the Gemini client
    let api_key = std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set");
    let client = GeminiClient::new(api_key);
    let extractor = ClaimExtractor::new(client, "gemini-2.5-pro");

    // 3. Stream progress events while the extraction runs
    let (tx, mut rx) = tokio::sync::mpsc::channel(16);
    let progress = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                ExtractionEvent::Starting => println!("🤖 Contacting Gemini..."),
                ExtractionEvent::AttachingImage { filename } => {
                    println!("📎 Attaching {}", filename)
                }
                ExtractionEvent::DraftingResponse => println!("📝 Model is reading the bill..."),
                ExtractionEvent::ProcessingResponse => println!("🔄 Parsing structured output..."),
                ExtractionEvent::Retry { attempt, error } => {
                    println!("⚠️  Attempt {} rejected: {}", attempt, error)
                }
                ExtractionEvent::Success => println!("📥 Extraction complete."),
                ExtractionEvent::Failed { reason } => println!("❌ Extraction failed: {}", reason),
            }
        }
    });

    let extraction = extractor.extract(&bill, &prescription, Some(tx)).await?;
    progress.await?;

    println!("✅ Extracted claim of {}", extraction.patient_name);

    // 4. Flatten and normalize, and keep the payload on disk for inspection
    let raw = extraction.into_raw_fields();
    let fields = normalize(&raw);
    write_fields_json(&fields, Path::new("claim_data.json"))?;
    println!("💾 Normalized fields saved to claim_data.json");

    // 5. Fill the claim template and export the result
    let mut session = JsonDocumentHost::open();
    let report = fill_and_export(
        &mut session,
        &raw,
        &template,
        Path::new("claim_filled.json"),
        Path::new("claim_filled.txt"),
        &FillConfig::default(),
    )?;

    println!(
        "⚙️  Fill report: {} deleted, {} replaced, {} emphasized, {} renumbered",
        report.deleted_paragraphs,
        report.replaced_tokens,
        report.emphasized_paragraphs,
        report.renumbered_statements
    );
    println!("✅ Generated: claim_filled.json (+ claim_filled.txt)");

    Ok(())
}

use std::path::Path;

use log::warn;
use tokio::sync::mpsc::Sender;

use crate::error::{ClaimFormError, Result};
use crate::fields;
use crate::llm::prompts::SYSTEM_PROMPT_CLAIM_EXTRACT;
use crate::llm::{client::GeminiClient, types::*};
use crate::schema::ClaimExtraction;

const MAX_ATTEMPTS: usize = 3;

/// Single-call vision extraction: bill image + prescription image in, one
/// [`ClaimExtraction`] out. Invalid JSON is fed back to the model for
/// correction up to [`MAX_ATTEMPTS`] times before giving up.
pub struct ClaimExtractor {
    client: GeminiClient,
    model: String,
    system_prompt: String,
}

impl ClaimExtractor {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            system_prompt: SYSTEM_PROMPT_CLAIM_EXTRACT.to_string(),
        }
    }

    /// Swap in a caller-supplied prompt (e.g., for a different claim form).
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub async fn extract(
        &self,
        bill: &Path,
        prescription: &Path,
        progress: Option<Sender<ExtractionEvent>>,
    ) -> Result<ClaimExtraction> {
        self.send_event(&progress, ExtractionEvent::Starting).await;

        let mut images = Vec::new();
        for path in [bill, prescription] {
            let image = self.client.load_image(path).await?;
            self.send_event(
                &progress,
                ExtractionEvent::AttachingImage {
                    filename: image.display_name.clone(),
                },
            )
            .await;
            images.push(image);
        }

        let instructions = "Extract the claim data from the two attached images.\n\
            Image 1 is the pharmacy bill. Image 2 is the ECHS prescription.\n\
            Return ONLY the JSON object; every schema key must be present.";

        let mut messages = vec![Content::user_with_images(instructions, &images)];
        let response_schema = serde_json::to_value(ClaimExtraction::generate_json_schema())?;

        self.send_event(&progress, ExtractionEvent::DraftingResponse)
            .await;

        for attempt in 1..=MAX_ATTEMPTS {
            let raw = self
                .client
                .generate_content(
                    &self.model,
                    &self.system_prompt,
                    messages.clone(),
                    Some(response_schema.clone()),
                )
                .await?;

            self.send_event(&progress, ExtractionEvent::ProcessingResponse)
                .await;

            match parse_extraction(&raw) {
                Ok(extraction) => {
                    if extraction.medicines.len() > fields::MEDICINE_SLOTS {
                        warn!(
                            "Model returned {} medicine lines; the form holds {}, extras are dropped",
                            extraction.medicines.len(),
                            fields::MEDICINE_SLOTS
                        );
                    }
                    self.send_event(&progress, ExtractionEvent::Success).await;
                    return Ok(extraction);
                }
                Err(e) => {
                    self.send_event(
                        &progress,
                        ExtractionEvent::Retry {
                            attempt,
                            error: e.to_string(),
                        },
                    )
                    .await;

                    // Feed the model its own bad output so it can correct it.
                    messages.push(Content::model(raw));
                    messages.push(Content::user(format!(
                        "Your previous reply could not be parsed against the claim schema:\n\n\
                        ERROR: {}\n\n\
                        Return the complete corrected JSON object. Do NOT return a diff or commentary.",
                        e
                    )));
                }
            }
        }

        let msg = format!(
            "The model could not produce valid claim JSON in {} attempts",
            MAX_ATTEMPTS
        );
        self.send_event(
            &progress,
            ExtractionEvent::Failed {
                reason: msg.clone(),
            },
        )
        .await;
        Err(ClaimFormError::ExtractionFailed(msg))
    }

    async fn send_event(&self, sender: &Option<Sender<ExtractionEvent>>, event: ExtractionEvent) {
        if let Some(tx) = sender {
            let _ = tx.send(event).await;
        }
    }
}

fn parse_extraction(raw: &str) -> std::result::Result<ClaimExtraction, serde_json::Error> {
    serde_json::from_str(&clean_json_output(raw))
}

/// Strip markdown fencing or stray prose around the model's JSON object.
fn clean_json_output(raw: &str) -> String {
    if let Some(start) = raw.find('{') {
        if let Some(end) = raw.rfind('}') {
            if start < end {
                return raw[start..=end].to_string();
            }
        }
    }
    raw.trim().to_string()
}

use crate::error::{ClaimFormError, Result};
use crate::llm::types::*;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use std::path::Path;
use tokio::fs;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: GEMINI_BASE_URL.to_string(),
        }
    }

    /// Read an image from disk into the inline-data form the API accepts.
    pub async fn load_image(&self, path: &Path) -> Result<ImageAttachment> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ClaimFormError::ExtractionFailed("Invalid file name".to_string()))?;

        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        let file_bytes = fs::read(path).await?;

        Ok(ImageAttachment {
            display_name: file_name.to_string(),
            mime_type,
            data: STANDARD.encode(file_bytes),
        })
    }

    pub(crate) async fn generate_content(
        &self,
        model: &str,
        system_prompt: &str,
        messages: Vec<Content>,
        response_schema: Option<serde_json::Value>,
    ) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let system_content = Some(Content {
            role: "user".to_string(),
            parts: vec![Part::Text {
                text: system_prompt.to_string(),
            }],
        });

        let payload = GenerateContentRequest {
            contents: messages,
            system_instruction: system_content,
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema,
            },
        };

        let res = self.client.post(&url).json(&payload).send().await?;
        let status = res.status();

        if !status.is_success() {
            let err_text = res.text().await?;
            return Err(ClaimFormError::ExtractionFailed(format!(
                "Gemini API Error (status {}): {}",
                status, err_text
            )));
        }

        let body: GenerateContentResponse = res.json().await?;

        let text = body
            .candidates
            .ok_or_else(|| {
                ClaimFormError::ExtractionFailed("No candidates returned".to_string())
            })?
            .first()
            .ok_or_else(|| {
                ClaimFormError::ExtractionFailed("Empty candidates list".to_string())
            })?
            .content
            .parts
            .first()
            .ok_or_else(|| ClaimFormError::ExtractionFailed("No parts in content".to_string()))?
            .clone();

        match text {
            Part::Text { text } => Ok(text),
            _ => Err(ClaimFormError::ExtractionFailed(
                "Model returned non-text content".to_string(),
            )),
        }
    }
}

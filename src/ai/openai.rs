use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::prompt::{SYSTEM_PROMPT, project_prompt};
use super::{GeneratedProject, GenerationError, GenerationRequest, ProjectGenerator};

/// Chat-completions client for OpenAI-compatible APIs.
pub struct OpenAiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiGenerator {
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl ProjectGenerator for OpenAiGenerator {
    fn id(&self) -> &str {
        "openai"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedProject, GenerationError> {
        let body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": project_prompt(request) },
            ],
            "response_format": { "type": "json_object" },
            "temperature": 0.7,
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::upstream(format!("OpenAI request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let detail = resp
                .text()
                .await
                .unwrap_or_default()
                .chars()
                .take(512)
                .collect::<String>();
            return Err(GenerationError::upstream(format!(
                "OpenAI returned {status}: {detail}"
            )));
        }

        let chat: ChatResponse = resp
            .json()
            .await
            .map_err(|e| GenerationError::upstream(format!("Invalid OpenAI response: {e}")))?;

        let content = chat
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| GenerationError::upstream("OpenAI response had no content"))?;

        parse_completion(&content)
    }
}

/// Parse the model's reply, tolerating a surrounding markdown code fence.
pub fn parse_completion(content: &str) -> Result<GeneratedProject, GenerationError> {
    let trimmed = content.trim();
    let json = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed);

    serde_json::from_str(json.trim())
        .map_err(|e| GenerationError::upstream(format!("Could not parse generated project: {e}")))
}

//! services/api/src/adapters/caption_llm.rs
//!
//! This module contains the adapter for the caption-writing LLM.
//! It implements the `CaptionGenerationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use caption_genius_core::{
    ports::{CaptionGenerationService, PortError, PortResult},
    prompt::SYSTEM_INSTRUCTION,
};
use tracing::{debug, error};

const TEMPERATURE: f32 = 0.7;
const MAX_OUTPUT_TOKENS: u32 = 150;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `CaptionGenerationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiCaptionAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiCaptionAdapter {
    /// Creates a new `OpenAiCaptionAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

/// Whether a provider failure means our API key was rejected.
///
/// The structured error code is checked first; the "401" substring is only a fallback
/// for transport-level failures that carry no code.
fn is_credential_rejection(code: Option<&str>, message: &str) -> bool {
    match code {
        Some(code) => code == "invalid_api_key",
        None => message.contains("401") || message.contains("Incorrect API key"),
    }
}

fn classify(e: OpenAIError) -> PortError {
    let code = match &e {
        OpenAIError::ApiError(api) => api.code.clone(),
        _ => None,
    };
    let message = e.to_string();
    if is_credential_rejection(code.as_deref(), &message) {
        error!("Completion provider rejected the API key: {}", message);
        PortError::Unauthorized
    } else {
        PortError::Unexpected(message)
    }
}

//=========================================================================================
// `CaptionGenerationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl CaptionGenerationService for OpenAiCaptionAdapter {
    fn model(&self) -> &str {
        &self.model
    }

    /// Sends the assembled prompt with the copywriter system instruction. Not retried.
    async fn generate_caption(&self, prompt: &str) -> PortResult<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(SYSTEM_INSTRUCTION)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| PortError::Unexpected(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(TEMPERATURE)
            .max_completion_tokens(MAX_OUTPUT_TOKENS)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(model = %self.model, "Requesting caption completion");
        let response = self.client.chat().create(request).await.map_err(classify)?;

        // Extract the text content from the first choice in the response.
        let caption = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                PortError::EmptyResponse("Caption LLM returned no text content.".to_string())
            })?;

        Ok(caption)
    }
}

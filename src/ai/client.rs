use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{AppError, Result};

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct ModelsResponse {
    data: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    #[serde(default)]
    pub owned_by: String,
}

/// Single-shot chat completion, one user-role message per request. The seam
/// scoring runs through; stubbed in tests.
#[allow(async_fn_in_trait)]
pub trait CompletionApi {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String>;
}

/// Client for an OpenAI-compatible completions endpoint.
pub struct ChatClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ChatClient {
    pub fn new(api_key: String, base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| {
            AppError::Config(
                "api_key is not set; set it in the config file, environment, or command line"
                    .to_string(),
            )
        })?;
        Ok(Self::new(api_key, &config.base_url))
    }

    pub async fn chat(&self, model: &str, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::Api(format!("API error: {error_text}")));
        }

        let chat_response: ChatResponse = response.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::Api("response contained no choices".to_string()))
    }

    /// List the models the provider exposes. Useful when switching providers,
    /// as not all of them name models the same way.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(AppError::Api(format!("API error: {error_text}")));
        }

        let models: ModelsResponse = response.json().await?;
        Ok(models.data)
    }
}

impl CompletionApi for ChatClient {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        self.chat(model, prompt).await
    }
}

//! HTTP client for an OpenAI-compatible chat-completions endpoint.
//!
//! The backend the chatbot proxies is Groq's completions API; any endpoint
//! with the same request/response shape works. Requests rotate across the
//! configured API keys, marking a key exhausted on 429 and retrying up to
//! `min(3, keys)` times before giving up. The rotation lock is never held
//! across an await.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::config::LlmConfig;
use crate::error::{Result, RevisorError};
use crate::llm::client::{
    ChatClient, ChatRequest, ChatResponse, LlmError, Message, Usage, VisionRequest,
};
use crate::llm::rotation::KeyRotation;

/// Cap on per-request attempts across the key rotation.
const MAX_ATTEMPTS: usize = 3;

/// Environment variables the keys are read from, in rotation order.
const KEY_ENV_VARS: &[&str] = &["GROQ_API_KEY_1", "GROQ_API_KEY_2", "GROQ_API_KEY_3"];

/// Default instruction for image turns without a user message.
const DEFAULT_VISION_PROMPT: &str =
    "Extrae TODO el texto de esta imagen y resuelve el problema paso a paso.";

/// Chat client over HTTP with API-key rotation.
pub struct HttpChatClient {
    client: reqwest::Client,
    config: LlmConfig,
    rotation: Mutex<KeyRotation>,
}

impl HttpChatClient {
    /// Create a client with explicit API keys.
    pub fn new(config: LlmConfig, keys: Vec<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| RevisorError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        let rotation = KeyRotation::new(keys, config.key_reset_hours);
        tracing::info!(keys = rotation.len(), "LLM client ready");

        Ok(Self {
            client,
            config,
            rotation: Mutex::new(rotation),
        })
    }

    /// Create a client reading `GROQ_API_KEY_1..3` from the environment.
    pub fn from_env(config: LlmConfig) -> Result<Self> {
        let keys: Vec<String> = KEY_ENV_VARS
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty())
            .collect();

        if keys.is_empty() {
            return Err(RevisorError::Config(
                "no API keys set (GROQ_API_KEY_1..3)".to_string(),
            ));
        }

        Self::new(config, keys)
    }

    fn next_key(&self) -> Option<String> {
        let mut rotation = self.rotation.lock().unwrap_or_else(|e| e.into_inner());
        rotation.current_key().map(String::from)
    }

    /// Returns true when another live key is available.
    fn mark_key_exhausted(&self) -> bool {
        let mut rotation = self.rotation.lock().unwrap_or_else(|e| e.into_inner());
        rotation.mark_exhausted()
    }

    fn attempts(&self) -> usize {
        let rotation = self.rotation.lock().unwrap_or_else(|e| e.into_inner());
        MAX_ATTEMPTS.min(rotation.len())
    }

    fn build_body(&self, model: &str, messages: &Value, temperature: f64, max_tokens: u32) -> Value {
        json!({
            "model": model,
            "messages": messages,
            "temperature": temperature,
            "max_tokens": max_tokens,
            "top_p": 0.9,
            "stream": false
        })
    }

    async fn post_completion(&self, body: &Value) -> std::result::Result<ChatResponse, LlmError> {
        let mut last_error = None;

        for _ in 0..self.attempts() {
            let Some(api_key) = self.next_key() else {
                return Err(LlmError::Api {
                    status: 503,
                    message: "No API keys available".to_string(),
                });
            };

            let response = match self
                .client
                .post(&self.config.api_url)
                .bearer_auth(&api_key)
                .json(body)
                .send()
                .await
            {
                Ok(response) => response,
                Err(e) => {
                    last_error = Some(LlmError::Http(e));
                    break;
                }
            };

            let status = response.status();
            if status.as_u16() == 429 {
                if self.mark_key_exhausted() {
                    continue;
                }
                return Err(LlmError::AllKeysExhausted);
            }

            if !status.is_success() {
                let message = response
                    .json::<Value>()
                    .await
                    .ok()
                    .and_then(|v| {
                        v["error"]["message"]
                            .as_str()
                            .map(String::from)
                    })
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
                return Err(LlmError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let data: Value = response.json().await?;
            let content = data["choices"][0]["message"]["content"]
                .as_str()
                .ok_or(LlmError::EmptyResponse)?
                .to_string();
            let usage = serde_json::from_value::<Usage>(data["usage"].clone()).ok();
            let model = data["model"].as_str().map(String::from);

            return Ok(ChatResponse {
                response: content,
                model,
                usage,
            });
        }

        Err(last_error.unwrap_or(LlmError::AllKeysExhausted))
    }
}

#[async_trait]
impl ChatClient for HttpChatClient {
    async fn chat(&self, request: ChatRequest) -> std::result::Result<ChatResponse, LlmError> {
        let mut messages = vec![Message::system(&self.config.system_prompt)];
        messages.extend(request.messages);

        let model = request.model.as_deref().unwrap_or(&self.config.model);
        let body = self.build_body(
            model,
            &serde_json::to_value(&messages).unwrap_or(Value::Null),
            request.temperature,
            request.max_tokens,
        );

        self.post_completion(&body).await
    }

    async fn vision(&self, request: VisionRequest) -> std::result::Result<ChatResponse, LlmError> {
        let prompt = request
            .user_message
            .as_deref()
            .unwrap_or(DEFAULT_VISION_PROMPT);

        let mut messages: Vec<Value> = vec![json!({
            "role": "system",
            "content": self.config.system_prompt,
        })];
        for message in &request.history {
            messages.push(serde_json::to_value(message).unwrap_or(Value::Null));
        }
        messages.push(json!({
            "role": "user",
            "content": [
                { "type": "text", "text": prompt },
                { "type": "image_url", "image_url": { "url": request.image_data } }
            ]
        }));
        let messages = Value::Array(messages);

        // vision models come and go; try the configured list in order
        let mut last_error = LlmError::Api {
            status: 503,
            message: "No vision models configured".to_string(),
        };
        for model in &self.config.vision_models {
            let body = self.build_body(model, &messages, 0.2, 2048);
            match self.post_completion(&body).await {
                Ok(response) => return Ok(response),
                Err(e) => {
                    tracing::warn!(model = %model, error = %e, "vision model failed, trying next");
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

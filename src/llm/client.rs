//! Core LLM client types and trait definitions.
//!
//! The model call is a black box behind [`ChatClient`]: one request, one
//! response, may fail. Callers must treat a failure as "skip verification" or
//! "keep the primary answer" - never as a fatal error for the chat turn.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A chat completion request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    /// Model override; the client's configured model when None.
    pub model: Option<String>,
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for ChatRequest {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            model: None,
            temperature: 0.2,
            max_tokens: 2048,
        }
    }
}

impl ChatRequest {
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// An image turn: optional instruction plus base64 image data.
#[derive(Debug, Clone)]
pub struct VisionRequest {
    pub user_message: Option<String>,
    pub image_data: String,
    pub history: Vec<Message>,
}

/// Response from the LLM
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub model: Option<String>,
    pub usage: Option<Usage>,
}

/// Token usage statistics (OpenAI-style)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Errors from LLM operations
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Todas las APIs han alcanzado su límite. Espera unas horas.")]
    AllKeysExhausted,

    #[error("Empty response from model")]
    EmptyResponse,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Stateless LLM client - each call is an independent request/response
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Single chat completion (blocking until complete)
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, LlmError>;

    /// Image understanding turn. Not every backend supports it.
    async fn vision(&self, request: VisionRequest) -> Result<ChatResponse, LlmError> {
        let _ = request;
        Err(LlmError::Unsupported("vision".to_string()))
    }
}

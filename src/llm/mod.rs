//! LLM collaborator: client trait, wire types, key rotation and the HTTP
//! implementation against an OpenAI-compatible chat-completions endpoint.

pub mod client;
pub mod http;
pub mod rotation;

pub use client::{ChatClient, ChatRequest, ChatResponse, LlmError, Message, Role, Usage, VisionRequest};
pub use http::HttpChatClient;
pub use rotation::KeyRotation;

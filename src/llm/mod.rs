//! LLM Client Layer - Anthropic API integration
//!
//! This module provides:
//! - Message types for LLM communication
//! - LlmClient trait for API abstraction
//! - AnthropicClient implementation
//! - MockLlmClient for tests and offline runs

pub mod anthropic;
pub mod client;
pub mod types;

pub use anthropic::{AnthropicClient, AnthropicConfig, DEFAULT_API_KEY_ENV};
pub use client::{LlmClient, MockLlmClient};
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, Usage};

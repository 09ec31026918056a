//! LLM-backed document improver.

use std::sync::Arc;

use async_trait::async_trait;
use log::debug;
use serde::Serialize;

use super::parse::parse_improvement;
use super::traits::{Improver, SessionToken};
use crate::document::Document;
use crate::error::{AutodocError, Result};
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompt::{PromptLoader, PromptRenderer, templates};

#[derive(Serialize)]
struct ImproverContext<'a> {
    content: &'a str,
    feedback: &'a str,
}

/// Rewrites documents by asking an LLM to apply evaluator feedback
pub struct LlmImprover {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    renderer: PromptRenderer,
    max_tokens: Option<u32>,
}

impl LlmImprover {
    pub fn new(client: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>) -> Self {
        Self {
            client,
            prompts,
            renderer: PromptRenderer::new(),
            max_tokens: None,
        }
    }

    /// Override the client's max tokens for the rewritten document
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    fn build_request(
        &self,
        document: &Document,
        feedback: &str,
        session: Option<&SessionToken>,
    ) -> Result<CompletionRequest> {
        let template = self.prompts.load(templates::IMPROVER)?;
        let prompt = self.renderer.render(
            &template,
            &ImproverContext {
                content: &document.content,
                feedback,
            },
        )?;

        let mut request = CompletionRequest::new(templates::IMPROVER_SYSTEM)
            .with_user_message(prompt)
            .with_user_id(session.map(SessionToken::as_str));
        request.max_tokens = self.max_tokens;
        Ok(request)
    }
}

#[async_trait]
impl Improver for LlmImprover {
    async fn improve(&self, document: &Document, feedback: &str, session: Option<&SessionToken>) -> Result<String> {
        let request = self.build_request(document, feedback, session)?;

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| AutodocError::Improvement(e.to_string()))?;

        // A cut-off rewrite would silently drop the end of the document
        if response.stop_reason.is_truncated() {
            return Err(AutodocError::Improvement(format!(
                "improved '{}' was truncated at max_tokens",
                document.id
            )));
        }

        let improved = parse_improvement(&response.content)?;
        debug!(
            "Improved '{}': {} -> {} bytes",
            document.id,
            document.content.len(),
            improved.len()
        );
        Ok(improved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{CompletionResponse, MockLlmClient, StopReason};

    fn improver(mock: Arc<MockLlmClient>) -> LlmImprover {
        LlmImprover::new(mock, Arc::new(PromptLoader::builtin()))
    }

    #[tokio::test]
    async fn test_improve_returns_text() {
        let mock = Arc::new(MockLlmClient::with_texts(["# Readme\n\nA clear overview."]));
        let text = improver(mock)
            .improve(&Document::new("readme", "readme stuff"), "Add an overview", None)
            .await
            .unwrap();
        assert_eq!(text, "# Readme\n\nA clear overview.");
    }

    #[tokio::test]
    async fn test_prompt_contains_document_and_feedback() {
        let mock = Arc::new(MockLlmClient::with_texts(["better"]));
        improver(mock.clone())
            .with_max_tokens(4096)
            .improve(&Document::new("a", "original words"), "use headings", None)
            .await
            .unwrap();

        let request = &mock.requests()[0];
        assert_eq!(request.system, templates::IMPROVER_SYSTEM);
        assert!(request.messages[0].content.contains("original words"));
        assert!(request.messages[0].content.contains("use headings"));
        assert_eq!(request.max_tokens, Some(4096));
    }

    #[tokio::test]
    async fn test_backend_failure_is_improvement_error() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push(Err(AutodocError::Llm("503".to_string())));

        let result = improver(mock).improve(&Document::new("a", "b"), "f", None).await;
        assert!(matches!(result, Err(AutodocError::Improvement(_))));
    }

    #[tokio::test]
    async fn test_empty_output_is_improvement_error() {
        let mock = Arc::new(MockLlmClient::with_texts(["  "]));
        let result = improver(mock).improve(&Document::new("a", "b"), "f", None).await;
        assert!(matches!(result, Err(AutodocError::Improvement(_))));
    }

    #[tokio::test]
    async fn test_truncated_output_is_improvement_error() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push(Ok(CompletionResponse {
            content: "# Half a docu".to_string(),
            stop_reason: StopReason::MaxTokens,
            ..Default::default()
        }));

        let result = improver(mock).improve(&Document::new("a", "b"), "f", None).await;
        assert!(matches!(result, Err(AutodocError::Improvement(_))));
    }
}

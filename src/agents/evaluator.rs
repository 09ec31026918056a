//! LLM-backed document evaluator.

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use serde::Serialize;

use super::parse::parse_evaluation;
use super::traits::{Evaluation, Evaluator, SessionToken};
use crate::document::Document;
use crate::error::{AutodocError, Result};
use crate::improve::ScoreScale;
use crate::llm::{CompletionRequest, LlmClient};
use crate::prompt::{PromptLoader, PromptRenderer, templates};

/// Evaluator answers are short; the document is in the prompt, not the reply
const DEFAULT_EVALUATOR_MAX_TOKENS: u32 = 2048;

#[derive(Serialize)]
struct EvaluatorContext<'a> {
    content: &'a str,
    scale_min: &'a str,
    scale_max: &'a str,
}

/// Scores documents by asking an LLM for a `Score:`/`Feedback:` answer
pub struct LlmEvaluator {
    client: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    renderer: PromptRenderer,
    scale: ScoreScale,
    max_tokens: u32,
}

impl LlmEvaluator {
    pub fn new(client: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, scale: ScoreScale) -> Self {
        Self {
            client,
            prompts,
            renderer: PromptRenderer::new(),
            scale,
            max_tokens: DEFAULT_EVALUATOR_MAX_TOKENS,
        }
    }

    /// Set max tokens for the evaluator's reply
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn build_request(&self, document: &Document, session: Option<&SessionToken>) -> Result<CompletionRequest> {
        let template = self.prompts.load(templates::EVALUATOR)?;
        let (scale_min, scale_max) = self.scale.bounds_label();
        let prompt = self.renderer.render(
            &template,
            &EvaluatorContext {
                content: &document.content,
                scale_min,
                scale_max,
            },
        )?;

        Ok(CompletionRequest::new(templates::EVALUATOR_SYSTEM)
            .with_user_message(prompt)
            .with_max_tokens(self.max_tokens)
            .with_user_id(session.map(SessionToken::as_str)))
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    async fn evaluate(&self, document: &Document, session: Option<&SessionToken>) -> Result<Evaluation> {
        let request = self.build_request(document, session)?;

        let response = self
            .client
            .complete(request)
            .await
            .map_err(|e| AutodocError::Evaluation(e.to_string()))?;

        if response.stop_reason.is_truncated() {
            warn!("Evaluator response for '{}' hit max_tokens", document.id);
        }

        let evaluation = parse_evaluation(&response.content, self.scale)?;

        if !self.scale.contains(evaluation.score) {
            return Err(AutodocError::Evaluation(format!(
                "score {} is outside the {} scale",
                evaluation.score, self.scale
            )));
        }

        debug!(
            "Evaluated '{}': score={} feedback_len={}",
            document.id,
            evaluation.score,
            evaluation.feedback.len()
        );
        Ok(evaluation)
    }
}

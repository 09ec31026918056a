//! Built-in prompt templates
//!
//! Used when no template directory is configured or a template is missing
//! from it. A file `<name>.md` in the configured directory overrides these.

/// Name of the evaluator template
pub const EVALUATOR: &str = "evaluator";

/// Name of the improver template
pub const IMPROVER: &str = "improver";

/// System prompt for the evaluator agent
pub const EVALUATOR_SYSTEM: &str = "You are an expert technical writer with years of experience evaluating \
documentation quality. You evaluate document clarity and provide constructive feedback.";

/// System prompt for the improver agent
pub const IMPROVER_SYSTEM: &str = "You are a senior technical writer who specializes in improving \
documentation. You transform documents into clear, comprehensive, and well-structured content.";

const EVALUATOR_TEMPLATE: &str = r#"Evaluate the following document for clarity, completeness, and coherence.
Score it on a scale from {{scale_min}} to {{scale_max}} where {{scale_max}} is perfect.
Provide specific, actionable feedback for improvement.

Document:
{{content}}

Your response must be in this format:
Score: <score between {{scale_min}} and {{scale_max}}>
Feedback: <detailed feedback>"#;

const IMPROVER_TEMPLATE: &str = r#"Improve the following document based on the provided feedback.
Make the document more clear, complete, and coherent.

Original Document:
{{content}}

Feedback:
{{feedback}}

Provide only the improved document as your response, without any additional commentary."#;

/// Look up a built-in template by name
pub fn builtin(name: &str) -> Option<&'static str> {
    match name {
        EVALUATOR => Some(EVALUATOR_TEMPLATE),
        IMPROVER => Some(IMPROVER_TEMPLATE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        assert!(builtin(EVALUATOR).unwrap().contains("{{content}}"));
        assert!(builtin(IMPROVER).unwrap().contains("{{feedback}}"));
        assert!(builtin("nope").is_none());
    }

    #[test]
    fn test_evaluator_template_states_format() {
        let template = builtin(EVALUATOR).unwrap();
        assert!(template.contains("Score:"));
        assert!(template.contains("Feedback:"));
    }
}

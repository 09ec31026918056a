//! Parsing of raw agent responses.

use serde_json::Value;

use super::traits::Evaluation;
use crate::error::{AutodocError, Result};
use crate::improve::ScoreScale;

/// Parse an evaluator response.
///
/// The expected shape is
///
/// ```text
/// Score: <number>
/// Feedback: <text>
/// <more feedback lines>
/// ```
///
/// A JSON object with `score` and `feedback` keys is accepted as well.
/// Fractions (`8/10`) and percentages (`80%`) are converted onto `scale`.
pub fn parse_evaluation(response: &str, scale: ScoreScale) -> Result<Evaluation> {
    if let Some(eval) = parse_labelled(response, scale)? {
        return Ok(eval);
    }

    if let Some(eval) = parse_json(response)? {
        return Ok(eval);
    }

    Err(AutodocError::Evaluation(format!(
        "no score found in response: {}",
        truncate_for_error(response.trim(), 100)
    )))
}

fn parse_labelled(response: &str, scale: ScoreScale) -> Result<Option<Evaluation>> {
    let mut score = None;
    let mut feedback_lines: Vec<&str> = Vec::new();
    let mut in_feedback = false;

    for line in response.lines() {
        let trimmed = strip_leading_markup(line.trim());
        if let Some(rest) = strip_label(trimmed, "score") {
            score = Some(parse_score(rest, scale)?);
            in_feedback = false;
        } else if let Some(rest) = strip_label(trimmed, "feedback") {
            feedback_lines.push(rest.trim());
            in_feedback = true;
        } else if in_feedback {
            feedback_lines.push(line.trim());
        }
    }

    Ok(score.map(|score| Evaluation::new(score, feedback_lines.join("\n").trim())))
}

fn parse_json(response: &str) -> Result<Option<Evaluation>> {
    let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) else {
        return Ok(None);
    };
    if end < start {
        return Ok(None);
    }

    let Ok(value) = serde_json::from_str::<Value>(&response[start..=end]) else {
        return Ok(None);
    };

    let Some(score) = value.get("score") else {
        return Ok(None);
    };
    let score = match score {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| AutodocError::Evaluation(format!("score is not a number: {}", score)))?;

    let feedback = value
        .get("feedback")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .trim()
        .to_string();

    Ok(Some(Evaluation::new(check_finite(score)?, feedback)))
}

/// Parse the value after `Score:`; accepts `0.8`, `85`, `85/100`, `85%`
fn parse_score(raw: &str, scale: ScoreScale) -> Result<f64> {
    let invalid = || AutodocError::Evaluation(format!("invalid score value: '{}'", raw.trim()));
    let parse_number = |s: &str| s.trim_end_matches([',', '.']).parse::<f64>().map_err(|_| invalid());

    let token = raw.split_whitespace().next().unwrap_or("");
    let token = token.trim_end_matches([',', '.']);

    let score = if let Some((numerator, denominator)) = token.split_once('/') {
        let denominator = parse_number(denominator)?;
        if !denominator.is_finite() || denominator <= 0.0 {
            return Err(invalid());
        }
        parse_number(numerator)? * scale.max() / denominator
    } else if let Some(percent) = token.strip_suffix('%') {
        parse_number(percent)? * scale.max() / 100.0
    } else {
        parse_number(token)?
    };

    check_finite(score)
}

fn check_finite(score: f64) -> Result<f64> {
    if score.is_finite() {
        Ok(score)
    } else {
        Err(AutodocError::Evaluation(format!("score is not finite: {}", score)))
    }
}

/// Strip a case-insensitive `label:` prefix
fn strip_label<'a>(line: &'a str, label: &str) -> Option<&'a str> {
    let head = line.get(..label.len())?;
    if !head.eq_ignore_ascii_case(label) {
        return None;
    }
    let rest = line[label.len()..].trim_start_matches('*');
    rest.strip_prefix(':').map(strip_leading_markup)
}

/// Drop leading Markdown emphasis and heading markers
fn strip_leading_markup(s: &str) -> &str {
    s.trim_start_matches(|c: char| c == '*' || c == '_' || c == '#' || c.is_whitespace())
}

/// Clean an improver response into document text.
///
/// A single Markdown code fence wrapping the whole answer is removed.
pub fn parse_improvement(response: &str) -> Result<String> {
    let trimmed = response.trim();
    let text = unwrap_fence(trimmed).unwrap_or(trimmed).trim();

    if text.is_empty() {
        return Err(AutodocError::Improvement("improver returned empty text".to_string()));
    }

    Ok(text.to_string())
}

fn unwrap_fence(text: &str) -> Option<&str> {
    let body = text.strip_prefix("```")?.strip_suffix("```")?;
    // Drop the info string (e.g. "markdown") on the opening line
    let (_, rest) = body.split_once('\n')?;
    if rest.contains("\n```") {
        return None;
    }
    Some(rest)
}

fn truncate_for_error(text: &str, max_len: usize) -> String {
    match text.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

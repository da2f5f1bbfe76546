//! Ollama chat client: model availability check, issue classification, and
//! bug-analysis generation.
//!
//! Classification runs first and decides whether the expensive retrieval and
//! analysis steps happen at all. Both calls go through the same `/api/chat`
//! endpoint with `stream: false`.

use anyhow::{bail, Result};
use std::time::Duration;

use crate::config::LlmConfig;
use crate::github::IssueDetails;
use crate::models::FileContext;

const SYSTEM_PROMPT: &str = "You are an expert software engineer specializing in bug detection and resolution. \
Analyze the provided GitHub issue and relevant code snippets to find the root cause and generate a complete fix. \
Be concise, accurate, and provide code in the requested formats. \
Provide your response *only* in the structured format requested.";

const CLASSIFICATION_SYSTEM_PROMPT: &str = "You are an issue classifier. Your job is to read a GitHub issue and classify it into one of four categories: 'BUG', 'FEATURE', 'QUESTION', 'ANNOUNCEMENT'. \
Respond *only* with the single category name in JSON format. \
Example: {\"type\": \"BUG\"}";

/// Check whether the configured chat model is available locally.
pub async fn check_model(config: &LlmConfig) -> Result<bool> {
    let client = build_client(config)?;
    let response = client
        .get(format!("{}/api/tags", config.url))
        .send()
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Ollama connection error (is Ollama running at {}?): {}",
                config.url,
                e
            )
        })?;

    if !response.status().is_success() {
        bail!("Ollama API error {} from /api/tags", response.status());
    }

    let json: serde_json::Value = response.json().await?;
    let models = json
        .get("models")
        .and_then(|m| m.as_array())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing models array"))?;

    let found = models.iter().any(|m| {
        m.get("name")
            .or_else(|| m.get("model"))
            .and_then(|n| n.as_str())
            .map(|n| n.starts_with(&config.model))
            .unwrap_or(false)
    });

    Ok(found)
}

/// Classify an issue as BUG, FEATURE, QUESTION, or ANNOUNCEMENT.
///
/// A well-formed response without a `type` key degrades to `UNKNOWN` rather
/// than failing the run.
pub async fn classify_issue(config: &LlmConfig, issue: &IssueDetails) -> Result<String> {
    let issue_text = format!("Title: {}\n\nBody: {}", issue.title, issue.body);
    let content = chat(config, CLASSIFICATION_SYSTEM_PROMPT, &issue_text, true).await?;
    Ok(parse_classification(&content))
}

fn parse_classification(content: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(content) {
        Ok(json) => match json.get("type").and_then(|t| t.as_str()) {
            Some(kind) => kind.to_uppercase(),
            None => {
                eprintln!("Warning: classification response missing 'type' key");
                "UNKNOWN".to_string()
            }
        },
        Err(e) => {
            eprintln!("Warning: classification response was not JSON: {}", e);
            "UNKNOWN".to_string()
        }
    }
}

/// Generate the full bug analysis for a classified bug.
pub async fn generate_analysis(
    config: &LlmConfig,
    issue: &IssueDetails,
    contexts: &[FileContext],
) -> Result<String> {
    let user_prompt = build_analysis_prompt(issue, contexts);
    let content = chat(config, SYSTEM_PROMPT, &user_prompt, false).await?;
    Ok(extract_analysis_block(&content).to_string())
}

fn build_analysis_prompt(issue: &IssueDetails, contexts: &[FileContext]) -> String {
    let file_context = if contexts.is_empty() {
        "No relevant code snippets found.".to_string()
    } else {
        contexts
            .iter()
            .map(|c| {
                format!(
                    "--- START FILE: {path} ---\n```\n{content}\n```\n--- END FILE: {path} ---",
                    path = c.path,
                    content = c.merged_text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let comments = if issue.comments.is_empty() {
        "No comments.".to_string()
    } else {
        issue
            .comments
            .iter()
            .map(|c| format!("- {}: {}", c.user, c.body))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"**GitHub Issue Analysis Task**

**1. Issue Details:**
* **Title:** {title}
* **Description:** {body}
* **Comments:** {comments}

**2. Relevant Code Context:**
{file_context}

**3. Your Task:**
Provide a comprehensive bug analysis and solution for the issue described above.
Use the provided code context to find the root cause and generate a fix.

<ANALYSIS>
**1. Root Cause Analysis:**
(Explain *why* the bug is happening, based *only* on the issue description and code context.)

**2. Step-by-Step Reproduction:**
(Provide a clear, numbered list of steps to reproduce the *specific bug* described in the issue.)

**3. Affected Code Paths:**
(List the specific files and functions from the context that are *directly related* to the reported bug.)

**4. Complete Fix (Patch):**
(Provide the fix as a git diff in the unified format. Use ```diff ... ```. If this is not possible, provide the complete new function.)

**5. Test Cases to Prevent Regression:**
(Provide test cases that *specifically* validate the fix for the reported bug.)

**6. Potential Side Effects:**
(List any potential risks or areas to double-check after implementing this fix.)
</ANALYSIS>"#,
        title = issue.title,
        body = issue.body,
        comments = comments,
        file_context = file_context,
    )
}

/// Pull the `<ANALYSIS>` block out of a response, falling back to the whole
/// text when the model ignored the structure.
fn extract_analysis_block(text: &str) -> &str {
    const START_TAG: &str = "<ANALYSIS>";
    const END_TAG: &str = "</ANALYSIS>";

    match (text.find(START_TAG), text.rfind(END_TAG)) {
        (Some(start), Some(end)) if start + START_TAG.len() <= end => {
            text[start + START_TAG.len()..end].trim()
        }
        _ => {
            eprintln!("Warning: LLM did not return the expected <ANALYSIS> structure.");
            text.trim()
        }
    }
}

async fn chat(
    config: &LlmConfig,
    system_prompt: &str,
    user_prompt: &str,
    json_format: bool,
) -> Result<String> {
    let client = build_client(config)?;

    let mut body = serde_json::json!({
        "model": config.model,
        "stream": false,
        "messages": [
            { "role": "system", "content": system_prompt },
            { "role": "user", "content": user_prompt },
        ],
    });
    if json_format {
        body["format"] = serde_json::json!("json");
    }

    let response = client
        .post(format!("{}/api/chat", config.url))
        .json(&body)
        .send()
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Ollama connection error (is Ollama running at {}?): {}",
                config.url,
                e
            )
        })?;

    let status = response.status();
    if !status.is_success() {
        let body_text = response.text().await.unwrap_or_default();
        bail!("Ollama API error {}: {}", status, body_text);
    }

    let json: serde_json::Value = response.json().await?;
    json.get("message")
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing message content"))
}

fn build_client(config: &LlmConfig) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::IssueComment;

    fn sample_issue() -> IssueDetails {
        IssueDetails {
            number: 42,
            title: "Crash on empty input".to_string(),
            body: "Passing an empty string panics.".to_string(),
            url: "https://github.com/a/b/issues/42".to_string(),
            comments: vec![IssueComment {
                user: "alice".to_string(),
                body: "Repros on main.".to_string(),
            }],
        }
    }

    #[test]
    fn test_parse_classification_valid() {
        assert_eq!(parse_classification(r#"{"type": "bug"}"#), "BUG");
        assert_eq!(parse_classification(r#"{"type": "FEATURE"}"#), "FEATURE");
    }

    #[test]
    fn test_parse_classification_missing_key() {
        assert_eq!(parse_classification(r#"{"kind": "BUG"}"#), "UNKNOWN");
    }

    #[test]
    fn test_parse_classification_not_json() {
        assert_eq!(parse_classification("BUG"), "UNKNOWN");
    }

    #[test]
    fn test_analysis_prompt_includes_context_blocks() {
        let contexts = vec![FileContext {
            path: "src/parser.rs".to_string(),
            merged_text: "fn parse() {}\n...\nfn lex() {}".to_string(),
        }];
        let prompt = build_analysis_prompt(&sample_issue(), &contexts);
        assert!(prompt.contains("Crash on empty input"));
        assert!(prompt.contains("- alice: Repros on main."));
        assert!(prompt.contains("--- START FILE: src/parser.rs ---"));
        assert!(prompt.contains("--- END FILE: src/parser.rs ---"));
        assert!(prompt.contains("<ANALYSIS>"));
    }

    #[test]
    fn test_analysis_prompt_without_context() {
        let prompt = build_analysis_prompt(&sample_issue(), &[]);
        assert!(prompt.contains("No relevant code snippets found."));
    }

    #[test]
    fn test_extract_analysis_block() {
        let text = "preamble <ANALYSIS>\nthe analysis\n</ANALYSIS> trailer";
        assert_eq!(extract_analysis_block(text), "the analysis");
    }

    #[test]
    fn test_extract_analysis_block_missing_tags() {
        assert_eq!(extract_analysis_block("  raw response  "), "raw response");
    }
}

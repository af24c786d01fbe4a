//! Completion-request client: turns `(title, intro_excerpt)` into a
//! structured post via an OpenAI-compatible chat-completions endpoint.
//!
//! The contract is a single request/response pair: prompt in, parsed JSON
//! payload or a typed failure out. Retry and pacing belong to the caller.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com/v1";
pub const DEFAULT_MODEL: &str = "deepseek-chat";

const TEMPERATURE: f32 = 0.8;
const MAX_TOKENS: u32 = 1500;

const SYSTEM_PROMPT: &str =
    "You create fascinating social media posts from Wikipedia articles. \
     Make them engaging and surprising.";

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("completion request failed")]
    Http(#[from] reqwest::Error),

    #[error("completion API returned {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("completion response contained no choices")]
    EmptyResponse,

    #[error("completion payload is not the expected JSON shape")]
    Parse(#[from] serde_json::Error),
}

/// Structured content payload produced by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedPost {
    pub title: String,
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub tldr: String,
}

fn default_category() -> String {
    "Science".to_string()
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

pub struct CompletionClient {
    http: reqwest::Client,
    config: CompletionConfig,
}

impl CompletionClient {
    pub fn new(config: CompletionConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    pub async fn generate_post(
        &self,
        article_title: &str,
        intro_excerpt: &str,
    ) -> Result<GeneratedPost, GenerateError> {
        let user_prompt = build_user_prompt(article_title, intro_excerpt);
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let url = format!("{}/chat/completions", self.config.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerateError::Api { status, body });
        }

        let chat: ChatResponse = response.json().await?;
        let content = chat
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(GenerateError::EmptyResponse)?;

        debug!(chars = content.len(), "Parsing completion payload");
        parse_post(&content)
    }
}

fn build_user_prompt(article_title: &str, intro_excerpt: &str) -> String {
    format!(
        "Wikipedia Article: {article_title}\n\n\
         Content: {intro_excerpt}\n\n\
         Create an engaging social media post. Make it FASCINATING with surprising facts.\n\n\
         Return JSON only:\n\
         {{\n\
         \x20   \"title\": \"Hook title (10-15 words)\",\n\
         \x20   \"content\": \"2-4 engaging paragraphs\",\n\
         \x20   \"category\": \"History/Science/Nature/Technology\",\n\
         \x20   \"tags\": [\"tag1\", \"tag2\", \"tag3\"],\n\
         \x20   \"tldr\": \"One sentence summary\"\n\
         }}"
    )
}

/// Models wrap JSON in markdown fences more often than not; strip them
/// before parsing.
fn parse_post(content: &str) -> Result<GeneratedPost, GenerateError> {
    let stripped = strip_code_fences(content.trim());
    Ok(serde_json::from_str(stripped)?)
}

fn strip_code_fences(content: &str) -> &str {
    let Some(rest) = content.strip_prefix("```") else {
        return content;
    };
    // Drop an optional language tag on the fence line.
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start_matches(['\r', '\n']);
    match rest.find("```") {
        Some(end) => rest[..end].trim(),
        None => rest.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{"title": "T", "content": "C", "category": "History", "tags": ["a"], "tldr": "S"}"#;

    #[test]
    fn parse_plain_json() {
        let post = parse_post(PAYLOAD).unwrap();
        assert_eq!(post.title, "T");
        assert_eq!(post.category, "History");
        assert_eq!(post.tags, vec!["a"]);
    }

    #[test]
    fn parse_fenced_json() {
        let fenced = format!("```json\n{}\n```", PAYLOAD);
        let post = parse_post(&fenced).unwrap();
        assert_eq!(post.title, "T");
    }

    #[test]
    fn parse_fenced_without_language_tag() {
        let fenced = format!("```\n{}\n```", PAYLOAD);
        let post = parse_post(&fenced).unwrap();
        assert_eq!(post.content, "C");
    }

    #[test]
    fn parse_fenced_without_closing_fence() {
        let fenced = format!("```json\n{}", PAYLOAD);
        let post = parse_post(&fenced).unwrap();
        assert_eq!(post.tldr, "S");
    }

    #[test]
    fn missing_optional_fields_get_defaults() {
        let post = parse_post(r#"{"title": "T", "content": "C"}"#).unwrap();
        assert_eq!(post.category, "Science");
        assert!(post.tags.is_empty());
        assert!(post.tldr.is_empty());
    }

    #[test]
    fn missing_required_field_is_parse_error() {
        let err = parse_post(r#"{"title": "T"}"#).unwrap_err();
        assert!(matches!(err, GenerateError::Parse(_)));
    }

    #[test]
    fn non_json_chatter_is_parse_error() {
        assert!(parse_post("Sure! Here's your post:").is_err());
    }

    #[test]
    fn prompt_carries_title_and_intro() {
        let prompt = build_user_prompt("Octopus", "The octopus is a mollusc.");
        assert!(prompt.contains("Wikipedia Article: Octopus"));
        assert!(prompt.contains("The octopus is a mollusc."));
        assert!(prompt.contains("Return JSON only"));
    }
}

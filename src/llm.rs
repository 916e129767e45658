//! Generative-model capability: "given a prompt, return text".
//!
//! [`Generator`] is the seam every prompt goes through. Two wire formats are
//! supported:
//! - **[`ChatCompletionsGenerator`]**: OpenAI-compatible `/chat/completions`
//!   (Groq and OpenAI).
//! - **[`OllamaGenerator`]**: Ollama's `/api/chat` with streaming disabled.
//!
//! Calls are single-turn: the filled prompt is sent as one user message and
//! the first choice's text is returned verbatim.

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::LlmConfig;
use crate::http;

#[async_trait]
pub trait Generator: Send + Sync {
    fn model_name(&self) -> &str;

    /// Submit a prompt and return the model's raw text response.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Client for OpenAI-compatible chat-completions endpoints.
pub struct ChatCompletionsGenerator {
    label: &'static str,
    model: String,
    url: String,
    api_key: String,
    temperature: f32,
    max_retries: u32,
    client: reqwest::Client,
}

impl ChatCompletionsGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let (label, default_base, default_key_env) = match config.provider.as_str() {
            "groq" => ("Groq", "https://api.groq.com/openai/v1", "GROQ_API_KEY"),
            "openai" => ("OpenAI", "https://api.openai.com/v1", "OPENAI_API_KEY"),
            other => bail!("'{}' is not a chat-completions provider", other),
        };
        let key_env = config.api_key_env.as_deref().unwrap_or(default_key_env);
        let api_key = std::env::var(key_env)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| anyhow::anyhow!("{} environment variable not set", key_env))?;
        let base = config.url.as_deref().unwrap_or(default_base);

        Ok(Self {
            label,
            model: config.model.clone(),
            url: format!("{}/chat/completions", base.trim_end_matches('/')),
            api_key,
            temperature: config.temperature,
            max_retries: config.max_retries,
            client: http::client_with_timeout(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl Generator for ChatCompletionsGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "messages": [{"role": "user", "content": prompt}],
        });
        let json = http::post_json(
            &self.client,
            &self.url,
            Some(&self.api_key),
            &body,
            self.max_retries,
            self.label,
        )
        .await?;
        parse_chat_completion(&json)
    }
}

fn parse_chat_completion(json: &serde_json::Value) -> Result<String> {
    json.pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| anyhow::anyhow!("Invalid chat completion response: missing choices[0].message.content"))
}

/// Client for a local Ollama instance.
pub struct OllamaGenerator {
    model: String,
    url: String,
    temperature: f32,
    max_retries: u32,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let base = config.url.as_deref().unwrap_or("http://localhost:11434");
        Ok(Self {
            model: config.model.clone(),
            url: format!("{}/api/chat", base.trim_end_matches('/')),
            temperature: config.temperature,
            max_retries: config.max_retries,
            client: http::client_with_timeout(config.timeout_secs)?,
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "stream": false,
            "options": {"temperature": self.temperature},
            "messages": [{"role": "user", "content": prompt}],
        });
        let json = http::post_json(
            &self.client,
            &self.url,
            None,
            &body,
            self.max_retries,
            "Ollama",
        )
        .await?;
        json.pointer("/message/content")
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing message.content"))
    }
}

/// Create the [`Generator`] named by `config.provider`.
pub fn create_generator(config: &LlmConfig) -> Result<Box<dyn Generator>> {
    match config.provider.as_str() {
        "groq" | "openai" => Ok(Box::new(ChatCompletionsGenerator::new(config)?)),
        "ollama" => Ok(Box::new(OllamaGenerator::new(config)?)),
        other => bail!("Unknown llm provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_choice() {
        let json = serde_json::json!({
            "choices": [
                {"message": {"role": "assistant", "content": "Purpose: parses things."}},
                {"message": {"role": "assistant", "content": "ignored"}}
            ]
        });
        assert_eq!(parse_chat_completion(&json).unwrap(), "Purpose: parses things.");
    }

    #[test]
    fn missing_choices_is_an_error() {
        assert!(parse_chat_completion(&serde_json::json!({"choices": []})).is_err());
    }

    #[test]
    fn missing_api_key_fails_construction() {
        let config = LlmConfig {
            provider: "groq".to_string(),
            api_key_env: Some("FDOC_TEST_KEY_THAT_IS_NEVER_SET".to_string()),
            ..LlmConfig::default()
        };
        let err = create_generator(&config).err().unwrap();
        assert!(err.to_string().contains("FDOC_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn ollama_builds_without_key() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            model: "llama3".to_string(),
            ..LlmConfig::default()
        };
        let generator = create_generator(&config).unwrap();
        assert_eq!(generator.model_name(), "llama3");
    }
}

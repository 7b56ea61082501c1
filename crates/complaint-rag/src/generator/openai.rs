use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use complaint_core::config::{GenerationConfig, GenerationSettings};
use complaint_core::traits::Generator;
use complaint_core::types::Prompt;

/// Chat-completions client for any OpenAI-compatible server
/// (llama.cpp server, LM Studio, vLLM, Ollama).
pub struct OpenAiCompatGenerator {
    client: reqwest::Client,
    url: String,
    model: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatGenerator {
    pub fn new(settings: &GenerationSettings) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(settings.timeout()).build()?;
        Ok(Self {
            client,
            url: chat_url(&settings.base_url),
            model: settings.model.clone(),
            name: format!("openai-compat:{}", settings.model),
        })
    }

    pub fn url(&self) -> &str { &self.url }
}

fn chat_url(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1") { format!("{base}/chat/completions") } else { format!("{base}/v1/chat/completions") }
}

#[async_trait]
impl Generator for OpenAiCompatGenerator {
    fn name(&self) -> &str { &self.name }

    async fn generate(&self, prompt: &Prompt, config: &GenerationConfig) -> Result<String> {
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt.render() }],
            "max_tokens": config.max_tokens,
            "temperature": config.temperature,
            "top_p": config.top_p,
            "stream": false,
        });
        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| anyhow!("{} connection failed ({}): {}", self.name, self.url, e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!("{} API error {}: {}", self.name, status, text);
        }

        let parsed: ChatResponse = resp.json().await.map_err(|e| anyhow!("{} returned a malformed response: {}", self.name, e))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("{} returned no choices", self.name))?;
        let answer = content.trim();
        if answer.is_empty() { bail!("{} returned an empty completion", self.name); }
        Ok(answer.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_url_appends_v1_once() {
        assert_eq!(chat_url("http://127.0.0.1:8080"), "http://127.0.0.1:8080/v1/chat/completions");
        assert_eq!(chat_url("http://localhost:1234/v1/"), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn parses_first_choice() {
        let raw = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":" Duplicate charge. "}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some(" Duplicate charge. "));
    }
}

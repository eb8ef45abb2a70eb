use crate::book::ChatConfig;
use crate::prompts::{
    self, initial_prompt, is_personalization_directive, scene_selection_prompt, SceneChoice,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Provider token ceiling for one chapter. Longer replies are truncated by
/// the provider; truncation is not detected here.
const MAX_COMPLETION_TOKENS: u32 = 2048;

pub const AUTHOR_PERSONA: &str =
    "You are a warm, imaginative children's book author who explains economics \
     through story. You invent vivid, age-appropriate scenes.";

pub const EDITOR_PERSONA: &str =
    "You are a precise editor. You revise text exactly as instructed, preserving \
     the original narrative and lessons, and change nothing else.";

const SCENE_PERSONA: &str =
    "You pick illustration-worthy moments from children's stories and describe \
     them for an image generator. Follow the requested reply format exactly.";

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct ChatReply {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

#[async_trait]
pub trait ChatClient: Send + Sync + Debug {
    async fn chat(&self, system: &str, user: &str) -> Result<ChatReply>;
}

/// Explicitly constructed and passed around; no module-global client.
pub fn create_chat_client(api_key: &str, config: &ChatConfig) -> Box<dyn ChatClient> {
    Box::new(OpenAiChatClient::new(api_key, config, None))
}

// --- OpenAI chat completions ---

#[derive(Debug)]
pub struct OpenAiChatClient {
    api_key: String,
    base_url: String,
    config: ChatConfig,
    client: reqwest::Client,
}

impl OpenAiChatClient {
    pub fn new(api_key: &str, config: &ChatConfig, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            base_url: base_url
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            config: config.clone(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    top_p: f32,
    frequency_penalty: f32,
    presence_penalty: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<TokenUsage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[async_trait]
impl ChatClient for OpenAiChatClient {
    async fn chat(&self, system: &str, user: &str) -> Result<ChatReply> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage { role: "system".to_string(), content: system.to_string() },
                ChatMessage { role: "user".to_string(), content: user.to_string() },
            ],
            temperature: self.config.temperature,
            top_p: self.config.top_p,
            frequency_penalty: self.config.frequency_penalty,
            presence_penalty: self.config.presence_penalty,
            max_tokens: MAX_COMPLETION_TOKENS,
        };

        debug!(
            "chat request: model={} temp={} system={} bytes, user={} bytes",
            self.config.model,
            self.config.temperature,
            system.len(),
            user.len()
        );

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            error!("chat request failed ({}): {}", status, error_text);
            return Err(anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let result: ChatResponse = resp.json().await?;

        if let Some(choice) = result.choices.first() {
            if let Some(content) = &choice.message.content {
                debug!("chat reply: {} bytes", content.len());
                return Ok(ChatReply {
                    text: content.clone(),
                    usage: result.usage,
                });
            }
        }

        Err(anyhow!("OpenAI response empty or missing content"))
    }
}

// --- Chapter generation ---

#[derive(Debug, Clone)]
pub struct GeneratedChapter {
    pub text: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

/// Two modes behind one call. When `prompt_or_context` already reads as a
/// personalization directive it is sent as-is under the editor persona;
/// otherwise a fresh initial prompt is built from the topic, subtopics and
/// the protagonist's name and age under the author persona. Single attempt,
/// no retry; a failed call changes nothing.
pub async fn generate_chapter(
    llm: &dyn ChatClient,
    topic: &str,
    subtopics: &[&str],
    protagonist_name: &str,
    protagonist_age: &str,
    prompt_or_context: Option<&str>,
) -> Result<GeneratedChapter> {
    let (system, user) = match prompt_or_context {
        Some(directive) if is_personalization_directive(directive) => {
            (EDITOR_PERSONA, directive.to_string())
        }
        _ => (
            AUTHOR_PERSONA,
            initial_prompt(topic, subtopics, protagonist_name, protagonist_age),
        ),
    };

    info!("generating chapter '{}' ({} mode)", topic,
        if system == EDITOR_PERSONA { "personalization" } else { "initial" });

    let reply = llm.chat(system, &user).await.map_err(|e| {
        error!("chapter generation failed for '{}': {:#}", topic, e);
        e
    })?;

    if let Some(usage) = reply.usage {
        info!(
            "chapter '{}' used {} tokens (prompt={} completion={})",
            topic, usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
        );
    }

    Ok(GeneratedChapter {
        text: reply.text.trim().to_string(),
        system_prompt: system.to_string(),
        user_prompt: user,
    })
}

/// Asks the model for the most illustration-worthy beat of a chapter.
/// Empty text short-circuits to Ok(None) without an API call.
pub async fn select_scene(
    llm: &dyn ChatClient,
    chapter_text: &str,
    topic: &str,
) -> Result<Option<SceneChoice>> {
    if chapter_text.trim().is_empty() {
        return Ok(None);
    }

    let user = scene_selection_prompt(chapter_text, topic);
    let reply = llm.chat(SCENE_PERSONA, &user).await?;
    if let Some(usage) = reply.usage {
        debug!("scene selection for '{}' used {} tokens", topic, usage.total_tokens);
    }
    Ok(prompts::parse_scene_reply(&reply.text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_chat_response_parsing_success() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4o",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "A coin is a promise." },
                "finish_reason": "stop"
            }],
            "usage": { "prompt_tokens": 12, "completion_tokens": 6, "total_tokens": 18 }
        }"#;

        let result: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            result.choices[0].message.content.as_deref(),
            Some("A coin is a promise.")
        );
        assert_eq!(result.usage.unwrap().total_tokens, 18);
    }

    #[test]
    fn test_chat_response_parsing_missing_usage() {
        let json = r#"{ "choices": [{ "message": { "role": "assistant", "content": "x" } }] }"#;
        let result: ChatResponse = serde_json::from_str(json).unwrap();
        assert!(result.usage.is_none());
    }

    // Mock chat client recording what it was sent.
    #[derive(Debug)]
    struct MockChatClient {
        calls: Arc<Mutex<Vec<(String, String)>>>,
        reply: String,
    }

    impl MockChatClient {
        fn new(reply: &str) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                reply: reply.to_string(),
            }
        }
    }

    #[async_trait]
    impl ChatClient for MockChatClient {
        async fn chat(&self, system: &str, user: &str) -> Result<ChatReply> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            Ok(ChatReply { text: self.reply.clone(), usage: None })
        }
    }

    #[tokio::test]
    async fn test_generate_chapter_initial_mode() {
        let mock = MockChatClient::new("Once upon a time, Luna found a coin.");
        let calls = mock.calls.clone();

        let out = generate_chapter(&mock, "What Is Money?", &["barter"], "Luna", "7", None)
            .await
            .unwrap();

        assert_eq!(out.text, "Once upon a time, Luna found a coin.");
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, AUTHOR_PERSONA);
        assert!(calls[0].1.contains("Luna"));
        assert!(calls[0].1.contains("- barter"));
    }

    #[tokio::test]
    async fn test_generate_chapter_personalization_mode() {
        let mock = MockChatClient::new("Revised chapter.");
        let calls = mock.calls.clone();

        let directive = crate::prompts::personalization_prompt(
            "Original text.",
            &serde_json::json!({ "protagonist": { "name": "Milo" } }),
            "boy",
        );
        generate_chapter(&mock, "Saving", &[], "Milo", "8", Some(&directive))
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].0, EDITOR_PERSONA);
        // The directive is sent verbatim, not rebuilt.
        assert_eq!(calls[0].1, directive);
    }

    #[tokio::test]
    async fn test_generate_chapter_plain_context_rebuilds_initial_prompt() {
        let mock = MockChatClient::new("text");
        let calls = mock.calls.clone();

        // A plain continuity string is not an edit directive.
        generate_chapter(&mock, "Saving", &["why save"], "Milo", "8", Some("previously..."))
            .await
            .unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(calls[0].0, AUTHOR_PERSONA);
        assert!(calls[0].1.contains("- why save"));
    }

    #[tokio::test]
    async fn test_select_scene_empty_text_skips_api() {
        let mock = MockChatClient::new("should never be used");
        let calls = mock.calls.clone();

        let result = select_scene(&mock, "   ", "Saving").await.unwrap();
        assert!(result.is_none());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_select_scene_parses_tagged_reply() {
        let mock =
            MockChatClient::new("SCENE: Luna at the market.\nSUMMARY: A girl at a market stall.");
        let choice = select_scene(&mock, "chapter text", "Spending Wisely")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(choice.summary, "A girl at a market stall.");
    }
}

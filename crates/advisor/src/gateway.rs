//! LLM gateway client.
//!
//! Supports OpenAI-compatible chat completions (the default), the Anthropic
//! Messages API, and Google Gemini. Structured advisors declare their output
//! schema as a forced tool call where the provider supports it; Gemini is asked
//! for `application/json` output instead. Plain text responses are run through
//! [`extract_json`](crate::extract::extract_json) as a fallback.

use std::time::Duration;

use finquest_api::{ChatMessage, ChatRole};
use finquest_runtime_config::{LlmConfig, LlmProvider};
use serde_json::{Value, json};
use tracing::warn;

use crate::LlmError;
use crate::extract::extract_json;

/// JSON-schema "tool" the model is forced to call.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// A rendered advisor prompt.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub system: String,
    pub messages: Vec<ChatMessage>,
    /// Present for structured advisors; absent for free-text chat.
    pub tool: Option<ToolSpec>,
}

impl Prompt {
    pub fn single(system: String, user: String, tool: ToolSpec) -> Self {
        Self {
            system,
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: user,
            }],
            tool: Some(tool),
        }
    }
}

pub struct LlmClient {
    http: reqwest::Client,
    provider: LlmProvider,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LlmError::NotConfigured(format!(
                    "set FINQUEST_LLM_API_KEY or {}",
                    config.provider.api_key_env()
                ))
            })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            provider: config.provider,
            base_url: config.base_url().to_string(),
            model: config.model().to_string(),
            api_key,
            max_tokens: config.max_tokens,
        })
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    /// Run a structured prompt and return the model's JSON object.
    pub async fn complete_json(&self, prompt: &Prompt) -> Result<Value, LlmError> {
        let body = self.send(prompt).await?;
        match self.provider {
            LlmProvider::Openai => read_openai_json(&body),
            LlmProvider::Anthropic => read_anthropic_json(&body),
            LlmProvider::Gemini => extract_json(&read_gemini_text(&body)?),
        }
    }

    /// Run a conversational prompt and return the reply text.
    pub async fn complete_text(&self, prompt: &Prompt) -> Result<String, LlmError> {
        let body = self.send(prompt).await?;
        let text = match self.provider {
            LlmProvider::Openai => read_openai_text(&body)?,
            LlmProvider::Anthropic => read_anthropic_text(&body)?,
            LlmProvider::Gemini => read_gemini_text(&body)?,
        };
        if text.trim().is_empty() {
            return Err(LlmError::InvalidResponse("empty reply".into()));
        }
        Ok(text)
    }

    async fn send(&self, prompt: &Prompt) -> Result<Value, LlmError> {
        let request = match self.provider {
            LlmProvider::Openai => self
                .http
                .post(format!("{}/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&openai_body(&self.model, self.max_tokens, prompt)),
            LlmProvider::Anthropic => self
                .http
                .post(format!("{}/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&anthropic_body(&self.model, self.max_tokens, prompt)),
            LlmProvider::Gemini => self
                .http
                .post(format!(
                    "{}/models/{}:generateContent",
                    self.base_url, self.model
                ))
                .header("x-goog-api-key", &self.api_key)
                .json(&gemini_body(self.max_tokens, prompt)),
        };

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            warn!(
                provider = %self.provider,
                status = status.as_u16(),
                "LLM gateway returned an error"
            );
            return Err(LlmError::from_status(status.as_u16(), body));
        }
        resp.json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("gateway body is not JSON: {e}")))
    }
}

// ─── Request bodies ──────────────────────────────────────────────────────────

fn role_str(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "user",
        ChatRole::Assistant => "assistant",
    }
}

pub fn openai_body(model: &str, max_tokens: u32, prompt: &Prompt) -> Value {
    let mut messages = vec![json!({"role": "system", "content": prompt.system})];
    messages.extend(
        prompt
            .messages
            .iter()
            .map(|m| json!({"role": role_str(m.role), "content": m.content})),
    );
    let mut body = json!({
        "model": model,
        "max_tokens": max_tokens,
        "messages": messages,
    });
    if let Some(tool) = &prompt.tool {
        body["tools"] = json!([{
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.parameters,
            }
        }]);
        body["tool_choice"] = json!({"type": "function", "function": {"name": tool.name}});
    }
    body
}

pub fn anthropic_body(model: &str, max_tokens: u32, prompt: &Prompt) -> Value {
    let messages: Vec<Value> = prompt
        .messages
        .iter()
        .map(|m| json!({"role": role_str(m.role), "content": m.content}))
        .collect();
    let mut body = json!({
        "model": model,
        "max_tokens": max_tokens,
        "system": prompt.system,
        "messages": messages,
    });
    if let Some(tool) = &prompt.tool {
        body["tools"] = json!([{
            "name": tool.name,
            "description": tool.description,
            "input_schema": tool.parameters,
        }]);
        body["tool_choice"] = json!({"type": "tool", "name": tool.name});
    }
    body
}

pub fn gemini_body(max_tokens: u32, prompt: &Prompt) -> Value {
    let contents: Vec<Value> = prompt
        .messages
        .iter()
        .map(|m| {
            let role = match m.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "model",
            };
            json!({"role": role, "parts": [{"text": m.content}]})
        })
        .collect();
    let mut config = json!({"maxOutputTokens": max_tokens});
    if prompt.tool.is_some() {
        config["responseMimeType"] = json!("application/json");
    }
    json!({
        "systemInstruction": {"parts": [{"text": prompt.system}]},
        "contents": contents,
        "generationConfig": config,
    })
}

// ─── Response readers ────────────────────────────────────────────────────────

fn missing(what: &str) -> LlmError {
    LlmError::InvalidResponse(format!("missing {what} in gateway response"))
}

fn openai_message(body: &Value) -> Result<&Value, LlmError> {
    body.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|choice| choice.get("message"))
        .ok_or_else(|| missing("choices[0].message"))
}

pub fn read_openai_text(body: &Value) -> Result<String, LlmError> {
    Ok(openai_message(body)?
        .get("content")
        .and_then(|t| t.as_str())
        .unwrap_or("")
        .to_string())
}

pub fn read_openai_json(body: &Value) -> Result<Value, LlmError> {
    let message = openai_message(body)?;
    let arguments = message
        .get("tool_calls")
        .and_then(|calls| calls.as_array())
        .and_then(|arr| arr.first())
        .and_then(|call| call.get("function"))
        .and_then(|f| f.get("arguments"));
    match arguments {
        // Arguments arrive as a JSON-encoded string.
        Some(Value::String(raw)) => extract_json(raw),
        Some(value @ Value::Object(_)) => Ok(value.clone()),
        _ => extract_json(&read_openai_text(body)?),
    }
}

fn anthropic_blocks(body: &Value) -> Result<&Vec<Value>, LlmError> {
    body.get("content")
        .and_then(|c| c.as_array())
        .ok_or_else(|| missing("content"))
}

pub fn read_anthropic_text(body: &Value) -> Result<String, LlmError> {
    Ok(anthropic_blocks(body)?
        .iter()
        .filter(|block| block.get("type").and_then(|t| t.as_str()) == Some("text"))
        .filter_map(|block| block.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join(""))
}

pub fn read_anthropic_json(body: &Value) -> Result<Value, LlmError> {
    let tool_input = anthropic_blocks(body)?
        .iter()
        .find(|block| block.get("type").and_then(|t| t.as_str()) == Some("tool_use"))
        .and_then(|block| block.get("input"));
    match tool_input {
        Some(input) => Ok(input.clone()),
        None => extract_json(&read_anthropic_text(body)?),
    }
}

pub fn read_gemini_text(body: &Value) -> Result<String, LlmError> {
    let parts = body
        .get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|arr| arr.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|parts| parts.as_array())
        .ok_or_else(|| missing("candidates[0].content.parts"))?;
    Ok(parts
        .iter()
        .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
        .collect::<Vec<_>>()
        .join(""))
}

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use super::tools::Tool;
use crate::config::LlmConfig;

/// Final answer of an agent run plus one line per tool invocation.
#[derive(Debug, Clone, Default)]
pub struct AgentReply {
    pub content: String,
    pub tool_log: Vec<String>,
}

#[async_trait]
pub trait RecommendationAgent: Send + Sync {
    async fn invoke(&self, prompt: &str) -> anyhow::Result<AgentReply>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn user(content: &str) -> Self {
        Self {
            role: "user".into(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool(call_id: &str, content: String) -> Self {
        Self {
            role: "tool".into(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCall {
    id: String,
    #[serde(rename = "type", default = "function_kind")]
    kind: String,
    function: FunctionCall,
}

fn function_kind() -> String {
    "function".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    arguments: String, // JSON-encoded object
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: &'a [ChatMessage],
    tools: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Tool-calling agent over an OpenAI-compatible chat completions API (Groq).
pub struct ChatCompletionsAgent {
    client: reqwest::Client,
    config: LlmConfig,
}

impl ChatCompletionsAgent {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    async fn complete(&self, messages: &[ChatMessage]) -> anyhow::Result<ChatMessage> {
        let req = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages,
            tools: Tool::ALL.iter().map(Tool::definition).collect(),
        };

        let resp = self
            .client
            .post(format!(
                "{}/chat/completions",
                self.config.base_url.trim_end_matches('/')
            ))
            .bearer_auth(&self.config.api_key)
            .json(&req)
            .send()
            .await
            .context("chat completion request")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("LLM API error {}: {}", status, body);
        }

        let parsed: ChatResponse = resp.json().await.context("decode chat completion")?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .context("chat completion returned no choices")
    }
}

fn run_tool(call: &ToolCall, month: u8) -> String {
    let Some(tool) = Tool::from_name(&call.function.name) else {
        warn!(tool = %call.function.name, "agent asked for unknown tool");
        return format!("unknown tool: {}", call.function.name);
    };
    let args: Value = if call.function.arguments.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&call.function.arguments).unwrap_or(Value::Null)
    };
    tool.call(&args, month)
}

#[async_trait]
impl RecommendationAgent for ChatCompletionsAgent {
    async fn invoke(&self, prompt: &str) -> anyhow::Result<AgentReply> {
        let mut messages = vec![ChatMessage::user(prompt)];
        let mut tool_log = Vec::new();
        let month = u8::from(OffsetDateTime::now_utc().month());

        for step in 0..self.config.max_steps {
            let mut reply = self.complete(&messages).await?;
            let calls = reply.tool_calls.take().unwrap_or_default();
            if calls.is_empty() {
                info!(step, tools_used = tool_log.len(), "agent finished");
                return Ok(AgentReply {
                    content: reply.content.unwrap_or_default(),
                    tool_log,
                });
            }

            messages.push(ChatMessage {
                tool_calls: Some(calls.clone()),
                ..reply
            });
            for call in &calls {
                debug!(step, tool = %call.function.name, "agent tool call");
                let output = run_tool(call, month);
                tool_log.push(format!(
                    "called {}({})",
                    call.function.name, call.function.arguments
                ));
                messages.push(ChatMessage::tool(&call.id, output));
            }
        }

        anyhow::bail!(
            "agent did not finish within {} steps",
            self.config.max_steps
        )
    }
}

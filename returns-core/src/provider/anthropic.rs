//! Anthropic Claude provider implementation

use super::*;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider
pub struct AnthropicProvider {
    client: Client,
    config: ProviderConfig,
}

impl AnthropicProvider {
    pub fn new(config: ProviderConfig) -> crate::error::Result<Self> {
        let client = http_client(&config)?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or("https://api.anthropic.com/v1")
    }

    /// Translate a provider-neutral request into the Messages API body
    fn build_request(&self, request: CompletionRequest) -> AnthropicRequest {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());

        AnthropicRequest {
            model,
            system: request.system_prompt().map(str::to_string),
            messages: convert_messages(&request.messages),
            max_tokens: request.max_tokens.unwrap_or(4096),
            temperature: request.temperature,
            tools: request.tools.as_ref().map(|tools| {
                tools
                    .iter()
                    .map(|t| AnthropicTool {
                        name: t.name.clone(),
                        description: t.description.clone(),
                        input_schema: t.parameters.clone(),
                    })
                    .collect()
            }),
        }
    }
}

impl LlmProvider for AnthropicProvider {
    fn name(&self) -> &str {
        "anthropic"
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or("claude-sonnet-4-20250514")
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let api_request = self.build_request(request);

        let api_key = self.config.api_key.as_ref()
            .ok_or(ProviderError::AuthenticationFailed)?;

        debug!(
            provider = "anthropic",
            model = %api_request.model,
            messages = api_request.messages.len(),
            "sending completion request"
        );

        let req = self.client
            .post(format!("{}/messages", self.base_url()))
            .header("x-api-key", api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&api_request);

        let response = req.send().await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());
            let text = response.text().await.unwrap_or_default();
            warn!(provider = "anthropic", status, "completion request rejected");
            return Err(status_error(status, text, retry_after));
        }

        let api_response: AnthropicResponse = response.json().await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        Ok(api_response.into_completion())
    }
}

/// Convert chat messages to Anthropic's alternating user/assistant shape.
///
/// System messages travel in the top-level `system` field. Consecutive tool
/// results are merged into a single user message of `tool_result` blocks.
fn convert_messages(messages: &[ChatMessage]) -> Vec<AnthropicMessage> {
    let mut out: Vec<AnthropicMessage> = Vec::new();

    for msg in messages {
        match msg.role {
            Role::System => {}
            Role::User => out.push(AnthropicMessage {
                role: "user".into(),
                content: AnthropicContent::Text(msg.content.clone().unwrap_or_default()),
            }),
            Role::Assistant => {
                let content = match &msg.tool_calls {
                    Some(calls) if !calls.is_empty() => {
                        let mut blocks = Vec::with_capacity(calls.len() + 1);
                        if let Some(text) = msg.content.as_ref().filter(|t| !t.is_empty()) {
                            blocks.push(AnthropicContentBlock::Text { text: text.clone() });
                        }
                        for call in calls {
                            blocks.push(AnthropicContentBlock::ToolUse {
                                id: call.id.clone(),
                                name: call.name.clone(),
                                input: call.arguments_value().unwrap_or_else(|_| serde_json::json!({})),
                            });
                        }
                        AnthropicContent::Blocks(blocks)
                    }
                    _ => AnthropicContent::Text(msg.content.clone().unwrap_or_default()),
                };
                out.push(AnthropicMessage {
                    role: "assistant".into(),
                    content,
                });
            }
            Role::Tool => {
                let block = AnthropicContentBlock::ToolResult {
                    tool_use_id: msg.tool_call_id.clone().unwrap_or_default(),
                    content: msg.content.clone().unwrap_or_default(),
                    is_error: msg.is_error,
                };
                match out.last_mut() {
                    Some(AnthropicMessage {
                        role,
                        content: AnthropicContent::Blocks(blocks),
                    }) if role.as_str() == "user" => blocks.push(block),
                    _ => out.push(AnthropicMessage {
                        role: "user".into(),
                        content: AnthropicContent::Blocks(vec![block]),
                    }),
                }
            }
        }
    }

    out
}

// ============================================================================
// Anthropic API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AnthropicTool>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: AnthropicContent,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum AnthropicContent {
    Text(String),
    Blocks(Vec<AnthropicContentBlock>),
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type")]
enum AnthropicContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

#[derive(Debug, Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    id: String,
    model: String,
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

impl AnthropicResponse {
    fn into_completion(self) -> CompletionResponse {
        // Extract text content and tool calls
        let mut content = String::new();
        let mut tool_calls = Vec::new();

        for block in self.content {
            match block {
                ContentBlock::Text { text } => content.push_str(&text),
                ContentBlock::ToolUse { id, name, input } => {
                    tool_calls.push(ToolCall::new(id, name, input));
                }
                ContentBlock::Other => {}
            }
        }

        let finish_reason = match self.stop_reason.as_deref() {
            Some("end_turn") | Some("stop_sequence") => FinishReason::Stop,
            Some("max_tokens") => FinishReason::Length,
            Some("tool_use") => FinishReason::ToolCalls,
            Some("refusal") => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        };

        CompletionResponse {
            id: self.id,
            model: self.model,
            content: if content.is_empty() { None } else { Some(content) },
            tool_calls,
            finish_reason,
            usage: Usage::new(self.usage.input_tokens, self.usage.output_tokens),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: usize,
    output_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(ProviderConfig::anthropic("sk-ant-test")).unwrap()
    }

    #[test]
    fn test_system_prompt_moves_to_top_level() {
        let request = CompletionRequest::new(vec![
            ChatMessage::system("You are a returns agent"),
            ChatMessage::user("Can I return ORD-001?"),
        ])
        .with_temperature(0.0);

        let body = serde_json::to_value(provider().build_request(request)).unwrap();
        assert_eq!(body["system"], "You are a returns agent");
        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
        assert_eq!(body["messages"][0]["role"], "user");
        assert_eq!(body["messages"][0]["content"], "Can I return ORD-001?");
    }

    #[test]
    fn test_tool_round_trip_shape() {
        let calls = vec![
            ToolCall::new("toolu_1", "lookup_order", json!({"order_id": "ORD-001"})),
            ToolCall::new("toolu_2", "product_return_policy", json!({})),
        ];
        let messages = vec![
            ChatMessage::user("Can I return ORD-001?"),
            ChatMessage::assistant_tool_calls(Some("Let me check.".into()), calls),
            ChatMessage::tool_result("toolu_1", "{\"found\":true}"),
            ChatMessage::tool_result("toolu_2", "unknown").with_error(true),
        ];

        let body = serde_json::to_value(convert_messages(&messages)).unwrap();
        let msgs = body.as_array().unwrap();
        assert_eq!(msgs.len(), 3);

        assert_eq!(msgs[1]["role"], "assistant");
        assert_eq!(msgs[1]["content"][0]["type"], "text");
        assert_eq!(msgs[1]["content"][1]["type"], "tool_use");
        assert_eq!(msgs[1]["content"][1]["input"]["order_id"], "ORD-001");

        assert_eq!(msgs[2]["role"], "user");
        let results = msgs[2]["content"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["tool_use_id"], "toolu_1");
        assert!(results[0].get("is_error").is_none());
        assert_eq!(results[1]["is_error"], true);
    }

    #[test]
    fn test_response_parsing() {
        let raw = json!({
            "id": "msg_1",
            "model": "claude-sonnet-4-20250514",
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "Looking that up."},
                {"type": "tool_use", "id": "toolu_9", "name": "lookup_order", "input": {"order_id": "ORD-002"}}
            ],
            "stop_reason": "tool_use",
            "usage": {"input_tokens": 120, "output_tokens": 30}
        });

        let parsed: AnthropicResponse = serde_json::from_value(raw).unwrap();
        let completion = parsed.into_completion();
        assert_eq!(completion.content.as_deref(), Some("Looking that up."));
        assert_eq!(completion.finish_reason, FinishReason::ToolCalls);
        assert_eq!(completion.tool_calls.len(), 1);
        assert_eq!(completion.tool_calls[0].name, "lookup_order");
        assert_eq!(completion.tool_calls[0].arguments_value().unwrap()["order_id"], "ORD-002");
        assert_eq!(completion.usage.total_tokens, 150);
    }
}

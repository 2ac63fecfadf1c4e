//! OpenAI-compatible provider implementation
//!
//! Works with OpenAI, Azure OpenAI, vLLM, Ollama, and other OpenAI-compatible APIs.

use super::*;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// OpenAI-compatible provider
pub struct OpenAIProvider {
    client: Client,
    config: ProviderConfig,
}

impl OpenAIProvider {
    pub fn new(config: ProviderConfig) -> crate::error::Result<Self> {
        let client = http_client(&config)?;
        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.base_url.as_deref().unwrap_or("https://api.openai.com/v1")
    }

    fn build_request(&self, request: CompletionRequest) -> OpenAIRequest {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.default_model().to_string());

        OpenAIRequest {
            model,
            messages: request.messages.into_iter().map(OpenAIMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            tools: request.tools.map(|tools| {
                tools.into_iter().map(|t| OpenAITool {
                    r#type: "function".into(),
                    function: OpenAIFunction {
                        name: t.name,
                        description: Some(t.description),
                        parameters: Some(t.parameters),
                    },
                }).collect()
            }),
        }
    }
}

impl LlmProvider for OpenAIProvider {
    fn name(&self) -> &str {
        "openai"
    }

    fn default_model(&self) -> &str {
        self.config.default_model.as_deref().unwrap_or("gpt-4o")
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, ProviderError> {
        let api_request = self.build_request(request);

        debug!(
            provider = "openai",
            model = %api_request.model,
            messages = api_request.messages.len(),
            "sending completion request"
        );

        let mut req = self.client
            .post(format!("{}/chat/completions", self.base_url()))
            .json(&api_request);

        if let Some(api_key) = &self.config.api_key {
            if !api_key.expose_secret().is_empty() {
                req = req.header("Authorization", format!("Bearer {}", api_key.expose_secret()));
            }
        }

        let response = req.send().await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(provider = "openai", status, "completion request rejected");
            return Err(status_error(status, text, None));
        }

        let api_response: OpenAIResponse = response.json().await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        api_response.into_completion()
    }
}

// ============================================================================
// OpenAI API Types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OpenAITool>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OpenAIToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl From<ChatMessage> for OpenAIMessage {
    fn from(msg: ChatMessage) -> Self {
        // Chat Completions has no failure flag on tool messages
        let content = match (msg.role, msg.is_error) {
            (Role::Tool, true) => msg.content.map(|c| format!("ERROR: {}", c)),
            _ => msg.content,
        };

        Self {
            role: match msg.role {
                Role::System => "system".into(),
                Role::User => "user".into(),
                Role::Assistant => "assistant".into(),
                Role::Tool => "tool".into(),
            },
            content,
            tool_calls: msg.tool_calls.map(|tcs| {
                tcs.into_iter().map(|tc| OpenAIToolCall {
                    id: tc.id,
                    r#type: "function".into(),
                    function: OpenAIFunctionCall {
                        name: tc.name,
                        arguments: tc.arguments,
                    },
                }).collect()
            }),
            tool_call_id: msg.tool_call_id,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAITool {
    r#type: String,
    function: OpenAIFunction,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunction {
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIToolCall {
    id: String,
    r#type: String,
    function: OpenAIFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIFunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    id: String,
    model: String,
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

impl OpenAIResponse {
    fn into_completion(self) -> Result<CompletionResponse, ProviderError> {
        let choice = self.choices.into_iter().next()
            .ok_or_else(|| ProviderError::Other("No choices in response".into()))?;

        let tool_calls = choice.message.tool_calls
            .map(|tcs| tcs.into_iter().map(|tc| ToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: tc.function.arguments,
            }).collect())
            .unwrap_or_default();

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("stop") => FinishReason::Stop,
            Some("length") => FinishReason::Length,
            Some("tool_calls") => FinishReason::ToolCalls,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Unknown,
        };

        let usage = self.usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        Ok(CompletionResponse {
            id: self.id,
            model: self.model,
            content: choice.message.content.filter(|c| !c.is_empty()),
            tool_calls,
            finish_reason,
            usage,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
    total_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_keeps_tool_messages_inline() {
        let provider = OpenAIProvider::new(ProviderConfig::openai("sk-test")).unwrap();
        let request = CompletionRequest::new(vec![
            ChatMessage::system("You are a returns agent"),
            ChatMessage::user("Refund for ORD-003?"),
            ChatMessage::assistant_tool_calls(
                None,
                vec![ToolCall::new("call_1", "calculate_refund", json!({"order_id": "ORD-003"}))],
            ),
            ChatMessage::tool_result("call_1", "no such tool").with_error(true),
        ])
        .with_tools(vec![ToolDefinition::new("calculate_refund", "Calculate a refund")]);

        let body = serde_json::to_value(provider.build_request(request)).unwrap();
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][2]["tool_calls"][0]["function"]["name"], "calculate_refund");
        assert_eq!(body["messages"][3]["role"], "tool");
        assert_eq!(body["messages"][3]["content"], "ERROR: no such tool");
        assert_eq!(body["tools"][0]["type"], "function");
    }

    #[test]
    fn test_response_parsing() {
        let raw = json!({
            "id": "chatcmpl-1",
            "model": "gpt-4o",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_7",
                        "type": "function",
                        "function": {"name": "lookup_order", "arguments": "{\"order_id\":\"ORD-005\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }],
            "usage": {"prompt_tokens": 80, "completion_tokens": 12, "total_tokens": 92}
        });

        let parsed: OpenAIResponse = serde_json::from_value(raw).unwrap();
        let completion = parsed.into_completion().unwrap();
        assert!(completion.content.is_none());
        assert!(completion.requests_tools());
        assert_eq!(completion.tool_calls[0].id, "call_7");
        assert_eq!(completion.finish_reason, FinishReason::ToolCalls);
        assert_eq!(completion.usage.total_tokens, 92);
    }

    #[test]
    fn test_empty_choices_is_an_error() {
        let parsed: OpenAIResponse = serde_json::from_value(json!({
            "id": "x", "model": "gpt-4o", "choices": []
        }))
        .unwrap();
        assert!(parsed.into_completion().is_err());
    }
}

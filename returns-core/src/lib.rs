//! # Returns Desk Core
//!
//! Everything the support agent reasons over, minus the loop itself.
//!
//! ## Core Concepts
//! - **Store**: Read-only order records, looked up by exact order id
//! - **Policy**: The 30-day return window and refund percentages by reason
//! - **Refund**: Decimal refund quotes for eligible orders
//! - **Tools**: Named functions the model may call, dispatched by name
//! - **Provider**: Trait-based LLM communication (Anthropic, OpenAI, scripted)

pub mod error;
pub mod policy;
pub mod provider;
pub mod refund;
pub mod store;
pub mod tools;

pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use policy::{normalize_reason, CategoryPolicy, PolicyFacts, RETURN_WINDOW_DAYS};
pub use provider::{
    AnthropicProvider, ChatMessage, CompletionRequest, CompletionResponse, FinishReason,
    HttpProvider, LlmProvider, OpenAIProvider, ProviderConfig, ProviderError, ProviderType,
    Role, ScriptedProvider, ToolCall, ToolDefinition, Usage, UsageTracker,
};
pub use refund::{round_currency, RefundCalculator, RefundQuote};
pub use store::{OrderRecord, OrderStore};
pub use tools::{Tool, ToolRegistry, ToolResult};

//! # Tools
//!
//! The functions the model may ask us to run, each described by a
//! [`ToolDefinition`] and dispatched by name through [`ToolRegistry`].
//!
//! Business outcomes (unknown order, return outside the window) are normal
//! observations: the tool succeeds and says so in its payload. Only
//! malformed calls (unknown tool, bad arguments) produce failed results.

use crate::error::{Error, ErrorKind, Result};
use crate::policy::PolicyFacts;
use crate::provider::{ToolCall, ToolDefinition};
use crate::refund::RefundCalculator;
use crate::store::OrderStore;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// A named, schema-described function the model can call
pub trait Tool: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// Run with already-parsed, schema-checked arguments
    fn call(&self, args: &Value) -> Result<Value>;
}

/// Outcome of one tool call, fed back to the model as an observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResult {
    pub tool_call_id: String,
    pub name: String,
    pub payload: Value,
    pub success: bool,
}

impl ToolResult {
    pub fn ok(call: &ToolCall, payload: Value) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            payload,
            success: true,
        }
    }

    pub fn failed(call: &ToolCall, error: &Error) -> Self {
        Self {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            payload: json!({
                "error": error.kind().as_str(),
                "message": error.message(),
            }),
            success: false,
        }
    }

    /// Payload rendered as text for the transcript
    pub fn content(&self) -> String {
        match &self.payload {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Tools available to the model, in declaration order
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The three returns-desk tools over a shared store
    pub fn returns_desk(store: Arc<OrderStore>, policy: PolicyFacts, today: NaiveDate) -> Self {
        let mut registry = Self::new();
        registry.register(LookupOrder {
            store: Arc::clone(&store),
            policy,
            today,
        });
        registry.register(ProductReturnPolicy { policy });
        registry.register(CalculateRefund {
            calculator: RefundCalculator::new(store, policy),
        });
        registry
    }

    /// Add a tool, replacing any tool already registered under its name
    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        let name = tool.definition().name;
        self.tools.retain(|t| t.definition().name != name);
        self.tools.push(Box::new(tool));
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    fn find(&self, name: &str) -> Option<&dyn Tool> {
        self.tools
            .iter()
            .find(|t| t.definition().name == name)
            .map(|t| t.as_ref())
    }

    /// Execute one call. Never panics and never aborts the turn: every
    /// failure comes back as a failed [`ToolResult`].
    pub fn dispatch(&self, call: &ToolCall) -> ToolResult {
        match self.try_dispatch(call) {
            Ok(payload) => {
                debug!(tool = %call.name, call_id = %call.id, "tool call succeeded");
                ToolResult::ok(call, payload)
            }
            Err(err) => {
                warn!(tool = %call.name, call_id = %call.id, error = %err, "tool call failed");
                ToolResult::failed(call, &err)
            }
        }
    }

    fn try_dispatch(&self, call: &ToolCall) -> Result<Value> {
        let tool = self
            .find(&call.name)
            .ok_or_else(|| Error::unknown_tool(&call.name).with_operation("tools::dispatch"))?;

        let args = call.arguments_value().map_err(|e| {
            Error::invalid_argument(format!("arguments for {} are not valid JSON", call.name))
                .with_operation("tools::dispatch")
                .set_source(e)
        })?;

        let Some(object) = args.as_object() else {
            return Err(Error::invalid_argument(format!(
                "arguments for {} must be a JSON object",
                call.name
            ))
            .with_operation("tools::dispatch"));
        };

        let definition = tool.definition();
        if let Some(missing) = definition
            .required_parameters()
            .into_iter()
            .find(|p| !object.contains_key(*p))
        {
            return Err(Error::invalid_argument(format!(
                "missing required parameter '{}' for {}",
                missing, call.name
            ))
            .with_operation("tools::dispatch")
            .with_context("parameter", missing));
        }

        tool.call(&args)
    }
}

fn string_arg<'a>(args: &'a Value, name: &'static str) -> Result<&'a str> {
    args[name].as_str().ok_or_else(|| {
        Error::invalid_argument(format!("parameter '{}' must be a string", name))
            .with_context("parameter", name)
    })
}

fn optional_string_arg<'a>(args: &'a Value, name: &'static str, default: &'a str) -> Result<&'a str> {
    match &args[name] {
        Value::Null => Ok(default),
        _ => string_arg(args, name),
    }
}

fn to_payload<T: Serialize>(value: &T) -> Result<Value> {
    serde_json::to_value(value).map_err(|e| {
        Error::new(ErrorKind::SerializationFailed, "failed to encode tool payload").set_source(e)
    })
}

// ============================================================================
// lookup_order
// ============================================================================

struct LookupOrder {
    store: Arc<OrderStore>,
    policy: PolicyFacts,
    today: NaiveDate,
}

impl Tool for LookupOrder {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "lookup_order",
            "Look up order details by order ID, including the product, price, \
             purchase date, days since purchase and whether it can still be returned.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "order_id": {
                    "type": "string",
                    "description": "The order ID to look up (e.g., ORD-001)"
                }
            },
            "required": ["order_id"]
        }))
    }

    fn call(&self, args: &Value) -> Result<Value> {
        let order_id = string_arg(args, "order_id")?;

        match self.store.lookup(order_id) {
            Ok(order) => {
                let mut record = to_payload(order)?;
                record["purchase_date"] = json!(order.purchase_date(self.today).to_string());
                record["return_window_days"] = json!(self.policy.return_window_days());
                Ok(json!({ "found": true, "order": record }))
            }
            Err(e) if e.kind() == ErrorKind::OrderNotFound => Ok(json!({
                "found": false,
                "message": format!("Order {} not found. Please check the order ID.", order_id),
            })),
            Err(e) => Err(e),
        }
    }
}

// ============================================================================
// product_return_policy
// ============================================================================

struct ProductReturnPolicy {
    policy: PolicyFacts,
}

impl Tool for ProductReturnPolicy {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "product_return_policy",
            "Get the return policy, including the number of days a purchase \
             stays eligible for return and the refund percentage for each return reason.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "product_category": {
                    "type": "string",
                    "description": "The category of product: electronics, accessories, or anything else (default: electronics)"
                }
            },
            "required": []
        }))
    }

    fn call(&self, args: &Value) -> Result<Value> {
        let category = optional_string_arg(args, "product_category", "electronics")?;
        let mut payload = to_payload(&self.policy.for_category(category))?;
        payload["policy_text"] = json!(self.policy.policy_text());
        Ok(payload)
    }
}

// ============================================================================
// calculate_refund
// ============================================================================

struct CalculateRefund {
    calculator: RefundCalculator,
}

impl Tool for CalculateRefund {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            "calculate_refund",
            "Calculate the refund amount for returning an order. \
             Fails softly when the order is outside the return window.",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "order_id": {
                    "type": "string",
                    "description": "The order ID"
                },
                "return_reason": {
                    "type": "string",
                    "description": "Reason for return: defective, damaged, wrong_item, changed_mind, unwanted, or general"
                }
            },
            "required": ["order_id"]
        }))
    }

    fn call(&self, args: &Value) -> Result<Value> {
        let order_id = string_arg(args, "order_id")?;
        let reason = optional_string_arg(args, "return_reason", "general")?;

        match self.calculator.calculate(order_id, reason) {
            Ok(quote) => Ok(json!({ "eligible": true, "refund": to_payload(&quote)? })),
            Err(e) => match e.kind() {
                ErrorKind::OrderNotFound => Ok(json!({
                    "found": false,
                    "message": format!("Order {} not found. Please check the order ID.", order_id),
                })),
                ErrorKind::ReturnIneligible => Ok(json!({
                    "eligible": false,
                    "message": e.message(),
                    "days_since_purchase": e
                        .context_value("days_since_purchase")
                        .and_then(|d| d.parse::<u32>().ok()),
                })),
                _ => Err(e),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ToolRegistry {
        let today = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        ToolRegistry::returns_desk(Arc::new(OrderStore::seeded()), PolicyFacts::new(), today)
    }

    fn call(name: &str, args: Value) -> ToolCall {
        ToolCall::new("call_1", name, args)
    }

    #[test]
    fn test_definitions_in_declaration_order() {
        let names: Vec<String> = registry().definitions().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["lookup_order", "product_return_policy", "calculate_refund"]);
    }

    #[test]
    fn test_lookup_order_found() {
        let result = registry().dispatch(&call("lookup_order", json!({"order_id": "ORD-002"})));
        assert!(result.success);
        assert_eq!(result.tool_call_id, "call_1");
        assert_eq!(result.payload["found"], true);
        assert_eq!(result.payload["order"]["days_since_purchase"], 35);
        assert_eq!(result.payload["order"]["eligible"], false);
        assert_eq!(result.payload["order"]["price"], "199.99");
        assert_eq!(result.payload["order"]["purchase_date"], "2024-02-09");
        assert_eq!(result.payload["order"]["return_window_days"], 30);
    }

    #[test]
    fn test_lookup_order_not_found_is_an_observation() {
        let result = registry().dispatch(&call("lookup_order", json!({"order_id": "ORD-042"})));
        assert!(result.success);
        assert_eq!(result.payload["found"], false);
        assert!(result.content().contains("ORD-042 not found"));
    }

    #[test]
    fn test_return_policy_defaults_to_electronics() {
        let result = registry().dispatch(&call("product_return_policy", json!({})));
        assert!(result.success);
        assert_eq!(result.payload["category"], "electronics");
        assert_eq!(result.payload["return_window_days"], 30);
        assert!(result.payload["policy_text"].as_str().unwrap().contains("30 days"));
    }

    #[test]
    fn test_calculate_refund() {
        let registry = registry();

        let result = registry.dispatch(&call(
            "calculate_refund",
            json!({"order_id": "ORD-001", "return_reason": "changed_mind"}),
        ));
        assert!(result.success);
        assert_eq!(result.payload["eligible"], true);
        assert_eq!(result.payload["refund"]["refund_amount"], "71.99");

        let result = registry.dispatch(&call("calculate_refund", json!({"order_id": "ORD-004"})));
        assert!(result.success);
        assert_eq!(result.payload["eligible"], false);
        assert_eq!(result.payload["days_since_purchase"], 45);
        assert!(result.payload["message"].as_str().unwrap().contains("30 days"));
    }

    #[test]
    fn test_unknown_tool_is_a_failed_result() {
        let result = registry().dispatch(&call("cancel_order", json!({"order_id": "ORD-001"})));
        assert!(!result.success);
        assert_eq!(result.name, "cancel_order");
        assert_eq!(result.payload["error"], "UnknownTool");
    }

    #[test]
    fn test_bad_arguments_are_failed_results() {
        let registry = registry();

        let missing = registry.dispatch(&call("lookup_order", json!({})));
        assert!(!missing.success);
        assert_eq!(missing.payload["error"], "InvalidArgument");

        let wrong_type = registry.dispatch(&call("lookup_order", json!({"order_id": 1})));
        assert!(!wrong_type.success);

        let not_json = registry.dispatch(&ToolCall {
            id: "call_2".into(),
            name: "lookup_order".into(),
            arguments: "order_id=ORD-001".into(),
        });
        assert!(!not_json.success);
        assert_eq!(not_json.tool_call_id, "call_2");
    }

    #[test]
    fn test_register_replaces_same_name() {
        struct Stub;
        impl Tool for Stub {
            fn definition(&self) -> ToolDefinition {
                ToolDefinition::new("lookup_order", "stub")
            }
            fn call(&self, _args: &Value) -> Result<Value> {
                Ok(json!("stubbed"))
            }
        }

        let mut registry = registry();
        registry.register(Stub);
        assert_eq!(registry.len(), 3);
        let result = registry.dispatch(&call("lookup_order", json!({})));
        assert_eq!(result.content(), "stubbed");
    }
}

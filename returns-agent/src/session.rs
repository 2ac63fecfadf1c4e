//! Conversation state: one customer's transcript across turns.

use returns_core::{ChatMessage, ToolCall, ToolResult, UsageTracker};
use serde::Serialize;
use uuid::Uuid;

/// One entry in the transcript, replayed to the model every cycle
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum TranscriptEntry {
    User(String),
    Assistant(String),
    /// The model asked for tools, possibly with some text first
    ToolCalls {
        content: Option<String>,
        calls: Vec<ToolCall>,
    },
    /// Results of the preceding `ToolCalls`, in request order
    ToolResults(Vec<ToolResult>),
}

impl TranscriptEntry {
    /// Render as provider messages. A batch of results becomes one tool
    /// message per call.
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        match self {
            Self::User(text) => vec![ChatMessage::user(text.as_str())],
            Self::Assistant(text) => vec![ChatMessage::assistant(text.as_str())],
            Self::ToolCalls { content, calls } => {
                vec![ChatMessage::assistant_tool_calls(content.clone(), calls.clone())]
            }
            Self::ToolResults(results) => results
                .iter()
                .map(|r| ChatMessage::tool_result(&r.tool_call_id, r.content()).with_error(!r.success))
                .collect(),
        }
    }
}

/// A single conversation. Not shared: every operation takes `&mut Session`.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    transcript: Vec<TranscriptEntry>,
    cycles: u32,
    usage: UsageTracker,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(format!("session_{}", Uuid::new_v4().simple()))
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            transcript: Vec::new(),
            cycles: 0,
            usage: UsageTracker::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// LLM calls made during the current (or last) turn
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Token usage across every turn of this session
    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    pub fn is_empty(&self) -> bool {
        self.transcript.is_empty()
    }

    /// The transcript as provider messages, oldest first
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        self.transcript.iter().flat_map(TranscriptEntry::to_messages).collect()
    }

    pub(crate) fn push(&mut self, entry: TranscriptEntry) {
        self.transcript.push(entry);
    }

    pub(crate) fn begin_turn(&mut self) -> usize {
        self.cycles = 0;
        self.transcript.len()
    }

    pub(crate) fn count_cycle(&mut self) -> u32 {
        self.cycles += 1;
        self.cycles
    }

    pub(crate) fn usage_mut(&mut self) -> &mut UsageTracker {
        &mut self.usage
    }

    /// Drop everything appended after `len`
    pub(crate) fn rollback(&mut self, len: usize) {
        self.transcript.truncate(len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use returns_core::Role;
    use serde_json::json;

    #[test]
    fn test_new_sessions_are_distinct() {
        let a = Session::new();
        let b = Session::new();
        assert_ne!(a.id(), b.id());
        assert!(a.id().starts_with("session_"));
        assert!(a.is_empty());
    }

    #[test]
    fn test_to_messages_keeps_order() {
        let call = ToolCall::new("c1", "lookup_order", json!({"order_id": "ORD-001"}));
        let mut session = Session::with_id("s1");
        session.push(TranscriptEntry::User("Can I return ORD-001?".into()));
        session.push(TranscriptEntry::ToolCalls {
            content: None,
            calls: vec![call.clone()],
        });
        session.push(TranscriptEntry::ToolResults(vec![
            ToolResult::ok(&call, json!({"found": true})),
        ]));
        session.push(TranscriptEntry::Assistant("Yes you can.".into()));

        let messages = session.to_messages();
        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::Tool, Role::Assistant]);
        assert_eq!(messages[2].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(messages[2].content.as_deref(), Some(r#"{"found":true}"#));
        assert!(!messages[2].is_error);
    }

    #[test]
    fn test_failed_results_are_flagged() {
        let call = ToolCall::new("c9", "cancel_order", json!({}));
        let entry = TranscriptEntry::ToolResults(vec![ToolResult {
            tool_call_id: call.id.clone(),
            name: call.name.clone(),
            payload: json!({"error": "UnknownTool"}),
            success: false,
        }]);
        assert!(entry.to_messages()[0].is_error);
    }

    #[test]
    fn test_rollback() {
        let mut session = Session::with_id("s1");
        session.push(TranscriptEntry::User("first".into()));
        session.push(TranscriptEntry::Assistant("ok".into()));

        let mark = session.begin_turn();
        session.push(TranscriptEntry::User("second".into()));
        session.count_cycle();
        session.rollback(mark);

        assert_eq!(session.transcript().len(), 2);
        assert_eq!(session.cycles(), 1);
    }
}

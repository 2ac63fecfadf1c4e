//! Agent implementation - the think/act loop over one session

use crate::prompt::system_prompt;
use crate::session::{Session, TranscriptEntry};
use chrono::{Local, NaiveDate};
use returns_core::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmProvider, ToolCall, ToolRegistry,
    ToolResult, Usage,
};
use returns_error::{Error, ErrorKind, Result};
use tracing::{debug, info, warn};

/// Default cap on LLM calls per user turn
pub const DEFAULT_MAX_CYCLES: u32 = 8;

/// Answer given when the cycle cap is hit before the model produced any text
pub const FALLBACK_MESSAGE: &str = "I'm sorry, I wasn't able to resolve your request. \
     Please try rephrasing it or contact our support team directly.";

/// Configuration for the agent
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Maximum LLM invocations per user turn
    pub max_cycles: u32,
    /// Model override; `None` uses the provider's default
    pub model: Option<String>,
    pub temperature: f32,
    pub max_tokens: usize,
    /// Extra instructions placed near the top of the system prompt
    pub preamble: Option<String>,
    pub fallback_message: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_cycles: DEFAULT_MAX_CYCLES,
            model: None,
            temperature: 0.0,
            max_tokens: 1024,
            preamble: None,
            fallback_message: FALLBACK_MESSAGE.to_string(),
        }
    }
}

impl AgentConfig {
    pub fn with_max_cycles(mut self, max_cycles: u32) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_preamble(mut self, preamble: impl Into<String>) -> Self {
        self.preamble = Some(preamble.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_cycles == 0 {
            return Err(Error::new(ErrorKind::ConfigInvalid, "max_cycles must be at least 1")
                .with_operation("agent::config"));
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(Error::new(
                ErrorKind::ConfigInvalid,
                format!("temperature {} is outside 0.0..=1.0", self.temperature),
            )
            .with_operation("agent::config"));
        }
        Ok(())
    }
}

/// Why a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The model answered in plain text
    Answered,
    /// The cycle cap was reached; the answer is partial text or the fallback
    CycleLimit,
}

/// One executed tool call, for display
#[derive(Debug, Clone)]
pub struct ToolStep {
    pub call: ToolCall,
    pub result: ToolResult,
}

/// Result of one user turn
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub answer: String,
    pub termination: Termination,
    /// LLM calls made this turn
    pub cycles: u32,
    pub steps: Vec<ToolStep>,
    /// Tokens spent this turn
    pub usage: Usage,
}

/// Where the loop is within a turn
#[derive(Debug)]
enum LoopState {
    ModelThinking,
    ExecutingTool(Vec<ToolCall>),
    Responding(String),
}

/// The returns-desk agent: a provider, the tools, and the loop between them.
///
/// The agent holds no conversation state; everything per-conversation lives
/// in the [`Session`] passed to [`submit`](Agent::submit).
pub struct Agent<P: LlmProvider> {
    provider: P,
    tools: ToolRegistry,
    config: AgentConfig,
    today: NaiveDate,
}

impl<P: LlmProvider> Agent<P> {
    pub fn new(provider: P, tools: ToolRegistry) -> Self {
        Self {
            provider,
            tools,
            config: AgentConfig::default(),
            today: Local::now().date_naive(),
        }
    }

    pub fn with_config(mut self, config: AgentConfig) -> Result<Self> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Pin the date the system prompt reports
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    pub fn system_prompt(&self) -> String {
        system_prompt(
            self.today,
            &self.tools.definitions(),
            self.config.preamble.as_deref(),
        )
    }

    /// Run one user turn to completion and return the answer.
    ///
    /// On an upstream failure the session's transcript is restored to what it
    /// was before the call, so the same text can be submitted again.
    pub async fn submit(&self, session: &mut Session, text: &str) -> Result<TurnOutcome> {
        let mark = session.begin_turn();
        session.push(TranscriptEntry::User(text.to_string()));
        info!(session = %session.id(), "user turn started");

        match self.run_turn(session).await {
            Ok(outcome) => {
                info!(
                    session = %session.id(),
                    cycles = outcome.cycles,
                    tools = outcome.steps.len(),
                    termination = ?outcome.termination,
                    "user turn finished"
                );
                Ok(outcome)
            }
            Err(err) => {
                warn!(session = %session.id(), error = %err, "turn aborted, transcript restored");
                session.rollback(mark);
                Err(err)
            }
        }
    }

    async fn run_turn(&self, session: &mut Session) -> Result<TurnOutcome> {
        let mut state = LoopState::ModelThinking;
        let mut steps = Vec::new();
        let mut usage = Usage::default();
        // Last non-empty text the model produced this turn
        let mut partial: Option<String> = None;

        loop {
            state = match state {
                LoopState::ModelThinking => {
                    if session.cycles() >= self.config.max_cycles {
                        warn!(
                            session = %session.id(),
                            max_cycles = self.config.max_cycles,
                            "cycle limit reached"
                        );
                        let answer = partial
                            .take()
                            .unwrap_or_else(|| self.config.fallback_message.clone());
                        return Ok(self.finish(session, answer, Termination::CycleLimit, steps, usage));
                    }

                    let cycle = session.count_cycle();
                    let response = self.think(session, cycle).await?;

                    let model = if response.model.is_empty() {
                        self.provider.default_model().to_string()
                    } else {
                        response.model.clone()
                    };
                    session.usage_mut().track(&model, &response.usage);
                    usage.prompt_tokens += response.usage.prompt_tokens;
                    usage.completion_tokens += response.usage.completion_tokens;
                    usage.total_tokens += response.usage.total_tokens;

                    let text = response.content.filter(|t| !t.trim().is_empty());
                    if let Some(text) = &text {
                        partial = Some(text.clone());
                    }

                    if response.tool_calls.is_empty() {
                        LoopState::Responding(text.or_else(|| partial.take()).unwrap_or_default())
                    } else {
                        debug!(cycle, calls = response.tool_calls.len(), "model requested tools");
                        session.push(TranscriptEntry::ToolCalls {
                            content: text,
                            calls: response.tool_calls.clone(),
                        });
                        LoopState::ExecutingTool(response.tool_calls)
                    }
                }

                LoopState::ExecutingTool(calls) => {
                    let mut results = Vec::with_capacity(calls.len());
                    for call in calls {
                        let result = self.tools.dispatch(&call);
                        results.push(result.clone());
                        steps.push(ToolStep { call, result });
                    }
                    session.push(TranscriptEntry::ToolResults(results));
                    LoopState::ModelThinking
                }

                LoopState::Responding(answer) => {
                    let answer = if answer.is_empty() {
                        self.config.fallback_message.clone()
                    } else {
                        answer
                    };
                    return Ok(self.finish(session, answer, Termination::Answered, steps, usage));
                }
            };
        }
    }

    /// One LLM invocation over the full transcript
    async fn think(&self, session: &Session, cycle: u32) -> Result<CompletionResponse> {
        let mut messages = vec![ChatMessage::system(self.system_prompt())];
        messages.extend(session.to_messages());

        let mut request = CompletionRequest::new(messages)
            .with_temperature(self.config.temperature)
            .with_max_tokens(self.config.max_tokens)
            .with_tools(self.tools.definitions());
        if let Some(model) = &self.config.model {
            request = request.with_model(model.clone());
        }

        debug!(
            session = %session.id(),
            cycle,
            messages = request.messages.len(),
            provider = self.provider.name(),
            "invoking model"
        );

        self.provider.complete(request).await.map_err(|e| {
            e.into_error(self.provider.name())
                .with_operation("agent::think")
                .with_context("cycle", cycle.to_string())
        })
    }

    fn finish(
        &self,
        session: &mut Session,
        answer: String,
        termination: Termination,
        steps: Vec<ToolStep>,
        usage: Usage,
    ) -> TurnOutcome {
        session.push(TranscriptEntry::Assistant(answer.clone()));
        TurnOutcome {
            answer,
            termination,
            cycles: session.cycles(),
            steps,
            usage,
        }
    }
}

//! # Returns Desk Agent
//!
//! The agent runs the think/act loop for one user turn:
//! 1. The user's message is appended to the session transcript
//! 2. The model sees the whole transcript plus the tool schemas
//! 3. If it asks for tools, each call is dispatched in order and the results
//!    are appended as one batch
//! 4. Repeat until the model answers in plain text or the cycle cap is hit
//!
//! Continuity across turns comes only from replaying the transcript.

mod agent;
mod prompt;
mod session;

pub use agent::{
    Agent, AgentConfig, Termination, ToolStep, TurnOutcome, DEFAULT_MAX_CYCLES, FALLBACK_MESSAGE,
};
pub use prompt::system_prompt;
pub use session::{Session, TranscriptEntry};

//! Error kinds for returns desk operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on ErrorKind to tell expected business outcomes
/// (an unknown order, a return outside the window) apart from failures
/// of the model provider or the process environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// Invalid configuration or missing credentials
    ConfigInvalid,

    // =========================================================================
    // Order/Policy errors
    // =========================================================================
    /// No order with the given identifier exists
    OrderNotFound,

    /// The order is outside the return window or flagged ineligible
    ReturnIneligible,

    // =========================================================================
    // Tool errors
    // =========================================================================
    /// The model asked for a tool that is not registered
    UnknownTool,

    /// Invalid argument passed to a tool or function
    InvalidArgument,

    // =========================================================================
    // Inference/LLM errors
    // =========================================================================
    /// LLM inference failed
    InferenceFailed,

    /// Provider rejected the credential
    AuthenticationFailed,

    /// Provider not available
    ProviderUnavailable,

    /// Rate limit exceeded
    RateLimited,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// IO operation failed
    IoFailed,

    /// Network error
    NetworkFailed,

    // =========================================================================
    // Parse errors
    // =========================================================================
    /// Failed to parse input
    ParseFailed,

    /// Serialization/deserialization failed
    SerializationFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            // General
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            // Order/Policy
            ErrorKind::OrderNotFound => "OrderNotFound",
            ErrorKind::ReturnIneligible => "ReturnIneligible",

            // Tool
            ErrorKind::UnknownTool => "UnknownTool",
            ErrorKind::InvalidArgument => "InvalidArgument",

            // Inference
            ErrorKind::InferenceFailed => "InferenceFailed",
            ErrorKind::AuthenticationFailed => "AuthenticationFailed",
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",
            ErrorKind::RateLimited => "RateLimited",

            // IO
            ErrorKind::IoFailed => "IoFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",

            // Parse
            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::SerializationFailed => "SerializationFailed",
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::NetworkFailed
                | ErrorKind::RateLimited
                | ErrorKind::ProviderUnavailable
        )
    }

    /// Whether this kind originates at the model provider boundary
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ErrorKind::InferenceFailed
                | ErrorKind::ParseFailed
                | ErrorKind::AuthenticationFailed
                | ErrorKind::ProviderUnavailable
                | ErrorKind::RateLimited
                | ErrorKind::NetworkFailed
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

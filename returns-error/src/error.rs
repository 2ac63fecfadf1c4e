//! The main Error type for the returns desk

use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// The unified error type for all returns desk operations.
///
/// This error type provides:
/// - `kind`: What type of error occurred
/// - `message`: Human-readable description
/// - `status`: Whether the error is retryable
/// - `operation`: What operation caused the error
/// - `context`: Key-value pairs for debugging
/// - `source`: The underlying error (if any)
///
/// # Example
///
/// ```rust
/// use returns_error::{Error, ErrorKind, ErrorStatus};
///
/// let err = Error::new(ErrorKind::InferenceFailed, "model returned empty response")
///     .with_operation("agent::think")
///     .with_status(ErrorStatus::Temporary)
///     .with_context("model", "claude-sonnet-4")
///     .with_context("cycle", "2");
///
/// assert_eq!(err.kind(), ErrorKind::InferenceFailed);
/// assert!(err.status().is_retryable());
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// Create a new error with the given kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        let status = if kind.is_retryable() {
            ErrorStatus::Temporary
        } else {
            ErrorStatus::Permanent
        };

        Self {
            kind,
            message: message.into(),
            status,
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    // =========================================================================
    // Getters
    // =========================================================================

    /// Get the error kind
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the error status
    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    /// Get the operation that caused this error
    pub fn operation(&self) -> &'static str {
        self.operation
    }

    /// Get the context key-value pairs
    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Look up a single context value by key
    pub fn context_value(&self, key: &str) -> Option<&str> {
        self.context
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Get the source error (if any)
    pub fn source_ref(&self) -> Option<&anyhow::Error> {
        self.source.as_ref()
    }

    // =========================================================================
    // Builders (chainable)
    // =========================================================================

    /// Set the error status
    pub fn with_status(mut self, status: ErrorStatus) -> Self {
        self.status = status;
        self
    }

    /// Mark as temporary (retryable)
    pub fn temporary(mut self) -> Self {
        self.status = ErrorStatus::Temporary;
        self
    }

    /// Mark as permanent (not retryable)
    pub fn permanent(mut self) -> Self {
        self.status = ErrorStatus::Permanent;
        self
    }

    /// Set the operation that caused this error.
    ///
    /// If an operation was already set, the previous one is moved to context
    /// as "called" to preserve the call chain.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            self.context.push(("called", self.operation.to_string()));
        }
        self.operation = operation;
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Set the source error.
    ///
    /// # Panics (debug only)
    /// Panics in debug mode if source was already set.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source error already set");
        self.source = Some(source.into());
        self
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }
}

// =============================================================================
// Display - compact, single-line format for logs
// =============================================================================

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.kind, self.status)?;

        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }

        if !self.context.is_empty() {
            write!(f, ", context {{ ")?;
            for (i, (key, value)) in self.context.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: {}", key, value)?;
            }
            write!(f, " }}")?;
        }

        if !self.message.is_empty() {
            write!(f, " => {}", self.message)?;
        }

        Ok(())
    }
}

// =============================================================================
// Debug - verbose, multi-line format for debugging
// =============================================================================

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({}) at {}", self.kind, self.status, self.operation)?;

        if !self.message.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Message: {}", self.message)?;
        }

        if !self.context.is_empty() {
            writeln!(f)?;
            writeln!(f, "    Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "        {}: {}", key, value)?;
            }
        }

        if let Some(source) = &self.source {
            writeln!(f)?;
            writeln!(f, "    Source: {:?}", source)?;
        }

        Ok(())
    }
}

// =============================================================================
// std::error::Error implementation
// =============================================================================

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

// =============================================================================
// Convenient From implementations (be careful not to leak raw errors!)
// =============================================================================

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::new(ErrorKind::IoFailed, err.to_string())
            .with_operation("io")
            .set_source(err)
    }
}

// =============================================================================
// Convenience constructors
// =============================================================================

impl Error {
    /// Create a ConfigInvalid error for a missing environment variable
    pub fn missing_env(var: &'static str) -> Self {
        Self::new(
            ErrorKind::ConfigInvalid,
            format!("environment variable {} is not set", var),
        )
        .with_context("variable", var)
    }

    /// Create an OrderNotFound error
    pub fn order_not_found(order_id: impl Into<String>) -> Self {
        let order_id = order_id.into();
        Self::new(ErrorKind::OrderNotFound, format!("order '{}' not found", order_id))
            .with_context("order_id", order_id)
    }

    /// Create a ReturnIneligible error
    pub fn return_ineligible(order_id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ReturnIneligible, detail).with_context("order_id", order_id)
    }

    /// Create an UnknownTool error
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(ErrorKind::UnknownTool, format!("unknown tool: {}", name))
            .with_context("tool", name)
    }

    /// Create an InvalidArgument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = Error::new(ErrorKind::OrderNotFound, "order 'ORD-999' not found");
        assert_eq!(err.kind(), ErrorKind::OrderNotFound);
        assert_eq!(err.message(), "order 'ORD-999' not found");
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::new(ErrorKind::InferenceFailed, "timeout")
            .with_operation("agent::think")
            .with_context("model", "claude-sonnet-4")
            .with_context("cycle", "3");

        assert_eq!(err.operation(), "agent::think");
        assert_eq!(err.context().len(), 2);
        assert_eq!(err.context()[0], ("model", "claude-sonnet-4".to_string()));
        assert_eq!(err.context_value("cycle"), Some("3"));
        assert_eq!(err.context_value("missing"), None);
    }

    #[test]
    fn test_operation_chaining() {
        let err = Error::new(ErrorKind::OrderNotFound, "no such order")
            .with_operation("store::lookup")
            .with_operation("refund::calculate");

        assert_eq!(err.operation(), "refund::calculate");
        assert_eq!(err.context().len(), 1);
        assert_eq!(err.context()[0], ("called", "store::lookup".to_string()));
    }

    #[test]
    fn test_temporary_status() {
        let err = Error::new(ErrorKind::RateLimited, "slow down");
        assert!(err.is_retryable());

        let err = Error::new(ErrorKind::ReturnIneligible, "outside window");
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_status_override() {
        let err = Error::new(ErrorKind::NetworkFailed, "connection refused");
        assert!(err.is_retryable());

        let err = err.permanent();
        assert!(!err.is_retryable());
        assert_eq!(err.status(), ErrorStatus::Permanent);
    }

    #[test]
    fn test_display() {
        let err = Error::new(ErrorKind::InferenceFailed, "model unavailable")
            .with_operation("provider::complete")
            .with_context("provider", "anthropic");

        let display = format!("{}", err);
        assert!(display.contains("InferenceFailed"));
        assert!(display.contains("temporary"));
        assert!(display.contains("provider::complete"));
        assert!(display.contains("provider: anthropic"));
        assert!(display.ends_with("=> model unavailable"));
    }

    #[test]
    fn test_display_without_operation() {
        let err = Error::invalid_argument("boom");
        assert_eq!(err.to_string(), "InvalidArgument (permanent) => boom");
    }

    #[test]
    fn test_convenience_constructors() {
        let err = Error::order_not_found("ORD-999");
        assert_eq!(err.kind(), ErrorKind::OrderNotFound);
        assert!(err.message().contains("ORD-999"));
        assert_eq!(err.context_value("order_id"), Some("ORD-999"));

        let err = Error::unknown_tool("delete_order");
        assert_eq!(err.kind(), ErrorKind::UnknownTool);
        assert_eq!(err.context_value("tool"), Some("delete_order"));

        let err = Error::missing_env("ANTHROPIC_API_KEY");
        assert_eq!(err.kind(), ErrorKind::ConfigInvalid);
        assert!(err.message().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_set_source() {
        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err = Error::invalid_argument("tool arguments are not valid JSON").set_source(json_err);

        assert!(err.source_ref().is_some());
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdin closed");
        let err: Error = io_err.into();
        assert_eq!(err.kind(), ErrorKind::IoFailed);
        assert_eq!(err.operation(), "io");
    }
}

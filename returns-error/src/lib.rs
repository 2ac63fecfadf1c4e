//! # returns-error
//!
//! Unified error handling for the returns desk, following OpenDAL's error handling practices.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., OrderNotFound, InferenceFailed)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use returns_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::OrderNotFound, "order 'ORD-999' not found")
//!         .with_operation("store::lookup")
//!         .with_context("order_id", "ORD-999"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All fallible functions return `Result<T, returns_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the returns desk Error
pub type Result<T> = std::result::Result<T, Error>;

//! Returns desk error types
//!
//! Re-exports returns-error so downstream crates only need one import path.

pub use returns_error::{Error, ErrorKind, ErrorStatus, Result};

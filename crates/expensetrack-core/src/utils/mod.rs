//! Utility functions for string formatting and log redaction.

pub mod format;
pub mod redact;

pub use format::{capitalize, format_date, truncate_string};
pub use redact::{redact_json, redacted_body};

//! Contextual Escaper - context-aware output escaping
//!
//! This library escapes untrusted text for safe embedding in HTML body text,
//! HTML attribute values, JavaScript string literals, CSS values and URL
//! components, following the OWASP contextual output-encoding rules.
//!
//! # Architecture
//!
//! The library is structured into several modules:
//! - `encoding`: Supported source encodings and transcoder selection
//! - `codepoint`: Source bytes to codepoints, codepoints to UTF-8
//! - `rules`: Per-context rule tables and immune sets
//! - `escaper`: The [`Escaper`] type and per-context formatting
//! - `error`: Error types
//!
//! # Example
//!
//! ```rust
//! use contextual_escaper::Escaper;
//!
//! let escaper = Escaper::new("iso-8859-1").unwrap();
//! assert_eq!(escaper.escape_html_attribute(b"Caf\xE9"), "Caf&#xE9;");
//! assert_eq!(escaper.escape_url("a+b"), "a%2Bb");
//! ```
//!
//! # Thread Safety
//!
//! [`Escaper`] is immutable after construction and is `Send + Sync`; all
//! escaping operations are pure functions of their input.

pub mod codepoint;
pub mod encoding;
pub mod error;
pub mod escaper;
pub mod rules;

// Re-export main types for convenience
pub use encoding::{SUPPORTED_ENCODINGS, SourceEncoding};
pub use error::{EscaperError, Result};
pub use escaper::Escaper;
pub use rules::Context;

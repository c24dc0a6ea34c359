//! Error types for escaper construction and codepoint handling

use thiserror::Error;

/// Errors that can occur while configuring an escaper or re-encoding codepoints
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscaperError {
    /// Encoding identifier was empty or is not in the supported table
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Value is not a Unicode scalar value (above 0x10FFFF or a lone surrogate)
    #[error("Invalid codepoint: U+{0:04X} is outside the Unicode scalar range")]
    InvalidCodepoint(u32),
}

impl EscaperError {
    /// Get numeric error code
    pub fn code(&self) -> u32 {
        match self {
            EscaperError::InvalidConfiguration(_) => 1,
            EscaperError::InvalidCodepoint(_) => 2,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, EscaperError>;

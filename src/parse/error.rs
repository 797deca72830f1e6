use thiserror::Error;

/// Errors produced when parsing rule DSL input. The message is winnow's
/// rendering of the failure, including the offending input position.
#[derive(Debug, Error)]
#[error("rule DSL parse error: {message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

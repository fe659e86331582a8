use std::error::Error as StdError;

type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// The one error type raised while building JSON output.
///
/// A field whose value fails validation produces an error that carries the
/// offending raw value ([`EncodeError::value`]); encoders record those and keep
/// going. Errors without a value (an illegal list/object mode change, a rendering
/// failure) abort the conversion.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct EncodeError {
    message: String,
    value: Option<String>,
    #[source]
    cause: Option<BoxedCause>,
}

impl EncodeError {
    /// Error with a message only
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            value: None,
            cause: None,
        }
    }

    /// Error raised because `value` failed validation
    pub fn invalid_value(message: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            value: Some(value.into()),
            cause: None,
        }
    }

    /// Attach the underlying cause
    pub fn with_cause(mut self, cause: impl Into<BoxedCause>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub(crate) fn illegal_state() -> Self {
        Self::new("Current state may not change (from list to object or reverse).")
    }

    /// Human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The raw value that failed validation, when the error is about a field value
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// True for field-level validation failures, which do not abort a conversion
    pub fn is_invalid_value(&self) -> bool {
        self.value.is_some()
    }
}

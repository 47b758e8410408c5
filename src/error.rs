use std::fmt;

use thiserror::Error;

/// A boxed error used as the cause of a normalized decode failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Schema Errors
// =============================================================================

/// A single field that failed the structural phase of schema validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// Name of the offending field
    pub field: &'static str,

    /// What was actually supplied (shape, length, value...)
    pub actual: String,

    /// What the field's contract expects
    pub expected: String,
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the field '{}' has {}, but should have {} instead",
            self.field, self.actual, self.expected
        )
    }
}

/// Errors raised by the entity construction gate.
///
/// Every domain entity passes through two validation phases at construction;
/// each phase has its own failure shape.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// Structural phase failed: lists every offending field, numbered.
    #[error("validation errors for entity '{entity}':\n{}", render_violations(.violations))]
    FieldErrors {
        entity: &'static str,
        violations: Vec<FieldViolation>,
    },

    /// Domain-invariant phase failed (single cause, not aggregated).
    #[error("invariant violated for entity '{entity}': {message}")]
    Invariant {
        entity: &'static str,
        message: String,
    },
}

/// Render field violations as a numbered list, one per line.
fn render_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{}. {}", i + 1, v))
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Source Errors
// =============================================================================

/// Errors raised while obtaining a source's raw bytes.
///
/// These are diagnostic and specific: they propagate to callers unmodified so
/// that "the bytes could not be obtained" stays distinguishable from decode
/// failures.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// The location does not resolve to an existing resource.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// No loader is registered for the location's addressing scheme.
    #[error("unsupported source scheme '{scheme}' for location '{location}'")]
    UnsupportedScheme { scheme: String, location: String },

    /// The backing store failed mid-read.
    #[error("I/O error reading '{location}': {message}")]
    Io { location: String, message: String },
}

// =============================================================================
// Decode Errors
// =============================================================================

/// Errors raised by a decoder registry's resolve-and-decode operation.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Byte retrieval failed; propagates the source error unwrapped.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// No registered decoder claims the source's format discriminator.
    #[error("no handler for format '{0}'")]
    NoHandler(String),

    /// Normalized wrapper around any failure during plugin decode or
    /// post-decode validation. Always carries the original failure as its
    /// cause for diagnostics.
    #[error("unable to decode asset from source '{location}'")]
    Failed {
        location: String,
        #[source]
        cause: BoxError,
    },
}

impl DecodeError {
    /// Wrap an arbitrary failure into the normalized decode-failure shape.
    pub fn failed(location: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        DecodeError::Failed {
            location: location.into(),
            cause: cause.into(),
        }
    }
}

// =============================================================================
// Model Errors
// =============================================================================

/// Errors raised by inference backends and model introspection.
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    /// The backend declares more than exactly one input layer.
    ///
    /// This is a hard precondition of the framework, not a backend
    /// limitation: models with multiple named inputs must fail loudly rather
    /// than silently picking one.
    #[error("expected exactly one input layer, found {0} instead")]
    MultipleInputLayers(usize),

    /// The backend rejected the sample or failed during prediction.
    #[error("inference failed: {0}")]
    Inference(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_errors_are_numbered() {
        let err = SchemaError::FieldErrors {
            entity: "Image",
            violations: vec![
                FieldViolation {
                    field: "content",
                    actual: "0 elements".to_string(),
                    expected: "a non-empty buffer".to_string(),
                },
                FieldViolation {
                    field: "resolution",
                    actual: "(0, 0)".to_string(),
                    expected: "a non-degenerate resolution".to_string(),
                },
            ],
        };

        let message = err.to_string();
        assert!(message.contains("entity 'Image'"));
        assert!(message.contains("1. the field 'content'"));
        assert!(message.contains("2. the field 'resolution'"));
    }

    #[test]
    fn test_decode_failed_preserves_cause() {
        let cause = SourceError::Io {
            location: "a.bin".to_string(),
            message: "interrupted".to_string(),
        };
        let err = DecodeError::failed("a.bin", cause);

        assert!(err.to_string().contains("unable to decode asset"));
        let source = std::error::Error::source(&err).expect("cause should be attached");
        assert!(source.to_string().contains("interrupted"));
    }

    #[test]
    fn test_source_error_messages() {
        let not_found = SourceError::NotFound("/tmp/missing.jpg".to_string());
        assert_eq!(not_found.to_string(), "resource not found: /tmp/missing.jpg");

        let scheme = SourceError::UnsupportedScheme {
            scheme: "s3".to_string(),
            location: "s3://bucket/key".to_string(),
        };
        assert!(scheme.to_string().contains("unsupported source scheme 's3'"));
    }

    #[test]
    fn test_no_handler_names_discriminator() {
        let err = DecodeError::NoHandler(".xyz".to_string());
        assert_eq!(err.to_string(), "no handler for format '.xyz'");
    }
}

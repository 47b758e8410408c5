//! Entity construction gate.
//!
//! Every domain object in this crate (source descriptor, decoded image,
//! decoded model) is built through the same two-phase validation discipline,
//! executed once, immediately after the fields are populated and before the
//! object is handed to any caller:
//!
//! 1. **Structural phase** — every declared field is checked against its
//!    structural contract (buffer length vs. shape, non-empty location...).
//!    All violations are accumulated, not just the first, and reported as one
//!    aggregated, numbered error.
//! 2. **Invariant phase** — an entity-specific domain check that may also
//!    normalize fields (e.g. appending a trailing unit axis to a 2-D buffer)
//!    before re-deriving dependent fields.
//!
//! An entity that completes [`SchemaEntity::validated`] without error
//! satisfies both contracts for its entire lifetime: no field is mutated
//! afterwards except the append-only memoization cell on
//! [`Source`](crate::source::Source).
//!
//! The gate itself cannot be instantiated: it is a trait, so "constructing
//! the abstract base directly" is rejected at design time by the compiler.

use crate::error::{FieldViolation, SchemaError};

// =============================================================================
// SchemaEntity
// =============================================================================

/// Two-phase construction contract for domain entities.
///
/// Implementors provide the two phases; callers go through [`validated`],
/// which enforces the strict phase ordering.
///
/// [`validated`]: SchemaEntity::validated
pub trait SchemaEntity: Sized {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    /// Structural phase: check every field against its declared contract.
    ///
    /// Implementations must accumulate **every** violation found rather than
    /// stopping at the first one.
    fn check_fields(&self) -> Vec<FieldViolation>;

    /// Invariant phase: entity-specific domain check.
    ///
    /// May mutate normalizable fields before re-deriving dependent ones.
    /// Failures describe which constraint was violated.
    fn check_invariants(&mut self) -> Result<(), SchemaError>;

    /// Run both phases in strict order and return the validated entity.
    ///
    /// # Errors
    /// - [`SchemaError::FieldErrors`] if any field fails the structural phase
    ///   (aggregated across all offending fields)
    /// - [`SchemaError::Invariant`] if the domain check fails
    fn validated(mut self) -> Result<Self, SchemaError> {
        let violations = self.check_fields();
        if !violations.is_empty() {
            return Err(SchemaError::FieldErrors {
                entity: Self::ENTITY,
                violations,
            });
        }

        self.check_invariants()?;
        Ok(self)
    }

    /// Build an invariant-phase failure for this entity.
    fn invariant_error(message: impl Into<String>) -> SchemaError {
        SchemaError::Invariant {
            entity: Self::ENTITY,
            message: message.into(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

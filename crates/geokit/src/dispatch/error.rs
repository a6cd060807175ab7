//! Error type shared by registration, resolution, and handlers.

use super::types::{OperationKind, ShapeType};

/// Every failure is synchronous and names the attempted operation and type pair.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GeoError {
    /// A handler (or predicate) already exists for this `(kind, from, to)`.
    #[error("duplicate {kind} registration for {from} -> {to}")]
    DuplicateRegistration {
        kind: OperationKind,
        from: ShapeType,
        to: ShapeType,
    },
    /// Registration attempted after `seal()`.
    #[error("registry is sealed; registration is closed")]
    RegistryClosed,
    /// Neither the exact pair nor any ancestor pair is registered.
    #[error("no {kind} handler for {from} -> {to}")]
    NoHandlerFound {
        kind: OperationKind,
        from: ShapeType,
        to: ShapeType,
    },
    /// An eligibility predicate (or a narrowing back to the requested type) said no.
    #[error("{kind} rejected for {from} -> {to}")]
    PredicateRejected {
        kind: OperationKind,
        from: ShapeType,
        to: ShapeType,
    },
    /// The transformable predicate rejected the (transformation, object) pair.
    #[error("transformation {from} is not applicable to {to}")]
    IncompatibleTransform { from: ShapeType, to: ShapeType },
    /// A handler's numeric precondition failed.
    #[error("degenerate shape: {reason}")]
    ShapeDegenerate { reason: String },
    /// The handler shape does not fit the table it was registered into.
    #[error("handler shape does not fit operation kind {kind}")]
    HandlerKindMismatch { kind: OperationKind },
    #[error("capability {variant} -> {capability} is already declared")]
    DuplicateCapability {
        variant: ShapeType,
        capability: ShapeType,
    },
    #[error("capability {variant} -> {capability} would close a cycle")]
    CyclicHierarchy {
        variant: ShapeType,
        capability: ShapeType,
    },
    /// A type-erased handler received a value of the wrong variant.
    #[error("expected a {expected} value, found {found}")]
    TypeMismatch {
        expected: ShapeType,
        found: ShapeType,
    },
}

impl GeoError {
    #[inline]
    pub fn degenerate(reason: impl Into<String>) -> Self {
        GeoError::ShapeDegenerate {
            reason: reason.into(),
        }
    }
}

//! Interoperability core: type-pair-indexed operation registry and dispatcher.
//!
//! Purpose
//! - Let heterogeneous geometric variants cast, transform, approximate, bound,
//!   and measure overlap with each other without knowing each other.
//! - Keep formulas out of the core: handlers are registered per `(kind, from, to)`
//!   by the modules that provide the variants.
//!
//! Why this design
//! - `TypeId` tokens plus type-erased handlers recovered via checked downcast;
//!   no global state. A `Registry` is built explicitly, sealed once, and then
//!   shared by reference (`&Registry` is `Send + Sync`).
//! - Fallback goes through an explicit capability DAG (`Hierarchy`) instead of
//!   inheritance. No automatic chaining of registered handlers.
//!
//! Cross-refs: `Registry::lookup` (resolution order), `Dispatcher` (conversions
//! around widened sides), `crate::builtin_registry`.

mod dispatcher;
mod error;
mod hierarchy;
mod registry;
mod types;

pub use dispatcher::Dispatcher;
pub use error::GeoError;
pub use hierarchy::{Ancestor, Hierarchy};
pub use registry::{
    CastablePredicateFn, Entry, Handler, JoinFn, Phase, Predicate, Registry, Resolution,
    TransformFn, TransformablePredicateFn, UnaryFn,
};
pub use types::{BoundDirection, Geometric, JoinVolume, OperationKind, ShapeType, TypeKey};

//! Type tokens, operation kinds, and the `Geometric` capability trait.
//!
//! - `ShapeType`: stable per-variant token (`TypeId` + short name for diagnostics).
//! - `TypeKey`: ordered `(from, to)` pair used to index every registry table.
//! - `OperationKind`: the eight tables (five actions, two predicates, join).
//! - `JoinVolume`: intersection/exclusive/union measures of two shapes.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::error::GeoError;

/// Static type token of a geometric variant.
///
/// Equality and hashing use the `TypeId` only; the name is for messages.
#[derive(Clone, Copy, Debug)]
pub struct ShapeType {
    id: TypeId,
    name: &'static str,
}

impl ShapeType {
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        let full = std::any::type_name::<T>();
        Self {
            id: TypeId::of::<T>(),
            name: full.rsplit("::").next().unwrap_or(full),
        }
    }
    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for ShapeType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for ShapeType {}

impl Hash for ShapeType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ShapeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Ordered `(from, to)` pair of type tokens.
///
/// Single-argument kinds: `from` is the input, `to` the result.
/// Transform: `from` is the transformation, `to` the transformed object.
/// JoinVolume: the two operands in call order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TypeKey {
    pub from: ShapeType,
    pub to: ShapeType,
}

impl TypeKey {
    #[inline]
    pub fn new(from: ShapeType, to: ShapeType) -> Self {
        Self { from, to }
    }
    #[inline]
    pub fn of<F: ?Sized + 'static, T: ?Sized + 'static>() -> Self {
        Self::new(ShapeType::of::<F>(), ShapeType::of::<T>())
    }
    #[inline]
    pub fn swapped(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// Registry table selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperationKind {
    Cast,
    Castable,
    Transform,
    Transformable,
    Approx,
    UpperBound,
    LowerBound,
    JoinVolume,
}

impl OperationKind {
    pub const ALL: [OperationKind; 8] = [
        OperationKind::Cast,
        OperationKind::Castable,
        OperationKind::Transform,
        OperationKind::Transformable,
        OperationKind::Approx,
        OperationKind::UpperBound,
        OperationKind::LowerBound,
        OperationKind::JoinVolume,
    ];

    /// Eligibility predicate kind paired with an action kind, if any.
    #[inline]
    pub fn predicate_kind(self) -> Option<OperationKind> {
        match self {
            OperationKind::Cast => Some(OperationKind::Castable),
            OperationKind::Transform => Some(OperationKind::Transformable),
            _ => None,
        }
    }

    #[inline]
    pub fn is_predicate(self) -> bool {
        matches!(self, OperationKind::Castable | OperationKind::Transformable)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Cast => "cast",
            OperationKind::Castable => "castable",
            OperationKind::Transform => "transform",
            OperationKind::Transformable => "transformable",
            OperationKind::Approx => "approx",
            OperationKind::UpperBound => "upper_bound",
            OperationKind::LowerBound => "lower_bound",
            OperationKind::JoinVolume => "join_volume",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a bound: enclosing (`Upper`) or enclosed (`Lower`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BoundDirection {
    Upper,
    Lower,
}

impl BoundDirection {
    #[inline]
    pub fn kind(self) -> OperationKind {
        match self {
            BoundDirection::Upper => OperationKind::UpperBound,
            BoundDirection::Lower => OperationKind::LowerBound,
        }
    }
}

/// Interior measures of two shapes `a` and `b`.
///
/// Invariant: `intersection + a_only + b_only == union` up to rounding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct JoinVolume {
    pub intersection: f64,
    pub a_only: f64,
    pub b_only: f64,
    pub union: f64,
}

impl JoinVolume {
    /// Build from the intersection measure and the two total measures.
    #[inline]
    pub fn from_measures(intersection: f64, a: f64, b: f64) -> Self {
        Self {
            intersection,
            a_only: a - intersection,
            b_only: b - intersection,
            union: a + b - intersection,
        }
    }

    /// Same measures seen from `(b, a)`.
    #[inline]
    pub fn swapped(&self) -> Self {
        Self {
            intersection: self.intersection,
            a_only: self.b_only,
            b_only: self.a_only,
            union: self.union,
        }
    }

    #[inline]
    pub fn as_tuple(&self) -> (f64, f64, f64, f64) {
        (self.intersection, self.a_only, self.b_only, self.union)
    }

    /// Intersection over union; `eps` guards an empty union.
    #[inline]
    pub fn iou(&self, eps: f64) -> f64 {
        self.intersection / self.union.max(eps)
    }

    /// Additivity check with a relative tolerance.
    pub fn is_additive(&self, rel_tol: f64) -> bool {
        let sum = self.intersection + self.a_only + self.b_only;
        (sum - self.union).abs() <= rel_tol * self.union.abs().max(1.0)
    }
}

/// A geometric entity the registry can dispatch on.
///
/// The only capabilities the dispatch core reads are the type identity
/// (`shape_type`) and the dimensionality (`ndim`). `as_any`/`into_any` back
/// the checked downcasts of type-erased handlers; implement them as `self`
/// (the `impl_geometric!` macro does this for the built-in variants).
pub trait Geometric: Any + fmt::Debug + Send + Sync + 'static {
    /// Dimension of the space the entity lives in.
    fn ndim(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    #[inline]
    fn shape_type(&self) -> ShapeType {
        ShapeType::of::<Self>()
    }
}

impl dyn Geometric {
    #[inline]
    pub fn is<T: Geometric>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Checked downcast; `TypeMismatch` names both types on failure.
    pub fn downcast_ref<T: Geometric>(&self) -> Result<&T, GeoError> {
        self.as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| GeoError::TypeMismatch {
                expected: ShapeType::of::<T>(),
                found: self.shape_type(),
            })
    }

    /// Checked downcast of an owned value.
    pub fn downcast<T: Geometric>(self: Box<Self>) -> Result<T, GeoError> {
        let found = self.shape_type();
        self.into_any()
            .downcast::<T>()
            .map(|b| *b)
            .map_err(|_| GeoError::TypeMismatch {
                expected: ShapeType::of::<T>(),
                found,
            })
    }
}

/// Implement `Geometric` for a concrete variant.
///
/// `impl_geometric!(Rect, 2)` for a fixed dimension, or
/// `impl_geometric!(Hyperbox, |b| b.dim())` when it depends on the value.
#[macro_export]
macro_rules! impl_geometric {
    ($ty:ty, |$s:ident| $ndim:expr) => {
        impl $crate::dispatch::Geometric for $ty {
            #[inline]
            fn ndim(&self) -> usize {
                let $s = self;
                $ndim
            }
            #[inline]
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
            #[inline]
            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
                self
            }
        }
    };
    ($ty:ty, $ndim:expr) => {
        $crate::impl_geometric!($ty, |_s| $ndim);
    };
}

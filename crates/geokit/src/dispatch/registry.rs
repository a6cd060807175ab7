//! Operation registry: `(OperationKind, TypeKey)` → handler, Open → Sealed.
//!
//! Invariants
//! - At most one entry per `(kind, key)`; duplicates are rejected, never replaced.
//! - Registration requires `&mut self` and the Open phase; lookups take `&self`.
//! - After `seal()` nothing mutates, so a `&Registry` can be shared across
//!   threads and read without locks.
//!
//! Resolution (`lookup`) tries the exact pair, then widens the `to` side
//! through its ancestors, then widens the `from` side one ancestor at a time
//! (each time retrying the original `to` and then its ancestors).

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::error::GeoError;
use super::hierarchy::{Ancestor, Capability, Hierarchy};
use super::types::{Geometric, JoinVolume, OperationKind, ShapeType, TypeKey};

/// `(input) -> result` for Cast, Approx, UpperBound, LowerBound.
pub type UnaryFn =
    Arc<dyn Fn(&dyn Geometric) -> Result<Box<dyn Geometric>, GeoError> + Send + Sync>;
/// `(transformation, object) -> result` for Transform.
pub type TransformFn = Arc<
    dyn Fn(&dyn Geometric, &dyn Geometric) -> Result<Box<dyn Geometric>, GeoError> + Send + Sync,
>;
/// `(a, b) -> measures` for JoinVolume.
pub type JoinFn =
    Arc<dyn Fn(&dyn Geometric, &dyn Geometric) -> Result<JoinVolume, GeoError> + Send + Sync>;
/// Castable predicate on the source instance.
pub type CastablePredicateFn = Arc<dyn Fn(&dyn Geometric) -> Result<bool, GeoError> + Send + Sync>;
/// Transformable predicate on the (transformation, object) instances.
pub type TransformablePredicateFn =
    Arc<dyn Fn(&dyn Geometric, &dyn Geometric) -> Result<bool, GeoError> + Send + Sync>;

/// Type-erased action handler. The variant must fit the kind it is registered under.
#[derive(Clone)]
pub enum Handler {
    Unary(UnaryFn),
    Transform(TransformFn),
    Join(JoinFn),
}

impl Handler {
    /// Wrap a typed `(S) -> T` function.
    pub fn unary<S: Geometric, T: Geometric>(
        f: impl Fn(&S) -> Result<T, GeoError> + Send + Sync + 'static,
    ) -> Self {
        Handler::Unary(Arc::new(move |obj: &dyn Geometric| {
            let s = obj.downcast_ref::<S>()?;
            Ok(Box::new(f(s)?) as Box<dyn Geometric>)
        }))
    }

    /// Wrap a typed `(F, O) -> R` transform.
    pub fn transform<F: Geometric, O: Geometric, R: Geometric>(
        f: impl Fn(&F, &O) -> Result<R, GeoError> + Send + Sync + 'static,
    ) -> Self {
        Handler::Transform(Arc::new(
            move |tfm: &dyn Geometric, obj: &dyn Geometric| {
                let t = tfm.downcast_ref::<F>()?;
                let o = obj.downcast_ref::<O>()?;
                Ok(Box::new(f(t, o)?) as Box<dyn Geometric>)
            },
        ))
    }

    /// Wrap a typed `(A, B) -> JoinVolume`.
    pub fn join<A: Geometric, B: Geometric>(
        f: impl Fn(&A, &B) -> Result<JoinVolume, GeoError> + Send + Sync + 'static,
    ) -> Self {
        Handler::Join(Arc::new(move |a: &dyn Geometric, b: &dyn Geometric| {
            f(a.downcast_ref::<A>()?, b.downcast_ref::<B>()?)
        }))
    }

    pub fn fits(&self, kind: OperationKind) -> bool {
        matches!(
            (self, kind),
            (
                Handler::Unary(_),
                OperationKind::Cast
                    | OperationKind::Approx
                    | OperationKind::UpperBound
                    | OperationKind::LowerBound
            ) | (Handler::Transform(_), OperationKind::Transform)
                | (Handler::Join(_), OperationKind::JoinVolume)
        )
    }
}

/// Type-erased eligibility predicate.
#[derive(Clone)]
pub enum Predicate {
    Castable(CastablePredicateFn),
    Transformable(TransformablePredicateFn),
}

impl Predicate {
    pub fn castable<S: Geometric>(f: impl Fn(&S) -> bool + Send + Sync + 'static) -> Self {
        Predicate::Castable(Arc::new(move |obj: &dyn Geometric| {
            Ok(f(obj.downcast_ref::<S>()?))
        }))
    }

    pub fn transformable<F: Geometric, O: Geometric>(
        f: impl Fn(&F, &O) -> bool + Send + Sync + 'static,
    ) -> Self {
        Predicate::Transformable(Arc::new(
            move |tfm: &dyn Geometric, obj: &dyn Geometric| {
                Ok(f(tfm.downcast_ref::<F>()?, obj.downcast_ref::<O>()?))
            },
        ))
    }

    pub fn fits(&self, kind: OperationKind) -> bool {
        matches!(
            (self, kind),
            (Predicate::Castable(_), OperationKind::Castable)
                | (Predicate::Transformable(_), OperationKind::Transformable)
        )
    }
}

/// Stored table entry.
#[derive(Clone)]
pub enum Entry {
    Handler(Handler),
    Predicate(Predicate),
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Entry::Handler(Handler::Unary(_)) => "Handler::Unary",
            Entry::Handler(Handler::Transform(_)) => "Handler::Transform",
            Entry::Handler(Handler::Join(_)) => "Handler::Join",
            Entry::Predicate(Predicate::Castable(_)) => "Predicate::Castable",
            Entry::Predicate(Predicate::Transformable(_)) => "Predicate::Transformable",
        };
        f.write_str(tag)
    }
}

/// Registry lifecycle phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Open,
    Sealed,
}

/// Outcome of a successful lookup.
///
/// `from_path`/`to_path` are the hierarchy edges walked on each side; both are
/// empty for an exact match.
#[derive(Clone, Debug)]
pub struct Resolution<'r> {
    pub kind: OperationKind,
    pub requested: TypeKey,
    pub resolved: TypeKey,
    pub from_path: Vec<usize>,
    pub to_path: Vec<usize>,
    entry: &'r Entry,
}

impl<'r> Resolution<'r> {
    #[inline]
    pub fn is_exact(&self) -> bool {
        self.from_path.is_empty() && self.to_path.is_empty()
    }
    #[inline]
    pub fn entry(&self) -> &'r Entry {
        self.entry
    }
    #[inline]
    pub fn handler(&self) -> Option<&'r Handler> {
        match self.entry {
            Entry::Handler(h) => Some(h),
            Entry::Predicate(_) => None,
        }
    }
    #[inline]
    pub fn predicate(&self) -> Option<&'r Predicate> {
        match self.entry {
            Entry::Predicate(p) => Some(p),
            Entry::Handler(_) => None,
        }
    }
}

pub struct Registry {
    phase: Phase,
    tables: HashMap<OperationKind, HashMap<TypeKey, Entry>>,
    hierarchy: Hierarchy,
    // Filled by `seal()`; before that, lineages are computed per lookup.
    lineages: HashMap<ShapeType, Vec<Ancestor>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(OperationKind, usize)> = OperationKind::ALL
            .iter()
            .map(|&k| (k, self.len(k)))
            .collect();
        counts.retain(|&(_, n)| n > 0);
        f.debug_struct("Registry")
            .field("phase", &self.phase)
            .field("entries", &counts)
            .field("capabilities", &self.hierarchy.len())
            .finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            phase: Phase::Open,
            tables: HashMap::new(),
            hierarchy: Hierarchy::default(),
            lineages: HashMap::new(),
        }
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[inline]
    pub fn is_sealed(&self) -> bool {
        self.phase == Phase::Sealed
    }

    #[inline]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Number of entries registered under `kind`.
    pub fn len(&self, kind: OperationKind) -> usize {
        self.tables.get(&kind).map_or(0, HashMap::len)
    }

    /// Whether an entry exists for exactly `(kind, from, to)` (no fallback).
    pub fn contains(&self, kind: OperationKind, from: ShapeType, to: ShapeType) -> bool {
        self.tables
            .get(&kind)
            .is_some_and(|t| t.contains_key(&TypeKey::new(from, to)))
    }

    /// Store an action handler. Kind is checked against the handler shape.
    pub fn register(
        &mut self,
        kind: OperationKind,
        from: ShapeType,
        to: ShapeType,
        handler: Handler,
    ) -> Result<(), GeoError> {
        if !handler.fits(kind) {
            return Err(GeoError::HandlerKindMismatch { kind });
        }
        self.insert(kind, TypeKey::new(from, to), Entry::Handler(handler))
    }

    /// Store an eligibility predicate (`Castable` or `Transformable`).
    pub fn register_predicate(
        &mut self,
        kind: OperationKind,
        from: ShapeType,
        to: ShapeType,
        predicate: Predicate,
    ) -> Result<(), GeoError> {
        if !predicate.fits(kind) {
            return Err(GeoError::HandlerKindMismatch { kind });
        }
        self.insert(kind, TypeKey::new(from, to), Entry::Predicate(predicate))
    }

    fn insert(&mut self, kind: OperationKind, key: TypeKey, entry: Entry) -> Result<(), GeoError> {
        if self.is_sealed() {
            return Err(GeoError::RegistryClosed);
        }
        let table = self.tables.entry(kind).or_default();
        if table.contains_key(&key) {
            return Err(GeoError::DuplicateRegistration {
                kind,
                from: key.from,
                to: key.to,
            });
        }
        tracing::debug!(kind = %kind, from = %key.from, to = %key.to, "register");
        table.insert(key, entry);
        Ok(())
    }

    pub fn register_cast<S: Geometric, T: Geometric>(
        &mut self,
        f: impl Fn(&S) -> Result<T, GeoError> + Send + Sync + 'static,
    ) -> Result<(), GeoError> {
        self.register(
            OperationKind::Cast,
            ShapeType::of::<S>(),
            ShapeType::of::<T>(),
            Handler::unary(f),
        )
    }

    /// Identity cast `T → T` by clone; the dispatcher never special-cases identity.
    pub fn register_identity<T: Geometric + Clone>(&mut self) -> Result<(), GeoError> {
        self.register_cast::<T, T>(|x| Ok(x.clone()))
    }

    pub fn register_castable<S: Geometric, T: Geometric>(
        &mut self,
        f: impl Fn(&S) -> bool + Send + Sync + 'static,
    ) -> Result<(), GeoError> {
        self.register_predicate(
            OperationKind::Castable,
            ShapeType::of::<S>(),
            ShapeType::of::<T>(),
            Predicate::castable(f),
        )
    }

    pub fn register_transform<F: Geometric, O: Geometric, R: Geometric>(
        &mut self,
        f: impl Fn(&F, &O) -> Result<R, GeoError> + Send + Sync + 'static,
    ) -> Result<(), GeoError> {
        self.register(
            OperationKind::Transform,
            ShapeType::of::<F>(),
            ShapeType::of::<O>(),
            Handler::transform(f),
        )
    }

    pub fn register_transformable<F: Geometric, O: Geometric>(
        &mut self,
        f: impl Fn(&F, &O) -> bool + Send + Sync + 'static,
    ) -> Result<(), GeoError> {
        self.register_predicate(
            OperationKind::Transformable,
            ShapeType::of::<F>(),
            ShapeType::of::<O>(),
            Predicate::transformable(f),
        )
    }

    pub fn register_approx<S: Geometric, T: Geometric>(
        &mut self,
        f: impl Fn(&S) -> Result<T, GeoError> + Send + Sync + 'static,
    ) -> Result<(), GeoError> {
        self.register(
            OperationKind::Approx,
            ShapeType::of::<S>(),
            ShapeType::of::<T>(),
            Handler::unary(f),
        )
    }

    pub fn register_upper_bound<S: Geometric, T: Geometric>(
        &mut self,
        f: impl Fn(&S) -> Result<T, GeoError> + Send + Sync + 'static,
    ) -> Result<(), GeoError> {
        self.register(
            OperationKind::UpperBound,
            ShapeType::of::<S>(),
            ShapeType::of::<T>(),
            Handler::unary(f),
        )
    }

    pub fn register_lower_bound<S: Geometric, T: Geometric>(
        &mut self,
        f: impl Fn(&S) -> Result<T, GeoError> + Send + Sync + 'static,
    ) -> Result<(), GeoError> {
        self.register(
            OperationKind::LowerBound,
            ShapeType::of::<S>(),
            ShapeType::of::<T>(),
            Handler::unary(f),
        )
    }

    pub fn register_join_volume<A: Geometric, B: Geometric>(
        &mut self,
        f: impl Fn(&A, &B) -> Result<JoinVolume, GeoError> + Send + Sync + 'static,
    ) -> Result<(), GeoError> {
        self.register(
            OperationKind::JoinVolume,
            ShapeType::of::<A>(),
            ShapeType::of::<B>(),
            Handler::join(f),
        )
    }

    /// Declare "`V` satisfies capability `C`" with its upcast and narrowing.
    pub fn declare_capability<V: Geometric, C: Geometric>(
        &mut self,
        upcast: impl Fn(&V) -> C + Send + Sync + 'static,
        narrow: impl Fn(&C) -> Option<V> + Send + Sync + 'static,
    ) -> Result<(), GeoError> {
        if self.is_sealed() {
            return Err(GeoError::RegistryClosed);
        }
        let edge = Capability::typed(upcast, narrow);
        tracing::debug!(variant = %edge.variant, capability = %edge.capability, "declare_capability");
        self.hierarchy.declare(edge)
    }

    /// Close registration. Idempotent.
    pub fn seal(&mut self) {
        if self.is_sealed() {
            return;
        }
        let mut types: Vec<ShapeType> = Vec::new();
        for table in self.tables.values() {
            for key in table.keys() {
                types.push(key.from);
                types.push(key.to);
            }
        }
        for ty in types {
            if !self.lineages.contains_key(&ty) {
                let lineage = self.hierarchy.lineage(ty);
                self.lineages.insert(ty, lineage);
            }
        }
        self.phase = Phase::Sealed;
        tracing::info!(
            casts = self.len(OperationKind::Cast),
            transforms = self.len(OperationKind::Transform),
            approx = self.len(OperationKind::Approx),
            upper_bounds = self.len(OperationKind::UpperBound),
            lower_bounds = self.len(OperationKind::LowerBound),
            join_volumes = self.len(OperationKind::JoinVolume),
            capabilities = self.hierarchy.len(),
            "registry sealed"
        );
    }

    fn lineage(&self, ty: ShapeType) -> Cow<'_, [Ancestor]> {
        match self.lineages.get(&ty) {
            Some(l) => Cow::Borrowed(l.as_slice()),
            None => Cow::Owned(self.hierarchy.lineage(ty)),
        }
    }

    /// Resolve `(kind, from, to)`: exact pair first, then ancestors (see module docs).
    pub fn lookup(
        &self,
        kind: OperationKind,
        from: ShapeType,
        to: ShapeType,
    ) -> Option<Resolution<'_>> {
        let table = self.tables.get(&kind)?;
        let requested = TypeKey::new(from, to);
        if let Some(entry) = table.get(&requested) {
            return Some(Resolution {
                kind,
                requested,
                resolved: requested,
                from_path: Vec::new(),
                to_path: Vec::new(),
                entry,
            });
        }
        let from_line = self.lineage(from);
        let to_line = self.lineage(to);
        for f in from_line.iter() {
            for t in to_line.iter() {
                let key = TypeKey::new(f.ty, t.ty);
                if let Some(entry) = table.get(&key) {
                    tracing::debug!(
                        kind = %kind,
                        requested = %requested,
                        resolved = %key,
                        "resolved through capability"
                    );
                    return Some(Resolution {
                        kind,
                        requested,
                        resolved: key,
                        from_path: f.path.clone(),
                        to_path: t.path.clone(),
                        entry,
                    });
                }
            }
        }
        None
    }
}

//! Stateless entry points over a registry: cast, transform, approx, bound, join_volume.
//!
//! Each call resolves once, consults the paired predicate (if any) first, then
//! invokes the handler. Inputs on a widened side are upcast along the edge
//! path before invocation; results on a widened side of a single-argument
//! kind are narrowed back. Transform results are returned as produced.

use super::error::GeoError;
use super::registry::{Handler, Predicate, Registry, Resolution};
use super::types::{BoundDirection, Geometric, JoinVolume, OperationKind, ShapeType, TypeKey};

#[derive(Clone, Copy, Debug)]
pub struct Dispatcher<'r> {
    registry: &'r Registry,
}

#[inline]
fn pick<'a>(
    widened: &'a Option<Box<dyn Geometric>>,
    original: &'a dyn Geometric,
) -> &'a dyn Geometric {
    widened.as_deref().unwrap_or(original)
}

impl<'r> Dispatcher<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        if !registry.is_sealed() {
            tracing::warn!("dispatching on a registry that is still open");
        }
        Self { registry }
    }

    #[inline]
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    /// Convert `obj` into the variant `target`.
    pub fn cast_to(
        &self,
        obj: &dyn Geometric,
        target: ShapeType,
    ) -> Result<Box<dyn Geometric>, GeoError> {
        self.check_castable(obj, target)?;
        self.unary(OperationKind::Cast, obj, target)
    }

    pub fn cast<T: Geometric>(&self, obj: &dyn Geometric) -> Result<T, GeoError> {
        self.cast_to(obj, ShapeType::of::<T>())?.downcast::<T>()
    }

    /// Whether a cast of `obj` to `target` would be attempted: a handler
    /// resolves and the castable predicate (if any) accepts `obj`.
    ///
    /// No handler runs, so a cast whose result must be narrowed back to
    /// `target` can still fail with `PredicateRejected` after `true` here
    /// (e.g. a sheared `Aff2d` to `Sim2d`, which resolves to the `Aff2d`
    /// identity and fails the narrowing).
    pub fn can_cast(&self, obj: &dyn Geometric, target: ShapeType) -> Result<bool, GeoError> {
        if self
            .registry
            .lookup(OperationKind::Cast, obj.shape_type(), target)
            .is_none()
        {
            return Ok(false);
        }
        match self.check_castable(obj, target) {
            Ok(()) => Ok(true),
            Err(GeoError::PredicateRejected { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Apply `tfm` to `obj`. The result variant is whatever the handler produces.
    pub fn transform(
        &self,
        tfm: &dyn Geometric,
        obj: &dyn Geometric,
    ) -> Result<Box<dyn Geometric>, GeoError> {
        let (from, to) = (tfm.shape_type(), obj.shape_type());
        let hierarchy = self.registry.hierarchy();
        if let Some(res) = self.registry.lookup(OperationKind::Transformable, from, to) {
            let t_up = hierarchy.upcast(tfm, &res.from_path)?;
            let o_up = hierarchy.upcast(obj, &res.to_path)?;
            let ok = match res.predicate() {
                Some(Predicate::Transformable(p)) => p(pick(&t_up, tfm), pick(&o_up, obj))?,
                _ => true,
            };
            if !ok {
                return Err(GeoError::IncompatibleTransform { from, to });
            }
        }
        let res = self
            .registry
            .lookup(OperationKind::Transform, from, to)
            .ok_or(GeoError::NoHandlerFound {
                kind: OperationKind::Transform,
                from,
                to,
            })?;
        let t_up = hierarchy.upcast(tfm, &res.from_path)?;
        let o_up = hierarchy.upcast(obj, &res.to_path)?;
        match res.handler() {
            Some(Handler::Transform(f)) => f(pick(&t_up, tfm), pick(&o_up, obj)),
            _ => Err(GeoError::HandlerKindMismatch {
                kind: OperationKind::Transform,
            }),
        }
    }

    /// `transform` with a typed result.
    pub fn transform_into<R: Geometric>(
        &self,
        tfm: &dyn Geometric,
        obj: &dyn Geometric,
    ) -> Result<R, GeoError> {
        self.transform(tfm, obj)?.downcast::<R>()
    }

    pub fn approx_to(
        &self,
        obj: &dyn Geometric,
        target: ShapeType,
    ) -> Result<Box<dyn Geometric>, GeoError> {
        self.unary(OperationKind::Approx, obj, target)
    }

    pub fn approx<T: Geometric>(&self, obj: &dyn Geometric) -> Result<T, GeoError> {
        self.approx_to(obj, ShapeType::of::<T>())?.downcast::<T>()
    }

    pub fn bound_to(
        &self,
        obj: &dyn Geometric,
        target: ShapeType,
        direction: BoundDirection,
    ) -> Result<Box<dyn Geometric>, GeoError> {
        self.unary(direction.kind(), obj, target)
    }

    pub fn bound<T: Geometric>(
        &self,
        obj: &dyn Geometric,
        direction: BoundDirection,
    ) -> Result<T, GeoError> {
        self.bound_to(obj, ShapeType::of::<T>(), direction)?
            .downcast::<T>()
    }

    #[inline]
    pub fn upper_bound<T: Geometric>(&self, obj: &dyn Geometric) -> Result<T, GeoError> {
        self.bound(obj, BoundDirection::Upper)
    }

    #[inline]
    pub fn lower_bound<T: Geometric>(&self, obj: &dyn Geometric) -> Result<T, GeoError> {
        self.bound(obj, BoundDirection::Lower)
    }

    /// Measures of `a` and `b`. Falls back to the `(b, a)` handler with the
    /// exclusive measures swapped back into call order.
    pub fn join_volume(
        &self,
        a: &dyn Geometric,
        b: &dyn Geometric,
    ) -> Result<JoinVolume, GeoError> {
        let (ta, tb) = (a.shape_type(), b.shape_type());
        if let Some(res) = self.registry.lookup(OperationKind::JoinVolume, ta, tb) {
            return self.run_join(&res, a, b);
        }
        if let Some(res) = self.registry.lookup(OperationKind::JoinVolume, tb, ta) {
            tracing::debug!(requested = %TypeKey::new(ta, tb), resolved = %res.resolved, "join_volume on swapped pair");
            return Ok(self.run_join(&res, b, a)?.swapped());
        }
        Err(GeoError::NoHandlerFound {
            kind: OperationKind::JoinVolume,
            from: ta,
            to: tb,
        })
    }

    fn run_join(
        &self,
        res: &Resolution<'_>,
        first: &dyn Geometric,
        second: &dyn Geometric,
    ) -> Result<JoinVolume, GeoError> {
        let hierarchy = self.registry.hierarchy();
        let f_up = hierarchy.upcast(first, &res.from_path)?;
        let s_up = hierarchy.upcast(second, &res.to_path)?;
        match res.handler() {
            Some(Handler::Join(f)) => f(pick(&f_up, first), pick(&s_up, second)),
            _ => Err(GeoError::HandlerKindMismatch {
                kind: OperationKind::JoinVolume,
            }),
        }
    }

    fn check_castable(&self, obj: &dyn Geometric, target: ShapeType) -> Result<(), GeoError> {
        let from = obj.shape_type();
        let Some(res) = self
            .registry
            .lookup(OperationKind::Castable, from, target)
        else {
            return Ok(());
        };
        let up = self.registry.hierarchy().upcast(obj, &res.from_path)?;
        let ok = match res.predicate() {
            Some(Predicate::Castable(p)) => p(pick(&up, obj))?,
            _ => true,
        };
        if ok {
            Ok(())
        } else {
            Err(GeoError::PredicateRejected {
                kind: OperationKind::Cast,
                from,
                to: target,
            })
        }
    }

    // Shared path of cast, approx and bound.
    fn unary(
        &self,
        kind: OperationKind,
        obj: &dyn Geometric,
        target: ShapeType,
    ) -> Result<Box<dyn Geometric>, GeoError> {
        let from = obj.shape_type();
        let res = self
            .registry
            .lookup(kind, from, target)
            .ok_or(GeoError::NoHandlerFound {
                kind,
                from,
                to: target,
            })?;
        let hierarchy = self.registry.hierarchy();
        let up = hierarchy.upcast(obj, &res.from_path)?;
        let out = match res.handler() {
            Some(Handler::Unary(f)) => f(pick(&up, obj))?,
            _ => return Err(GeoError::HandlerKindMismatch { kind }),
        };
        if res.to_path.is_empty() {
            return Ok(out);
        }
        hierarchy
            .narrow(out, &res.to_path)?
            .ok_or(GeoError::PredicateRejected {
                kind,
                from,
                to: target,
            })
    }
}

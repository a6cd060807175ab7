//! Capability DAG: "variant V satisfies capability C".
//!
//! Edges are consulted only when exact resolution misses. Each edge carries an
//! upcast `V → C` (used to feed a widened input to a handler) and a narrowing
//! `C → Option<V>` (used to bring a widened result back to the requested type).
//!
//! Ancestor order is breadth-first over edges in declaration order, so the
//! walk is deterministic and nearest ancestors come first.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use super::error::GeoError;
use super::types::{Geometric, ShapeType};

pub(crate) type UpcastFn =
    Arc<dyn Fn(&dyn Geometric) -> Result<Box<dyn Geometric>, GeoError> + Send + Sync>;
pub(crate) type NarrowFn =
    Arc<dyn Fn(&dyn Geometric) -> Result<Option<Box<dyn Geometric>>, GeoError> + Send + Sync>;

/// One declared edge.
#[derive(Clone)]
pub(crate) struct Capability {
    pub variant: ShapeType,
    pub capability: ShapeType,
    pub upcast: UpcastFn,
    pub narrow: NarrowFn,
}

impl Capability {
    pub(crate) fn typed<V: Geometric, C: Geometric>(
        upcast: impl Fn(&V) -> C + Send + Sync + 'static,
        narrow: impl Fn(&C) -> Option<V> + Send + Sync + 'static,
    ) -> Self {
        let up: UpcastFn = Arc::new(move |obj: &dyn Geometric| {
            let v = obj.downcast_ref::<V>()?;
            Ok(Box::new(upcast(v)) as Box<dyn Geometric>)
        });
        let down: NarrowFn = Arc::new(move |obj: &dyn Geometric| {
            let c = obj.downcast_ref::<C>()?;
            Ok(narrow(c).map(|v| Box::new(v) as Box<dyn Geometric>))
        });
        Self {
            variant: ShapeType::of::<V>(),
            capability: ShapeType::of::<C>(),
            upcast: up,
            narrow: down,
        }
    }
}

/// A type reached by widening, with the edge indices walked from the start type.
///
/// The start type itself appears with an empty path.
#[derive(Clone, Debug, PartialEq)]
pub struct Ancestor {
    pub ty: ShapeType,
    pub path: Vec<usize>,
}

#[derive(Clone, Default)]
pub struct Hierarchy {
    edges: Vec<Capability>,
}

impl Hierarchy {
    #[inline]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub(crate) fn declare(&mut self, edge: Capability) -> Result<(), GeoError> {
        let (variant, capability) = (edge.variant, edge.capability);
        if self
            .edges
            .iter()
            .any(|e| e.variant == variant && e.capability == capability)
        {
            return Err(GeoError::DuplicateCapability {
                variant,
                capability,
            });
        }
        if variant == capability || self.satisfies(capability, variant) {
            return Err(GeoError::CyclicHierarchy {
                variant,
                capability,
            });
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Direct capabilities of `ty`, in declaration order.
    pub fn parents(&self, ty: ShapeType) -> impl Iterator<Item = ShapeType> + '_ {
        self.edges
            .iter()
            .filter(move |e| e.variant == ty)
            .map(|e| e.capability)
    }

    /// Whether `variant` reaches `capability` through one or more edges.
    pub fn satisfies(&self, variant: ShapeType, capability: ShapeType) -> bool {
        self.lineage(variant)
            .iter()
            .skip(1)
            .any(|a| a.ty == capability)
    }

    /// `ty` followed by all of its ancestors, nearest first.
    pub fn lineage(&self, ty: ShapeType) -> Vec<Ancestor> {
        let mut out = vec![Ancestor {
            ty,
            path: Vec::new(),
        }];
        let mut seen: HashSet<ShapeType> = HashSet::new();
        seen.insert(ty);
        let mut queue: VecDeque<usize> = VecDeque::new();
        queue.push_back(0);
        while let Some(k) = queue.pop_front() {
            let cur = out[k].ty;
            for (idx, edge) in self.edges.iter().enumerate() {
                if edge.variant != cur || !seen.insert(edge.capability) {
                    continue;
                }
                let mut path = out[k].path.clone();
                path.push(idx);
                out.push(Ancestor {
                    ty: edge.capability,
                    path,
                });
                queue.push_back(out.len() - 1);
            }
        }
        out
    }

    /// Upcast `obj` along `path`. `None` for an empty path (use `obj` as is).
    pub(crate) fn upcast(
        &self,
        obj: &dyn Geometric,
        path: &[usize],
    ) -> Result<Option<Box<dyn Geometric>>, GeoError> {
        let mut cur: Option<Box<dyn Geometric>> = None;
        for &idx in path {
            let next = match cur.as_deref() {
                Some(prev) => (self.edges[idx].upcast)(prev)?,
                None => (self.edges[idx].upcast)(obj)?,
            };
            cur = Some(next);
        }
        Ok(cur)
    }

    /// Narrow a value typed as the end of `path` back to the start of `path`.
    ///
    /// `Ok(None)` if some edge refuses the value.
    pub(crate) fn narrow(
        &self,
        obj: Box<dyn Geometric>,
        path: &[usize],
    ) -> Result<Option<Box<dyn Geometric>>, GeoError> {
        let mut cur = obj;
        for &idx in path.iter().rev() {
            match (self.edges[idx].narrow)(cur.as_ref())? {
                Some(next) => cur = next,
                None => return Ok(None),
            }
        }
        Ok(Some(cur))
    }
}

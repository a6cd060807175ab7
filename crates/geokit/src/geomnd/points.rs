//! Points and point lists in n-D, plus the fixed-size 3D point list.

use nalgebra::{DVector, Vector3};

use super::affine::{Aff, Aff3d};
use crate::cfg::GeomCfg;
use crate::dispatch::{GeoError, Registry};

#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    pub p: DVector<f64>,
}

impl Point {
    #[inline]
    pub fn new(p: DVector<f64>) -> Self {
        Self { p }
    }
    #[inline]
    pub fn dim(&self) -> usize {
        self.p.len()
    }
}

/// Ordered list of points sharing one dimension (kept explicitly so an empty list has one).
#[derive(Clone, Debug, PartialEq)]
pub struct PointList {
    dim: usize,
    points: Vec<DVector<f64>>,
}

impl PointList {
    /// None if some point does not have `dim` coordinates.
    pub fn new(dim: usize, points: Vec<DVector<f64>>) -> Option<Self> {
        if points.iter().any(|p| p.len() != dim) {
            return None;
        }
        Some(Self { dim, points })
    }
    /// Caller guarantees every point has `dim` coordinates.
    pub(crate) fn from_parts(dim: usize, points: Vec<DVector<f64>>) -> Self {
        debug_assert!(points.iter().all(|p| p.len() == dim));
        Self { dim, points }
    }
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }
    #[inline]
    pub fn points(&self) -> &[DVector<f64>] {
        &self.points
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn transformed(&self, aff: &Aff) -> Option<PointList> {
        if aff.dim() != self.dim {
            return None;
        }
        Some(Self {
            dim: self.dim,
            points: self.points.iter().map(|p| aff.apply(p)).collect(),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointList3d {
    pub points: Vec<Vector3<f64>>,
}

impl PointList3d {
    #[inline]
    pub fn new(points: Vec<Vector3<f64>>) -> Self {
        Self { points }
    }
    pub fn transformed(&self, aff: &Aff3d) -> PointList3d {
        Self::new(self.points.iter().map(|p| aff.apply(*p)).collect())
    }
    pub fn to_point_list(&self) -> PointList {
        PointList {
            dim: 3,
            points: self
                .points
                .iter()
                .map(|p| DVector::from_vec(p.as_slice().to_vec()))
                .collect(),
        }
    }
    /// None unless `pl` is 3D.
    pub fn from_point_list(pl: &PointList) -> Option<PointList3d> {
        if pl.dim() != 3 {
            return None;
        }
        Some(Self::new(
            pl.points()
                .iter()
                .map(|p| Vector3::from_column_slice(p.as_slice()))
                .collect(),
        ))
    }
}

pub(super) fn register(reg: &mut Registry, _cfg: GeomCfg) -> Result<(), GeoError> {
    reg.declare_capability::<PointList3d, PointList>(
        PointList3d::to_point_list,
        PointList3d::from_point_list,
    )?;

    reg.register_identity::<Point>()?;
    reg.register_identity::<PointList>()?;
    reg.register_identity::<PointList3d>()?;

    reg.register_transform::<Aff, PointList, PointList>(|a, pl| {
        pl.transformed(a)
            .ok_or_else(|| GeoError::degenerate("affine map and point list differ in dimension"))
    })?;
    reg.register_transformable::<Aff, PointList>(|a, pl| a.dim() == pl.dim())?;
    reg.register_transform::<Aff3d, PointList3d, PointList3d>(|a, pl| Ok(pl.transformed(a)))?;
    Ok(())
}

crate::impl_geometric!(Point, |p| p.dim());
crate::impl_geometric!(PointList, |l| l.dim());
crate::impl_geometric!(PointList3d, 3);

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn point_list_rejects_mixed_dims() {
        assert!(PointList::new(2, vec![dvector![1.0, 2.0], dvector![1.0, 2.0, 3.0]]).is_none());
        let empty = PointList::new(4, Vec::new()).unwrap();
        assert_eq!(empty.dim(), 4);
        assert!(empty.is_empty());
    }

    #[test]
    fn point_list3d_dynamic_roundtrip() {
        let pl = PointList3d::new(vec![Vector3::new(1.0, 2.0, 3.0), Vector3::new(-1.0, 0.0, 0.5)]);
        let dynamic = pl.to_point_list();
        assert_eq!(dynamic.dim(), 3);
        assert_eq!(PointList3d::from_point_list(&dynamic), Some(pl));
    }

    #[test]
    fn transformed_checks_dimension() {
        let pl = PointList::new(2, vec![dvector![1.0, 1.0]]).unwrap();
        assert!(pl.transformed(&Aff::identity(3)).is_none());
        let shifted = pl
            .transformed(&Aff::new(nalgebra::DMatrix::identity(2, 2), dvector![1.0, -1.0]).unwrap())
            .unwrap();
        assert_eq!(shifted.points()[0], dvector![2.0, 0.0]);
    }
}

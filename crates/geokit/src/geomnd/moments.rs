//! Raw moments up to second order: `m0 = ∫1`, `m1 = ∫x`, `m2 = ∫x xᵀ`.
//!
//! Mean and covariance are derived on demand, never cached. With
//! `|m0| < eps` the moments are degenerate: mean 0, covariance identity.

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

use super::affine::{Aff, Aff3d};
use super::points::{PointList, PointList3d};
use crate::cfg::{GeomCfg, EPS_MASS};
use crate::dispatch::{GeoError, Registry};

#[derive(Clone, Debug, PartialEq)]
pub struct Moments {
    pub(crate) m0: f64,
    pub(crate) m1: DVector<f64>,
    pub(crate) m2: DMatrix<f64>,
}

impl Moments {
    /// None unless `m2` is `n×n` with `n = m1.len()`.
    pub fn new(m0: f64, m1: DVector<f64>, m2: DMatrix<f64>) -> Option<Self> {
        if m2.nrows() != m1.len() || m2.ncols() != m1.len() {
            return None;
        }
        Some(Self { m0, m1, m2 })
    }
    #[inline]
    pub fn zeros(dim: usize) -> Self {
        Self {
            m0: 0.0,
            m1: DVector::zeros(dim),
            m2: DMatrix::zeros(dim, dim),
        }
    }
    /// Counting moments of a point set (each point has unit mass).
    pub fn from_points(dim: usize, points: &[DVector<f64>]) -> Self {
        let mut out = Self::zeros(dim);
        for p in points {
            out.m0 += 1.0;
            out.m1 += p;
            out.m2 += p * p.transpose();
        }
        out
    }
    #[inline]
    pub fn m0(&self) -> f64 {
        self.m0
    }
    #[inline]
    pub fn m1(&self) -> &DVector<f64> {
        &self.m1
    }
    #[inline]
    pub fn m2(&self) -> &DMatrix<f64> {
        &self.m2
    }
    #[inline]
    pub fn dim(&self) -> usize {
        self.m1.len()
    }
    pub fn mean_eps(&self, eps: f64) -> DVector<f64> {
        if !(self.m0.abs() >= eps) {
            DVector::zeros(self.dim())
        } else {
            &self.m1 / self.m0
        }
    }
    pub fn cov_eps(&self, eps: f64) -> DMatrix<f64> {
        if !(self.m0.abs() >= eps) {
            return DMatrix::identity(self.dim(), self.dim());
        }
        let mean = self.mean_eps(eps);
        &self.m2 / self.m0 - &mean * mean.transpose()
    }
    #[inline]
    pub fn mean(&self) -> DVector<f64> {
        self.mean_eps(EPS_MASS)
    }
    #[inline]
    pub fn cov(&self) -> DMatrix<f64> {
        self.cov_eps(EPS_MASS)
    }
    pub fn negate(&self) -> Self {
        Self {
            m0: -self.m0,
            m1: -&self.m1,
            m2: -&self.m2,
        }
    }
    /// Rebuild raw moments from mass, mean and covariance.
    pub fn from_mean_cov(m0: f64, mean: DVector<f64>, cov: DMatrix<f64>) -> Self {
        let m2 = (cov + &mean * mean.transpose()) * m0;
        Self {
            m0,
            m1: mean * m0,
            m2,
        }
    }
    /// Moments of the image under `aff`: `m0·|det W|`, `W μ + b`, `W Σ Wᵀ`.
    pub fn transformed(&self, aff: &Aff, eps: f64) -> Option<Moments> {
        if aff.dim() != self.dim() {
            return None;
        }
        let m0 = self.m0 * aff.det().abs();
        let mean = aff.apply(&self.mean_eps(eps));
        let cov = &aff.weight * self.cov_eps(eps) * aff.weight.transpose();
        Some(Self::from_mean_cov(m0, mean, cov))
    }
}

/// Fixed-size 3D raw moments.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Moments3d {
    pub m0: f64,
    pub m1: Vector3<f64>,
    pub m2: Matrix3<f64>,
}

impl Moments3d {
    #[inline]
    pub fn new(m0: f64, m1: Vector3<f64>, m2: Matrix3<f64>) -> Self {
        Self { m0, m1, m2 }
    }
    pub fn from_points(points: &[Vector3<f64>]) -> Self {
        points.iter().fold(
            Self::new(0.0, Vector3::zeros(), Matrix3::zeros()),
            |acc, p| Self::new(acc.m0 + 1.0, acc.m1 + p, acc.m2 + p * p.transpose()),
        )
    }
    pub fn mean_eps(&self, eps: f64) -> Vector3<f64> {
        if !(self.m0.abs() >= eps) {
            Vector3::zeros()
        } else {
            self.m1 / self.m0
        }
    }
    pub fn cov_eps(&self, eps: f64) -> Matrix3<f64> {
        if !(self.m0.abs() >= eps) {
            return Matrix3::identity();
        }
        let mean = self.mean_eps(eps);
        self.m2 / self.m0 - mean * mean.transpose()
    }
    #[inline]
    pub fn mean(&self) -> Vector3<f64> {
        self.mean_eps(EPS_MASS)
    }
    #[inline]
    pub fn cov(&self) -> Matrix3<f64> {
        self.cov_eps(EPS_MASS)
    }
    #[inline]
    pub fn negate(&self) -> Self {
        Self::new(-self.m0, -self.m1, -self.m2)
    }
    pub fn transformed(&self, aff: &Aff3d, eps: f64) -> Moments3d {
        let m0 = self.m0 * aff.det().abs();
        let mean = aff.apply(self.mean_eps(eps));
        let cov = aff.m * self.cov_eps(eps) * aff.m.transpose();
        Self::new(m0, mean * m0, (cov + mean * mean.transpose()) * m0)
    }
    pub fn to_moments(&self) -> Moments {
        Moments {
            m0: self.m0,
            m1: DVector::from_vec(self.m1.as_slice().to_vec()),
            m2: DMatrix::from_column_slice(3, 3, self.m2.as_slice()),
        }
    }
    /// None unless `m` is 3D.
    pub fn from_moments(m: &Moments) -> Option<Moments3d> {
        if m.dim() != 3 {
            return None;
        }
        Some(Self::new(
            m.m0,
            Vector3::from_column_slice(m.m1.as_slice()),
            Matrix3::from_column_slice(m.m2.as_slice()),
        ))
    }
}

pub(super) fn register(reg: &mut Registry, cfg: GeomCfg) -> Result<(), GeoError> {
    let eps = cfg.eps_mass;
    reg.declare_capability::<Moments3d, Moments>(Moments3d::to_moments, Moments3d::from_moments)?;

    reg.register_identity::<Moments>()?;
    reg.register_identity::<Moments3d>()?;

    reg.register_cast::<PointList, Moments>(|pl| Ok(Moments::from_points(pl.dim(), pl.points())))?;
    reg.register_cast::<PointList3d, Moments3d>(|pl| Ok(Moments3d::from_points(&pl.points)))?;
    reg.register_cast::<Moments3d, Moments>(|m| Ok(m.to_moments()))?;
    reg.register_cast::<Moments, Moments3d>(|m| {
        Moments3d::from_moments(m).ok_or_else(|| GeoError::degenerate("moments are not 3D"))
    })?;
    reg.register_castable::<Moments, Moments3d>(|m| m.dim() == 3)?;

    reg.register_transform::<Aff, Moments, Moments>(move |a, m| {
        m.transformed(a, eps)
            .ok_or_else(|| GeoError::degenerate("affine map and moments differ in dimension"))
    })?;
    reg.register_transformable::<Aff, Moments>(|a, m| a.dim() == m.dim())?;
    reg.register_transform::<Aff3d, Moments3d, Moments3d>(move |a, m| Ok(m.transformed(a, eps)))?;
    Ok(())
}

crate::impl_geometric!(Moments, |m| m.dim());
crate::impl_geometric!(Moments3d, 3);

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn point_moments_mean_and_cov() {
        let pts = vec![dvector![0.0, 0.0], dvector![2.0, 0.0], dvector![0.0, 2.0], dvector![2.0, 2.0]];
        let m = Moments::from_points(2, &pts);
        assert_eq!(m.m0, 4.0);
        assert!((m.mean() - dvector![1.0, 1.0]).norm() < 1e-12);
        let cov = m.cov();
        assert!((cov[(0, 0)] - 1.0).abs() < 1e-12);
        assert!(cov[(0, 1)].abs() < 1e-12);
    }

    #[test]
    fn degenerate_mass_gives_canonical_mean_cov() {
        let m = Moments::zeros(3);
        assert_eq!(m.mean(), DVector::zeros(3));
        assert_eq!(m.cov(), DMatrix::identity(3, 3));
        let n = m.negate();
        assert_eq!(n.m0, 0.0);
    }

    #[test]
    fn transformed_matches_transformed_points() {
        let mut rng = StdRng::seed_from_u64(7);
        let pts: Vec<Vector3<f64>> = (0..20)
            .map(|_| Vector3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
            .collect();
        let aff = Aff3d::new(Aff3d::rot_y(0.4).m, Vector3::new(1.0, 2.0, 3.0));
        let moved: Vec<Vector3<f64>> = pts.iter().map(|p| aff.apply(*p)).collect();
        let lhs = Moments3d::from_points(&pts).transformed(&aff, EPS_MASS);
        let rhs = Moments3d::from_points(&moved);
        // Rotations keep |det| = 1, so point-mass moments transform exactly.
        assert!((lhs.m0 - rhs.m0).abs() < 1e-12);
        assert!((lhs.m1 - rhs.m1).norm() < 1e-9);
        assert!((lhs.m2 - rhs.m2).norm() < 1e-9);
    }

    #[test]
    fn moments3d_dynamic_roundtrip() {
        let m = Moments3d::new(2.0, Vector3::new(1.0, 2.0, 3.0), Matrix3::new(1.0, 2.0, 3.0, 2.0, 5.0, 6.0, 3.0, 6.0, 9.0));
        assert_eq!(Moments3d::from_moments(&m.to_moments()), Some(m));
        assert!(Moments3d::from_moments(&Moments::zeros(2)).is_none());
    }
}

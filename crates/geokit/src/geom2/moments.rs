//! 2D raw moments (`m0`, `m1`, `m2`) and their affine push-forward.
//!
//! Degenerate (`|m0| < eps_mass`): mean 0 and covariance identity, as in
//! `geomnd::Moments`. Approximations from moments live next to their targets.

use nalgebra::{DMatrix, DVector, Matrix2, Vector2};

use super::points::PointList2d;
use super::types::Aff2d;
use crate::cfg::{GeomCfg, EPS_MASS};
use crate::dispatch::{GeoError, Registry};
use crate::geomnd::Moments;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Moments2d {
    pub m0: f64,
    pub m1: Vector2<f64>,
    pub m2: Matrix2<f64>,
}

impl Moments2d {
    #[inline]
    pub fn new(m0: f64, m1: Vector2<f64>, m2: Matrix2<f64>) -> Self {
        Self { m0, m1, m2 }
    }
    #[inline]
    pub fn zeros() -> Self {
        Self::new(0.0, Vector2::zeros(), Matrix2::zeros())
    }
    /// Moments of the unit square `[0, 1]²`.
    pub fn unit_square() -> Self {
        Self::new(
            1.0,
            Vector2::new(0.5, 0.5),
            Matrix2::new(1.0 / 3.0, 0.25, 0.25, 1.0 / 3.0),
        )
    }
    /// Moments of the closed unit disk.
    pub fn unit_disk() -> Self {
        let a = std::f64::consts::FRAC_PI_4;
        Self::new(std::f64::consts::PI, Vector2::zeros(), Matrix2::new(a, 0.0, 0.0, a))
    }
    /// Counting moments (unit mass per point).
    pub fn from_points(points: &[Vector2<f64>]) -> Self {
        points.iter().fold(Self::zeros(), |acc, p| {
            Self::new(acc.m0 + 1.0, acc.m1 + p, acc.m2 + p * p.transpose())
        })
    }
    pub fn from_mean_cov(m0: f64, mean: Vector2<f64>, cov: Matrix2<f64>) -> Self {
        Self::new(m0, mean * m0, (cov + mean * mean.transpose()) * m0)
    }
    #[inline]
    pub fn is_degenerate(&self, eps: f64) -> bool {
        !(self.m0.abs() >= eps)
    }
    pub fn mean_eps(&self, eps: f64) -> Vector2<f64> {
        if self.is_degenerate(eps) {
            Vector2::zeros()
        } else {
            self.m1 / self.m0
        }
    }
    pub fn cov_eps(&self, eps: f64) -> Matrix2<f64> {
        if self.is_degenerate(eps) {
            return Matrix2::identity();
        }
        let mean = self.mean_eps(eps);
        self.m2 / self.m0 - mean * mean.transpose()
    }
    #[inline]
    pub fn mean(&self) -> Vector2<f64> {
        self.mean_eps(EPS_MASS)
    }
    #[inline]
    pub fn cov(&self) -> Matrix2<f64> {
        self.cov_eps(EPS_MASS)
    }
    #[inline]
    pub fn negate(&self) -> Self {
        Self::new(-self.m0, -self.m1, -self.m2)
    }
    /// Push-forward under `aff`: mass scales by `|det|`, mean maps, `cov ↦ M cov Mᵀ`.
    pub fn transformed(&self, aff: &Aff2d, eps: f64) -> Self {
        let m0 = self.m0 * aff.det().abs();
        let mean = aff.apply(self.mean_eps(eps));
        let cov = aff.m * self.cov_eps(eps) * aff.m.transpose();
        Self::from_mean_cov(m0, mean, cov)
    }
    pub fn to_moments(&self) -> Moments {
        Moments {
            m0: self.m0,
            m1: DVector::from_vec(self.m1.as_slice().to_vec()),
            m2: DMatrix::from_column_slice(2, 2, self.m2.as_slice()),
        }
    }
    pub fn from_moments(m: &Moments) -> Option<Self> {
        if m.dim() != 2 {
            return None;
        }
        Some(Self::new(
            m.m0,
            Vector2::from_column_slice(m.m1.as_slice()),
            Matrix2::from_column_slice(m.m2.as_slice()),
        ))
    }
}

impl std::ops::Add for Moments2d {
    type Output = Moments2d;
    #[inline]
    fn add(self, rhs: Moments2d) -> Moments2d {
        Moments2d::new(self.m0 + rhs.m0, self.m1 + rhs.m1, self.m2 + rhs.m2)
    }
}

pub(super) fn register(reg: &mut Registry, cfg: GeomCfg) -> Result<(), GeoError> {
    let eps = cfg.eps_mass;
    reg.register_identity::<Moments2d>()?;
    reg.register_cast::<PointList2d, Moments2d>(|pl| Ok(Moments2d::from_points(&pl.points)))?;
    reg.register_cast::<Moments2d, Moments>(|m| Ok(m.to_moments()))?;
    reg.register_cast::<Moments, Moments2d>(|m| {
        Moments2d::from_moments(m).ok_or_else(|| GeoError::degenerate("moments are not 2D"))
    })?;
    reg.register_castable::<Moments, Moments2d>(|m| m.dim() == 2)?;
    reg.register_transform::<Aff2d, Moments2d, Moments2d>(move |a, m| Ok(m.transformed(a, eps)))?;
    Ok(())
}

crate::impl_geometric!(Moments2d, 2);

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{matrix, vector};

    #[test]
    fn unit_square_mean_and_cov() {
        let m = Moments2d::unit_square();
        assert!((m.mean() - vector![0.5, 0.5]).norm() < 1e-12);
        let cov = m.cov();
        assert!((cov[(0, 0)] - 1.0 / 12.0).abs() < 1e-12);
        assert!(cov[(0, 1)].abs() < 1e-12);
    }

    #[test]
    fn degenerate_is_canonical_not_nan() {
        let m = Moments2d::new(1e-12, vector![3.0, 4.0], matrix![1.0, 0.0; 0.0, 1.0]);
        assert_eq!(m.mean(), Vector2::zeros());
        assert_eq!(m.cov(), Matrix2::identity());
        let t = m.transformed(&Aff2d::new(matrix![2.0, 0.0; 0.0, 2.0], vector![1.0, 1.0]), EPS_MASS);
        assert!(t.m1.iter().all(|x| x.is_finite()));
    }

    #[test]
    fn transform_scales_mass_by_abs_det() {
        let m = Moments2d::unit_disk();
        let a = Aff2d::new(matrix![0.0, -3.0; 2.0, 0.0], vector![1.0, -1.0]);
        let t = m.transformed(&a, EPS_MASS);
        assert!((t.m0 - 6.0 * std::f64::consts::PI).abs() < 1e-12);
        assert!((t.mean() - vector![1.0, -1.0]).norm() < 1e-12);
        let cov = t.cov();
        assert!((cov[(0, 0)] - 9.0 / 4.0).abs() < 1e-12);
        assert!((cov[(1, 1)] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn negate_then_add_cancels() {
        let m = Moments2d::unit_square();
        let z = m + m.negate();
        assert_eq!(z.m0, 0.0);
        assert_eq!(z.m2, Matrix2::zeros());
    }
}

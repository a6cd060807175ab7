//! 2D transformations: linear `Lin2d`, affine `Aff2d`, similarity `Sim2d`.
//!
//! - `Aff2d`: `x ↦ M x + t`. The other two widen into it via the capability DAG.
//! - `Sim2d`: `x ↦ offset + scale · R(angle) · F^reflect · x` with
//!   `F = diag(-1, 1)` (reflection through the x axis).
//!
//! Code cross-refs: `geom2::register` (capability edges and handlers).

use nalgebra::{DMatrix, DVector, Matrix2, Vector2, SVD};

use crate::geomnd::Aff;

/// 2D linear map: `x ↦ M x`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lin2d {
    pub m: Matrix2<f64>,
}

impl Lin2d {
    #[inline]
    pub fn new(m: Matrix2<f64>) -> Self {
        Self { m }
    }
    #[inline]
    pub fn identity() -> Self {
        Self::new(Matrix2::identity())
    }
    /// Rotation by `angle` after axis scaling `scale`.
    #[inline]
    pub fn from_scale_angle(scale: Vector2<f64>, angle: f64) -> Self {
        Self::new(rotation(angle) * Matrix2::from_diagonal(&scale))
    }
    #[inline]
    pub fn det(&self) -> f64 {
        self.m.determinant()
    }
    #[inline]
    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(Self::new)
    }
    /// `self ∘ other`.
    #[inline]
    pub fn compose(&self, other: &Lin2d) -> Lin2d {
        Self::new(self.m * other.m)
    }
    #[inline]
    pub fn apply(&self, p: Vector2<f64>) -> Vector2<f64> {
        self.m * p
    }
    #[inline]
    pub fn to_aff2d(&self) -> Aff2d {
        Aff2d::from_linear(self.m)
    }
}

/// 2D affine map: `x ↦ M x + t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aff2d {
    pub m: Matrix2<f64>,
    pub t: Vector2<f64>,
}

impl Aff2d {
    #[inline]
    pub fn new(m: Matrix2<f64>, t: Vector2<f64>) -> Self {
        Self { m, t }
    }
    #[inline]
    pub fn identity() -> Self {
        Self::new(Matrix2::identity(), Vector2::zeros())
    }
    #[inline]
    pub fn from_linear(m: Matrix2<f64>) -> Self {
        Self::new(m, Vector2::zeros())
    }
    #[inline]
    pub fn translation(t: Vector2<f64>) -> Self {
        Self::new(Matrix2::identity(), t)
    }
    #[inline]
    pub fn det(&self) -> f64 {
        self.m.determinant()
    }
    #[inline]
    pub fn inverse(&self) -> Option<Self> {
        self.m.try_inverse().map(|minv| Self {
            m: minv,
            t: -minv * self.t,
        })
    }
    /// `self ∘ other`: apply `other` first.
    #[inline]
    pub fn compose(&self, other: &Aff2d) -> Aff2d {
        Self::new(self.m * other.m, self.m * other.t + self.t)
    }
    #[inline]
    pub fn apply(&self, p: Vector2<f64>) -> Vector2<f64> {
        self.m * p + self.t
    }
    #[inline]
    pub fn is_orientation_preserving(&self) -> bool {
        self.det() > 0.0
    }
    /// Orthogonal polar factor `Q = U Vᵀ` of the linear part (a rotation or a reflection).
    pub fn polar_factor(&self) -> Option<Matrix2<f64>> {
        let svd = SVD::new(self.m, true, true);
        Some(svd.u? * svd.v_t?)
    }
    pub fn to_aff(&self) -> Aff {
        Aff {
            weight: DMatrix::from_column_slice(2, 2, self.m.as_slice()),
            bias: DVector::from_vec(vec![self.t.x, self.t.y]),
        }
    }
    /// None unless `a` is 2D.
    pub fn from_aff(a: &Aff) -> Option<Aff2d> {
        if a.dim() != 2 {
            return None;
        }
        Some(Self::new(
            Matrix2::from_column_slice(a.weight.as_slice()),
            Vector2::new(a.bias[0], a.bias[1]),
        ))
    }
    /// Polar rotation factor. None if the linear part reverses orientation.
    pub fn polar_rotation(&self) -> Option<Matrix2<f64>> {
        let q = self.polar_factor()?;
        if q.determinant() < 0.0 {
            None
        } else {
            Some(q)
        }
    }
}

impl std::ops::Mul for Aff2d {
    type Output = Aff2d;
    #[inline]
    fn mul(self, rhs: Aff2d) -> Aff2d {
        self.compose(&rhs)
    }
}

/// 2D similarity: translation · uniform scale · rotation · optional x-reflection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sim2d {
    pub offset: Vector2<f64>,
    pub scale: f64,
    pub angle: f64,
    pub reflect: bool,
}

impl Sim2d {
    #[inline]
    pub fn new(offset: Vector2<f64>, scale: f64, angle: f64, reflect: bool) -> Self {
        Self {
            offset,
            scale,
            angle,
            reflect,
        }
    }
    #[inline]
    pub fn identity() -> Self {
        Self::new(Vector2::zeros(), 1.0, 0.0, false)
    }
    /// `scale · R(angle) · F^reflect`.
    pub fn linear(&self) -> Matrix2<f64> {
        let r = rotation(self.angle) * self.scale;
        if self.reflect {
            r * reflect_x()
        } else {
            r
        }
    }
    #[inline]
    pub fn to_aff2d(&self) -> Aff2d {
        Aff2d::new(self.linear(), self.offset)
    }
    #[inline]
    pub fn apply(&self, p: Vector2<f64>) -> Vector2<f64> {
        self.linear() * p + self.offset
    }
    /// `self ∘ other`. Since `F R(a) = R(-a) F`, a reflecting `self` flips `other`'s angle.
    pub fn compose(&self, other: &Sim2d) -> Sim2d {
        Sim2d {
            offset: self.apply(other.offset),
            scale: self.scale * other.scale,
            angle: if self.reflect {
                self.angle - other.angle
            } else {
                self.angle + other.angle
            },
            reflect: self.reflect != other.reflect,
        }
    }
    /// None for a zero (or non-finite inverse) scale.
    pub fn inverse(&self) -> Option<Sim2d> {
        let inv_scale = 1.0 / self.scale;
        if !inv_scale.is_finite() {
            return None;
        }
        let angle = if self.reflect { self.angle } else { -self.angle };
        let mut inv = Sim2d::new(Vector2::zeros(), inv_scale, angle, self.reflect);
        inv.offset = -(inv.linear() * self.offset);
        Some(inv)
    }
}

/// Counterclockwise rotation by `angle` radians.
#[inline]
pub fn rotation(angle: f64) -> Matrix2<f64> {
    let (s, c) = angle.sin_cos();
    Matrix2::new(c, -s, s, c)
}

#[inline]
pub(crate) fn reflect_x() -> Matrix2<f64> {
    Matrix2::new(-1.0, 0.0, 0.0, 1.0)
}

/// Whether `m` is a non-negative multiple of an orthogonal matrix, within `eps` (relative).
pub(crate) fn is_scaled_orthogonal(m: &Matrix2<f64>, eps: f64) -> bool {
    let c0 = m.column(0);
    let c1 = m.column(1);
    let (n0, n1) = (c0.norm_squared(), c1.norm_squared());
    let tol = eps * n0.max(n1).max(1.0);
    (n0 - n1).abs() <= tol && c0.dot(&c1).abs() <= tol
}

crate::impl_geometric!(Lin2d, 2);
crate::impl_geometric!(Aff2d, 2);
crate::impl_geometric!(Sim2d, 2);

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{matrix, vector};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn aff2d_inverse_roundtrip() {
        let a = Aff2d::new(matrix![2.0, 1.0; 0.0, 3.0], vector![1.0, -2.0]);
        let inv = a.inverse().unwrap();
        let p = vector![0.3, 0.7];
        let q = inv.apply(a.apply(p));
        assert!((q - p).norm() < 1e-12);
        assert!(Aff2d::from_linear(matrix![1.0, 2.0; 2.0, 4.0]).inverse().is_none());
    }

    #[test]
    fn sim2d_compose_matches_affine_compose() {
        let a = Sim2d::new(vector![1.0, 2.0], 2.0, 0.3, true);
        let b = Sim2d::new(vector![-0.5, 0.25], 0.5, -1.1, false);
        let ab = a.compose(&b).to_aff2d();
        let ab_aff = a.to_aff2d() * b.to_aff2d();
        assert!((ab.m - ab_aff.m).norm() < 1e-12);
        assert!((ab.t - ab_aff.t).norm() < 1e-12);
    }

    #[test]
    fn sim2d_inverse_undoes_apply() {
        for reflect in [false, true] {
            let s = Sim2d::new(vector![3.0, -1.0], 1.5, FRAC_PI_2 / 3.0, reflect);
            let inv = s.inverse().unwrap();
            let p = vector![0.2, -0.9];
            assert!((inv.apply(s.apply(p)) - p).norm() < 1e-12);
        }
        assert!(Sim2d::new(vector![0.0, 0.0], 0.0, 0.0, false)
            .inverse()
            .is_none());
    }

    #[test]
    fn polar_rotation_of_rotation_scale() {
        let a = Aff2d::from_linear(rotation(0.4) * 3.0);
        let q = a.polar_rotation().unwrap();
        assert!((q - rotation(0.4)).norm() < 1e-12);
        let r = Aff2d::from_linear(reflect_x());
        assert!(r.polar_rotation().is_none());
    }

    #[test]
    fn scaled_orthogonal_detection() {
        assert!(is_scaled_orthogonal(&(rotation(1.0) * 2.0), 1e-9));
        assert!(!is_scaled_orthogonal(&matrix![2.0, 0.0; 0.0, 1.0], 1e-9));
    }

    #[test]
    fn transformations_erase_and_downcast() {
        use crate::dispatch::{Geometric, ShapeType};
        let erased: Vec<Box<dyn Geometric>> = vec![
            Box::new(Lin2d::identity()),
            Box::new(Aff2d::translation(vector![1.0, 2.0])),
            Box::new(Sim2d::new(vector![0.0, 1.0], 2.0, 0.3, true)),
        ];
        let types: Vec<ShapeType> = erased.iter().map(|g| g.shape_type()).collect();
        assert_eq!(
            types,
            [ShapeType::of::<Lin2d>(), ShapeType::of::<Aff2d>(), ShapeType::of::<Sim2d>()]
        );
        assert!(erased.iter().all(|g| g.ndim() == 2));
        assert_eq!(
            erased[1].downcast_ref::<Aff2d>().unwrap().t,
            vector![1.0, 2.0]
        );
        assert!(erased[2].downcast_ref::<Aff2d>().is_err());
    }
}

//! n-D transformations: `Aff` (weight, bias), `Aff3d`, `Dlt`, `Dltra`.
//!
//! `Dlt` (dilatation) scales each axis then offsets; `Dltra` (dilated
//! translation) scales uniformly then offsets. Both are diagonal `Aff`s.

use nalgebra::{DMatrix, DVector, Matrix3, Vector3};

use crate::cfg::GeomCfg;
use crate::dispatch::{GeoError, Registry};

/// n-D affine map: `x ↦ W x + b`.
#[derive(Clone, Debug, PartialEq)]
pub struct Aff {
    pub(crate) weight: DMatrix<f64>,
    pub(crate) bias: DVector<f64>,
}

impl Aff {
    /// None unless `weight` is square and matches `bias`.
    pub fn new(weight: DMatrix<f64>, bias: DVector<f64>) -> Option<Self> {
        if weight.nrows() != weight.ncols() || weight.nrows() != bias.len() {
            return None;
        }
        Some(Self { weight, bias })
    }
    #[inline]
    pub fn identity(dim: usize) -> Self {
        Self {
            weight: DMatrix::identity(dim, dim),
            bias: DVector::zeros(dim),
        }
    }
    #[inline]
    pub fn weight(&self) -> &DMatrix<f64> {
        &self.weight
    }
    #[inline]
    pub fn bias(&self) -> &DVector<f64> {
        &self.bias
    }
    #[inline]
    pub fn dim(&self) -> usize {
        self.bias.len()
    }
    #[inline]
    pub fn det(&self) -> f64 {
        self.weight.determinant()
    }
    #[inline]
    pub fn apply(&self, p: &DVector<f64>) -> DVector<f64> {
        &self.weight * p + &self.bias
    }
    /// `self ∘ other`. None on mismatched dimensions.
    pub fn compose(&self, other: &Aff) -> Option<Aff> {
        if self.dim() != other.dim() {
            return None;
        }
        Some(Aff {
            weight: &self.weight * &other.weight,
            bias: &self.weight * &other.bias + &self.bias,
        })
    }
    pub fn inverse(&self) -> Option<Aff> {
        let winv = self.weight.clone().try_inverse()?;
        let bias = -(&winv * &self.bias);
        Some(Aff { weight: winv, bias })
    }
    /// Whether all off-diagonal weights are within `eps` of zero.
    pub fn is_diagonal(&self, eps: f64) -> bool {
        let n = self.dim();
        (0..n).all(|i| (0..n).all(|j| i == j || self.weight[(i, j)].abs() <= eps))
    }
}

/// 3D affine map with a fixed-size representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aff3d {
    pub m: Matrix3<f64>,
    pub t: Vector3<f64>,
}

impl Aff3d {
    #[inline]
    pub fn new(m: Matrix3<f64>, t: Vector3<f64>) -> Self {
        Self { m, t }
    }
    #[inline]
    pub fn identity() -> Self {
        Self::new(Matrix3::identity(), Vector3::zeros())
    }
    /// Rotation about the x axis by `angle` radians.
    pub fn rot_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(
            Matrix3::new(1.0, 0.0, 0.0, 0.0, c, -s, 0.0, s, c),
            Vector3::zeros(),
        )
    }
    pub fn rot_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(
            Matrix3::new(c, 0.0, s, 0.0, 1.0, 0.0, -s, 0.0, c),
            Vector3::zeros(),
        )
    }
    pub fn rot_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(
            Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0),
            Vector3::zeros(),
        )
    }
    #[inline]
    pub fn det(&self) -> f64 {
        self.m.determinant()
    }
    #[inline]
    pub fn apply(&self, p: Vector3<f64>) -> Vector3<f64> {
        self.m * p + self.t
    }
    #[inline]
    pub fn compose(&self, other: &Aff3d) -> Aff3d {
        Self::new(self.m * other.m, self.m * other.t + self.t)
    }
    #[inline]
    pub fn inverse(&self) -> Option<Aff3d> {
        self.m.try_inverse().map(|minv| Self::new(minv, -minv * self.t))
    }
    #[inline]
    pub fn to_aff(&self) -> Aff {
        Aff {
            weight: DMatrix::from_column_slice(3, 3, self.m.as_slice()),
            bias: DVector::from_vec(self.t.as_slice().to_vec()),
        }
    }
    /// None unless `aff` is 3D.
    pub fn from_aff(aff: &Aff) -> Option<Aff3d> {
        if aff.dim() != 3 {
            return None;
        }
        Some(Self::new(
            Matrix3::from_column_slice(aff.weight.as_slice()),
            Vector3::from_column_slice(aff.bias.as_slice()),
        ))
    }
}

/// Dilatation: `x ↦ scale ⊙ x + offset`.
#[derive(Clone, Debug, PartialEq)]
pub struct Dlt {
    pub(crate) offset: DVector<f64>,
    pub(crate) scale: DVector<f64>,
}

impl Dlt {
    pub fn new(offset: DVector<f64>, scale: DVector<f64>) -> Option<Self> {
        if offset.len() != scale.len() {
            return None;
        }
        Some(Self { offset, scale })
    }
    #[inline]
    pub fn identity(dim: usize) -> Self {
        Self {
            offset: DVector::zeros(dim),
            scale: DVector::from_element(dim, 1.0),
        }
    }
    #[inline]
    pub fn offset(&self) -> &DVector<f64> {
        &self.offset
    }
    #[inline]
    pub fn scale(&self) -> &DVector<f64> {
        &self.scale
    }
    #[inline]
    pub fn dim(&self) -> usize {
        self.offset.len()
    }
    #[inline]
    pub fn apply(&self, p: &DVector<f64>) -> DVector<f64> {
        self.scale.component_mul(p) + &self.offset
    }
    pub fn compose(&self, other: &Dlt) -> Option<Dlt> {
        if self.dim() != other.dim() {
            return None;
        }
        Some(Dlt {
            offset: self.apply(&other.offset),
            scale: self.scale.component_mul(&other.scale),
        })
    }
    /// None if any axis scale is zero.
    pub fn inverse(&self) -> Option<Dlt> {
        if self.scale.iter().any(|&s| s == 0.0) {
            return None;
        }
        let scale = self.scale.map(|s| 1.0 / s);
        let offset = -scale.component_mul(&self.offset);
        Some(Dlt { offset, scale })
    }
    #[inline]
    pub fn to_aff(&self) -> Aff {
        Aff {
            weight: DMatrix::from_diagonal(&self.scale),
            bias: self.offset.clone(),
        }
    }
    /// Diagonal of `aff`'s weight; None if off-diagonal entries exceed `eps`.
    pub fn from_aff(aff: &Aff, eps: f64) -> Option<Dlt> {
        if !aff.is_diagonal(eps) {
            return None;
        }
        Some(Dlt {
            offset: aff.bias.clone(),
            scale: aff.weight.diagonal(),
        })
    }
}

/// Dilated translation: `x ↦ scale · x + offset`.
#[derive(Clone, Debug, PartialEq)]
pub struct Dltra {
    pub offset: DVector<f64>,
    pub scale: f64,
}

impl Dltra {
    #[inline]
    pub fn new(offset: DVector<f64>, scale: f64) -> Self {
        Self { offset, scale }
    }
    #[inline]
    pub fn dim(&self) -> usize {
        self.offset.len()
    }
    #[inline]
    pub fn apply(&self, p: &DVector<f64>) -> DVector<f64> {
        p * self.scale + &self.offset
    }
    pub fn compose(&self, other: &Dltra) -> Option<Dltra> {
        if self.dim() != other.dim() {
            return None;
        }
        Some(Dltra::new(self.apply(&other.offset), self.scale * other.scale))
    }
    pub fn inverse(&self) -> Option<Dltra> {
        if self.scale == 0.0 {
            return None;
        }
        let inv = 1.0 / self.scale;
        Some(Dltra::new(&self.offset * -inv, inv))
    }
    #[inline]
    pub fn to_dlt(&self) -> Dlt {
        Dlt {
            offset: self.offset.clone(),
            scale: DVector::from_element(self.dim(), self.scale),
        }
    }
    /// None unless all axis scales agree within `eps` (relative).
    pub fn from_dlt(dlt: &Dlt, eps: f64) -> Option<Dltra> {
        let first = *dlt.scale.iter().next()?;
        let tol = eps * first.abs().max(1.0);
        if dlt.scale.iter().any(|&s| (s - first).abs() > tol) {
            return None;
        }
        Some(Dltra::new(dlt.offset.clone(), first))
    }
}

pub(super) fn register(reg: &mut Registry, cfg: GeomCfg) -> Result<(), GeoError> {
    let eps = cfg.eps_shape;
    reg.declare_capability::<Aff3d, Aff>(Aff3d::to_aff, Aff3d::from_aff)?;
    reg.declare_capability::<Dlt, Aff>(Dlt::to_aff, move |a| Dlt::from_aff(a, eps))?;
    reg.declare_capability::<Dltra, Dlt>(Dltra::to_dlt, move |d| Dltra::from_dlt(d, eps))?;

    reg.register_identity::<Aff>()?;
    reg.register_identity::<Aff3d>()?;
    reg.register_identity::<Dlt>()?;
    reg.register_identity::<Dltra>()?;

    reg.register_cast::<Dlt, Aff>(|d| Ok(d.to_aff()))?;
    reg.register_cast::<Aff, Dlt>(move |a| {
        Dlt::from_aff(a, eps).ok_or_else(|| GeoError::degenerate("affine weight is not diagonal"))
    })?;
    reg.register_castable::<Aff, Dlt>(move |a| a.is_diagonal(eps))?;
    reg.register_cast::<Aff3d, Aff>(|a| Ok(a.to_aff()))?;
    reg.register_cast::<Aff, Aff3d>(|a| {
        Aff3d::from_aff(a).ok_or_else(|| GeoError::degenerate("affine map is not 3D"))
    })?;
    reg.register_castable::<Aff, Aff3d>(|a| a.dim() == 3)?;
    reg.register_cast::<Dltra, Dlt>(|d| Ok(d.to_dlt()))?;
    Ok(())
}

crate::impl_geometric!(Aff, |a| a.dim());
crate::impl_geometric!(Aff3d, 3);
crate::impl_geometric!(Dlt, |d| d.dim());
crate::impl_geometric!(Dltra, |d| d.dim());

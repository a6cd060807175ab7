//! Ellipse: affine image of the closed unit disk, normalised via SVD.

use nalgebra::{Matrix2, Vector2, SVD};

use super::moments::Moments2d;
use super::rect::{principal_axes, Rect};
use super::types::Aff2d;
use crate::cfg::GeomCfg;
use crate::dispatch::{GeoError, Registry};
use crate::geomnd::Hyperellipsoid;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipse {
    pub aff: Aff2d,
}

impl Ellipse {
    /// Normalising constructor: the linear part becomes `U S` (perpendicular
    /// semi-axes, `U` a rotation).
    pub fn new(aff: Aff2d) -> Self {
        Self {
            aff: normalised(aff),
        }
    }
    #[inline]
    pub fn from_affine_raw(aff: Aff2d) -> Self {
        Self { aff }
    }
    /// Axis-aligned ellipse with semi-axes `radii` centered at `center`.
    #[inline]
    pub fn axis_aligned(center: Vector2<f64>, radii: Vector2<f64>) -> Self {
        Self::from_affine_raw(Aff2d::new(Matrix2::from_diagonal(&radii), center))
    }
    #[inline]
    pub fn center(&self) -> Vector2<f64> {
        self.aff.t
    }
    #[inline]
    pub fn area(&self) -> f64 {
        std::f64::consts::PI * self.aff.det().abs()
    }
    #[inline]
    pub fn moments(&self) -> Moments2d {
        Moments2d::unit_disk().transformed(&self.aff, 0.0)
    }
    /// Tight axis-aligned bound: half extents are the row norms of the linear part.
    pub fn bounding_rect(&self) -> Rect {
        let half = Vector2::new(self.aff.m.row(0).norm(), self.aff.m.row(1).norm());
        Rect::from_corners(self.center() - half, self.center() + half)
    }
    /// Largest axis-aligned ellipse inside `r`.
    pub fn inscribed(r: &Rect) -> Ellipse {
        let v = r.validated();
        Self::axis_aligned(v.center(), Vector2::new(v.w(), v.h()) * 0.5)
    }
    #[inline]
    pub fn transformed(&self, aff: &Aff2d) -> Ellipse {
        Ellipse::new(aff.compose(&self.aff))
    }
    /// Ellipse with the moments' mean and covariance: `4 cov = A Aᵀ`.
    ///
    /// Degenerate moments give a zero-sized ellipse at the origin.
    pub fn approx_from_moments(m: &Moments2d, cfg: &GeomCfg) -> Ellipse {
        if cfg.is_degenerate_mass(m.m0) {
            return Ellipse::from_affine_raw(Aff2d::new(Matrix2::zeros(), Vector2::zeros()));
        }
        let (axes, lambda) = principal_axes(&(m.cov_eps(cfg.eps_mass) * 4.0));
        let lin = axes * Matrix2::from_diagonal(&lambda.map(f64::sqrt));
        Ellipse::from_affine_raw(Aff2d::new(lin, m.mean_eps(cfg.eps_mass)))
    }
    pub fn to_hyperellipsoid(&self) -> Hyperellipsoid {
        Hyperellipsoid::from_affine_raw(self.aff.to_aff())
    }
    pub fn from_hyperellipsoid(e: &Hyperellipsoid) -> Option<Ellipse> {
        Aff2d::from_aff(&e.aff).map(Ellipse::from_affine_raw)
    }
}

fn normalised(aff: Aff2d) -> Aff2d {
    let svd = SVD::new(aff.m, true, false);
    let Some(mut u) = svd.u else {
        return aff;
    };
    if u.determinant() < 0.0 {
        u.column_mut(1).neg_mut();
    }
    Aff2d::new(u * Matrix2::from_diagonal(&svd.singular_values), aff.t)
}

pub(super) fn register(reg: &mut Registry, cfg: GeomCfg) -> Result<(), GeoError> {
    reg.register_identity::<Ellipse>()?;
    reg.register_cast::<Ellipse, Hyperellipsoid>(|e| Ok(e.to_hyperellipsoid()))?;
    reg.register_cast::<Hyperellipsoid, Ellipse>(|e| {
        Ellipse::from_hyperellipsoid(e).ok_or_else(|| GeoError::degenerate("ellipsoid is not 2D"))
    })?;
    reg.register_castable::<Hyperellipsoid, Ellipse>(|e| e.dim() == 2)?;
    reg.register_cast::<Ellipse, Moments2d>(|e| Ok(e.moments()))?;

    reg.register_transform::<Aff2d, Ellipse, Ellipse>(|a, e| Ok(e.transformed(a)))?;
    reg.register_approx::<Moments2d, Ellipse>(move |m| Ok(Ellipse::approx_from_moments(m, &cfg)))?;
    reg.register_upper_bound::<Ellipse, Rect>(|e| Ok(e.bounding_rect()))?;
    reg.register_lower_bound::<Rect, Ellipse>(|r| Ok(Ellipse::inscribed(r)))?;
    Ok(())
}

crate::impl_geometric!(Ellipse, 2);

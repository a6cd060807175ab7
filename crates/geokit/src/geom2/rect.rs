//! Axis-aligned `Rect` and rotated `RRect`.
//!
//! - `Rect`: min/max corners. Moments are signed by `w · h`.
//! - `RRect`: affine image of the unit square `[0, 1]²`. `RRect::new` builds
//!   rotation · axis scaling (no shear); `from_affine` accepts any linear part.
//!
//! Code cross-refs: `clip` (polygon joins), `Moments2d` (approximations).

use nalgebra::{DVector, Matrix2, SymmetricEigen, Vector2};

use super::clip;
use super::moments::Moments2d;
use super::points::{PointList2d, Polygon};
use super::types::{rotation, Aff2d};
use crate::cfg::GeomCfg;
use crate::dispatch::{GeoError, JoinVolume, Registry};
use crate::geomnd::Hyperbox;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub min: Vector2<f64>,
    pub max: Vector2<f64>,
}

impl Rect {
    #[inline]
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self {
            min: Vector2::new(min_x, min_y),
            max: Vector2::new(max_x, max_y),
        }
    }
    #[inline]
    pub fn from_corners(min: Vector2<f64>, max: Vector2<f64>) -> Self {
        Self { min, max }
    }
    /// Zero-sized rect at `p`.
    #[inline]
    pub fn point(p: Vector2<f64>) -> Self {
        Self::from_corners(p, p)
    }
    /// Tight bound of a point set; None when empty.
    pub fn bounding(points: &[Vector2<f64>]) -> Option<Self> {
        let first = *points.first()?;
        Some(points.iter().skip(1).fold(Self::point(first), |r, p| {
            Self::from_corners(r.min.inf(p), r.max.sup(p))
        }))
    }
    #[inline]
    pub fn w(&self) -> f64 {
        self.max.x - self.min.x
    }
    #[inline]
    pub fn h(&self) -> f64 {
        self.max.y - self.min.y
    }
    #[inline]
    pub fn center(&self) -> Vector2<f64> {
        (self.min + self.max) * 0.5
    }
    #[inline]
    pub fn signed_area(&self) -> f64 {
        self.w() * self.h()
    }
    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }
    #[inline]
    pub fn circumference(&self) -> f64 {
        (self.w().abs() + self.h().abs()) * 2.0
    }
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y
    }
    #[inline]
    pub fn validated(&self) -> Self {
        Self::from_corners(self.min.inf(&self.max), self.min.sup(&self.max))
    }
    /// Overlap; an empty overlap collapses to zero extent.
    pub fn intersect(&self, other: &Rect) -> Rect {
        let min = self.min.sup(&other.min);
        let max = self.max.inf(&other.max).sup(&min);
        Self::from_corners(min, max)
    }
    pub fn union(&self, other: &Rect) -> Rect {
        Self::from_corners(self.min.inf(&other.min), self.max.sup(&other.max))
    }
    #[inline]
    pub fn moved(&self, offset: Vector2<f64>) -> Rect {
        Self::from_corners(self.min + offset, self.max + offset)
    }
    /// Intersection over union; `eps` guards an empty union.
    pub fn iou(&self, other: &Rect, eps: f64) -> f64 {
        join_rect_rect(self, other).iou(eps)
    }
    /// Counterclockwise corners starting at `min`.
    pub fn corners(&self) -> [Vector2<f64>; 4] {
        [
            self.min,
            Vector2::new(self.max.x, self.min.y),
            self.max,
            Vector2::new(self.min.x, self.max.y),
        ]
    }
    #[inline]
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(self.corners().to_vec())
    }
    #[inline]
    pub fn to_rrect(&self) -> RRect {
        RRect::from_affine(Aff2d::new(Matrix2::from_diagonal(&(self.max - self.min)), self.min))
    }
    pub fn moments(&self) -> Moments2d {
        let m0 = self.signed_area();
        let c = self.center();
        let (x0, x1, y0, y1) = (self.min.x, self.max.x, self.min.y, self.max.y);
        let mxy = m0 * c.x * c.y;
        Moments2d::new(
            m0,
            c * m0,
            Matrix2::new(
                m0 * (x0 * x0 + x0 * x1 + x1 * x1) / 3.0,
                mxy,
                mxy,
                m0 * (y0 * y0 + y0 * y1 + y1 * y1) / 3.0,
            ),
        )
    }
    #[inline]
    pub fn to_hyperbox(&self) -> Hyperbox {
        Hyperbox {
            min: DVector::from_vec(vec![self.min.x, self.min.y]),
            max: DVector::from_vec(vec![self.max.x, self.max.y]),
        }
    }
    pub fn from_hyperbox(b: &Hyperbox) -> Option<Rect> {
        (b.dim() == 2).then(|| Rect::new(b.min[0], b.min[1], b.max[0], b.max[1]))
    }
    /// Rect with the moments' mean as center whose moment covariance best matches.
    ///
    /// Degenerate moments give a zero-sized rect at the origin. Negative
    /// variances are clamped to zero.
    pub fn approx_from_moments(m: &Moments2d, cfg: &GeomCfg) -> Rect {
        if cfg.is_degenerate_mass(m.m0) {
            return Rect::point(Vector2::zeros());
        }
        let c = m.mean_eps(cfg.eps_mass);
        let cov = m.cov_eps(cfg.eps_mass);
        let (vx, vy) = (cov[(0, 0)].max(0.0), cov[(1, 1)].max(0.0));
        // w, h are half extents: hw3 = w³h and wh3 = wh³ for an exact rect.
        let size = m.m0.abs();
        let hw3 = vx * size * 0.75;
        let wh3 = vy * size * 0.75;
        let wh = (wh3 * hw3).sqrt().sqrt();
        let (w, h) = if wh > 0.0 && wh.is_finite() {
            ((hw3 / wh).sqrt(), (wh3 / wh).sqrt())
        } else {
            ((3.0 * vx).sqrt(), (3.0 * vy).sqrt())
        };
        let half = Vector2::new(w, h);
        Rect::from_corners(c - half, c + half)
    }
}

/// Affine image of the unit square.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RRect {
    pub aff: Aff2d,
}

impl RRect {
    /// Rotation by `angle` of the axis scaling `scale`, then translation by `offset`.
    pub fn new(scale: Vector2<f64>, angle: f64, offset: Vector2<f64>) -> Self {
        Self {
            aff: Aff2d::new(rotation(angle) * Matrix2::from_diagonal(&scale), offset),
        }
    }
    #[inline]
    pub fn from_affine(aff: Aff2d) -> Self {
        Self { aff }
    }
    /// Image of `(0, 0)`, `(1, 0)`, `(1, 1)`, `(0, 1)`.
    pub fn corners(&self) -> [Vector2<f64>; 4] {
        [
            self.aff.apply(Vector2::new(0.0, 0.0)),
            self.aff.apply(Vector2::new(1.0, 0.0)),
            self.aff.apply(Vector2::new(1.0, 1.0)),
            self.aff.apply(Vector2::new(0.0, 1.0)),
        ]
    }
    #[inline]
    pub fn center(&self) -> Vector2<f64> {
        self.aff.apply(Vector2::new(0.5, 0.5))
    }
    /// Length of the first side.
    #[inline]
    pub fn w(&self) -> f64 {
        self.aff.m.column(0).norm()
    }
    /// Length of the second side.
    #[inline]
    pub fn h(&self) -> f64 {
        self.aff.m.column(1).norm()
    }
    #[inline]
    pub fn signed_area(&self) -> f64 {
        self.aff.det()
    }
    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }
    #[inline]
    pub fn circumference(&self) -> f64 {
        (self.w() + self.h()) * 2.0
    }
    #[inline]
    pub fn to_polygon(&self) -> Polygon {
        Polygon::new(self.corners().to_vec())
    }
    #[inline]
    pub fn bounding_rect(&self) -> Rect {
        let c = self.corners();
        Rect::from_corners(
            c[0].inf(&c[1]).inf(&c[2]).inf(&c[3]),
            c[0].sup(&c[1]).sup(&c[2]).sup(&c[3]),
        )
    }
    #[inline]
    pub fn moments(&self) -> Moments2d {
        Moments2d::unit_square().transformed(&self.aff, 0.0)
    }
    #[inline]
    pub fn transformed(&self, aff: &Aff2d) -> RRect {
        RRect::from_affine(aff.compose(&self.aff))
    }
    /// Rotated rect aligned with the covariance eigenvectors, side `sqrt(12 λ)`.
    ///
    /// Degenerate moments give a zero-sized rrect at the origin.
    pub fn approx_from_moments(m: &Moments2d, cfg: &GeomCfg) -> RRect {
        if cfg.is_degenerate_mass(m.m0) {
            return RRect::from_affine(Aff2d::new(Matrix2::zeros(), Vector2::zeros()));
        }
        let mean = m.mean_eps(cfg.eps_mass);
        let (axes, lambda) = principal_axes(&m.cov_eps(cfg.eps_mass));
        let sides = lambda.map(|l| (12.0 * l).sqrt());
        let lin = axes * Matrix2::from_diagonal(&sides);
        RRect::from_affine(Aff2d::new(lin, mean - lin * Vector2::new(0.5, 0.5)))
    }
}

/// Eigenvectors (as a proper rotation) and clamped eigenvalues of a symmetric 2×2 matrix.
pub(crate) fn principal_axes(s: &Matrix2<f64>) -> (Matrix2<f64>, Vector2<f64>) {
    let eig = SymmetricEigen::new(*s);
    let mut v = eig.eigenvectors;
    if v.determinant() < 0.0 {
        v.column_mut(1).neg_mut();
    }
    (v, eig.eigenvalues.map(|l| l.max(0.0)))
}

pub fn join_rect_rect(a: &Rect, b: &Rect) -> JoinVolume {
    JoinVolume::from_measures(a.intersect(b).area(), a.area(), b.area())
}

fn join_polygons(
    a: &[Vector2<f64>],
    area_a: f64,
    b: &[Vector2<f64>],
    area_b: f64,
    eps: f64,
) -> Result<JoinVolume, GeoError> {
    let inter = clip::intersection_area(a, b, eps)?;
    Ok(JoinVolume::from_measures(inter, area_a, area_b))
}

pub(super) fn register(reg: &mut Registry, cfg: GeomCfg) -> Result<(), GeoError> {
    let eps = cfg.eps_shape;
    reg.register_identity::<Rect>()?;
    reg.register_identity::<RRect>()?;

    reg.register_cast::<Rect, Hyperbox>(|r| Ok(r.to_hyperbox()))?;
    reg.register_cast::<Hyperbox, Rect>(|b| {
        Rect::from_hyperbox(b).ok_or_else(|| GeoError::degenerate("box is not 2D"))
    })?;
    reg.register_castable::<Hyperbox, Rect>(|b| b.dim() == 2)?;
    reg.register_cast::<Rect, Polygon>(|r| Ok(r.to_polygon()))?;
    reg.register_cast::<Rect, RRect>(|r| Ok(r.to_rrect()))?;
    reg.register_cast::<RRect, Polygon>(|r| Ok(r.to_polygon()))?;
    reg.register_cast::<Rect, Moments2d>(|r| Ok(r.moments()))?;
    reg.register_cast::<RRect, Moments2d>(|r| Ok(r.moments()))?;

    reg.register_transform::<Aff2d, RRect, RRect>(|a, r| Ok(r.transformed(a)))?;
    reg.register_transform::<Aff2d, Rect, RRect>(|a, r| Ok(r.to_rrect().transformed(a)))?;

    reg.register_approx::<Moments2d, Rect>(move |m| Ok(Rect::approx_from_moments(m, &cfg)))?;
    reg.register_approx::<Moments2d, RRect>(move |m| Ok(RRect::approx_from_moments(m, &cfg)))?;

    reg.register_upper_bound::<RRect, Rect>(|r| Ok(r.bounding_rect()))?;
    reg.register_upper_bound::<Polygon, Rect>(|p| {
        Rect::bounding(&p.points).ok_or_else(|| GeoError::degenerate("polygon has no vertices"))
    })?;
    reg.register_upper_bound::<PointList2d, Rect>(|pl| {
        Rect::bounding(&pl.points).ok_or_else(|| GeoError::degenerate("point list is empty"))
    })?;

    reg.register_join_volume::<Rect, Rect>(|a, b| Ok(join_rect_rect(a, b)))?;
    reg.register_join_volume::<Rect, RRect>(move |a, b| {
        join_polygons(&a.corners(), a.area(), &b.corners(), b.area(), eps)
    })?;
    reg.register_join_volume::<RRect, RRect>(move |a, b| {
        join_polygons(&a.corners(), a.area(), &b.corners(), b.area(), eps)
    })?;
    reg.register_join_volume::<Rect, Polygon>(move |a, b| {
        join_polygons(&a.corners(), a.area(), &b.points, b.area(), eps)
    })?;
    reg.register_join_volume::<RRect, Polygon>(move |a, b| {
        join_polygons(&a.corners(), a.area(), &b.points, b.area(), eps)
    })?;
    reg.register_join_volume::<Polygon, Polygon>(move |a, b| {
        join_polygons(&a.points, a.area(), &b.points, b.area(), eps)
    })?;
    Ok(())
}

crate::impl_geometric!(Rect, 2);
crate::impl_geometric!(RRect, 2);

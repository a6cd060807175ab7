//! 2D variants: transformations, points and polygons, rectangles, ellipses, moments.
//!
//! Purpose
//! - Fixed-size (`nalgebra` stack types) 2D shapes and the handlers between them.
//! - Each 2D variant widens into its n-D counterpart, so anything registered
//!   in `crate::geomnd` also applies here through the capability DAG.
//!
//! Capability edges declared here (in this order):
//! `Rect → Hyperbox`, `Ellipse → Hyperellipsoid`, `Point2d → Point`,
//! `PointList2d → PointList`, `Polygon → PointList2d`, `Moments2d → Moments`,
//! `Lin2d → Aff2d`, `Sim2d → Aff2d`, `Aff2d → Aff`.
//!
//! Conventions
//! - Polygons may be given in either orientation. Areas returned by joins are
//!   unsigned; `Polygon::moments` is signed by orientation.
//! - `Rect` stores corners as given; `validated()` sorts them.
//!
//! Code cross-refs: `crate::geomnd::register` (must run first), `crate::builtin_registry`.

mod clip;
mod ellipse;
mod moments;
mod points;
mod rect;
mod types;

pub use clip::{clip_convex, intersection_area};
pub use ellipse::Ellipse;
pub use moments::Moments2d;
pub use points::{Point2d, PointList2d, Polygon};
pub use rect::{join_rect_rect, RRect, Rect};
pub use types::{rotation, Aff2d, Lin2d, Sim2d};

use nalgebra::{DVector, Vector2};

use crate::cfg::GeomCfg;
use crate::dispatch::{GeoError, Registry};
use crate::geomnd::{Aff, Dltra, Hyperbox, Hyperellipsoid, Moments, Point, PointList};

/// Declare the 2D capability edges and register every 2D handler.
///
/// Expects the n-D types to be registered already (`crate::geomnd::register`).
pub fn register(reg: &mut Registry, cfg: GeomCfg) -> Result<(), GeoError> {
    let eps = cfg.eps_shape;
    reg.declare_capability::<Rect, Hyperbox>(Rect::to_hyperbox, Rect::from_hyperbox)?;
    reg.declare_capability::<Ellipse, Hyperellipsoid>(
        Ellipse::to_hyperellipsoid,
        Ellipse::from_hyperellipsoid,
    )?;
    reg.declare_capability::<Point2d, Point>(Point2d::to_point, Point2d::from_point)?;
    reg.declare_capability::<PointList2d, PointList>(
        PointList2d::to_point_list,
        PointList2d::from_point_list,
    )?;
    reg.declare_capability::<Polygon, PointList2d>(
        |p| PointList2d::new(p.points.clone()),
        |pl| Some(Polygon::new(pl.points.clone())),
    )?;
    reg.declare_capability::<Moments2d, Moments>(Moments2d::to_moments, Moments2d::from_moments)?;
    reg.declare_capability::<Lin2d, Aff2d>(Lin2d::to_aff2d, move |a| {
        (a.t.norm() <= eps).then(|| Lin2d::new(a.m))
    })?;
    reg.declare_capability::<Sim2d, Aff2d>(Sim2d::to_aff2d, move |a| sim2d_from_aff2d(a, eps))?;
    reg.declare_capability::<Aff2d, Aff>(Aff2d::to_aff, Aff2d::from_aff)?;

    reg.register_identity::<Lin2d>()?;
    reg.register_identity::<Aff2d>()?;
    reg.register_identity::<Sim2d>()?;
    reg.register_cast::<Lin2d, Aff2d>(|l| Ok(l.to_aff2d()))?;
    reg.register_cast::<Sim2d, Aff2d>(|s| Ok(s.to_aff2d()))?;
    reg.register_cast::<Aff2d, Aff>(|a| Ok(a.to_aff()))?;
    reg.register_cast::<Aff, Aff2d>(|a| {
        Aff2d::from_aff(a).ok_or_else(|| GeoError::degenerate("affine map is not 2D"))
    })?;
    reg.register_castable::<Aff, Aff2d>(|a| a.dim() == 2)?;
    reg.register_approx::<Sim2d, Dltra>(|s| {
        Ok(Dltra::new(
            DVector::from_vec(vec![s.offset.x, s.offset.y]),
            s.scale,
        ))
    })?;
    reg.register_approx::<Aff2d, Sim2d>(|a| {
        nearest_sim2d(a).ok_or_else(|| GeoError::degenerate("polar decomposition failed"))
    })?;

    points::register(reg, cfg)?;
    moments::register(reg, cfg)?;
    rect::register(reg, cfg)?;
    ellipse::register(reg, cfg)?;
    tracing::debug!(capabilities = reg.hierarchy().len(), "geom2 registered");
    Ok(())
}

/// Exact recovery of a similarity from its affine form; `None` if the linear
/// part is not a scaled orthogonal matrix.
fn sim2d_from_aff2d(a: &Aff2d, eps: f64) -> Option<Sim2d> {
    if !types::is_scaled_orthogonal(&a.m, eps) {
        return None;
    }
    let det = a.det();
    let scale = det.abs().sqrt();
    let reflect = det < 0.0;
    let q = if scale > 0.0 { a.m / scale } else { a.m };
    Some(similarity(a.t, scale, q, reflect))
}

/// Closest similarity: orthogonal polar factor for the rotation (and
/// reflection), `sqrt(|det|)` for the scale.
fn nearest_sim2d(a: &Aff2d) -> Option<Sim2d> {
    let q = a.polar_factor()?;
    let reflect = q.determinant() < 0.0;
    Some(similarity(a.t, a.det().abs().sqrt(), q, reflect))
}

// `q = R(angle) · F^reflect`, so `R = q · F` when reflecting (F is an involution).
fn similarity(
    offset: Vector2<f64>,
    scale: f64,
    q: nalgebra::Matrix2<f64>,
    reflect: bool,
) -> Sim2d {
    let r = if reflect { q * types::reflect_x() } else { q };
    Sim2d::new(offset, scale, r[(1, 0)].atan2(r[(0, 0)]), reflect)
}

#[cfg(test)]
mod tests;

//! Hyperellipsoid: affine image of the closed unit ball.
//!
//! Stored normalised: the weight is `U S` from the SVD `W = U S Vᵀ`, so the
//! columns are the (perpendicular) semi-axes. `Vᵀ` only rotates the ball.

use nalgebra::{DMatrix, DVector, SVD};

use super::affine::Aff;
use super::hyperbox::Hyperbox;
use crate::cfg::GeomCfg;
use crate::dispatch::{GeoError, Registry};

#[derive(Clone, Debug, PartialEq)]
pub struct Hyperellipsoid {
    pub aff: Aff,
}

impl Hyperellipsoid {
    /// Normalising constructor.
    pub fn new(aff: Aff) -> Self {
        Self {
            aff: normalised(aff),
        }
    }
    /// Keep `aff` as given (semi-axes need not be perpendicular).
    #[inline]
    pub fn from_affine_raw(aff: Aff) -> Self {
        Self { aff }
    }
    #[inline]
    pub fn dim(&self) -> usize {
        self.aff.dim()
    }
    #[inline]
    pub fn center(&self) -> &DVector<f64> {
        &self.aff.bias
    }
    /// `|det W|` times the volume of the unit `n`-ball.
    pub fn volume(&self) -> f64 {
        unit_ball_volume(self.dim()) * self.aff.det().abs()
    }
    /// Per-axis half extents of the tight axis-aligned bounding box (row norms of `W`).
    pub fn half_extents(&self) -> DVector<f64> {
        let w = &self.aff.weight;
        DVector::from_fn(w.nrows(), |i, _| w.row(i).norm())
    }
    /// Tight axis-aligned bounding box.
    pub fn bounding_box(&self) -> Hyperbox {
        let m = self.half_extents();
        Hyperbox {
            min: self.center() - &m,
            max: self.center() + &m,
        }
    }
    /// Axis-aligned ellipsoid inscribed in `b`.
    pub fn inscribed(b: &Hyperbox) -> Hyperellipsoid {
        let v = b.validated();
        Hyperellipsoid {
            aff: Aff {
                weight: DMatrix::from_diagonal(&(v.size() * 0.5)),
                bias: v.center(),
            },
        }
    }
    /// Image under `aff`; None on mismatched dimensions.
    pub fn transformed(&self, aff: &Aff) -> Option<Hyperellipsoid> {
        aff.compose(&self.aff).map(Hyperellipsoid::new)
    }
}

fn normalised(aff: Aff) -> Aff {
    if aff.dim() == 0 {
        return aff;
    }
    let svd = SVD::new(aff.weight.clone(), true, false);
    match svd.u {
        Some(u) => Aff {
            weight: u * DMatrix::from_diagonal(&svd.singular_values),
            bias: aff.bias,
        },
        None => aff,
    }
}

/// Volume of the unit ball in `n` dimensions: `V_n = V_{n-2} · 2π / n`.
pub fn unit_ball_volume(n: usize) -> f64 {
    let mut v = if n % 2 == 0 { 1.0 } else { 2.0 };
    let mut k = if n % 2 == 0 { 2 } else { 3 };
    while k <= n {
        v *= 2.0 * std::f64::consts::PI / k as f64;
        k += 2;
    }
    v
}

pub(super) fn register(reg: &mut Registry, _cfg: GeomCfg) -> Result<(), GeoError> {
    reg.register_identity::<Hyperellipsoid>()?;
    reg.register_transform::<Aff, Hyperellipsoid, Hyperellipsoid>(|a, e| {
        e.transformed(a)
            .ok_or_else(|| GeoError::degenerate("affine map and ellipsoid differ in dimension"))
    })?;
    reg.register_transformable::<Aff, Hyperellipsoid>(|a, e| a.dim() == e.dim())?;
    reg.register_upper_bound::<Hyperellipsoid, Hyperbox>(|e| Ok(e.bounding_box()))?;
    reg.register_lower_bound::<Hyperbox, Hyperellipsoid>(|b| Ok(Hyperellipsoid::inscribed(b)))?;
    Ok(())
}

crate::impl_geometric!(Hyperellipsoid, |e| e.dim());

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;
    use std::f64::consts::PI;

    #[test]
    fn unit_ball_volumes() {
        assert_eq!(unit_ball_volume(0), 1.0);
        assert_eq!(unit_ball_volume(1), 2.0);
        assert!((unit_ball_volume(2) - PI).abs() < 1e-12);
        assert!((unit_ball_volume(3) - 4.0 * PI / 3.0).abs() < 1e-12);
        assert!((unit_ball_volume(4) - PI * PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn normalisation_keeps_the_shape() {
        let w = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 0.0, 1.0]);
        let raw = Hyperellipsoid::from_affine_raw(Aff::new(w, dvector![1.0, 1.0]).unwrap());
        let norm = Hyperellipsoid::new(raw.aff.clone());
        let gram_raw = &raw.aff.weight * raw.aff.weight.transpose();
        let gram_norm = &norm.aff.weight * norm.aff.weight.transpose();
        assert!((gram_raw - gram_norm).norm() < 1e-12);
        let c0 = norm.aff.weight.column(0);
        let c1 = norm.aff.weight.column(1);
        assert!(c0.dot(&c1).abs() < 1e-12);
        assert!((raw.volume() - norm.volume()).abs() < 1e-12);
        let (bb_raw, bb_norm) = (raw.bounding_box(), norm.bounding_box());
        assert!((bb_raw.min - bb_norm.min).norm() < 1e-12);
        assert!((bb_raw.max - bb_norm.max).norm() < 1e-12);
    }

    #[test]
    fn inscribed_then_bounded_is_the_box() {
        let b = Hyperbox::new(dvector![0.0, -1.0, 2.0], dvector![4.0, 1.0, 3.0]).unwrap();
        let e = Hyperellipsoid::inscribed(&b);
        let bb = e.bounding_box();
        assert!((bb.min - b.min).norm() < 1e-12);
        assert!((bb.max - b.max).norm() < 1e-12);
    }
}

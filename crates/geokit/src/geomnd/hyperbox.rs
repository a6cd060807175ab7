//! Axis-aligned n-D box given by its min/max corners.

use nalgebra::DVector;

use super::affine::Dlt;
use crate::cfg::GeomCfg;
use crate::dispatch::{GeoError, JoinVolume, Registry};

/// Corners are only set through `new` (or in-crate constructors), so `min`
/// and `max` always share one length:
///
/// ```compile_fail
/// use geokit::geomnd::Hyperbox;
/// use nalgebra::dvector;
/// let b = Hyperbox { min: dvector![0.0, 0.0], max: dvector![1.0] };
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Hyperbox {
    pub(crate) min: DVector<f64>,
    pub(crate) max: DVector<f64>,
}

impl Hyperbox {
    /// None on mismatched corner dimensions.
    pub fn new(min: DVector<f64>, max: DVector<f64>) -> Option<Self> {
        if min.len() != max.len() {
            return None;
        }
        Some(Self { min, max })
    }
    #[inline]
    pub fn min(&self) -> &DVector<f64> {
        &self.min
    }
    #[inline]
    pub fn max(&self) -> &DVector<f64> {
        &self.max
    }
    #[inline]
    pub fn dim(&self) -> usize {
        self.min.len()
    }
    #[inline]
    pub fn center(&self) -> DVector<f64> {
        (&self.min + &self.max) * 0.5
    }
    /// Signed side lengths `max - min`.
    #[inline]
    pub fn size(&self) -> DVector<f64> {
        &self.max - &self.min
    }
    /// Whether `min <= max` on every axis.
    pub fn is_valid(&self) -> bool {
        self.min.iter().zip(self.max.iter()).all(|(a, b)| a <= b)
    }
    /// Same box with each axis' corners ordered.
    pub fn validated(&self) -> Hyperbox {
        Hyperbox {
            min: self.min.zip_map(&self.max, f64::min),
            max: self.min.zip_map(&self.max, f64::max),
        }
    }
    /// Absolute interior measure (0 for a zero-dimensional box).
    pub fn volume(&self) -> f64 {
        if self.dim() == 0 {
            return 0.0;
        }
        self.size().iter().product::<f64>().abs()
    }
    /// Axis-wise overlap; empty overlaps collapse to zero extent at the touching corner.
    pub fn intersect(&self, other: &Hyperbox) -> Option<Hyperbox> {
        if self.dim() != other.dim() {
            return None;
        }
        let min = self.min.zip_map(&other.min, f64::max);
        let max = self.max.zip_map(&other.max, f64::min).zip_map(&min, f64::max);
        Some(Hyperbox { min, max })
    }
    /// Smallest box containing both.
    pub fn union(&self, other: &Hyperbox) -> Option<Hyperbox> {
        if self.dim() != other.dim() {
            return None;
        }
        Some(Hyperbox {
            min: self.min.zip_map(&other.min, f64::min),
            max: self.max.zip_map(&other.max, f64::max),
        })
    }
    /// The dilatation mapping `[-1, 1]^n` onto this box.
    pub fn to_dlt(&self) -> Dlt {
        Dlt {
            offset: self.center(),
            scale: self.size() * 0.5,
        }
    }
    /// Image of `[-1, 1]^n` under `dlt`.
    pub fn from_dlt(dlt: &Dlt) -> Hyperbox {
        Hyperbox {
            min: &dlt.offset - &dlt.scale,
            max: &dlt.offset + &dlt.scale,
        }
        .validated()
    }
    /// Image under `dlt`; None on mismatched dimensions.
    pub fn dilate(&self, dlt: &Dlt) -> Option<Hyperbox> {
        if dlt.dim() != self.dim() {
            return None;
        }
        Some(
            Hyperbox {
                min: dlt.apply(&self.min),
                max: dlt.apply(&self.max),
            }
            .validated(),
        )
    }
}

/// Interior measures of two boxes of equal dimension.
pub fn join_volume(a: &Hyperbox, b: &Hyperbox) -> Result<JoinVolume, GeoError> {
    let inter = a
        .intersect(b)
        .ok_or_else(|| GeoError::degenerate("boxes differ in dimension"))?;
    Ok(JoinVolume::from_measures(inter.volume(), a.volume(), b.volume()))
}

pub(super) fn register(reg: &mut Registry, _cfg: GeomCfg) -> Result<(), GeoError> {
    reg.register_identity::<Hyperbox>()?;
    reg.register_transform::<Dlt, Hyperbox, Hyperbox>(|d, b| {
        b.dilate(d)
            .ok_or_else(|| GeoError::degenerate("dilatation and box differ in dimension"))
    })?;
    reg.register_transformable::<Dlt, Hyperbox>(|d, b| d.dim() == b.dim())?;
    reg.register_join_volume::<Hyperbox, Hyperbox>(join_volume)?;
    Ok(())
}

crate::impl_geometric!(Hyperbox, |b| b.dim());

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::dvector;

    #[test]
    fn intersect_disjoint_has_zero_volume() {
        let a = Hyperbox::new(dvector![0.0, 0.0, 0.0], dvector![1.0, 1.0, 1.0]).unwrap();
        let b = Hyperbox::new(dvector![2.0, 0.0, 0.0], dvector![3.0, 1.0, 1.0]).unwrap();
        let i = a.intersect(&b).unwrap();
        assert_eq!(i.volume(), 0.0);
        assert!(i.is_valid());
        assert_eq!(a.union(&b).unwrap().volume(), 3.0);
    }

    #[test]
    fn dlt_roundtrip_and_negative_scale() {
        let b = Hyperbox::new(dvector![-1.0, 2.0], dvector![3.0, 4.0]).unwrap();
        assert_eq!(Hyperbox::from_dlt(&b.to_dlt()), b);
        let flip = Dlt::new(dvector![0.0, 0.0], dvector![-1.0, 2.0]).unwrap();
        let img = b.dilate(&flip).unwrap();
        assert_eq!(img.min, dvector![-3.0, 4.0]);
        assert_eq!(img.max, dvector![1.0, 8.0]);
        assert!((img.volume() - 2.0 * b.volume()).abs() < 1e-12);
    }
}

//! 2D points, point lists, and polygons (vertex lists of either orientation).

use nalgebra::{DVector, Matrix2, Vector2};

use super::clip;
use super::moments::Moments2d;
use super::types::Aff2d;
use crate::cfg::GeomCfg;
use crate::dispatch::{GeoError, Registry};
use crate::geomnd::{Point, PointList};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point2d {
    pub p: Vector2<f64>,
}

impl Point2d {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            p: Vector2::new(x, y),
        }
    }
    #[inline]
    pub fn to_point(&self) -> Point {
        Point::new(DVector::from_vec(vec![self.p.x, self.p.y]))
    }
    pub fn from_point(p: &Point) -> Option<Self> {
        (p.dim() == 2).then(|| Self::new(p.p[0], p.p[1]))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointList2d {
    pub points: Vec<Vector2<f64>>,
}

impl PointList2d {
    #[inline]
    pub fn new(points: Vec<Vector2<f64>>) -> Self {
        Self { points }
    }
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn transformed(&self, aff: &Aff2d) -> Self {
        Self::new(self.points.iter().map(|p| aff.apply(*p)).collect())
    }
    pub fn to_point_list(&self) -> PointList {
        PointList::from_parts(
            2,
            self.points
                .iter()
                .map(|p| DVector::from_vec(vec![p.x, p.y]))
                .collect(),
        )
    }
    pub fn from_point_list(pl: &PointList) -> Option<Self> {
        if pl.dim() != 2 {
            return None;
        }
        Some(Self::new(
            pl.points().iter().map(|p| Vector2::new(p[0], p[1])).collect(),
        ))
    }
}

/// Simple polygon given by its vertices (closing edge implied).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Polygon {
    pub points: Vec<Vector2<f64>>,
}

impl Polygon {
    #[inline]
    pub fn new(points: Vec<Vector2<f64>>) -> Self {
        Self { points }
    }
    /// Shoelace area; positive for counterclockwise vertices.
    #[inline]
    pub fn signed_area(&self) -> f64 {
        clip::signed_area(&self.points)
    }
    #[inline]
    pub fn area(&self) -> f64 {
        self.signed_area().abs()
    }
    #[inline]
    pub fn is_convex(&self, eps: f64) -> bool {
        clip::is_convex(&self.points, eps)
    }
    /// No two non-adjacent edges cross; joins reject rings failing this.
    #[inline]
    pub fn is_simple(&self, eps: f64) -> bool {
        clip::is_simple(&self.points, eps)
    }
    /// Same polygon with counterclockwise vertices.
    pub fn to_ccw(&self) -> Polygon {
        let mut pts = self.points.clone();
        if self.signed_area() < 0.0 {
            pts.reverse();
        }
        Polygon::new(pts)
    }
    pub fn transformed(&self, aff: &Aff2d) -> Polygon {
        Polygon::new(self.points.iter().map(|p| aff.apply(*p)).collect())
    }
    /// Area moments of the interior, signed by orientation (Green's theorem per edge).
    pub fn moments(&self) -> Moments2d {
        let n = self.points.len();
        let mut m = Moments2d::zeros();
        if n < 3 {
            return m;
        }
        let (mut mxx, mut myy, mut mxy) = (0.0, 0.0, 0.0);
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            let c = a.x * b.y - b.x * a.y;
            m.m0 += c;
            m.m1.x += (a.x + b.x) * c;
            m.m1.y += (a.y + b.y) * c;
            mxx += (a.x * a.x + a.x * b.x + b.x * b.x) * c;
            myy += (a.y * a.y + a.y * b.y + b.y * b.y) * c;
            mxy += (a.x * b.y + 2.0 * a.x * a.y + 2.0 * b.x * b.y + b.x * a.y) * c;
        }
        m.m0 /= 2.0;
        m.m1 /= 6.0;
        m.m2 = Matrix2::new(mxx / 12.0, mxy / 24.0, mxy / 24.0, myy / 12.0);
        m
    }
}

pub(super) fn register(reg: &mut Registry, _cfg: GeomCfg) -> Result<(), GeoError> {
    reg.register_identity::<Point2d>()?;
    reg.register_identity::<PointList2d>()?;
    reg.register_identity::<Polygon>()?;

    reg.register_cast::<Point2d, Point>(|p| Ok(p.to_point()))?;
    reg.register_cast::<Point, Point2d>(|p| {
        Point2d::from_point(p).ok_or_else(|| GeoError::degenerate("point is not 2D"))
    })?;
    reg.register_castable::<Point, Point2d>(|p| p.dim() == 2)?;
    reg.register_cast::<PointList2d, PointList>(|pl| Ok(pl.to_point_list()))?;
    reg.register_cast::<PointList, PointList2d>(|pl| {
        PointList2d::from_point_list(pl).ok_or_else(|| GeoError::degenerate("point list is not 2D"))
    })?;
    reg.register_castable::<PointList, PointList2d>(|pl| pl.dim() == 2)?;
    reg.register_cast::<Polygon, PointList2d>(|p| Ok(PointList2d::new(p.points.clone())))?;
    reg.register_cast::<PointList2d, Polygon>(|pl| Ok(Polygon::new(pl.points.clone())))?;
    reg.register_cast::<Polygon, Moments2d>(|p| Ok(p.moments()))?;

    reg.register_transform::<Aff2d, Point2d, Point2d>(|a, p| Ok(Point2d { p: a.apply(p.p) }))?;
    reg.register_transform::<Aff2d, PointList2d, PointList2d>(|a, pl| Ok(pl.transformed(a)))?;
    reg.register_transform::<Aff2d, Polygon, Polygon>(|a, p| Ok(p.transformed(a)))?;
    Ok(())
}

crate::impl_geometric!(Point2d, 2);
crate::impl_geometric!(PointList2d, 2);
crate::impl_geometric!(Polygon, 2);

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::vector;

    fn unit_square() -> Polygon {
        Polygon::new(vec![
            vector![0.0, 0.0],
            vector![1.0, 0.0],
            vector![1.0, 1.0],
            vector![0.0, 1.0],
        ])
    }

    #[test]
    fn square_moments_match_closed_form() {
        let m = unit_square().moments();
        let expect = Moments2d::unit_square();
        assert!((m.m0 - expect.m0).abs() < 1e-12);
        assert!((m.m1 - expect.m1).norm() < 1e-12);
        assert!((m.m2 - expect.m2).norm() < 1e-12);
    }

    #[test]
    fn clockwise_polygon_has_negated_moments() {
        let ccw = unit_square();
        let mut cw = ccw.clone();
        cw.points.reverse();
        assert!(cw.signed_area() < 0.0);
        let (a, b) = (ccw.moments(), cw.moments().negate());
        assert!((a.m0 - b.m0).abs() < 1e-12);
        assert!((a.m2 - b.m2).norm() < 1e-12);
        assert_eq!(cw.to_ccw().signed_area(), 1.0);
    }

    #[test]
    fn triangle_moments_mean_is_centroid() {
        let t = Polygon::new(vec![vector![0.0, 0.0], vector![3.0, 0.0], vector![0.0, 3.0]]);
        let m = t.moments();
        assert!((m.m0 - 4.5).abs() < 1e-12);
        assert!((m.mean() - vector![1.0, 1.0]).norm() < 1e-12);
    }

    #[test]
    fn point_list_dynamic_roundtrip() {
        let pl = PointList2d::new(vec![vector![1.0, 2.0], vector![3.0, 4.0]]);
        assert_eq!(PointList2d::from_point_list(&pl.to_point_list()), Some(pl));
        let p = Point2d::new(1.0, -1.0);
        assert_eq!(Point2d::from_point(&p.to_point()), Some(p));
    }
}

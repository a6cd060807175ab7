use super::*;
use crate::dispatch::{Dispatcher, GeoError, OperationKind, Registry, ShapeType};
use crate::geomnd::{Dlt, Dltra, Hyperbox, Hyperellipsoid, Moments, PointList};
use nalgebra::{dvector, matrix, vector};

fn registry() -> Registry {
    crate::builtin_registry().unwrap()
}

#[test]
fn aff2d_casts_to_sim2d_only_when_it_is_a_similarity() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let sim = Sim2d::new(vector![1.0, 2.0], 2.0, 0.5, true);
    let back: Sim2d = d.cast(&sim.to_aff2d()).unwrap();
    assert!(back.reflect);
    assert!((back.scale - 2.0).abs() < 1e-12);
    assert!((back.angle - 0.5).abs() < 1e-12);
    assert!((back.offset - sim.offset).norm() < 1e-12);

    let shear = Aff2d::from_linear(matrix![1.0, 1.0; 0.0, 1.0]);
    let err = d.cast::<Sim2d>(&shear).unwrap_err();
    assert_eq!(
        err,
        GeoError::PredicateRejected {
            kind: OperationKind::Cast,
            from: ShapeType::of::<Aff2d>(),
            to: ShapeType::of::<Sim2d>(),
        }
    );
    // The narrowing only runs on the cast itself.
    assert!(d.can_cast(&shear, ShapeType::of::<Sim2d>()).unwrap());
}

#[test]
fn aff2d_narrows_to_lin2d_without_translation() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let lin = Lin2d::new(matrix![2.0, 1.0; 0.0, 3.0]);
    let back: Lin2d = d.cast(&lin.to_aff2d()).unwrap();
    assert_eq!(back, lin);
    let moved = Aff2d::new(lin.m, vector![0.0, 1.0]);
    assert!(matches!(
        d.cast::<Lin2d>(&moved),
        Err(GeoError::PredicateRejected { .. })
    ));
}

#[test]
fn approx_aff2d_picks_polar_rotation() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let a = Aff2d::new(
        matrix![3.0, 0.0; 0.0, 1.0] * rotation(0.3),
        vector![-1.0, 4.0],
    );
    let s: Sim2d = d.approx(&a).unwrap();
    assert!(!s.reflect);
    assert!((s.angle - 0.3).abs() < 1e-12);
    assert!((s.scale - 3f64.sqrt()).abs() < 1e-12);
    assert_eq!(s.offset, a.t);

    let flipped = Aff2d::from_linear(rotation(-0.2) * types::reflect_x() * 2.0);
    let s: Sim2d = d.approx(&flipped).unwrap();
    assert!(s.reflect);
    assert!((s.angle + 0.2).abs() < 1e-12);
    assert!((s.to_aff2d().m - flipped.m).norm() < 1e-12);
}

#[test]
fn approx_sim2d_drops_rotation() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let s = Sim2d::new(vector![1.5, -0.5], 4.0, 1.0, false);
    let t: Dltra = d.approx(&s).unwrap();
    assert_eq!(t.offset, dvector![1.5, -0.5]);
    assert_eq!(t.scale, 4.0);
}

#[test]
fn similarity_on_rect_widens_to_affine_handler() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let r = Rect::new(0.0, 0.0, 2.0, 1.0);
    let s = Sim2d::new(vector![1.0, 1.0], 2.0, 0.25, false);
    let out: RRect = d.transform_into(&s, &r).unwrap();
    assert!((out.area() - 8.0).abs() < 1e-12);
    assert!((out.center() - s.apply(r.center())).norm() < 1e-12);

    let lin = Lin2d::new(matrix![1.0, 0.0; 0.0, -1.0]);
    let out: RRect = d.transform_into(&lin, &r).unwrap();
    assert!(out.signed_area() < 0.0);
    assert!((out.area() - r.area()).abs() < 1e-12);
}

#[test]
fn transformed_polygon_moments_match_transformed_moments() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let poly = Polygon::new(vec![
        vector![0.0, 0.0],
        vector![4.0, 0.0],
        vector![4.0, 1.0],
        vector![1.0, 1.0],
        vector![1.0, 3.0],
        vector![0.0, 3.0],
    ]);
    let a = Aff2d::new(matrix![1.0, 0.5; -0.3, 2.0], vector![2.0, -1.0]);
    let moved: Polygon = d.transform_into(&a, &poly).unwrap();
    let m_then_t: Moments2d = d
        .transform_into(&a, &d.cast::<Moments2d>(&poly).unwrap())
        .unwrap();
    let t_then_m: Moments2d = d.cast(&moved).unwrap();
    assert!((m_then_t.m0 - t_then_m.m0).abs() < 1e-8);
    assert!((m_then_t.m1 - t_then_m.m1).norm() < 1e-8);
    assert!((m_then_t.m2 - t_then_m.m2).norm() < 1e-8);
}

#[test]
fn moments_round_trip_through_nd() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let m = Rect::new(0.0, 0.0, 2.0, 3.0).moments();
    let nd: Moments = d.cast(&m).unwrap();
    assert_eq!(nd.dim(), 2);
    let back: Moments2d = d.cast(&nd).unwrap();
    assert!((back.m2 - m.m2).norm() < 1e-12);

    let three = Moments::zeros(3);
    assert!(matches!(
        d.cast::<Moments2d>(&three),
        Err(GeoError::PredicateRejected { .. })
    ));
}

#[test]
fn approx_rect_and_rrect_from_moments() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let r = Rect::new(1.0, 2.0, 5.0, 3.0);
    let m: Moments2d = d.cast(&r).unwrap();
    let back: Rect = d.approx(&m).unwrap();
    assert!((back.min - r.min).norm() < 1e-9);
    assert!((back.max - r.max).norm() < 1e-9);
    let rr: RRect = d.approx(&m).unwrap();
    assert!((rr.area() - r.area()).abs() < 1e-9);
    assert!((rr.center() - r.center()).norm() < 1e-9);
}

#[test]
fn upper_bounds_of_point_sets() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let pl = PointList2d::new(vec![vector![1.0, 5.0], vector![-2.0, 0.5], vector![3.0, 2.0]]);
    let b: Rect = d.upper_bound(&pl).unwrap();
    assert_eq!(b, Rect::new(-2.0, 0.5, 3.0, 5.0));
    let poly = Polygon::new(pl.points.clone());
    assert_eq!(d.upper_bound::<Rect>(&poly).unwrap(), b);
    assert!(matches!(
        d.upper_bound::<Rect>(&PointList2d::default()),
        Err(GeoError::ShapeDegenerate { .. })
    ));
}

#[test]
fn ellipse_bounds_bracket_the_rect() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let r = Rect::new(-1.0, 0.0, 3.0, 2.0);
    let inner: Ellipse = d.lower_bound(&r).unwrap();
    let outer: Rect = d.upper_bound(&inner).unwrap();
    assert!(inner.area() <= r.area());
    assert!((outer.min - r.min).norm() < 1e-12);
    assert!((outer.max - r.max).norm() < 1e-12);
}

#[test]
fn dilatation_on_ellipse_goes_through_hyperellipsoid() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let e = Ellipse::axis_aligned(vector![1.0, 0.0], vector![1.0, 2.0]);
    let dlt = Dlt::new(dvector![0.0, 1.0], dvector![3.0, 0.5]).unwrap();
    let out = d.transform(&dlt, &e).unwrap();
    let he = out.downcast::<Hyperellipsoid>().unwrap();
    assert!((he.volume() - e.area() * 1.5).abs() < 1e-9);
    assert!((he.center() - dvector![3.0, 1.0]).norm() < 1e-12);
}

#[test]
fn dilatation_on_point_list2d_returns_nd_list() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let pl = PointList2d::new(vec![vector![1.0, 1.0], vector![2.0, -1.0]]);
    let dlt = Dlt::new(dvector![1.0, 0.0], dvector![2.0, 3.0]).unwrap();
    let out: PointList = d.transform_into(&dlt, &pl).unwrap();
    assert_eq!(out.points(), &[dvector![3.0, 3.0], dvector![5.0, -3.0]]);

    let wrong = Dlt::new(dvector![0.0, 0.0, 0.0], dvector![1.0, 1.0, 1.0]).unwrap();
    assert_eq!(
        d.transform(&wrong, &pl).unwrap_err(),
        GeoError::IncompatibleTransform {
            from: ShapeType::of::<Dlt>(),
            to: ShapeType::of::<PointList2d>(),
        }
    );
}

#[test]
fn rect_joins_against_rotated_and_polygon_shapes() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let a = Rect::new(0.0, 0.0, 2.0, 2.0);
    let b = Rect::new(1.0, 1.0, 3.0, 3.0).to_rrect();
    let j = d.join_volume(&a, &b).unwrap();
    assert!((j.intersection - 1.0).abs() < 1e-12);
    assert!((j.union - 7.0).abs() < 1e-12);

    let tri = Polygon::new(vec![vector![0.0, 0.0], vector![4.0, 0.0], vector![0.0, 4.0]]);
    let j = d.join_volume(&tri, &a).unwrap();
    assert!((j.intersection - 4.0).abs() < 1e-12);
    assert!((j.a_only - 4.0).abs() < 1e-12);
    assert!(j.b_only.abs() < 1e-12);
    assert!(j.is_additive(1e-12));
}

#[test]
fn rect_and_hyperbox_joins_agree() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let a = Rect::new(0.0, 0.0, 10.0, 5.0);
    let b = Rect::new(5.0, 0.0, 15.0, 5.0);
    let j2 = d.join_volume(&a, &b).unwrap();
    let jn = d.join_volume(&a.to_hyperbox(), &b.to_hyperbox()).unwrap();
    assert_eq!(j2, jn);
    let mixed = d.join_volume(&a, &b.to_hyperbox()).unwrap();
    assert_eq!(mixed, j2);
}

#[test]
fn three_d_box_does_not_cast_to_rect() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let b = Hyperbox::new(dvector![0.0, 0.0, 0.0], dvector![1.0, 1.0, 1.0]).unwrap();
    assert!(!d.can_cast(&b, ShapeType::of::<Rect>()).unwrap());
    let flat = Hyperbox::new(dvector![0.0, 0.0], dvector![1.0, 2.0]).unwrap();
    assert!(d.can_cast(&flat, ShapeType::of::<Rect>()).unwrap());
    assert_eq!(d.cast::<Rect>(&flat).unwrap(), Rect::new(0.0, 0.0, 1.0, 2.0));
}

fn ell(dx: f64, dy: f64) -> Polygon {
    Polygon::new(
        [(0.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0), (1.0, 2.0), (0.0, 2.0)]
            .iter()
            .map(|&(x, y)| vector![x + dx, y + dy])
            .collect(),
    )
}

#[test]
fn concave_polygons_join_symmetrically() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let (a, b) = (ell(0.0, 0.0), ell(0.5, 0.5));
    let ab = d.join_volume(&a, &b).unwrap();
    let ba = d.join_volume(&b, &a).unwrap();
    assert!((ab.intersection - 1.25).abs() < 1e-12);
    assert!((ab.a_only - 1.75).abs() < 1e-12);
    assert!((ab.union - 4.75).abs() < 1e-12);
    assert!((ab.intersection - ba.intersection).abs() < 1e-12);
    assert!(ab.is_additive(1e-12));

    let own = d.join_volume(&a, &a).unwrap();
    assert!((own.intersection - a.area()).abs() < 1e-12);
    assert!(own.a_only.abs() < 1e-12 && own.b_only.abs() < 1e-12);
}

#[test]
fn self_intersecting_polygon_is_rejected() {
    let reg = registry();
    let d = Dispatcher::new(&reg);
    let star = Polygon::new(
        (0..5)
            .map(|k| {
                let t = std::f64::consts::FRAC_PI_2 + k as f64 * 0.8 * std::f64::consts::PI;
                vector![t.cos(), t.sin()]
            })
            .collect(),
    );
    assert!(!star.is_simple(1e-9));
    assert!(!star.is_convex(1e-9));
    let frame = Rect::new(-5.0, -5.0, 5.0, 5.0);
    for err in [
        d.join_volume(&frame, &star).unwrap_err(),
        d.join_volume(&star, &frame).unwrap_err(),
        d.join_volume(&star, &star).unwrap_err(),
    ] {
        assert!(matches!(err, GeoError::ShapeDegenerate { .. }));
    }
}

//! Planar polygon helpers: shoelace area, convexity, simplicity, clipping.
//!
//! Polygons are closed vertex rings in either orientation and must be simple
//! (no two non-adjacent edges cross). Intersection areas:
//! - one operand convex: Sutherland–Hodgman with the convex one as window
//!   (exact area for any simple subject, spurious zero-width edges aside);
//! - both concave: signed fan triangulation of each ring. The signed fan
//!   triangles sum to the ring's winding number, so
//!   `|A ∩ B| = |Σᵢ Σⱼ sᵢ sⱼ |Tᵢ ∩ Uⱼ||` with every term a convex clip.

use nalgebra::Vector2;

use crate::dispatch::GeoError;

/// Orientation of `c` relative to the directed line `a → b` (twice the triangle area).
#[inline]
pub(crate) fn cross(a: Vector2<f64>, b: Vector2<f64>, c: Vector2<f64>) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

/// Shoelace signed area; positive for counterclockwise vertex order.
pub fn signed_area(points: &[Vector2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let (a, b) = (points[i], points[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice / 2.0
}

/// Non-zero edge vectors of the closed ring.
fn edges(points: &[Vector2<f64>]) -> Vec<Vector2<f64>> {
    let n = points.len();
    (0..n)
        .map(|i| points[(i + 1) % n] - points[i])
        .filter(|e| e.norm_squared() > 0.0)
        .collect()
}

/// Whether the ring bounds a convex region: turns never change sign
/// (collinear runs tolerated) and wind exactly once.
///
/// `eps` is relative to the squared bounding extent of the points.
pub fn is_convex(points: &[Vector2<f64>], eps: f64) -> bool {
    let es = edges(points);
    let n = es.len();
    if n < 3 {
        return false;
    }
    let tol = eps * extent_sq(points).max(f64::MIN_POSITIVE);
    let (mut pos, mut neg) = (false, false);
    let mut turning = 0.0;
    for i in 0..n {
        let (e1, e2) = (es[i], es[(i + 1) % n]);
        let t = e1.x * e2.y - e1.y * e2.x;
        if t > tol {
            pos = true;
        } else if t < -tol {
            neg = true;
        }
        if pos && neg {
            return false;
        }
        turning += t.atan2(e1.dot(&e2));
    }
    // A pentagram turns the same way at every vertex but winds twice.
    (turning.abs() - std::f64::consts::TAU).abs() < 1e-6
}

/// Whether no two non-adjacent edges cross properly.
///
/// Touching and collinear overlaps are tolerated: they leave the winding
/// number at 0 or ±1 almost everywhere. O(n²) in the vertex count.
pub fn is_simple(points: &[Vector2<f64>], eps: f64) -> bool {
    let n = points.len();
    if n < 4 {
        return true;
    }
    let tol = eps * extent_sq(points).max(f64::MIN_POSITIVE);
    let straddles = |p: f64, q: f64| (p > tol && q < -tol) || (p < -tol && q > tol);
    for i in 0..n {
        let (a, b) = (points[i], points[(i + 1) % n]);
        // Edge i is adjacent to i - 1 and i + 1 (cyclically).
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (c, d) = (points[j], points[(j + 1) % n]);
            if straddles(cross(a, b, c), cross(a, b, d))
                && straddles(cross(c, d, a), cross(c, d, b))
            {
                return false;
            }
        }
    }
    true
}

fn extent_sq(points: &[Vector2<f64>]) -> f64 {
    let (lo, hi) = bounds(points);
    (hi - lo).norm_squared()
}

fn bounds(points: &[Vector2<f64>]) -> (Vector2<f64>, Vector2<f64>) {
    let mut lo = Vector2::repeat(f64::INFINITY);
    let mut hi = Vector2::repeat(f64::NEG_INFINITY);
    for p in points {
        lo = lo.inf(p);
        hi = hi.sup(p);
    }
    (lo, hi)
}

#[inline]
fn line_hit(s: Vector2<f64>, e: Vector2<f64>, a: Vector2<f64>, b: Vector2<f64>) -> Vector2<f64> {
    let (cs, ce) = (cross(a, b, s), cross(a, b, e));
    let denom = cs - ce;
    if denom == 0.0 {
        return e;
    }
    s + (e - s) * (cs / denom)
}

/// Sutherland–Hodgman: `subject ∩ clip` for a convex `clip` (either orientation).
pub fn clip_convex(subject: &[Vector2<f64>], clip: &[Vector2<f64>]) -> Vec<Vector2<f64>> {
    let mut window = clip.to_vec();
    if signed_area(&window) < 0.0 {
        window.reverse();
    }
    let mut out = subject.to_vec();
    let m = window.len();
    for k in 0..m {
        if out.is_empty() {
            break;
        }
        let (a, b) = (window[k], window[(k + 1) % m]);
        let input = std::mem::take(&mut out);
        let mut prev = input[input.len() - 1];
        for &cur in &input {
            let cur_in = cross(a, b, cur) >= 0.0;
            let prev_in = cross(a, b, prev) >= 0.0;
            if cur_in {
                if !prev_in {
                    out.push(line_hit(prev, cur, a, b));
                }
                out.push(cur);
            } else if prev_in {
                out.push(line_hit(prev, cur, a, b));
            }
            prev = cur;
        }
    }
    out
}

struct FanTriangle {
    corners: [Vector2<f64>; 3],
    sign: f64,
    lo: Vector2<f64>,
    hi: Vector2<f64>,
}

/// Triangles `(p₀, pᵢ, pᵢ₊₁)` with their orientation; slivers below `tol` are dropped.
fn fan(points: &[Vector2<f64>], tol: f64) -> Vec<FanTriangle> {
    let p0 = points[0];
    points
        .windows(2)
        .skip(1)
        .filter_map(|w| {
            let corners = [p0, w[0], w[1]];
            let twice = cross(p0, w[0], w[1]);
            if twice.abs() <= tol {
                return None;
            }
            let (lo, hi) = bounds(&corners);
            Some(FanTriangle {
                corners,
                sign: twice.signum(),
                lo,
                hi,
            })
        })
        .collect()
}

/// Area of `a ∩ b` for two simple rings of any convexity.
fn fan_intersection_area(a: &[Vector2<f64>], b: &[Vector2<f64>], eps: f64) -> f64 {
    let tol = eps * extent_sq(a).max(extent_sq(b)).max(f64::MIN_POSITIVE);
    let (ta, tb) = (fan(a, tol), fan(b, tol));
    let mut acc = 0.0;
    for t in &ta {
        for u in &tb {
            if t.hi.x < u.lo.x || u.hi.x < t.lo.x || t.hi.y < u.lo.y || u.hi.y < t.lo.y {
                continue;
            }
            let piece = signed_area(&clip_convex(&t.corners, &u.corners)).abs();
            acc += t.sign * u.sign * piece;
        }
    }
    acc.abs()
}

/// Area of `a ∩ b` for simple polygons; self-intersecting rings are rejected.
pub fn intersection_area(
    a: &[Vector2<f64>],
    b: &[Vector2<f64>],
    eps: f64,
) -> Result<f64, GeoError> {
    if a.len() < 3 || b.len() < 3 {
        return Ok(0.0);
    }
    if !is_simple(a, eps) || !is_simple(b, eps) {
        return Err(GeoError::degenerate("polygon is self-intersecting"));
    }
    let area = if is_convex(b, eps) {
        signed_area(&clip_convex(a, b)).abs()
    } else if is_convex(a, eps) {
        signed_area(&clip_convex(b, a)).abs()
    } else {
        fan_intersection_area(a, b, eps)
    };
    Ok(area)
}

//! Interoperability registry for geometric entities.
//!
//! Heterogeneous 2D and n-D shapes, point sets, moments, and transformations
//! cast, transform, approximate, bound, and measure overlap with each other
//! through one sealed operation registry.
//!
//! Layout
//! - `dispatch`: type tokens, registry, capability DAG, dispatcher, `GeoError`.
//! - `geomnd`: dimension-generic variants (`Hyperbox`, `Aff`, `Moments`, ...).
//! - `geom2`: fixed-size 2D variants (`Rect`, `RRect`, `Ellipse`, `Aff2d`, ...).
//! - `cfg`: tolerances captured by the registered handlers.
//!
//! Usage
//! ```
//! use geokit::prelude::*;
//!
//! let reg = geokit::builtin_registry().unwrap();
//! let d = Dispatcher::new(&reg);
//! let a = Rect::new(0.0, 0.0, 10.0, 5.0);
//! let b = Rect::new(5.0, 0.0, 15.0, 5.0);
//! assert_eq!(d.join_volume(&a, &b).unwrap().as_tuple(), (25.0, 25.0, 25.0, 75.0));
//! ```
//!
//! API Policy
//! - The registry is built explicitly and sealed once; there is no global
//!   instance. Callers wanting one process-wide registry hold it themselves
//!   (e.g. in a `OnceLock`).

pub mod cfg;
pub mod dispatch;
pub mod geom2;
pub mod geomnd;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use cfg::GeomCfg;
pub use dispatch::{Dispatcher, GeoError, Registry};

/// Build and seal the registry with every built-in handler, default tolerances.
pub fn builtin_registry() -> Result<Registry, GeoError> {
    builtin_registry_with(GeomCfg::default())
}

/// As `builtin_registry`, with `cfg` captured by every registered handler.
///
/// Order matters only for capability declaration (the n-D module first, since
/// the 2D edges point into it); handler registration order does not affect
/// resolution.
pub fn builtin_registry_with(cfg: GeomCfg) -> Result<Registry, GeoError> {
    let mut reg = Registry::new();
    geomnd::register(&mut reg, cfg)?;
    geom2::register(&mut reg, cfg)?;
    reg.seal();
    Ok(reg)
}

/// Common exports for quick imports in callers.
pub mod prelude {
    pub use crate::cfg::GeomCfg;
    pub use crate::dispatch::{
        BoundDirection, Dispatcher, GeoError, Geometric, JoinVolume, OperationKind, Registry,
        ShapeType,
    };
    pub use crate::geom2::{
        Aff2d, Ellipse, Lin2d, Moments2d, Point2d, PointList2d, Polygon, RRect, Rect, Sim2d,
    };
    pub use crate::geomnd::{
        Aff, Aff3d, Dlt, Dltra, Hyperbox, Hyperellipsoid, Moments, Moments3d, Point, PointList,
        PointList3d,
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_tolerances_reach_the_handlers() {
        use crate::geom2::{Aff2d, Sim2d};
        use nalgebra::{matrix, vector};

        // Nearly a similarity: columns differ in length by 1e-6.
        let a = Aff2d::new(matrix![1.0, 0.0; 0.0, 1.000_001], vector![0.0, 0.0]);
        let strict = builtin_registry().unwrap();
        assert!(Dispatcher::new(&strict).cast::<Sim2d>(&a).is_err());
        let loose = builtin_registry_with(GeomCfg {
            eps_shape: 1e-3,
            ..GeomCfg::default()
        })
        .unwrap();
        let s: Sim2d = Dispatcher::new(&loose).cast(&a).unwrap();
        assert!((s.scale - 1.0).abs() < 1e-5);
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}

//! n-D variants: points, moments, boxes, ellipsoids, and affine-family transformations.
//!
//! Purpose
//! - Provide the dimension-generic shapes the 2D module widens into, and the
//!   handlers that operate on them.
//!
//! Capability edges declared here: `PointList3d → PointList`,
//! `Moments3d → Moments`, `Aff3d → Aff`, `Dlt → Aff`, `Dltra → Dlt`.
//!
//! Code cross-refs: `crate::geom2` (2D edges into these types), `crate::dispatch::Registry`.

mod affine;
mod ellipsoid;
mod hyperbox;
mod moments;
mod points;

pub use affine::{Aff, Aff3d, Dlt, Dltra};
pub use ellipsoid::{unit_ball_volume, Hyperellipsoid};
pub use hyperbox::{join_volume as join_volume_hyperbox, Hyperbox};
pub use moments::{Moments, Moments3d};
pub use points::{Point, PointList, PointList3d};

use crate::cfg::GeomCfg;
use crate::dispatch::{GeoError, Registry};

/// Declare this module's capability edges and register its handlers.
pub fn register(reg: &mut Registry, cfg: GeomCfg) -> Result<(), GeoError> {
    affine::register(reg, cfg)?;
    points::register(reg, cfg)?;
    moments::register(reg, cfg)?;
    hyperbox::register(reg, cfg)?;
    ellipsoid::register(reg, cfg)?;
    tracing::debug!(capabilities = reg.hierarchy().len(), "geomnd registered");
    Ok(())
}

//! Tolerance defaults and the `GeomCfg` carried into registered handlers.
//!
//! Policy
//! - Defaults are fixed constants. `builtin_registry_with(cfg)` is the only
//!   place a custom config enters; every handler captures it by value.

/// Below this absolute total mass, moments are treated as degenerate.
pub(crate) const EPS_MASS: f64 = 1.490_116_119_384_765_6e-8; // sqrt(f64::EPSILON)
/// Shape checks: dimension-free predicates, narrowing, convexity, zero extents.
pub(crate) const EPS_SHAPE: f64 = 1e-9;

/// Geometry configuration (tolerances).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeomCfg {
    pub eps_mass: f64,
    pub eps_shape: f64,
}

impl Default for GeomCfg {
    fn default() -> Self {
        Self {
            eps_mass: EPS_MASS,
            eps_shape: EPS_SHAPE,
        }
    }
}

impl GeomCfg {
    #[inline]
    pub fn is_degenerate_mass(&self, m0: f64) -> bool {
        !(m0.abs() >= self.eps_mass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mass_eps_is_sqrt_machine_eps() {
        let cfg = GeomCfg::default();
        assert!((cfg.eps_mass - f64::EPSILON.sqrt()).abs() < 1e-24);
        assert!(cfg.is_degenerate_mass(0.0));
        assert!(cfg.is_degenerate_mass(f64::NAN));
        assert!(!cfg.is_degenerate_mass(-1.0));
    }
}

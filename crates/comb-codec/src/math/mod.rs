// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Linear algebra used by combination leaves: a row-major `f64` 4×4 matrix
//! and the tolerance pair used to decide when a transform is "no transform".

mod mat4;

pub use mat4::Mat4;

/// Numeric tolerance for matrix comparisons.
///
/// `dist` bounds translation terms (model units); `perp` bounds the
/// dimensionless terms (cosines, scale factors).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Tolerance {
    /// Maximum absolute difference for translation terms.
    pub dist: f64,
    /// Maximum absolute difference for every other term.
    pub perp: f64,
}

impl Tolerance {
    /// Default distance tolerance, in model units (millimetres).
    pub const DEFAULT_DIST: f64 = 0.0005;
    /// Default tolerance for dimensionless terms.
    pub const DEFAULT_PERP: f64 = 1e-6;

    /// Creates a tolerance from explicit bounds.
    pub const fn new(dist: f64, perp: f64) -> Self {
        Self { dist, perp }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIST, Self::DEFAULT_PERP)
    }
}

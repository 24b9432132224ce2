// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::math::Tolerance;

/// Row‑major 4×4 matrix of `f64`, the layout combination records persist.
///
/// - Element `(row, col)` lives at `row * 4 + col`; translation occupies
///   indices 3, 7 and 11.
/// - Points are column vectors, so `A * B` applies `B` first. Composing a
///   placement `M` onto an existing leaf transform `T` is therefore `M * T`.
///
/// # Examples
/// ```
/// use comb_codec::math::Mat4;
/// let t = Mat4::translation(5.0, -3.0, 2.0);
/// assert_eq!(t.transform_point([2.0, 4.0, -1.0]), [7.0, 1.0, 1.0]);
/// ```
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    data: [f64; 16],
}

impl Mat4 {
    /// Returns the identity matrix.
    pub const fn identity() -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, 0.0, // row 0
                0.0, 1.0, 0.0, 0.0, // row 1
                0.0, 0.0, 1.0, 0.0, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    /// Builds a translation matrix.
    ///
    /// Row-major layout: translation occupies the last column of rows 0..3.
    pub const fn translation(tx: f64, ty: f64, tz: f64) -> Self {
        Self {
            data: [
                1.0, 0.0, 0.0, tx, // row 0
                0.0, 1.0, 0.0, ty, // row 1
                0.0, 0.0, 1.0, tz, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    /// Builds a non-uniform scale matrix.
    pub const fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        Self {
            data: [
                sx, 0.0, 0.0, 0.0, // row 0
                0.0, sy, 0.0, 0.0, // row 1
                0.0, 0.0, sz, 0.0, // row 2
                0.0, 0.0, 0.0, 1.0, // row 3
            ],
        }
    }

    /// Builds a rotation about the X axis by `angle` radians.
    #[rustfmt::skip]
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new([
            1.0, 0.0, 0.0, 0.0,
            0.0, c,   -s,  0.0,
            0.0, s,   c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Builds a rotation about the Y axis by `angle` radians.
    #[rustfmt::skip]
    pub fn rotation_y(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new([
            c,   0.0, s,   0.0,
            0.0, 1.0, 0.0, 0.0,
            -s,  0.0, c,   0.0,
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Builds a rotation about the Z axis by `angle` radians.
    #[rustfmt::skip]
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new([
            c,   -s,  0.0, 0.0,
            s,   c,   0.0, 0.0,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ])
    }

    /// Creates a matrix from row-major array data.
    pub const fn new(data: [f64; 16]) -> Self {
        Self { data }
    }

    /// Returns the matrix as a row‑major array.
    pub const fn to_array(self) -> [f64; 16] {
        self.data
    }

    /// Borrows the row-major elements.
    pub const fn as_array(&self) -> &[f64; 16] {
        &self.data
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        self.data[row * 4 + col]
    }

    /// Multiplies the matrix with another matrix (`self * rhs`).
    ///
    /// # Examples
    /// ```
    /// use comb_codec::math::Mat4;
    /// let a = Mat4::identity();
    /// let b = Mat4::scale(2.0, 3.0, 4.0);
    /// assert_eq!(a.multiply(&b), b);
    /// ```
    pub fn multiply(&self, rhs: &Self) -> Self {
        let mut out = [0.0; 16];
        for row in 0..4 {
            for col in 0..4 {
                let mut sum = 0.0;
                for k in 0..4 {
                    sum += self.at(row, k) * rhs.at(k, col);
                }
                out[row * 4 + col] = sum;
            }
        }
        Self::new(out)
    }

    /// Transforms a point (assumes `w = 1`, no perspective divide).
    pub fn transform_point(&self, point: [f64; 3]) -> [f64; 3] {
        let [x, y, z] = point;
        let mut out = [0.0; 3];
        for (row, slot) in out.iter_mut().enumerate() {
            *slot = self.at(row, 0) * x + self.at(row, 1) * y + self.at(row, 2) * z + self.at(row, 3);
        }
        out
    }

    /// Bit-exact comparison against the identity.
    ///
    /// This is the test the record writer uses to decide whether a leaf
    /// consumes a matrix slot; `-0.0` counts as zero.
    pub fn is_identity(&self) -> bool {
        self.data
            .iter()
            .zip(Self::identity().data.iter())
            .all(|(a, b)| a == b)
    }

    /// Identity test within `tol`.
    ///
    /// Translation elements are held to `tol.dist`; every other element
    /// (rotation, scale, perspective, homogeneous scale) to `tol.perp`.
    pub fn is_identity_within(&self, tol: &Tolerance) -> bool {
        self.approx_eq(&Self::identity(), tol)
    }

    /// Element-wise comparison split by translation and non-translation terms.
    pub fn approx_eq(&self, other: &Self, tol: &Tolerance) -> bool {
        self.data
            .iter()
            .zip(other.data.iter())
            .enumerate()
            .all(|(i, (a, b))| {
                let bound = if matches!(i, 3 | 7 | 11) {
                    tol.dist
                } else {
                    tol.perp
                };
                (a - b).abs() <= bound
            })
    }
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<[f64; 16]> for Mat4 {
    fn from(value: [f64; 16]) -> Self {
        Self { data: value }
    }
}

impl From<Mat4> for [f64; 16] {
    fn from(value: Mat4) -> Self {
        value.data
    }
}

impl core::ops::Mul for Mat4 {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self::Output {
        self.multiply(&rhs)
    }
}

impl core::ops::Mul<&Mat4> for &Mat4 {
    type Output = Mat4;
    fn mul(self, rhs: &Mat4) -> Self::Output {
        self.multiply(rhs)
    }
}

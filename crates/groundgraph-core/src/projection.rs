//! Image-plane → ground-plane point projection.
//!
//! The standard projective transform: homogenize `(x, y, 1)`, multiply by
//! the homography, de-homogenize by the third coordinate. A (near-)zero
//! homogeneous weight means the point sits at or behind the vanishing line
//! for this homography and is surfaced as an error so callers can drop the
//! affected detection instead of propagating NaNs.

use nalgebra::{Matrix3, Vector3};

/// Homogeneous weights with absolute value below this are degenerate.
pub const WEIGHT_EPS: f64 = 1e-12;

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ProjectionError {
    /// The homogeneous weight after transformation is numerically negligible.
    DegenerateWeight { weight: f64 },
}

impl std::fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DegenerateWeight { weight } => {
                write!(f, "degenerate projection: homogeneous weight {}", weight)
            }
        }
    }
}

impl std::error::Error for ProjectionError {}

// ── Projection ───────────────────────────────────────────────────────────

/// Project a 2D point through a 3×3 homography: H * [x, y, 1]^T → [x', y'].
///
/// Pure function; safe to invoke independently for every detection in every
/// frame.
pub fn project_point(h: &Matrix3<f64>, p: [f64; 2]) -> Result<[f64; 2], ProjectionError> {
    let q = h * Vector3::new(p[0], p[1], 1.0);
    if q[2].abs() < WEIGHT_EPS {
        return Err(ProjectionError::DegenerateWeight { weight: q[2] });
    }
    Ok([q[0] / q[2], q[1] / q[2]])
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn perspective_h() -> Matrix3<f64> {
        // Scale + translate + mild perspective.
        Matrix3::new(
            3.5, 0.1, 640.0,
            -0.05, 3.3, 480.0,
            0.0001, -0.00005, 1.0,
        )
    }

    #[test]
    fn identity_is_noop() {
        let p = project_point(&Matrix3::identity(), [12.5, -3.0]).unwrap();
        assert_relative_eq!(p[0], 12.5);
        assert_relative_eq!(p[1], -3.0);
    }

    #[test]
    fn roundtrip_through_inverse() {
        let h = perspective_h();
        let h_inv = h.try_inverse().unwrap();

        let p = [50.0, 75.0];
        let q = project_point(&h, p).unwrap();
        let back = project_point(&h_inv, q).unwrap();

        assert_relative_eq!(p[0], back[0], epsilon = 1e-8);
        assert_relative_eq!(p[1], back[1], epsilon = 1e-8);
    }

    #[test]
    fn point_on_vanishing_line_is_degenerate() {
        // Bottom row [0, 1, -10]: weight vanishes along y = 10.
        let h = Matrix3::new(
            1.0, 0.0, 0.0,
            0.0, 1.0, 0.0,
            0.0, 1.0, -10.0,
        );
        match project_point(&h, [3.0, 10.0]) {
            Err(ProjectionError::DegenerateWeight { weight }) => {
                assert!(weight.abs() < WEIGHT_EPS);
            }
            other => panic!("expected DegenerateWeight, got {:?}", other),
        }
        // Off the vanishing line the same H projects fine.
        assert!(project_point(&h, [3.0, 12.0]).is_ok());
    }
}

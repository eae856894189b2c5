//! Ground-plane homography calibration via DLT with Hartley normalization.
//!
//! One-shot at startup: four image-plane corners of a ground rectangle with
//! known real-world proportions are mapped to an axis-aligned bird's-eye
//! rectangle, producing the 3×3 homography every frame projects through,
//! plus the distance threshold expressed in the same projected unit space.

use nalgebra::{DMatrix, Matrix3};

use crate::projection::project_point;

/// Height of the bird's-eye target rectangle, in ground units. The width is
/// scaled from the calibration rectangle's real proportions. All projected
/// coordinates and the distance threshold live in this unit space.
pub const BIRD_VIEW_SPAN: f64 = 1000.0;

/// Relative area tolerance for the collinearity test on calibration points.
const COLLINEAR_EPS: f64 = 1e-9;

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// Calibration requires exactly four image points.
    PointCount { needed: usize, got: usize },
    /// Three of the four points are (near-)collinear; the quad is degenerate.
    CollinearPoints { indices: [usize; 3] },
    /// Rectangle dimensions or safe distance are non-finite or non-positive.
    BadScale { what: &'static str, value: f64 },
    NumericalFailure(String),
}

impl std::fmt::Display for CalibrationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PointCount { needed, got } => {
                write!(f, "calibration needs exactly {} points, got {}", needed, got)
            }
            Self::CollinearPoints { indices } => {
                write!(
                    f,
                    "calibration points {}, {}, {} are collinear",
                    indices[0], indices[1], indices[2]
                )
            }
            Self::BadScale { what, value } => {
                write!(f, "{} must be finite and positive, got {}", what, value)
            }
            Self::NumericalFailure(msg) => write!(f, "numerical failure: {}", msg),
        }
    }
}

impl std::error::Error for CalibrationError {}

// ── Calibration input ────────────────────────────────────────────────────

/// Everything the estimator needs: one reference frame's worth of
/// user-selected geometry.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationInput {
    /// Image-plane corners of a ground rectangle, ordered top-left,
    /// top-right, bottom-right, bottom-left.
    pub image_quad: [[f64; 2]; 4],
    /// Real-world width of that rectangle, in the calibration unit.
    pub rect_width: f64,
    /// Real-world height of that rectangle, in the calibration unit.
    pub rect_height: f64,
    /// Minimum safe ground distance, in the same unit.
    pub safe_distance: f64,
}

impl CalibrationInput {
    /// Construct from a runtime-sized point list, enforcing the exactly-four
    /// contract. Callers with config-file input land here; callers that
    /// already hold four points can build the struct directly.
    pub fn from_points(
        points: &[[f64; 2]],
        rect_width: f64,
        rect_height: f64,
        safe_distance: f64,
    ) -> Result<Self, CalibrationError> {
        let image_quad: [[f64; 2]; 4] = points
            .try_into()
            .map_err(|_| CalibrationError::PointCount {
                needed: 4,
                got: points.len(),
            })?;
        Ok(Self {
            image_quad,
            rect_width,
            rect_height,
            safe_distance,
        })
    }
}

// ── Calibration result ───────────────────────────────────────────────────

/// Run-invariant calibration: the image→ground homography and the violation
/// distance threshold in projected ground units.
///
/// Computed once at startup and shared read-only by every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    /// Image-plane → ground-plane homography, normalized so `h[(2, 2)] = 1`.
    pub homography: Matrix3<f64>,
    /// Two people closer than this (strictly) in ground units are violating.
    pub threshold: f64,
}

/// Serializable form of [`Calibration`] (homography row-major) for writing
/// to and reading from calibration files.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationRecord {
    /// 3×3 homography, row-major.
    pub homography: [[f64; 3]; 3],
    /// Violation threshold in projected ground units.
    pub threshold: f64,
}

impl From<&Calibration> for CalibrationRecord {
    fn from(c: &Calibration) -> Self {
        let h = &c.homography;
        Self {
            homography: [
                [h[(0, 0)], h[(0, 1)], h[(0, 2)]],
                [h[(1, 0)], h[(1, 1)], h[(1, 2)]],
                [h[(2, 0)], h[(2, 1)], h[(2, 2)]],
            ],
            threshold: c.threshold,
        }
    }
}

impl From<&CalibrationRecord> for Calibration {
    fn from(r: &CalibrationRecord) -> Self {
        let m = &r.homography;
        Self {
            homography: Matrix3::new(
                m[0][0], m[0][1], m[0][2],
                m[1][0], m[1][1], m[1][2],
                m[2][0], m[2][1], m[2][2],
            ),
            threshold: r.threshold,
        }
    }
}

// ── Estimation ───────────────────────────────────────────────────────────

/// Estimate the ground-plane calibration from four corner correspondences.
///
/// The DLT target is the axis-aligned rectangle `(0,0)-(W,H)` with
/// `H = BIRD_VIEW_SPAN` and `W` scaled to preserve the real rectangle's
/// proportions. The threshold is derived by projecting the bottom edge (a
/// segment of known real length `rect_width`) and scaling its projected
/// length by `safe_distance / rect_width`, so threshold and projected
/// coordinates share one unit space.
pub fn estimate(input: &CalibrationInput) -> Result<Calibration, CalibrationError> {
    check_positive("rect_width", input.rect_width)?;
    check_positive("rect_height", input.rect_height)?;
    check_positive("safe_distance", input.safe_distance)?;
    check_quad(&input.image_quad)?;

    let span_h = BIRD_VIEW_SPAN;
    let span_w = span_h * input.rect_width / input.rect_height;

    // Target corners in the same TL, TR, BR, BL order as the image quad.
    // Image y grows downward, so top-left maps to (0, 0).
    let target = [
        [0.0, 0.0],
        [span_w, 0.0],
        [span_w, span_h],
        [0.0, span_h],
    ];

    let h = solve_dlt(&input.image_quad, &target)?;

    // Project the bottom edge (BL → BR, real length rect_width) and scale.
    let bl = project_point(&h, input.image_quad[3])
        .map_err(|e| CalibrationError::NumericalFailure(e.to_string()))?;
    let br = project_point(&h, input.image_quad[2])
        .map_err(|e| CalibrationError::NumericalFailure(e.to_string()))?;
    let edge_len = ((br[0] - bl[0]).powi(2) + (br[1] - bl[1]).powi(2)).sqrt();
    let threshold = edge_len * input.safe_distance / input.rect_width;

    if !threshold.is_finite() || threshold <= 0.0 {
        return Err(CalibrationError::NumericalFailure(format!(
            "derived threshold {} is not positive",
            threshold
        )));
    }

    Ok(Calibration {
        homography: h,
        threshold,
    })
}

fn check_positive(what: &'static str, value: f64) -> Result<(), CalibrationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(CalibrationError::BadScale { what, value });
    }
    Ok(())
}

/// Reject quads where any three corners are (near-)collinear. Collinearity
/// is measured by the triangle area relative to the quad's overall extent,
/// so the test is invariant to the image resolution.
fn check_quad(quad: &[[f64; 2]; 4]) -> Result<(), CalibrationError> {
    for p in quad {
        if !p[0].is_finite() || !p[1].is_finite() {
            return Err(CalibrationError::NumericalFailure(
                "calibration points must be finite".into(),
            ));
        }
    }

    // Characteristic length: the longest pairwise distance.
    let mut max_d2: f64 = 0.0;
    for i in 0..4 {
        for j in (i + 1)..4 {
            let dx = quad[i][0] - quad[j][0];
            let dy = quad[i][1] - quad[j][1];
            max_d2 = max_d2.max(dx * dx + dy * dy);
        }
    }
    if max_d2 <= 0.0 {
        return Err(CalibrationError::CollinearPoints { indices: [0, 1, 2] });
    }

    for i in 0..4 {
        for j in (i + 1)..4 {
            for k in (j + 1)..4 {
                let [ax, ay] = quad[i];
                let [bx, by] = quad[j];
                let [cx, cy] = quad[k];
                let doubled_area = ((bx - ax) * (cy - ay) - (by - ay) * (cx - ax)).abs();
                if doubled_area < COLLINEAR_EPS * max_d2 {
                    return Err(CalibrationError::CollinearPoints { indices: [i, j, k] });
                }
            }
        }
    }
    Ok(())
}

// ── Hartley normalization ────────────────────────────────────────────────

/// Compute a normalizing transform: translate centroid to origin, scale so
/// mean distance from origin is sqrt(2).
fn normalize_points(pts: &[[f64; 2]]) -> (Matrix3<f64>, Vec<[f64; 2]>) {
    let n = pts.len() as f64;
    let cx: f64 = pts.iter().map(|p| p[0]).sum::<f64>() / n;
    let cy: f64 = pts.iter().map(|p| p[1]).sum::<f64>() / n;

    let mean_dist: f64 = pts
        .iter()
        .map(|p| ((p[0] - cx).powi(2) + (p[1] - cy).powi(2)).sqrt())
        .sum::<f64>()
        / n;

    let s = if mean_dist > 1e-15 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);

    let normalized: Vec<[f64; 2]> =
        pts.iter().map(|p| [s * (p[0] - cx), s * (p[1] - cy)]).collect();

    (t, normalized)
}

// ── DLT ──────────────────────────────────────────────────────────────────

/// Solve the DLT system for H mapping `src` onto `dst`. Slice-generic so an
/// overdetermined fit stays possible, though calibration only ever passes
/// four corners.
fn solve_dlt(src: &[[f64; 2]], dst: &[[f64; 2]]) -> Result<Matrix3<f64>, CalibrationError> {
    let n = src.len();
    debug_assert_eq!(n, dst.len());

    let (t_src, src_n) = normalize_points(src);
    let (t_dst, dst_n) = normalize_points(dst);

    // 2n × 9 measurement matrix: each correspondence gives two rows.
    let mut a = DMatrix::zeros(2 * n, 9);
    for i in 0..n {
        let (sx, sy) = (src_n[i][0], src_n[i][1]);
        let (dx, dy) = (dst_n[i][0], dst_n[i][1]);

        a[(2 * i, 3)] = -sx;
        a[(2 * i, 4)] = -sy;
        a[(2 * i, 5)] = -1.0;
        a[(2 * i, 6)] = dy * sx;
        a[(2 * i, 7)] = dy * sy;
        a[(2 * i, 8)] = dy;

        a[(2 * i + 1, 0)] = sx;
        a[(2 * i + 1, 1)] = sy;
        a[(2 * i + 1, 2)] = 1.0;
        a[(2 * i + 1, 6)] = -dx * sx;
        a[(2 * i + 1, 7)] = -dx * sy;
        a[(2 * i + 1, 8)] = -dx;
    }

    // The solution is the eigenvector of A^T A with the smallest eigenvalue.
    let ata = a.transpose() * &a;
    let eig = nalgebra::SymmetricEigen::new(ata);

    let mut min_idx = 0;
    let mut min_val = eig.eigenvalues[0].abs();
    for i in 1..9 {
        let v = eig.eigenvalues[i].abs();
        if v < min_val {
            min_val = v;
            min_idx = i;
        }
    }
    let h_vec: Vec<f64> = (0..9).map(|j| eig.eigenvectors[(j, min_idx)]).collect();
    let h_norm = Matrix3::new(
        h_vec[0], h_vec[1], h_vec[2],
        h_vec[3], h_vec[4], h_vec[5],
        h_vec[6], h_vec[7], h_vec[8],
    );

    // Denormalize: H = T_dst^-1 * H_norm * T_src
    let t_dst_inv = t_dst
        .try_inverse()
        .ok_or_else(|| CalibrationError::NumericalFailure("T_dst not invertible".into()))?;
    let h = t_dst_inv * h_norm * t_src;

    // Normalize so h[2][2] = 1.
    let scale = h[(2, 2)];
    if scale.abs() < 1e-15 {
        return Err(CalibrationError::NumericalFailure(
            "homography scale h[2][2] is zero".into(),
        ));
    }
    Ok(h / scale)
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit ground square seen head-on as a 100px image square.
    fn square_input() -> CalibrationInput {
        CalibrationInput {
            image_quad: [[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]],
            rect_width: 1.0,
            rect_height: 1.0,
            safe_distance: 1.0,
        }
    }

    #[test]
    fn square_maps_to_bird_view_rect() {
        let cal = estimate(&square_input()).unwrap();

        let corners = [
            ([0.0, 0.0], [0.0, 0.0]),
            ([100.0, 0.0], [BIRD_VIEW_SPAN, 0.0]),
            ([100.0, 100.0], [BIRD_VIEW_SPAN, BIRD_VIEW_SPAN]),
            ([0.0, 100.0], [0.0, BIRD_VIEW_SPAN]),
        ];
        for (img, expected) in corners {
            let p = project_point(&cal.homography, img).unwrap();
            assert_relative_eq!(p[0], expected[0], epsilon = 1e-6);
            assert_relative_eq!(p[1], expected[1], epsilon = 1e-6);
        }
    }

    #[test]
    fn square_homography_is_pure_scale() {
        // Head-on unit square: H should be a scale by SPAN/100 with no
        // perspective component.
        let cal = estimate(&square_input()).unwrap();
        let h = &cal.homography;
        let s = BIRD_VIEW_SPAN / 100.0;
        assert_relative_eq!(h[(0, 0)], s, epsilon = 1e-6);
        assert_relative_eq!(h[(1, 1)], s, epsilon = 1e-6);
        assert_relative_eq!(h[(2, 0)], 0.0, epsilon = 1e-9);
        assert_relative_eq!(h[(2, 1)], 0.0, epsilon = 1e-9);
        assert_relative_eq!(h[(2, 2)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn threshold_equals_safe_distance_in_ground_units() {
        // Safe distance = full rectangle width, so the threshold must equal
        // the projected bottom-edge length, which is exactly the span width.
        let cal = estimate(&square_input()).unwrap();
        assert_relative_eq!(cal.threshold, BIRD_VIEW_SPAN, epsilon = 1e-5);

        // Half the width → half the threshold.
        let mut input = square_input();
        input.safe_distance = 0.5;
        let cal = estimate(&input).unwrap();
        assert_relative_eq!(cal.threshold, BIRD_VIEW_SPAN / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn perspective_quad_reprojects_corners() {
        // A trapezoid, as a ground rectangle seen from a tilted camera.
        let input = CalibrationInput {
            image_quad: [
                [420.0, 200.0],
                [860.0, 210.0],
                [1100.0, 700.0],
                [180.0, 690.0],
            ],
            rect_width: 8.0,
            rect_height: 12.0,
            safe_distance: 2.0,
        };
        let cal = estimate(&input).unwrap();

        let span_w = BIRD_VIEW_SPAN * input.rect_width / input.rect_height;
        let expected = [
            [0.0, 0.0],
            [span_w, 0.0],
            [span_w, BIRD_VIEW_SPAN],
            [0.0, BIRD_VIEW_SPAN],
        ];
        for (img, exp) in input.image_quad.iter().zip(&expected) {
            let p = project_point(&cal.homography, *img).unwrap();
            assert_relative_eq!(p[0], exp[0], epsilon = 1e-5);
            assert_relative_eq!(p[1], exp[1], epsilon = 1e-5);
        }

        // Bottom edge projects to span_w, so threshold scales from there.
        assert_relative_eq!(
            cal.threshold,
            span_w * input.safe_distance / input.rect_width,
            epsilon = 1e-5
        );
    }

    #[test]
    fn collinear_points_rejected() {
        let input = CalibrationInput {
            image_quad: [[0.0, 0.0], [50.0, 0.0], [100.0, 0.0], [0.0, 100.0]],
            rect_width: 1.0,
            rect_height: 1.0,
            safe_distance: 1.0,
        };
        match estimate(&input) {
            Err(CalibrationError::CollinearPoints { indices }) => {
                assert_eq!(indices, [0, 1, 2]);
            }
            other => panic!("expected CollinearPoints, got {:?}", other),
        }
    }

    #[test]
    fn coincident_points_rejected() {
        let input = CalibrationInput {
            image_quad: [[10.0, 10.0], [10.0, 10.0], [100.0, 100.0], [0.0, 100.0]],
            rect_width: 1.0,
            rect_height: 1.0,
            safe_distance: 1.0,
        };
        assert!(matches!(
            estimate(&input),
            Err(CalibrationError::CollinearPoints { .. })
        ));
    }

    #[test]
    fn bad_scale_rejected() {
        let mut input = square_input();
        input.rect_width = 0.0;
        assert!(matches!(
            estimate(&input),
            Err(CalibrationError::BadScale { what: "rect_width", .. })
        ));

        let mut input = square_input();
        input.safe_distance = f64::NAN;
        assert!(matches!(
            estimate(&input),
            Err(CalibrationError::BadScale { what: "safe_distance", .. })
        ));
    }

    #[test]
    fn wrong_point_count_rejected() {
        let three = [[0.0, 0.0], [100.0, 0.0], [100.0, 100.0]];
        match CalibrationInput::from_points(&three, 1.0, 1.0, 1.0) {
            Err(CalibrationError::PointCount { needed: 4, got: 3 }) => {}
            other => panic!("expected PointCount, got {:?}", other),
        }
        let five = [[0.0, 0.0]; 5];
        assert!(CalibrationInput::from_points(&five, 1.0, 1.0, 1.0).is_err());
    }

    #[test]
    fn record_roundtrip() {
        let cal = estimate(&square_input()).unwrap();
        let record = CalibrationRecord::from(&cal);
        let back = Calibration::from(&record);
        assert_eq!(cal, back);
    }
}

//! High-level per-frame assessment API.
//!
//! [`Assessor`] is the primary entry point: calibrate once, assess every
//! frame's detections against the shared read-only calibration. Each frame
//! is independent; a bad detection degrades that frame only.

use crate::detection::Detection;
use crate::graph::ViolationGraph;
use crate::homography::Calibration;
use crate::projection::project_point;
use crate::status::{classify, PersonStatus};

/// Everything downstream collaborators need from one frame.
///
/// Indices refer to the frame's detection slice. Renderers take `statuses`
/// plus `violations` (connecting lines) plus `ground_points` (bird's-eye
/// view); metrics consumers take the counts.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FrameAssessment {
    /// Status per detection index.
    pub statuses: Vec<PersonStatus>,
    /// Violating pairs, each with `i < j`.
    pub violations: Vec<[usize; 2]>,
    /// Projected foot points in ground units; `None` where projection was
    /// degenerate.
    pub ground_points: Vec<Option<[f64; 2]>>,
    /// Indices whose projection failed this frame.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dropped: Vec<usize>,
}

impl FrameAssessment {
    /// Assessment of a frame with no detections.
    pub fn empty() -> Self {
        Self {
            statuses: Vec::new(),
            violations: Vec::new(),
            ground_points: Vec::new(),
            dropped: Vec::new(),
        }
    }

    /// Number of detections this frame.
    pub fn detection_count(&self) -> usize {
        self.statuses.len()
    }

    /// Number of detections classified unsafe this frame.
    pub fn unsafe_count(&self) -> usize {
        self.statuses
            .iter()
            .filter(|s| **s == PersonStatus::Unsafe)
            .count()
    }
}

/// Per-frame assessment engine.
///
/// Holds the run-invariant [`Calibration`] (homography + threshold).
/// Create once, assess on many frames.
///
/// # Examples
///
/// ```
/// use groundgraph_core::assess::Assessor;
/// use groundgraph_core::detection::{BoundingBox, Detection};
/// use groundgraph_core::homography::{estimate, CalibrationInput};
///
/// let cal = estimate(&CalibrationInput {
///     image_quad: [[0.0, 0.0], [100.0, 0.0], [100.0, 100.0], [0.0, 100.0]],
///     rect_width: 10.0,
///     rect_height: 10.0,
///     safe_distance: 2.0,
/// })
/// .unwrap();
///
/// let assessor = Assessor::new(cal);
/// let bbox = BoundingBox::new(40.0, 10.0, 60.0, 50.0).unwrap();
/// let frame = assessor.assess(&[Detection::new(bbox, 0.9).unwrap()]);
/// assert_eq!(frame.unsafe_count(), 0);
/// ```
pub struct Assessor {
    calibration: Calibration,
}

impl Assessor {
    /// Create from an estimated or loaded calibration.
    pub fn new(calibration: Calibration) -> Self {
        Self { calibration }
    }

    /// Access the calibration in use.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Assess one frame's detections.
    ///
    /// Projects each foot point to the ground plane, builds the violation
    /// graph, and classifies statuses. A detection whose projection is
    /// degenerate is dropped from the graph (no edges, degree 0) with a
    /// warning; the frame itself never fails.
    pub fn assess(&self, detections: &[Detection]) -> FrameAssessment {
        if detections.is_empty() {
            return FrameAssessment::empty();
        }

        let mut ground_points = Vec::with_capacity(detections.len());
        let mut dropped = Vec::new();
        for (idx, det) in detections.iter().enumerate() {
            match project_point(&self.calibration.homography, det.foot_point()) {
                Ok(p) => ground_points.push(Some(p)),
                Err(e) => {
                    tracing::warn!("dropping detection {}: {}", idx, e);
                    ground_points.push(None);
                    dropped.push(idx);
                }
            }
        }

        let graph = ViolationGraph::build(&ground_points, self.calibration.threshold);
        let statuses = classify(&graph);

        FrameAssessment {
            statuses,
            violations: graph.edges().to_vec(),
            ground_points,
            dropped,
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

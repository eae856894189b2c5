//! groundgraph-core — ground-plane social-distancing assessment.
//!
//! Turns one frame's person detections into a distancing assessment. The
//! pipeline stages are:
//!
//! 1. **Detection** – validated bounding boxes from an external detector;
//!    foot-point extraction (box bottom center).
//! 2. **Homography** – one-shot DLT calibration from four ground-rectangle
//!    corners, producing the image→ground homography and the violation
//!    distance threshold in projected units.
//! 3. **Projection** – per-frame projective transform of each foot point
//!    into ground-plane coordinates.
//! 4. **Graph** – pairwise ground distances, undirected violation graph over
//!    detection indices.
//! 5. **Status** – safe/unsafe per detection from node degree.
//!
//! Every frame is assessed independently against the run-invariant
//! calibration: no tracking, no cross-frame state. Detection indices are
//! identities within a frame only, which bounds error propagation at the
//! cost of frame-to-frame status flicker.
//!
//! # Public API
//! [`Assessor`] (calibrate once, assess many frames) and
//! [`homography::estimate`] are the primary entry points; the stage modules
//! stay public for callers that need a single stage.

pub mod assess;
pub mod detection;
pub mod graph;
pub mod homography;
pub mod projection;
pub mod status;

pub use assess::{Assessor, FrameAssessment};
pub use detection::{BoundingBox, Detection, DetectionError};
pub use graph::ViolationGraph;
pub use homography::{Calibration, CalibrationError, CalibrationInput, CalibrationRecord};
pub use projection::ProjectionError;
pub use status::PersonStatus;

//! Detection records arriving from an external detector.
//!
//! Boxes are validated once here, at the detector boundary, so the rest of
//! the pipeline only ever sees well-formed values. Confidence filtering is
//! the caller's job: construct a [`Detection`] only for boxes that already
//! passed the score threshold.

// ── Error type ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DetectionError {
    /// Box coordinates are NaN or infinite.
    NonFinite,
    /// Box has non-positive width or height.
    EmptyBox { x1: f64, y1: f64, x2: f64, y2: f64 },
    /// Score outside [0, 1].
    ScoreOutOfRange(f32),
}

impl std::fmt::Display for DetectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonFinite => write!(f, "bounding box coordinates must be finite"),
            Self::EmptyBox { x1, y1, x2, y2 } => {
                write!(f, "empty bounding box: ({}, {})-({}, {})", x1, y1, x2, y2)
            }
            Self::ScoreOutOfRange(s) => write!(f, "score {} outside [0, 1]", s),
        }
    }
}

impl std::error::Error for DetectionError {}

// ── Types ────────────────────────────────────────────────────────────────

/// Axis-aligned bounding box in image pixel coordinates.
///
/// `(x1, y1)` is the top-left corner, `(x2, y2)` the bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    /// Validate and construct. Requires finite coordinates and positive extent.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, DetectionError> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(DetectionError::NonFinite);
        }
        if x2 <= x1 || y2 <= y1 {
            return Err(DetectionError::EmptyBox { x1, y1, x2, y2 });
        }
        Ok(Self { x1, y1, x2, y2 })
    }

    /// Image-plane point where the person contacts the ground: horizontal
    /// box center, bottom edge.
    pub fn foot_point(&self) -> [f64; 2] {
        [(self.x1 + self.x2) / 2.0, self.y2]
    }
}

/// One detector output: a bounding box plus its confidence score.
///
/// Lifetime is a single frame; indices into a frame's detection slice are
/// the only identity the pipeline uses (no tracking across frames).
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    pub score: f32,
}

impl Detection {
    /// Validate and construct from a box and a confidence score in [0, 1].
    pub fn new(bbox: BoundingBox, score: f32) -> Result<Self, DetectionError> {
        if !(0.0..=1.0).contains(&score) || !score.is_finite() {
            return Err(DetectionError::ScoreOutOfRange(score));
        }
        Ok(Self { bbox, score })
    }

    /// Foot point of the underlying box.
    pub fn foot_point(&self) -> [f64; 2] {
        self.bbox.foot_point()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

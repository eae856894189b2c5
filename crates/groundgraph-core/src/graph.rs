//! Per-frame violation graph over detection indices.
//!
//! Nodes are this frame's detection indices `0..N-1`; an edge joins every
//! unordered pair whose ground-plane distance is strictly below the
//! threshold. The graph is rebuilt from scratch each frame and carries no
//! state into the next one, so a bad frame cannot corrupt its successors.
//!
//! Pair enumeration is O(N²). N is people per frame (tens, not thousands),
//! so no spatial index is warranted; revisit with a grid or k-d tree before
//! pointing this at crowd-scale N.

/// Undirected graph of distance violations for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolationGraph {
    node_count: usize,
    /// Violating pairs with `i < j`, in enumeration order.
    edges: Vec<[usize; 2]>,
    /// Per-node edge count, indexed by detection index.
    degrees: Vec<usize>,
}

impl ViolationGraph {
    /// Build the graph for one frame.
    ///
    /// `points[i]` is detection `i`'s projected ground point, or `None` if
    /// its projection was dropped as degenerate; dropped points keep their
    /// index (so downstream indices stay aligned with the detections) but
    /// contribute no edges. Ties at exactly the threshold do not violate.
    pub fn build(points: &[Option<[f64; 2]>], threshold: f64) -> Self {
        let n = points.len();
        let mut edges = Vec::new();
        let mut degrees = vec![0usize; n];

        for i in 0..n {
            let Some(a) = points[i] else { continue };
            for (j, q) in points.iter().enumerate().skip(i + 1) {
                let Some(b) = q else { continue };
                let dx = a[0] - b[0];
                let dy = a[1] - b[1];
                let dist = (dx * dx + dy * dy).sqrt();
                if dist < threshold {
                    edges.push([i, j]);
                    degrees[i] += 1;
                    degrees[j] += 1;
                }
            }
        }

        Self {
            node_count: n,
            edges,
            degrees,
        }
    }

    /// Number of nodes (this frame's detection count, dropped ones included).
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Violating pairs, each with `i < j`.
    pub fn edges(&self) -> &[[usize; 2]] {
        &self.edges
    }

    /// Degree of node `index`.
    pub fn degree(&self, index: usize) -> usize {
        self.degrees[index]
    }

    /// Per-node degrees, indexed by detection index.
    pub fn degrees(&self) -> &[usize] {
        &self.degrees
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

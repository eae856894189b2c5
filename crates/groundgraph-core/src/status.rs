//! Per-person status classification from violation-graph degree.

use crate::graph::ViolationGraph;

/// Distancing status of one detection in one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonStatus {
    /// No violating neighbor this frame.
    Safe,
    /// At least one violating neighbor this frame.
    Unsafe,
}

/// Classify every node: degree 0 → safe, degree ≥ 1 → unsafe.
///
/// Returns one status per detection index. The edge list lives on the graph
/// itself; renderers take both (statuses for box colors, edges for the
/// connecting lines).
pub fn classify(graph: &ViolationGraph) -> Vec<PersonStatus> {
    graph
        .degrees()
        .iter()
        .map(|&d| if d == 0 { PersonStatus::Safe } else { PersonStatus::Unsafe })
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[[f64; 2]]) -> Vec<Option<[f64; 2]>> {
        coords.iter().copied().map(Some).collect()
    }

    #[test]
    fn empty_graph_empty_statuses() {
        let g = ViolationGraph::build(&[], 1.0);
        assert!(classify(&g).is_empty());
    }

    #[test]
    fn isolated_nodes_are_safe() {
        let g = ViolationGraph::build(&pts(&[[0.0, 0.0], [10.0, 0.0]]), 1.0);
        assert_eq!(classify(&g), vec![PersonStatus::Safe, PersonStatus::Safe]);
    }

    #[test]
    fn violating_pair_both_unsafe() {
        let g = ViolationGraph::build(&pts(&[[0.0, 0.0], [0.5, 0.0]]), 1.0);
        assert_eq!(classify(&g), vec![PersonStatus::Unsafe, PersonStatus::Unsafe]);
    }

    #[test]
    fn mixed_statuses_follow_degree() {
        // Pair in violation plus one bystander far away.
        let g = ViolationGraph::build(&pts(&[[0.0, 0.0], [0.5, 0.0], [9.0, 9.0]]), 1.0);
        assert_eq!(
            classify(&g),
            vec![PersonStatus::Unsafe, PersonStatus::Unsafe, PersonStatus::Safe]
        );
    }

    #[test]
    fn serde_labels_are_snake_case() {
        let s = serde_json::to_string(&PersonStatus::Unsafe).unwrap();
        assert_eq!(s, "\"unsafe\"");
        let s = serde_json::to_string(&PersonStatus::Safe).unwrap();
        assert_eq!(s, "\"safe\"");
    }
}

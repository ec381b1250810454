use ndarray::Array2;

/// Absolute tolerance for distance ties in the tiebreakers and the
/// recrafting gate.
pub(crate) const TIE_EPSILON: f64 = 1e-10;

/// A tree edge. For the undirected MST the direction records insertion
/// order (`from` was already in the tree when `to` was added); for the
/// arborescence it is the semantic arc `from -> to`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub distance: f64,
}

impl Edge {
    pub fn new(from: usize, to: usize, distance: f64) -> Self {
        Edge { from, to, distance }
    }
}

/// Tiebreak heuristic applied when several nodes sit at the minimum
/// distance from the growing tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    /// Prefer the candidate with the most equal-distance connections into
    /// the tree (epidemiological origin).
    EBurst,
    /// Prefer the candidate with the highest harmonic mean distance to all
    /// other nodes, a centrality proxy.
    Harmonic,
}

impl Heuristic {
    /// `"harmonic"` selects the harmonic tiebreak; any other string falls
    /// back to eBurst.
    pub fn from_name(name: &str) -> Self {
        if name == "harmonic" {
            Heuristic::Harmonic
        } else {
            Heuristic::EBurst
        }
    }
}

/// Build a minimum spanning tree over a symmetric distance matrix with
/// Prim's algorithm, starting at node 0.
///
/// Returns `n - 1` edges, each directed from the tree member toward the
/// node it attached. Ties on the minimum distance are resolved by the
/// given heuristic, falling back to the lowest node index.
pub fn minimum_spanning_tree(matrix: &Array2<f64>, heuristic: Heuristic) -> Vec<Edge> {
    let n = matrix.nrows();
    let mut tree_edges = Vec::with_capacity(n.saturating_sub(1));
    if n == 0 {
        return tree_edges;
    }

    let mut in_tree = vec![false; n];
    let mut min_distance = vec![f64::MAX; n];
    let mut parent = vec![0usize; n];

    in_tree[0] = true;
    min_distance[0] = 0.0;
    for i in 1..n {
        min_distance[i] = matrix[[0, i]];
    }

    for _ in 1..n {
        let mut min_dist = f64::MAX;
        for i in 0..n {
            if !in_tree[i] && min_distance[i] < min_dist {
                min_dist = min_distance[i];
            }
        }

        let min_node = select_with_tiebreak(matrix, &min_distance, &in_tree, min_dist, heuristic);

        in_tree[min_node] = true;
        tree_edges.push(Edge::new(parent[min_node], min_node, min_dist));

        for i in 0..n {
            if !in_tree[i] {
                let new_dist = matrix[[min_node, i]];
                if new_dist < min_distance[i] {
                    min_distance[i] = new_dist;
                    parent[i] = min_node;
                }
            }
        }
    }

    tree_edges
}

fn select_with_tiebreak(
    matrix: &Array2<f64>,
    min_distance: &[f64],
    in_tree: &[bool],
    min_dist: f64,
    heuristic: Heuristic,
) -> usize {
    let candidates: Vec<usize> = (0..matrix.nrows())
        .filter(|&i| !in_tree[i] && (min_distance[i] - min_dist).abs() < TIE_EPSILON)
        .collect();

    if candidates.len() == 1 {
        return candidates[0];
    }

    match heuristic {
        Heuristic::EBurst => eburst_tiebreak(matrix, &candidates, in_tree, min_dist),
        Heuristic::Harmonic => harmonic_tiebreak(matrix, &candidates),
    }
}

/// Pick the candidate with the most connections at exactly `min_dist` to
/// nodes already in the tree; further ties go to the lowest index.
fn eburst_tiebreak(
    matrix: &Array2<f64>,
    candidates: &[usize],
    in_tree: &[bool],
    min_dist: f64,
) -> usize {
    let mut best_node = candidates[0];
    let mut max_connections = 0usize;

    for &node in candidates {
        let connections = (0..matrix.nrows())
            .filter(|&j| in_tree[j] && (matrix[[node, j]] - min_dist).abs() < TIE_EPSILON)
            .count();

        if connections > max_connections {
            max_connections = connections;
            best_node = node;
        } else if connections == max_connections && node < best_node {
            best_node = node;
        }
    }

    best_node
}

fn harmonic_tiebreak(matrix: &Array2<f64>, candidates: &[usize]) -> usize {
    let mut best_node = candidates[0];
    let mut best_score = -1.0;

    for &node in candidates {
        let score = harmonic_mean_score(matrix, node);

        if score > best_score {
            best_score = score;
            best_node = node;
        } else if (score - best_score).abs() < TIE_EPSILON && node < best_node {
            best_node = node;
        }
    }

    best_node
}

/// Harmonic mean of a node's positive distances to every other node:
/// `k / sum(1 / d)`. Nodes whose neighbors are uniformly close score high.
/// Returns 0 when the node has no positive-distance neighbor.
pub(crate) fn harmonic_mean_score(matrix: &Array2<f64>, node: usize) -> f64 {
    let mut sum_reciprocals = 0.0;
    let mut count = 0u32;

    for i in 0..matrix.nrows() {
        if i == node {
            continue;
        }
        let dist = matrix[[node, i]];
        if dist > 0.0 {
            sum_reciprocals += 1.0 / dist;
            count += 1;
        }
    }

    if count == 0 {
        return 0.0;
    }

    f64::from(count) / sum_reciprocals
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    /// Undirected connectivity check over the edge list.
    fn spans_all_nodes(edges: &[Edge], n: usize) -> bool {
        let mut adjacency = vec![Vec::new(); n];
        for e in edges {
            adjacency[e.from].push(e.to);
            adjacency[e.to].push(e.from);
        }
        let mut seen = vec![false; n];
        let mut stack = vec![0usize];
        seen[0] = true;
        while let Some(node) = stack.pop() {
            for &next in &adjacency[node] {
                if !seen[next] {
                    seen[next] = true;
                    stack.push(next);
                }
            }
        }
        seen.into_iter().all(|s| s)
    }

    #[test]
    fn test_chain_matrix_yields_chain() {
        let matrix = arr2(&[[0.0, 1.0, 5.0], [1.0, 0.0, 1.0], [5.0, 1.0, 0.0]]);
        let edges = minimum_spanning_tree(&matrix, Heuristic::EBurst);
        assert_eq!(edges, vec![Edge::new(0, 1, 1.0), Edge::new(1, 2, 1.0)]);
    }

    #[test]
    fn test_eburst_prefers_most_connected_candidate() {
        // Nodes 2 and 3 tie at distance 2 from the tree {0, 1}; node 3 has
        // two equal-distance connections into the tree, node 2 only one.
        let matrix = arr2(&[
            [0.0, 1.0, 2.0, 2.0],
            [1.0, 0.0, 3.0, 2.0],
            [2.0, 3.0, 0.0, 3.0],
            [2.0, 2.0, 3.0, 0.0],
        ]);
        let edges = minimum_spanning_tree(&matrix, Heuristic::EBurst);
        assert_eq!(
            edges,
            vec![
                Edge::new(0, 1, 1.0),
                Edge::new(0, 3, 2.0),
                Edge::new(0, 2, 2.0),
            ]
        );
    }

    #[test]
    fn test_harmonic_prefers_central_candidate() {
        // Same tie as above, but the harmonic tiebreak scores node 2
        // higher: 3 / (1/2 + 1/3 + 1/3) = 18/7 vs. 3 / (1/2 + 1/2 + 1/3) = 9/4.
        let matrix = arr2(&[
            [0.0, 1.0, 2.0, 2.0],
            [1.0, 0.0, 3.0, 2.0],
            [2.0, 3.0, 0.0, 3.0],
            [2.0, 2.0, 3.0, 0.0],
        ]);
        let edges = minimum_spanning_tree(&matrix, Heuristic::Harmonic);
        assert_eq!(
            edges,
            vec![
                Edge::new(0, 1, 1.0),
                Edge::new(0, 2, 2.0),
                Edge::new(0, 3, 2.0),
            ]
        );
    }

    #[test]
    fn test_harmonic_mean_score() {
        let matrix = arr2(&[[0.0, 1.0, 2.0], [1.0, 0.0, 1.0], [2.0, 1.0, 0.0]]);
        // Node 0: distances 1 and 2 -> 2 / (1 + 0.5) = 4/3
        assert!((harmonic_mean_score(&matrix, 0) - 4.0 / 3.0).abs() < 1e-10);
        // Node 1: distances 1 and 1 -> 2 / 2 = 1
        assert!((harmonic_mean_score(&matrix, 1) - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_harmonic_mean_score_skips_zero_distances() {
        let matrix = arr2(&[[0.0, 0.0, 2.0], [0.0, 0.0, 2.0], [2.0, 2.0, 0.0]]);
        assert!((harmonic_mean_score(&matrix, 0) - 2.0).abs() < 1e-10);

        let isolated = arr2(&[[0.0, 0.0], [0.0, 0.0]]);
        assert_eq!(harmonic_mean_score(&isolated, 0), 0.0);
    }

    #[test]
    fn test_tree_spans_all_nodes() {
        let matrix = arr2(&[
            [0.0, 3.0, 7.0, 2.0, 9.0],
            [3.0, 0.0, 4.0, 6.0, 8.0],
            [7.0, 4.0, 0.0, 5.0, 1.0],
            [2.0, 6.0, 5.0, 0.0, 4.0],
            [9.0, 8.0, 1.0, 4.0, 0.0],
        ]);
        let edges = minimum_spanning_tree(&matrix, Heuristic::EBurst);
        assert_eq!(edges.len(), 4);
        assert!(spans_all_nodes(&edges, 5));
    }

    #[test]
    fn test_singleton_has_no_edges() {
        let matrix = arr2(&[[0.0]]);
        assert!(minimum_spanning_tree(&matrix, Heuristic::EBurst).is_empty());
    }

    #[test]
    fn test_two_nodes_single_edge() {
        let matrix = arr2(&[[0.0, 4.0], [4.0, 0.0]]);
        let edges = minimum_spanning_tree(&matrix, Heuristic::Harmonic);
        assert_eq!(edges, vec![Edge::new(0, 1, 4.0)]);
    }

    #[test]
    fn test_identical_profiles_resolve_by_index() {
        // All distances zero: every round ties, the index fallback builds a
        // star around node 0.
        let matrix = Array2::<f64>::zeros((4, 4));
        let edges = minimum_spanning_tree(&matrix, Heuristic::EBurst);
        assert_eq!(edges.len(), 3);
        let mut targets: Vec<usize> = edges.iter().map(|e| e.to).collect();
        targets.sort_unstable();
        assert_eq!(targets, vec![1, 2, 3]);
        assert!(edges.iter().all(|e| e.from == 0 && e.distance == 0.0));
    }

    #[test]
    fn test_heuristic_from_name() {
        assert_eq!(Heuristic::from_name("harmonic"), Heuristic::Harmonic);
        assert_eq!(Heuristic::from_name("eburst"), Heuristic::EBurst);
        assert_eq!(Heuristic::from_name("anything"), Heuristic::EBurst);
    }
}

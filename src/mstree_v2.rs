use std::collections::{HashMap, HashSet};

use ndarray::Array2;

use crate::mstree::{harmonic_mean_score, Edge, TIE_EPSILON};

const MAX_RECRAFT_PASSES: usize = 10;

/// Build a directed minimum arborescence rooted at node 0.
///
/// The input matrix is generally asymmetric. The result has exactly
/// `n - 1` arcs: node 0 has no incoming arc, every other node exactly one.
/// Greedy minimum-incoming selection is followed by Edmonds-style cycle
/// contraction (recursing on the reduced matrix) and a bounded local
/// branch-recrafting pass.
pub fn minimum_arborescence(matrix: &Array2<f64>) -> Vec<Edge> {
    let mut edges = minimum_incoming_edges(matrix);

    let cycle_id = detect_cycles(matrix.nrows(), &edges);

    if cycle_id.iter().any(Option::is_some) {
        edges = contract_and_solve(matrix, &edges, &cycle_id);
    }

    recraft_branches(matrix, &mut edges);

    edges
}

/// Select, for every non-root node, the cheapest incoming arc. Ties go to
/// the source with the highest harmonic mean score.
fn minimum_incoming_edges(matrix: &Array2<f64>) -> Vec<Edge> {
    let n = matrix.nrows();
    let mut edges = Vec::with_capacity(n.saturating_sub(1));

    for to in 1..n {
        let mut min_dist = f64::MAX;
        let mut best_from = None;
        let mut best_score = -1.0;

        for from in 0..n {
            if from == to {
                continue;
            }

            let dist = matrix[[from, to]];

            if dist < min_dist {
                min_dist = dist;
                best_from = Some(from);
                best_score = harmonic_mean_score(matrix, from);
            } else if (dist - min_dist).abs() < TIE_EPSILON {
                let score = harmonic_mean_score(matrix, from);
                if score > best_score {
                    best_from = Some(from);
                    best_score = score;
                }
            }
        }

        if let Some(from) = best_from {
            edges.push(Edge::new(from, to, min_dist));
        }
    }

    edges
}

struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, node: usize) -> usize {
        let mut root = node;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression: point the walked chain straight at the root.
        let mut current = node;
        while self.parent[current] != root {
            let next = self.parent[current];
            self.parent[current] = root;
            current = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }
        if self.rank[root_a] < self.rank[root_b] {
            self.parent[root_a] = root_b;
        } else if self.rank[root_a] > self.rank[root_b] {
            self.parent[root_b] = root_a;
        } else {
            self.parent[root_b] = root_a;
            self.rank[root_a] += 1;
        }
    }
}

/// Tag every node that sits on a cycle of the minimum-incoming edge set
/// with a cycle id; untagged nodes get `None`.
fn detect_cycles(n: usize, edges: &[Edge]) -> Vec<Option<usize>> {
    let mut components = UnionFind::new(n);
    let mut cycle_id = vec![None; n];
    let mut next_cycle_id = 0;

    for e in edges {
        let root_from = components.find(e.from);
        let root_to = components.find(e.to);

        if root_from == root_to && cycle_id[e.to].is_none() {
            mark_cycle(edges, e.to, &mut cycle_id, next_cycle_id);
            next_cycle_id += 1;
        }

        components.union(root_from, root_to);
    }

    cycle_id
}

/// Walk the incoming-edge relation from `start` until a node repeats,
/// tagging everything on the walk.
fn mark_cycle(edges: &[Edge], start: usize, cycle_id: &mut [Option<usize>], id: usize) {
    let mut current = start;
    let mut visited = HashSet::new();

    while visited.insert(current) {
        cycle_id[current] = Some(id);

        match edges.iter().find(|e| e.to == current) {
            Some(e) => current = e.from,
            None => break,
        }
    }
}

/// Contract every cycle to a single node, solve the reduced problem
/// recursively, and expand the solution back to the original nodes.
fn contract_and_solve(
    matrix: &Array2<f64>,
    edges: &[Edge],
    cycle_id: &[Option<usize>],
) -> Vec<Edge> {
    let n = matrix.nrows();

    let n_cycles = cycle_id.iter().flatten().max().map_or(0, |&max| max + 1);
    let mut cycles: Vec<Vec<usize>> = vec![Vec::new(); n_cycles];
    let mut node_mapping = vec![0usize; n];
    let mut next_node = 0;

    for i in 0..n {
        match cycle_id[i] {
            None => {
                node_mapping[i] = next_node;
                next_node += 1;
            }
            Some(id) => cycles[id].push(i),
        }
    }
    for members in &cycles {
        let contracted_node = next_node;
        next_node += 1;
        for &node in members {
            node_mapping[node] = contracted_node;
        }
    }

    let new_size = next_node;
    let mut new_distances = Array2::from_elem((new_size, new_size), f64::MAX);
    // Remembers, per contracted pair, the original arc that achieved the
    // minimum reduced weight (kept at its unreduced distance).
    let mut edge_mapping: HashMap<(usize, usize), Edge> = HashMap::new();

    for i in 0..n {
        for j in 0..n {
            if i == j {
                continue;
            }

            let ni = node_mapping[i];
            let nj = node_mapping[j];
            if ni == nj {
                continue;
            }

            let dist = matrix[[i, j]];
            let mut reduced_dist = dist;

            // Edmonds weight reduction: entering a cycle is discounted by
            // the in-cycle incoming arc this entry would replace.
            if cycle_id[j].is_some() {
                let cycle_edge_weight = edges
                    .iter()
                    .find(|e| e.to == j)
                    .map_or(0.0, |e| e.distance);
                reduced_dist -= cycle_edge_weight;
            }

            if reduced_dist < new_distances[[ni, nj]] {
                new_distances[[ni, nj]] = reduced_dist;
                edge_mapping.insert((ni, nj), Edge::new(i, j, dist));
            }
        }
    }

    let contracted_edges = minimum_arborescence(&new_distances);

    // Expand: inter-component arcs come from the contracted solution, then
    // every still-uncovered target keeps its minimum incoming arc. This
    // leaves each cycle with |cycle| - 1 internal arcs.
    let mut final_edges = Vec::new();
    let mut covered = HashSet::new();

    for e in &contracted_edges {
        if let Some(original) = edge_mapping.get(&(e.from, e.to)) {
            final_edges.push(*original);
            covered.insert(original.to);
        }
    }

    for e in edges {
        if covered.insert(e.to) {
            final_edges.push(*e);
        }
    }

    final_edges
}

/// Local optimization: repeatedly exchange the targets of edge pairs that
/// share a node when the exchanged pair is strictly cheaper, up to
/// [`MAX_RECRAFT_PASSES`] full passes.
// TODO: calculate_swap_cost evaluates two candidate pairings but the
// exchange always swaps the `to` endpoints, which realizes only the first
// pairing; apply the pairing that achieved the minimum instead.
fn recraft_branches(matrix: &Array2<f64>, tree: &mut [Edge]) {
    let mut improved = true;
    let mut iteration = 0;

    while improved && iteration < MAX_RECRAFT_PASSES {
        improved = false;
        iteration += 1;

        for i in 0..tree.len() {
            for j in (i + 1)..tree.len() {
                if !edges_share_node(&tree[i], &tree[j]) {
                    continue;
                }

                let current_cost = tree[i].distance + tree[j].distance;
                let swap_cost = calculate_swap_cost(matrix, &tree[i], &tree[j]);

                if swap_cost < current_cost - TIE_EPSILON {
                    perform_edge_swap(matrix, tree, i, j);
                    improved = true;
                }
            }
        }
    }
}

fn edges_share_node(e1: &Edge, e2: &Edge) -> bool {
    e1.from == e2.from || e1.from == e2.to || e1.to == e2.from || e1.to == e2.to
}

fn calculate_swap_cost(matrix: &Array2<f64>, e1: &Edge, e2: &Edge) -> f64 {
    let cost1 = matrix[[e1.from, e2.to]] + matrix[[e2.from, e1.to]];
    let cost2 = matrix[[e1.to, e2.from]] + matrix[[e2.to, e1.from]];
    cost1.min(cost2)
}

fn perform_edge_swap(matrix: &Array2<f64>, tree: &mut [Edge], idx1: usize, idx2: usize) {
    let to1 = tree[idx1].to;
    tree[idx1].to = tree[idx2].to;
    tree[idx2].to = to1;

    tree[idx1].distance = matrix[[tree[idx1].from, tree[idx1].to]];
    tree[idx2].distance = matrix[[tree[idx2].from, tree[idx2].to]];
}

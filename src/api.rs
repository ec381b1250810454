//! JSON-string entry points for host embeddings.
//!
//! Both functions take and return JSON strings and never fail across the
//! boundary: every exceptional path is rendered as
//! `{"success": false, "error": "..."}`.

use ndarray::Array2;
use serde::Serialize;

use crate::distance::{self, MissingHandler};
use crate::error::TreeError;
use crate::mstree::{self, Heuristic};
use crate::mstree_v2;
use crate::newick;
use crate::profile::ProfileSet;

#[derive(Debug, Serialize)]
struct EdgeRecord {
    from: usize,
    to: usize,
    from_name: String,
    to_name: String,
    distance: f64,
}

#[derive(Debug, Serialize)]
struct TreeResponse {
    success: bool,
    newick: String,
    edges: Vec<EdgeRecord>,
    n_nodes: usize,
    n_edges: usize,
}

#[derive(Debug, Serialize)]
struct MatrixResponse {
    success: bool,
    matrix: Vec<Vec<f64>>,
    strain_names: Vec<String>,
    n_strains: usize,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

/// Compute a spanning tree from profile JSON and return the result as a
/// JSON string.
///
/// * `method`: `"MSTree"` (undirected MST) or `"MSTreeV2"` (directed
///   minimum arborescence); anything else is an error.
/// * `matrix_type`: `"symmetric"` selects the symmetric allelic distance,
///   any other value the asymmetric one.
/// * `missing_handler`: integer code 0..3, see
///   [`MissingHandler`](crate::distance::MissingHandler).
/// * `heuristic`: `"harmonic"`, or anything else for eBurst (only used by
///   `"MSTree"`).
pub fn compute_tree(
    profile_json: &str,
    method: &str,
    matrix_type: &str,
    missing_handler: i32,
    heuristic: &str,
) -> String {
    match try_compute_tree(profile_json, method, matrix_type, missing_handler, heuristic) {
        Ok(response) => to_json(&response),
        Err(e) => failure(&e),
    }
}

/// Compute a distance matrix from profile JSON and return it as a JSON
/// string. Parameters as in [`compute_tree`].
pub fn compute_distance_matrix(
    profile_json: &str,
    matrix_type: &str,
    missing_handler: i32,
) -> String {
    match try_compute_distance_matrix(profile_json, matrix_type, missing_handler) {
        Ok(response) => to_json(&response),
        Err(e) => failure(&e),
    }
}

fn try_compute_tree(
    profile_json: &str,
    method: &str,
    matrix_type: &str,
    missing_handler: i32,
    heuristic: &str,
) -> Result<TreeResponse, TreeError> {
    let profile = ProfileSet::from_json(profile_json)?;
    let matrix = build_matrix(&profile, matrix_type, missing_handler)?;

    let tree_edges = match method {
        "MSTree" => mstree::minimum_spanning_tree(&matrix, Heuristic::from_name(heuristic)),
        "MSTreeV2" => mstree_v2::minimum_arborescence(&matrix),
        other => return Err(TreeError::UnknownMethod(other.to_string())),
    };

    let newick = newick::format_tree(&tree_edges, &profile.strains);
    let edges = tree_edges
        .iter()
        .map(|e| EdgeRecord {
            from: e.from,
            to: e.to,
            from_name: profile.strains[e.from].clone(),
            to_name: profile.strains[e.to].clone(),
            distance: e.distance,
        })
        .collect();

    Ok(TreeResponse {
        success: true,
        newick,
        n_nodes: profile.n_strains(),
        n_edges: tree_edges.len(),
        edges,
    })
}

fn try_compute_distance_matrix(
    profile_json: &str,
    matrix_type: &str,
    missing_handler: i32,
) -> Result<MatrixResponse, TreeError> {
    let profile = ProfileSet::from_json(profile_json)?;
    let matrix = build_matrix(&profile, matrix_type, missing_handler)?;

    Ok(MatrixResponse {
        success: true,
        matrix: matrix.outer_iter().map(|row| row.to_vec()).collect(),
        n_strains: profile.n_strains(),
        strain_names: profile.strains,
    })
}

fn build_matrix(
    profile: &ProfileSet,
    matrix_type: &str,
    missing_handler: i32,
) -> Result<Array2<f64>, TreeError> {
    let handler = MissingHandler::try_from(missing_handler)?;

    if matrix_type == "symmetric" {
        Ok(distance::symmetric_matrix(profile, handler))
    } else {
        Ok(distance::asymmetric_matrix(profile))
    }
}

fn failure(error: &TreeError) -> String {
    to_json(&ErrorResponse {
        success: false,
        error: error.to_string(),
    })
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|e| format!(r#"{{"success":false,"error":"{}"}}"#, e))
}

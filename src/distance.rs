use ndarray::Array2;
use rayon::prelude::*;

use crate::error::TreeError;
use crate::profile::ProfileSet;

/// Policy for loci where one or both alleles are missing (non-positive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingHandler {
    /// Skip the locus entirely.
    Ignore,
    /// Per-pair this behaves exactly like [`MissingHandler::Ignore`]; the
    /// name suggests a global column removal that is not applied
    /// retroactively across pairs.
    RemoveColumn,
    /// Missing is a distinct allele: mismatched presence counts as a
    /// difference, two missings match.
    TreatAsAllele,
    /// Every missing-involved locus counts as one difference.
    AbsoluteDiff,
}

impl TryFrom<i32> for MissingHandler {
    type Error = TreeError;

    fn try_from(code: i32) -> Result<Self, TreeError> {
        match code {
            0 => Ok(MissingHandler::Ignore),
            1 => Ok(MissingHandler::RemoveColumn),
            2 => Ok(MissingHandler::TreatAsAllele),
            3 => Ok(MissingHandler::AbsoluteDiff),
            other => Err(TreeError::InvalidMissingHandler(other)),
        }
    }
}

/// Compute the symmetric allelic distance matrix.
///
/// The distance between two strains is the raw count of loci at which
/// their alleles differ, under the given missing-data policy. No
/// normalization by the number of comparable loci is applied. The matrix
/// is computed over the upper triangle and mirrored; the diagonal is zero.
pub fn symmetric_matrix(profile: &ProfileSet, handler: MissingHandler) -> Array2<f64> {
    let n = profile.n_strains();
    let mut matrix = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in (i + 1)..n {
            let dist = pairwise_distance(&profile.profiles[i], &profile.profiles[j], handler);
            matrix[[i, j]] = dist;
            matrix[[j, i]] = dist;
        }
    }

    matrix
}

/// Compute the asymmetric distance matrix used by the arborescence builder.
///
/// The `i → j` entry is `differences + 0.5 * missing_in_source`, where
/// `missing_in_source` counts loci missing in strain `i`. Missing source
/// data compounds per outgoing arc, which steers the tree toward growing
/// from complete profiles. Rows are independent and computed in parallel;
/// the result does not depend on scheduling.
pub fn asymmetric_matrix(profile: &ProfileSet) -> Array2<f64> {
    let n = profile.n_strains();

    let rows: Vec<Vec<f64>> = (0..n)
        .into_par_iter()
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        directional_distance(&profile.profiles[i], &profile.profiles[j])
                    }
                })
                .collect()
        })
        .collect();

    let mut matrix = Array2::<f64>::zeros((n, n));
    for (i, row) in rows.into_iter().enumerate() {
        for (j, value) in row.into_iter().enumerate() {
            matrix[[i, j]] = value;
        }
    }

    matrix
}

/// Compute the p-distance matrix for pre-aligned character sequences.
///
/// Sequences of unequal length are incomparable and get the maximum
/// representable distance.
pub fn p_distance_matrix(sequences: &[Vec<u8>]) -> Array2<f64> {
    let n = sequences.len();
    let mut matrix = Array2::<f64>::zeros((n, n));

    for i in 0..n {
        for j in (i + 1)..n {
            let dist = p_distance(&sequences[i], &sequences[j]);
            matrix[[i, j]] = dist;
            matrix[[j, i]] = dist;
        }
    }

    matrix
}

fn pairwise_distance(profile1: &[i32], profile2: &[i32], handler: MissingHandler) -> f64 {
    let mut differences = 0u32;

    for (&allele1, &allele2) in profile1.iter().zip(profile2) {
        let missing1 = allele1 <= 0;
        let missing2 = allele2 <= 0;

        if missing1 || missing2 {
            match handler {
                MissingHandler::Ignore | MissingHandler::RemoveColumn => continue,
                MissingHandler::TreatAsAllele => {
                    if missing1 != missing2 || (!missing1 && allele1 != allele2) {
                        differences += 1;
                    }
                }
                MissingHandler::AbsoluteDiff => {
                    differences += 1;
                }
            }
        } else if allele1 != allele2 {
            differences += 1;
        }
    }

    f64::from(differences)
}

fn directional_distance(from_profile: &[i32], to_profile: &[i32]) -> f64 {
    let mut differences = 0u32;
    let mut missing_in_from = 0u32;

    for (&from_allele, &to_allele) in from_profile.iter().zip(to_profile) {
        if from_allele <= 0 {
            missing_in_from += 1;
        } else if to_allele > 0 && from_allele != to_allele {
            differences += 1;
        }
    }

    f64::from(differences) + 0.5 * f64::from(missing_in_from)
}

/// Proportion of mismatching positions among comparable ones. Gaps (`-`)
/// and ambiguous bases (`N`) are skipped, case-insensitively.
fn p_distance(seq1: &[u8], seq2: &[u8]) -> f64 {
    if seq1.len() != seq2.len() {
        return f64::MAX;
    }

    let mut differences = 0u32;
    let mut valid_positions = 0u32;

    for (&b1, &b2) in seq1.iter().zip(seq2) {
        let c1 = b1.to_ascii_uppercase();
        let c2 = b2.to_ascii_uppercase();

        if c1 == b'-' || c1 == b'N' || c2 == b'-' || c2 == b'N' {
            continue;
        }

        if c1 != c2 {
            differences += 1;
        }
        valid_positions += 1;
    }

    if valid_positions == 0 {
        return 0.0;
    }

    f64::from(differences) / f64::from(valid_positions)
}

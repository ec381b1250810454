use serde::Deserialize;

use crate::error::TreeError;

/// A set of strains with index-aligned names and allelic profiles.
///
/// Each profile is a fixed-length vector of integer allele identifiers;
/// position `k` is locus `k`. Non-positive values mean the allele is
/// missing at that locus, positive identifiers are opaque (equality is the
/// only meaningful operation on them).
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileSet {
    pub strains: Vec<String>,
    pub profiles: Vec<Vec<i32>>,
}

impl ProfileSet {
    /// Build a profile set, checking the shape invariants: names and
    /// profiles index-aligned, at least one strain, all profiles the same
    /// length.
    pub fn new(strains: Vec<String>, profiles: Vec<Vec<i32>>) -> Result<Self, TreeError> {
        let set = ProfileSet { strains, profiles };
        set.validate()?;
        Ok(set)
    }

    /// Parse the `{"strains": [...], "profiles": [[...]]}` input shape and
    /// validate it.
    pub fn from_json(json: &str) -> Result<Self, TreeError> {
        let set: ProfileSet = serde_json::from_str(json)?;
        set.validate()?;
        Ok(set)
    }

    pub fn n_strains(&self) -> usize {
        self.strains.len()
    }

    /// Number of loci per profile (0 when there are no strains).
    pub fn n_loci(&self) -> usize {
        self.profiles.first().map_or(0, Vec::len)
    }

    fn validate(&self) -> Result<(), TreeError> {
        if self.strains.len() != self.profiles.len() {
            return Err(TreeError::InvalidProfile(format!(
                "{} strain names but {} profiles",
                self.strains.len(),
                self.profiles.len()
            )));
        }
        if self.strains.is_empty() {
            return Err(TreeError::InvalidProfile(
                "at least one strain is required".to_string(),
            ));
        }
        let n_loci = self.profiles[0].len();
        for (name, profile) in self.strains.iter().zip(&self.profiles) {
            if profile.len() != n_loci {
                return Err(TreeError::InvalidProfile(format!(
                    "profile for strain '{}' has {} loci, expected {}",
                    name,
                    profile.len(),
                    n_loci
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_valid_profile_json() {
        let set = ProfileSet::from_json(
            r#"{"strains": ["A", "B"], "profiles": [[1, 2, 3], [1, 2, 4]]}"#,
        )
        .unwrap();

        assert_eq!(set.n_strains(), 2);
        assert_eq!(set.n_loci(), 3);
        assert_eq!(set.strains[1], "B");
        assert_eq!(set.profiles[1], vec![1, 2, 4]);
    }

    #[test]
    fn test_rejects_ragged_profiles() {
        let result = ProfileSet::from_json(
            r#"{"strains": ["A", "B"], "profiles": [[1, 2, 3], [1, 2]]}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_misaligned_names() {
        let result = ProfileSet::new(vec!["A".to_string()], vec![vec![1], vec![2]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_set() {
        let result = ProfileSet::new(Vec::new(), Vec::new());
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_malformed_json() {
        assert!(ProfileSet::from_json("not json").is_err());
        assert!(ProfileSet::from_json(r#"{"strains": ["A"]}"#).is_err());
    }
}

use crate::base::*;
use log::info;
use std::io;
use std::io::{Error, ErrorKind};

/// The two designated tail groups used to re-calibrate the zero-kinship
/// baseline, conventionally obtained by ordering individuals by genetic
/// similarity and taking the two extremes.
#[derive(Debug, Clone)]
pub struct ExtremeGroups {
    pub first: Vec<usize>,
    pub second: Vec<usize>,
}

impl ExtremeGroups {
    pub fn new(first: Vec<usize>, second: Vec<usize>) -> io::Result<Self> {
        if first.is_empty() || second.is_empty() {
            return Err(Error::new(
                ErrorKind::NotFound,
                "Both extreme groups need at least one individual.",
            ));
        }
        if first.iter().any(|i| second.contains(i)) {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "The two extreme groups overlap; they must be disjoint.",
            ));
        }
        Ok(ExtremeGroups { first, second })
    }

    /// Pull the two tail groups out of a grouping by label.
    pub fn from_grouping(grouping: &Grouping, label_a: &str, label_b: &str) -> io::Result<Self> {
        if label_a == label_b {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "The two extreme groups must carry different labels.",
            ));
        }
        ExtremeGroups::new(
            grouping.group_members(label_a)?,
            grouping.group_members(label_b)?,
        )
    }

    fn check_bounds(&self, n: usize) -> io::Result<()> {
        match self
            .first
            .iter()
            .chain(self.second.iter())
            .find(|&&i| i >= n)
        {
            Some(&i) => Err(Error::new(
                ErrorKind::InvalidInput,
                "Extreme-group index ".to_owned()
                    + &i.to_string()
                    + " is out of bounds for a kinship matrix of dimension "
                    + &n.to_string()
                    + ".",
            )),
            None => Ok(()),
        }
    }
}

/// Shift the whole kinship matrix so that the mean kinship between the two
/// extreme groups becomes zero, and return the shift that was applied.
///
/// The shift is purely additive: differences between entries, and hence the
/// relative ordering of all pairs, are unchanged, and the self-kinship
/// diagonal moves by the same constant as the off-diagonal entries. Any NaN
/// (undefined-pair) entry between the two tail groups makes the baseline
/// itself undefined and is a hard error rather than being skipped.
pub fn rescale_baseline_in_place(
    kinship: &mut KinshipMatrix,
    extremes: &ExtremeGroups,
) -> io::Result<f64> {
    let n = kinship.dim();
    extremes.check_bounds(n)?;
    let mut sum: f64 = 0.0;
    let mut count: usize = 0;
    for &i in &extremes.first {
        for &j in &extremes.second {
            let x = kinship.kinship[(i, j)];
            if x.is_nan() {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    "Kinship between individuals ".to_owned()
                        + &i.to_string()
                        + " and "
                        + &j.to_string()
                        + " is undefined (no informative locus in common); cannot re-calibrate the baseline on it.",
                ));
            }
            sum += x;
            count += 1;
        }
    }
    let baseline = sum / count as f64;
    info!(
        "Re-calibrating zero-kinship baseline by {} over {} extreme-group pairs",
        baseline, count
    );
    kinship.kinship.mapv_inplace(|x| x - baseline);
    Ok(baseline)
}

/// Non-mutating variant of `rescale_baseline_in_place`.
pub fn rescale_baseline(
    kinship: &KinshipMatrix,
    extremes: &ExtremeGroups,
) -> io::Result<KinshipMatrix> {
    let mut out = kinship.clone();
    rescale_baseline_in_place(&mut out, extremes)?;
    Ok(out)
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    // Note this useful idiom: importing names from outer (for mod tests) scope.
    use super::*;
    use ndarray::prelude::*;

    fn toy_kinship() -> KinshipMatrix {
        KinshipMatrix {
            kinship: Array2::from_shape_vec(
                (4, 4),
                vec![
                    0.70, 0.30, 0.12, 0.10, 0.30, 0.65, 0.14, 0.16, 0.12, 0.14, 0.80, 0.40,
                    0.10, 0.16, 0.40, 0.75,
                ],
            )
            .unwrap(),
            pair_loci: Array2::from_elem((4, 4), 1_000),
        }
    }

    #[test]
    fn test_extreme_groups_validation() {
        assert!(ExtremeGroups::new(vec![], vec![1]).is_err());
        assert!(ExtremeGroups::new(vec![0, 1], vec![1, 2]).is_err());
        assert!(ExtremeGroups::new(vec![0, 1], vec![2, 3]).is_ok());
        let grouping = Grouping::new(
            vec!["A", "A", "B", "B"]
                .into_iter()
                .map(|x| x.to_owned())
                .collect(),
        );
        let extremes = ExtremeGroups::from_grouping(&grouping, "A", "B").unwrap();
        assert_eq!(extremes.first, vec![0, 1]);
        assert_eq!(extremes.second, vec![2, 3]);
        assert!(ExtremeGroups::from_grouping(&grouping, "A", "A").is_err());
        assert!(ExtremeGroups::from_grouping(&grouping, "A", "C").is_err());
    }

    #[test]
    fn test_rescale_is_a_pure_shift() {
        let original = toy_kinship();
        let extremes = ExtremeGroups::new(vec![0, 1], vec![2, 3]).unwrap();
        let rescaled = rescale_baseline(&original, &extremes).unwrap();
        // Baseline is the mean of the 4 cross-group entries
        let expected = (0.12 + 0.10 + 0.14 + 0.16) / 4.0;
        for i in 0..4 {
            for j in 0..4 {
                assert!(
                    f64::abs(
                        rescaled.kinship[(i, j)] - (original.kinship[(i, j)] - expected)
                    ) < 1e-12
                );
            }
        }
        // Differences between entries are untouched, diagonal included
        for (a, b) in [((0, 1), (2, 3)), ((0, 0), (1, 2)), ((3, 3), (0, 2))] {
            assert!(
                f64::abs(
                    (rescaled.kinship[a] - rescaled.kinship[b])
                        - (original.kinship[a] - original.kinship[b])
                ) < 1e-12
            );
        }
        // The recalibrated cross-group block now averages to zero
        let mut cross = 0.0;
        for &i in &extremes.first {
            for &j in &extremes.second {
                cross += rescaled.kinship[(i, j)];
            }
        }
        assert!(f64::abs(cross / 4.0) < 1e-12);
        // The diagnostic counts ride along unchanged
        assert_eq!(rescaled.pair_loci, original.pair_loci);
    }

    #[test]
    fn test_rescale_in_place_returns_shift() {
        let mut kinship = toy_kinship();
        let extremes = ExtremeGroups::new(vec![0], vec![3]).unwrap();
        let shift = rescale_baseline_in_place(&mut kinship, &extremes).unwrap();
        assert!(f64::abs(shift - 0.10) < 1e-12);
        assert!(f64::abs(kinship.kinship[(0, 3)]) < 1e-12);
    }

    #[test]
    fn test_undefined_entry_fails_loudly() {
        let mut kinship = toy_kinship();
        kinship.kinship[(0, 3)] = f64::NAN;
        kinship.kinship[(3, 0)] = f64::NAN;
        kinship.pair_loci[(0, 3)] = 0;
        kinship.pair_loci[(3, 0)] = 0;
        let extremes = ExtremeGroups::new(vec![0, 1], vec![2, 3]).unwrap();
        let out = rescale_baseline(&kinship, &extremes);
        assert_eq!(out.unwrap_err().kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn test_out_of_bounds_extremes() {
        let mut kinship = toy_kinship();
        let extremes = ExtremeGroups::new(vec![0], vec![4]).unwrap();
        assert!(rescale_baseline_in_place(&mut kinship, &extremes).is_err());
    }
}

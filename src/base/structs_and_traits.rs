use ndarray::prelude::*;
use std::io;
use std::io::{Error, ErrorKind};

///////////////////////////////////////////////////////////////////////////////
// TRAITS
///////////////////////////////////////////////////////////////////////////////

/// Read-only supplier of genotype dosages, one locus at a time.
///
/// Dosages are the number of copies of the reference allele, i.e. 0.0, 1.0 or
/// 2.0, with `f64::NAN` marking a missing call. Implementations are expected
/// to be cheap to query by locus so that the kinship estimator can stream the
/// whole genome without ever holding more than one locus per worker thread.
pub trait GenotypeSource: Sync {
    fn n_individuals(&self) -> usize;
    fn n_loci(&self) -> usize;
    /// Fill `buffer` (length `n_individuals()`) with the dosages at `locus`.
    fn copy_locus_into(&self, locus: usize, buffer: &mut Array1<f64>) -> io::Result<()>;
}

///////////////////////////////////////////////////////////////////////////////
// STRUCTS
///////////////////////////////////////////////////////////////////////////////

/// In-memory genotype matrix: l loci x n individuals, dosages in {0, 1, 2, NaN}.
#[derive(Debug, Clone)]
pub struct GenotypeMatrix {
    genotypes: Array2<f64>,
}

/// Population labels per individual, with an optional nested second level and
/// an optional designation of which top-level group stands in for the
/// ancestral population when estimating allele frequencies.
#[derive(Debug, Clone)]
pub struct Grouping {
    pub groups: Vec<String>,
    pub subgroups: Option<Vec<String>>,
    pub ancestral: Option<String>,
}

/// Symmetric n x n kinship estimate plus the per-pair count of informative
/// loci behind each entry. Entries for pairs with no informative locus are
/// NaN. The diagonal holds self-kinship, from which the inbreeding
/// coefficient is derived as `2*self_kinship - 1`.
#[derive(Debug, Clone)]
pub struct KinshipMatrix {
    pub kinship: Array2<f64>,
    pub pair_loci: Array2<usize>,
}

///////////////////////////////////////////////////////////////////////////////
// IMPLEMENTATIONS
///////////////////////////////////////////////////////////////////////////////

impl GenotypeMatrix {
    pub fn new(genotypes: Array2<f64>) -> io::Result<Self> {
        for &x in genotypes.iter() {
            if !x.is_nan() && x != 0.0 && x != 1.0 && x != 2.0 {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    "Invalid genotype dosage: ".to_owned()
                        + &x.to_string()
                        + ". Expecting 0, 1, 2 or NaN for missing.",
                ));
            }
        }
        Ok(GenotypeMatrix { genotypes })
    }

    pub fn matrix(&self) -> &Array2<f64> {
        &self.genotypes
    }
}

impl GenotypeSource for GenotypeMatrix {
    fn n_individuals(&self) -> usize {
        self.genotypes.ncols()
    }

    fn n_loci(&self) -> usize {
        self.genotypes.nrows()
    }

    fn copy_locus_into(&self, locus: usize, buffer: &mut Array1<f64>) -> io::Result<()> {
        if locus >= self.genotypes.nrows() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Locus index out of bounds: ".to_owned() + &locus.to_string(),
            ));
        }
        if buffer.len() != self.genotypes.ncols() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Locus buffer length does not match the number of individuals.",
            ));
        }
        buffer.assign(&self.genotypes.row(locus));
        Ok(())
    }
}

impl Grouping {
    pub fn new(groups: Vec<String>) -> Self {
        Grouping {
            groups,
            subgroups: None,
            ancestral: None,
        }
    }

    pub fn with_subgroups(groups: Vec<String>, subgroups: Vec<String>) -> io::Result<Self> {
        if groups.len() != subgroups.len() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Group and subgroup label vectors have different lengths: ".to_owned()
                    + &groups.len().to_string()
                    + " vs "
                    + &subgroups.len().to_string()
                    + ".",
            ));
        }
        Ok(Grouping {
            groups,
            subgroups: Some(subgroups),
            ancestral: None,
        })
    }

    pub fn with_ancestral(mut self, label: &str) -> Self {
        self.ancestral = Some(label.to_owned());
        self
    }

    pub fn n(&self) -> usize {
        self.groups.len()
    }

    /// Distinct top-level labels in order of first appearance, each with the
    /// indexes of its members.
    pub fn group_indices(&self) -> Vec<(String, Vec<usize>)> {
        super::label_indices(&self.groups)
    }

    pub fn group_members(&self, label: &str) -> io::Result<Vec<usize>> {
        let members: Vec<usize> = self
            .groups
            .iter()
            .enumerate()
            .filter(|(_, x)| x.as_str() == label)
            .map(|(i, _)| i)
            .collect();
        if members.is_empty() {
            return Err(Error::new(
                ErrorKind::NotFound,
                "Group has no members: ".to_owned() + label + ".",
            ));
        }
        Ok(members)
    }

    /// Indexes of the individuals whose allele frequencies define the
    /// zero-kinship reference, i.e. the designated ancestral group. None when
    /// no group was designated.
    pub fn ancestral_members(&self) -> io::Result<Option<Vec<usize>>> {
        match &self.ancestral {
            Some(label) => Ok(Some(self.group_members(label)?)),
            None => Ok(None),
        }
    }
}

impl KinshipMatrix {
    pub fn dim(&self) -> usize {
        self.kinship.nrows()
    }

    /// Per-individual inbreeding coefficients from the self-kinship diagonal.
    /// NaN diagonal entries (individuals with no informative locus) propagate.
    pub fn inbreeding(&self) -> Array1<f64> {
        self.kinship.diag().map(|&x| 2.00 * x - 1.00)
    }

    /// Smallest number of informative loci across all pairs.
    pub fn min_pair_loci(&self) -> usize {
        self.pair_loci.iter().fold(usize::MAX, |min, &x| min.min(x))
    }

    /// Pairs (i <= j) whose kinship estimate rests on fewer than `min_loci`
    /// informative loci. Diagnostic only; estimation never fails on this.
    pub fn pairs_below(&self, min_loci: usize) -> Vec<(usize, usize)> {
        let n = self.dim();
        let mut out: Vec<(usize, usize)> = vec![];
        for i in 0..n {
            for j in i..n {
                if self.pair_loci[(i, j)] < min_loci {
                    out.push((i, j));
                }
            }
        }
        out
    }

    /// Permute rows and columns in tandem, e.g. to sort individuals by
    /// population before tail-group selection. `order[k]` is the old index of
    /// the individual placed at new index k.
    pub fn reorder(&self, order: &[usize]) -> io::Result<KinshipMatrix> {
        let n = self.dim();
        if order.len() != n {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Permutation length does not match the kinship matrix dimension: ".to_owned()
                    + &order.len().to_string()
                    + " vs "
                    + &n.to_string()
                    + ".",
            ));
        }
        let mut seen = vec![false; n];
        for &o in order {
            if o >= n || seen[o] {
                return Err(Error::new(
                    ErrorKind::InvalidInput,
                    "Invalid permutation: each index in 0..n must appear exactly once.",
                ));
            }
            seen[o] = true;
        }
        let mut kinship: Array2<f64> = Array2::from_elem((n, n), f64::NAN);
        let mut pair_loci: Array2<usize> = Array2::from_elem((n, n), 0);
        for i in 0..n {
            for j in 0..n {
                kinship[(i, j)] = self.kinship[(order[i], order[j])];
                pair_loci[(i, j)] = self.pair_loci[(order[i], order[j])];
            }
        }
        Ok(KinshipMatrix { kinship, pair_loci })
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    // Note this useful idiom: importing names from outer (for mod tests) scope.
    use super::*;
    #[test]
    fn test_genotype_matrix() {
        let g = GenotypeMatrix::new(
            Array2::from_shape_vec((3, 2), vec![0.0, 1.0, 2.0, f64::NAN, 1.0, 1.0]).unwrap(),
        )
        .unwrap();
        assert_eq!(g.n_loci(), 3);
        assert_eq!(g.n_individuals(), 2);
        let mut buffer: Array1<f64> = Array1::from_elem(2, 0.0);
        g.copy_locus_into(1, &mut buffer).unwrap();
        assert_eq!(buffer[0], 2.0);
        assert!(buffer[1].is_nan());
        // Out-of-range dosages are rejected outright
        let bad = GenotypeMatrix::new(Array2::from_elem((1, 2), 0.5));
        assert!(bad.is_err());
        // So are out-of-bounds locus requests
        assert!(g.copy_locus_into(3, &mut buffer).is_err());
    }

    #[test]
    fn test_grouping() {
        let grouping = Grouping::new(
            vec!["AFR", "EUR", "AFR", "EAS", "EUR"]
                .into_iter()
                .map(|x| x.to_owned())
                .collect(),
        )
        .with_ancestral("AFR");
        let idx = grouping.group_indices();
        assert_eq!(
            idx.iter().map(|(x, _)| x.to_owned()).collect::<Vec<String>>(),
            vec!["AFR".to_owned(), "EUR".to_owned(), "EAS".to_owned()]
        );
        assert_eq!(grouping.group_members("EUR").unwrap(), vec![1, 4]);
        assert_eq!(grouping.ancestral_members().unwrap().unwrap(), vec![0, 2]);
        assert!(grouping.group_members("SAS").is_err());
        assert!(Grouping::with_subgroups(
            vec!["A".to_owned(), "A".to_owned()],
            vec!["a1".to_owned()]
        )
        .is_err());
    }

    #[test]
    fn test_kinship_matrix_accessors() {
        let kinship = KinshipMatrix {
            kinship: Array2::from_shape_vec(
                (3, 3),
                vec![0.6, 0.1, 0.1, 0.1, 0.4, 0.1, 0.1, 0.1, 0.5],
            )
            .unwrap(),
            pair_loci: Array2::from_elem((3, 3), 100),
        };
        let inbr = kinship.inbreeding();
        assert!(f64::abs(inbr[0] - 0.2) < 1e-12);
        assert!(f64::abs(inbr[1] - -0.2) < 1e-12);
        assert!(f64::abs(inbr[2] - 0.0) < 1e-12);
        assert_eq!(kinship.min_pair_loci(), 100);
        assert_eq!(kinship.pairs_below(100).len(), 0);
        assert_eq!(kinship.pairs_below(101).len(), 6);
        // Reordering permutes rows and columns in tandem
        let reordered = kinship.reorder(&[2, 0, 1]).unwrap();
        assert_eq!(reordered.kinship[(0, 0)], 0.5);
        assert_eq!(reordered.kinship[(1, 1)], 0.6);
        assert_eq!(reordered.kinship[(0, 1)], kinship.kinship[(2, 0)]);
        assert!(kinship.reorder(&[0, 0, 1]).is_err());
        assert!(kinship.reorder(&[0, 1]).is_err());
    }
}

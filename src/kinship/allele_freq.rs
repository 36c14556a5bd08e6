use ndarray::prelude::*;

/// Estimated reference-allele frequency at one locus, i.e. the mean dosage
/// halved, ignoring missing calls. When `mask` is supplied only the listed
/// individuals are considered (e.g. the designated ancestral group). Returns
/// None when every considered genotype is missing: such a locus carries no
/// frequency information and must be excluded from kinship accumulation
/// rather than given a fabricated frequency.
pub fn allele_frequency(genotypes: &ArrayView1<f64>, mask: Option<&[usize]>) -> Option<f64> {
    let (sum, count) = match mask {
        Some(idx) => idx
            .iter()
            .map(|&i| genotypes[i])
            .filter(|x| !x.is_nan())
            .fold((0.0, 0), |(sum, count), x| (sum + x, count + 1)),
        None => genotypes
            .iter()
            .filter(|x| !x.is_nan())
            .fold((0.0, 0), |(sum, count), &x| (sum + x, count + 1)),
    };
    if count == 0 {
        None
    } else {
        Some(sum / (2.00 * count as f64))
    }
}

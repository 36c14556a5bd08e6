use crate::base::*;
use crate::kinship::allele_frequency;
use log::{debug, info, warn};
use ndarray::prelude::*;
use rayon::prelude::*;
use std::io;
use std::io::{Error, ErrorKind};

/// Per-worker accumulation state: running numerator/denominator sums and
/// informative-locus counts over the upper triangle (diagonal included), plus
/// one locus-sized scratch buffer. Memory is O(n^2) per worker regardless of
/// the number of loci.
struct PairAccumulator {
    numerator: Array2<f64>,
    denominator: Array2<f64>,
    pair_loci: Array2<usize>,
    buffer: Array1<f64>,
    loci_no_frequency: usize,
    loci_monomorphic: usize,
}

impl PairAccumulator {
    fn new(n: usize) -> Self {
        PairAccumulator {
            numerator: Array2::from_elem((n, n), 0.0),
            denominator: Array2::from_elem((n, n), 0.0),
            pair_loci: Array2::from_elem((n, n), 0),
            buffer: Array1::from_elem(n, f64::NAN),
            loci_no_frequency: 0,
            loci_monomorphic: 0,
        }
    }

    /// Fold the locus currently held in the buffer into the running sums.
    /// Missing genotypes drop only the pairs they touch, never the locus.
    fn accumulate(&mut self, p: f64) {
        let n = self.buffer.len();
        let het = 4.00 * p * (1.00 - p);
        for i in 0..n {
            let xi = self.buffer[i];
            if xi.is_nan() {
                continue;
            }
            let di = xi - 2.00 * p;
            for j in i..n {
                let xj = self.buffer[j];
                if xj.is_nan() {
                    continue;
                }
                self.numerator[(i, j)] += di * (xj - 2.00 * p);
                self.denominator[(i, j)] += het;
                self.pair_loci[(i, j)] += 1;
            }
        }
    }

    fn merge(mut self, other: PairAccumulator) -> Self {
        self.numerator += &other.numerator;
        self.denominator += &other.denominator;
        self.pair_loci += &other.pair_loci;
        self.loci_no_frequency += other.loci_no_frequency;
        self.loci_monomorphic += other.loci_monomorphic;
        self
    }
}

/// Estimate the genome-wide kinship matrix by a single streaming pass over
/// the loci of `source`.
///
/// Each locus contributes `(x_i - 2p)(x_j - 2p)` to the pair numerator and
/// `4p(1-p)` to the pair denominator, and each entry is finalised as the
/// ratio of the two sums, which converges to the classical kinship
/// coefficient (self-kinship on the diagonal). Loci are partitioned across
/// rayon workers; every worker owns a private accumulator and the partial
/// sums are merged by elementwise addition at the end.
///
/// When `groups` is supplied, (a) the designated ancestral group (if any)
/// restricts the per-locus allele-frequency estimate, and (b) the mean
/// kinship between the two least related groups is subtracted from every
/// entry so that the zero-kinship baseline lands at zero. Without `groups`
/// the baseline is left uncalibrated; see `rescale_baseline` for the
/// post-hoc alternative.
///
/// Loci with undefined frequency (all considered calls missing) or
/// monomorphic in the reference set carry no signal and are skipped. Pairs
/// with no informative locus in common end up as NaN entries, reported via
/// the log and the `pair_loci` counts, never coerced to zero.
pub fn estimate_kinship<S: GenotypeSource + ?Sized>(
    source: &S,
    groups: Option<&Grouping>,
) -> io::Result<KinshipMatrix> {
    let n = source.n_individuals();
    let l = source.n_loci();
    if n == 0 {
        return Err(Error::new(
            ErrorKind::NotFound,
            "The genotype source has no individuals.",
        ));
    }
    if l == 0 {
        return Err(Error::new(
            ErrorKind::NotFound,
            "The genotype source has no loci.",
        ));
    }
    if let Some(grouping) = groups {
        if grouping.n() != n {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                "Grouping has ".to_owned()
                    + &grouping.n().to_string()
                    + " labels but the genotype source has "
                    + &n.to_string()
                    + " individuals.",
            ));
        }
    }
    let ancestral: Option<Vec<usize>> = match groups {
        Some(grouping) => grouping.ancestral_members()?,
        None => None,
    };
    info!(
        "Estimating kinship for {} individuals across {} loci",
        n, l
    );
    let acc = (0..l)
        .into_par_iter()
        .try_fold(
            || PairAccumulator::new(n),
            |mut acc: PairAccumulator, locus: usize| -> io::Result<PairAccumulator> {
                source.copy_locus_into(locus, &mut acc.buffer)?;
                match allele_frequency(&acc.buffer.view(), ancestral.as_deref()) {
                    None => acc.loci_no_frequency += 1,
                    Some(p) if p * (1.00 - p) <= 0.0 => acc.loci_monomorphic += 1,
                    Some(p) => acc.accumulate(p),
                }
                Ok(acc)
            },
        )
        .try_reduce(|| PairAccumulator::new(n), |a, b| Ok(a.merge(b)))?;
    debug!(
        "Skipped {} loci with undefined frequency and {} loci monomorphic in the reference set",
        acc.loci_no_frequency, acc.loci_monomorphic
    );
    // Finalise each pair as the ratio of its sums (ratio-of-sums, not
    // sum-of-ratios) and mirror the upper triangle
    let mut kinship: Array2<f64> = Array2::from_elem((n, n), f64::NAN);
    let mut pair_loci: Array2<usize> = Array2::from_elem((n, n), 0);
    let mut undefined_pairs: usize = 0;
    for i in 0..n {
        for j in i..n {
            let count = acc.pair_loci[(i, j)];
            pair_loci[(i, j)] = count;
            pair_loci[(j, i)] = count;
            if count > 0 && acc.denominator[(i, j)] > 0.0 {
                let value = acc.numerator[(i, j)] / acc.denominator[(i, j)];
                kinship[(i, j)] = value;
                kinship[(j, i)] = value;
            } else {
                undefined_pairs += 1;
            }
        }
    }
    if undefined_pairs > 0 {
        warn!(
            "{} pairs share no informative locus; their kinship entries are NaN",
            undefined_pairs
        );
    }
    let mut out = KinshipMatrix { kinship, pair_loci };
    if let Some(grouping) = groups {
        calibrate_baseline(&mut out, grouping);
    }
    Ok(out)
}

/// Zero-kinship calibration: among all pairs of distinct top-level groups,
/// the pair with the smallest mean cross-group kinship is taken to be
/// unrelated and that mean is subtracted from every entry.
fn calibrate_baseline(kinship: &mut KinshipMatrix, grouping: &Grouping) {
    let group_idx = grouping.group_indices();
    let k = group_idx.len();
    if k < 2 {
        debug!("Fewer than two groups supplied; zero-kinship baseline left uncalibrated");
        return;
    }
    let matrix = &kinship.kinship;
    let mut baseline = f64::INFINITY;
    let mut baseline_groups: (String, String) = ("".to_owned(), "".to_owned());
    for a in 0..k {
        for b in (a + 1)..k {
            let (label_a, idx_a) = &group_idx[a];
            let (label_b, idx_b) = &group_idx[b];
            let (mean, count) = mean_defined(
                idx_a
                    .iter()
                    .flat_map(|&i| idx_b.iter().map(move |&j| matrix[(i, j)])),
            );
            if count == 0 {
                warn!(
                    "No defined kinship entry between groups {} and {}; pair skipped for baseline calibration",
                    label_a, label_b
                );
                continue;
            }
            if mean < baseline {
                baseline = mean;
                baseline_groups = (label_a.to_owned(), label_b.to_owned());
            }
        }
    }
    if baseline.is_finite() {
        info!(
            "Zero-kinship baseline {} set by groups {} and {}",
            baseline, baseline_groups.0, baseline_groups.1
        );
        kinship.kinship.mapv_inplace(|x| x - baseline);
    }
}

use crate::base::*;
use ndarray::prelude::*;
use rand::distributions::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;
use statrs::distribution::{Beta, Binomial, Uniform};
use std::io;
use std::io::{Error, ErrorKind};

// Simulate genotypes for fully independent subpopulations under the
// Balding-Nichols model

/// Draw `n_loci` unlinked loci for `inbreeding.len()` independent
/// subpopulations of `n_per_pop` individuals each. Per locus the ancestral
/// frequency is uniform on (0.05, 0.95); subpopulation k drifts to a
/// Beta-distributed frequency with mean p and variance `inbreeding[k]`*p*(1-p),
/// and genotypes are binomial draws of two alleles. Within-population kinship
/// relative to the ancestral population is therefore `inbreeding[k]`,
/// cross-population kinship is zero, and Fst under equal-group weights is the
/// mean of `inbreeding`. Fully deterministic for a fixed `seed`.
pub fn simulate_genotypes(
    n_per_pop: usize,
    inbreeding: &[f64],
    n_loci: usize,
    seed: u64,
) -> io::Result<(GenotypeMatrix, Grouping)> {
    if n_per_pop == 0 || n_loci == 0 || inbreeding.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Need at least one subpopulation, one individual per subpopulation and one locus.",
        ));
    }
    if inbreeding.iter().any(|&f| !(0.0..1.0).contains(&f)) {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Subpopulation inbreeding coefficients must lie in [0, 1).",
        ));
    }
    let k = inbreeding.len();
    let n = k * n_per_pop;
    let mut rng = StdRng::seed_from_u64(seed);
    let dist_ancestral = Uniform::new(0.05, 0.95).unwrap();
    let mut genotypes: Array2<f64> = Array2::from_elem((n_loci, n), f64::NAN);
    for locus in 0..n_loci {
        let p = dist_ancestral.sample(&mut rng);
        for (pop, &f) in inbreeding.iter().enumerate() {
            let q = if f <= 0.0 {
                p
            } else {
                let shape = (1.00 - f) / f;
                Beta::new(p * shape, (1.00 - p) * shape)
                    .unwrap()
                    .sample(&mut rng)
            };
            let dist_genotype = Binomial::new(q, 2).unwrap();
            for ind in 0..n_per_pop {
                genotypes[(locus, pop * n_per_pop + ind)] = dist_genotype.sample(&mut rng);
            }
        }
    }
    let groups: Vec<String> = (0..k)
        .flat_map(|pop| std::iter::repeat("pop".to_owned() + &pop.to_string()).take(n_per_pop))
        .collect();
    Ok((GenotypeMatrix::new(genotypes)?, Grouping::new(groups)))
}

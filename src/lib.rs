//! Genome-wide kinship estimation and generalised Fst for structured
//! populations.
//!
//! The crate streams a genotype matrix locus-by-locus (any [`GenotypeSource`]
//! works; an in-memory [`GenotypeMatrix`] is provided) into a bias-corrected
//! kinship matrix, re-calibrates the zero-kinship baseline either
//! automatically from population labels or post hoc from two designated
//! extreme groups, balances per-individual weights across a one- or two-level
//! population hierarchy, and reduces kinship plus weights to a single
//! generalised Fst scalar, i.e. the weighted mean inbreeding coefficient.

pub use base::{GenotypeMatrix, GenotypeSource, Grouping, KinshipMatrix};
pub use kinship::{
    allele_frequency, estimate_kinship, rescale_baseline, rescale_baseline_in_place, ExtremeGroups,
};
pub use popgen::{balance_weights, estimate_fst, inbreeding};
pub use simulation::simulate_genotypes;

pub mod base;
pub mod kinship;
pub mod popgen;
pub mod simulation;

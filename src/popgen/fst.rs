use crate::base::*;
use log::info;
use ndarray::prelude::*;
use std::io;
use std::io::{Error, ErrorKind};

/// Relative tolerance on the weight sum; anything further from 1 than this is
/// a caller mistake and is never silently renormalised.
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Generalised Fst: the weighted mean of the per-individual inbreeding
/// coefficients taken off the kinship-matrix diagonal. Weights default to
/// uniform 1/n; pass the output of `balance_weights` to make every
/// population, rather than every sample, count equally.
///
/// Fails loudly (never repairs) on: weight vector of the wrong length,
/// weights not summing to one, negative weights, and any undefined (NaN)
/// kinship entry whose row or column carries nonzero weight.
pub fn estimate_fst(kinship: &KinshipMatrix, weights: Option<&Array1<f64>>) -> io::Result<f64> {
    let n = kinship.dim();
    if n == 0 {
        return Err(Error::new(
            ErrorKind::NotFound,
            "The kinship matrix is empty.",
        ));
    }
    let uniform: Array1<f64>;
    let weights: &Array1<f64> = match weights {
        Some(w) => w,
        None => {
            uniform = Array1::from_elem(n, 1.00 / n as f64);
            &uniform
        }
    };
    if weights.len() != n {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Weight vector length ".to_owned()
                + &weights.len().to_string()
                + " does not match the kinship matrix dimension "
                + &n.to_string()
                + ".",
        ));
    }
    if weights.iter().any(|&w| w < 0.0) {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Weights must be non-negative.",
        ));
    }
    let sum = weights.sum();
    if f64::abs(sum - 1.00) > WEIGHT_SUM_TOLERANCE {
        return Err(Error::new(
            ErrorKind::InvalidInput,
            "Weights sum to ".to_owned() + &sum.to_string() + " instead of 1.",
        ));
    }
    // An undefined pair poisons the statistic whenever either individual
    // carries weight; surface it instead of quietly averaging around it
    for i in 0..n {
        for j in i..n {
            if kinship.kinship[(i, j)].is_nan() && (weights[i] != 0.0 || weights[j] != 0.0) {
                return Err(Error::new(
                    ErrorKind::InvalidData,
                    "Kinship between individuals ".to_owned()
                        + &i.to_string()
                        + " and "
                        + &j.to_string()
                        + " is undefined but both carry weight in the Fst estimate.",
                ));
            }
        }
    }
    let fst = kinship
        .inbreeding()
        .iter()
        .zip(weights.iter())
        .fold(0.0, |sum, (&f, &w)| sum + w * f);
    info!("Generalised Fst estimate: {}", fst);
    Ok(fst)
}

/// Per-individual inbreeding coefficients, `2 * self_kinship - 1`.
pub fn inbreeding(kinship: &KinshipMatrix) -> Array1<f64> {
    kinship.inbreeding()
}

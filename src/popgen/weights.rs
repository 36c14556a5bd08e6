use crate::base::*;
use ndarray::prelude::*;
use std::io;
use std::io::{Error, ErrorKind};

/// Per-individual weights that balance the contribution of each population
/// regardless of sample-size imbalance.
///
/// With K top-level groups every group receives total weight 1/K split
/// equally among its members. When the grouping carries a nested second
/// level, each group's share is first split equally among the S_g subgroups
/// observed inside it and then equally among the individuals of each
/// subgroup. Group and subgroup sizes are counted from the individuals
/// actually present, so the weights always sum to one even when the caller's
/// label tables mention populations with no sampled member.
pub fn balance_weights(grouping: &Grouping) -> io::Result<Array1<f64>> {
    let n = grouping.n();
    if n == 0 {
        return Err(Error::new(
            ErrorKind::NotFound,
            "There are no individuals to weight.",
        ));
    }
    let group_idx = grouping.group_indices();
    let k = group_idx.len() as f64;
    let mut weights: Array1<f64> = Array1::from_elem(n, 0.0);
    match &grouping.subgroups {
        None => {
            for (_, members) in &group_idx {
                let w = 1.00 / (k * members.len() as f64);
                for &i in members {
                    weights[i] = w;
                }
            }
        }
        Some(subgroups) => {
            // A subgroup label straddling two top-level groups breaks the
            // nesting invariant and would double-count its members
            for (label, members) in label_indices(subgroups) {
                let top = &grouping.groups[members[0]];
                if members.iter().any(|&i| &grouping.groups[i] != top) {
                    return Err(Error::new(
                        ErrorKind::InvalidInput,
                        "Subgroup ".to_owned()
                            + &label
                            + " appears in more than one top-level group.",
                    ));
                }
            }
            for (_, members) in &group_idx {
                let member_subgroups: Vec<String> = members
                    .iter()
                    .map(|&i| subgroups[i].to_owned())
                    .collect();
                let sub_idx = label_indices(&member_subgroups);
                let s_g = sub_idx.len() as f64;
                for (_, sub_members) in &sub_idx {
                    let w = 1.00 / (k * s_g * sub_members.len() as f64);
                    for &m in sub_members {
                        weights[members[m]] = w;
                    }
                }
            }
        }
    }
    Ok(weights)
}

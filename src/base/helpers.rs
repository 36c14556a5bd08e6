// Shared label and numeric utilities used across the estimators

/// Distinct labels in order of first appearance, each paired with the indexes
/// carrying that label.
pub fn label_indices(labels: &[String]) -> Vec<(String, Vec<usize>)> {
    let mut out: Vec<(String, Vec<usize>)> = vec![];
    for (i, label) in labels.iter().enumerate() {
        match out.iter_mut().find(|(x, _)| x == label) {
            Some((_, idx)) => idx.push(i),
            None => out.push((label.to_owned(), vec![i])),
        }
    }
    out
}

/// Mean of the defined (non-NaN) values, with the count of defined values.
/// Returns (NaN, 0) when every value is NaN or the iterator is empty.
pub fn mean_defined<I: Iterator<Item = f64>>(values: I) -> (f64, usize) {
    let (sum, count) = values
        .filter(|x| !x.is_nan())
        .fold((0.0, 0), |(sum, count), x| (sum + x, count + 1));
    if count == 0 {
        (f64::NAN, 0)
    } else {
        (sum / count as f64, count)
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn test_label_indices() {
        let labels: Vec<String> = vec!["b", "a", "b", "c", "a"]
            .into_iter()
            .map(|x| x.to_owned())
            .collect();
        let idx = label_indices(&labels);
        assert_eq!(idx.len(), 3);
        assert_eq!(idx[0], ("b".to_owned(), vec![0, 2]));
        assert_eq!(idx[1], ("a".to_owned(), vec![1, 4]));
        assert_eq!(idx[2], ("c".to_owned(), vec![3]));
        assert_eq!(label_indices(&[]).len(), 0);
    }

    #[test]
    fn test_mean_defined() {
        let (mean, count) = mean_defined(vec![1.0, f64::NAN, 3.0].into_iter());
        assert_eq!(mean, 2.0);
        assert_eq!(count, 2);
        let (mean, count) = mean_defined(vec![f64::NAN].into_iter());
        assert!(mean.is_nan());
        assert_eq!(count, 0);
    }
}

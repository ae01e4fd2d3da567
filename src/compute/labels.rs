//! Agreement between two clusterings of the same points.
//!
//! Labels are compared by co-membership only: the label values themselves
//! never need to match.

use rustc_hash::FxHashMap;

/// Rand index between two labelings of the same points.
///
/// Fraction of point pairs on which the two labelings agree (both together or
/// both apart). Returns `None` when the slices differ in length; fewer than
/// two points trivially agree.
///
/// # Examples
///
/// ```
/// use geocluster::compute::labels::rand_index;
///
/// let a = [1, 1, 2, 2];
/// let b = [7, 7, 9, 9];
/// assert_eq!(rand_index(&a, &b), Some(1.0));
/// ```
pub fn rand_index(a: &[i64], b: &[i64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let n = a.len() as u64;
    if n < 2 {
        return Some(1.0);
    }
    let table = Contingency::build(a, b);
    let total = comb2(n) as f64;
    // agreements = pairs together in both + pairs apart in both
    let together_both = table.sum_comb_cells();
    let together_a = table.sum_comb_rows();
    let together_b = table.sum_comb_cols();
    let agreements = total + 2.0 * together_both - together_a - together_b;
    Some(agreements / total)
}

/// Adjusted Rand index (Hubert and Arabie).
///
/// `1.0` for identical partitions, around `0.0` for independent ones.
/// Returns `None` when the slices differ in length.
pub fn adjusted_rand_index(a: &[i64], b: &[i64]) -> Option<f64> {
    if a.len() != b.len() {
        return None;
    }
    let n = a.len() as u64;
    if n < 2 {
        return Some(1.0);
    }
    let table = Contingency::build(a, b);
    let sum_ij = table.sum_comb_cells();
    let sum_a = table.sum_comb_rows();
    let sum_b = table.sum_comb_cols();

    let expected = sum_a * sum_b / comb2(n) as f64;
    let max_index = (sum_a + sum_b) / 2.0;
    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return Some(1.0);
    }
    Some((sum_ij - expected) / denom)
}

struct Contingency {
    cells: FxHashMap<(i64, i64), u64>,
    rows: FxHashMap<i64, u64>,
    cols: FxHashMap<i64, u64>,
}

impl Contingency {
    fn build(a: &[i64], b: &[i64]) -> Self {
        let mut cells = FxHashMap::default();
        let mut rows = FxHashMap::default();
        let mut cols = FxHashMap::default();
        for (&la, &lb) in a.iter().zip(b) {
            *cells.entry((la, lb)).or_insert(0) += 1;
            *rows.entry(la).or_insert(0) += 1;
            *cols.entry(lb).or_insert(0) += 1;
        }
        Self { cells, rows, cols }
    }

    fn sum_comb_cells(&self) -> f64 {
        self.cells.values().map(|&c| comb2(c) as f64).sum()
    }

    fn sum_comb_rows(&self) -> f64 {
        self.rows.values().map(|&c| comb2(c) as f64).sum()
    }

    fn sum_comb_cols(&self) -> f64 {
        self.cols.values().map(|&c| comb2(c) as f64).sum()
    }
}

fn comb2(n: u64) -> u64 {
    if n < 2 { 0 } else { n * (n - 1) / 2 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_partitions() {
        let a = [0, 0, 1, 1, 2];
        let b = [5, 5, 3, 3, 9];
        assert_eq!(rand_index(&a, &b), Some(1.0));
        assert!((adjusted_rand_index(&a, &b).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rand_index_known_value() {
        // pairs: (0,1) same/same, (0,2) diff/same, (1,2) diff/same,
        // (0,3) diff/diff, (1,3) diff/diff, (2,3) same/diff -> 3 of 6 agree
        let a = [0, 0, 1, 1];
        let b = [0, 0, 0, 1];
        let ri = rand_index(&a, &b).unwrap();
        assert!((ri - 0.5).abs() < 1e-12, "got {}", ri);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(rand_index(&[1, 2], &[1]).is_none());
        assert!(adjusted_rand_index(&[1], &[]).is_none());
    }

    #[test]
    fn test_ari_disagreement_is_below_one() {
        let a = [0, 0, 0, 1, 1, 1];
        let b = [0, 1, 2, 0, 1, 2];
        let ari = adjusted_rand_index(&a, &b).unwrap();
        assert!(ari < 0.1, "got {}", ari);
    }
}

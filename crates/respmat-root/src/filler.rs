//! Pairing of scalar and jagged columns under the positive-deposition cut.

use crate::branch_reader::JaggedCol;
use crate::error::{Result, RootError};

/// Expand a per-event scalar against a jagged column, keeping positive values.
///
/// For each event `i`, every element `v` of `seq.entry(i)` with `v > 0.0`
/// produces one `(scalars[i], v)` pair; zero, negative and NaN elements are
/// dropped. Event order and within-event element order are preserved.
///
/// The two output vectors have equal length and feed straight into
/// [`Hist2D::fill`](crate::hist2d::Hist2D::fill).
pub fn flatten_positive(scalars: &[f64], seq: &JaggedCol) -> Result<(Vec<f64>, Vec<f64>)> {
    if scalars.len() != seq.n_entries() {
        return Err(RootError::ColumnMismatch(format!(
            "scalar column has {} entries but sequence column has {}",
            scalars.len(),
            seq.n_entries()
        )));
    }

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (i, &x) in scalars.iter().enumerate() {
        for &v in seq.entry(i) {
            if v > 0.0 {
                xs.push(x);
                ys.push(v);
            }
        }
    }

    Ok((xs, ys))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jagged(entries: &[&[f64]]) -> JaggedCol {
        let mut flat = Vec::new();
        let mut offsets = vec![0usize];
        for e in entries {
            flat.extend_from_slice(e);
            offsets.push(flat.len());
        }
        JaggedCol { flat, offsets }
    }

    #[test]
    fn keeps_only_positive_elements() {
        let col = jagged(&[&[5.0, -1.0, 5.0]]);
        let (xs, ys) = flatten_positive(&[10.0], &col).unwrap();
        assert_eq!(xs, vec![10.0, 10.0]);
        assert_eq!(ys, vec![5.0, 5.0]);
    }

    #[test]
    fn zero_is_dropped() {
        let col = jagged(&[&[0.0, 2.0]]);
        let (xs, ys) = flatten_positive(&[1.0], &col).unwrap();
        assert_eq!(xs, vec![1.0]);
        assert_eq!(ys, vec![2.0]);
    }

    #[test]
    fn nan_is_dropped() {
        let col = jagged(&[&[f64::NAN, 3.0]]);
        let (_, ys) = flatten_positive(&[1.0], &col).unwrap();
        assert_eq!(ys, vec![3.0]);
    }

    #[test]
    fn empty_entries_contribute_nothing() {
        let col = jagged(&[&[], &[4.0], &[]]);
        let (xs, ys) = flatten_positive(&[1.0, 2.0, 3.0], &col).unwrap();
        assert_eq!(xs, vec![2.0]);
        assert_eq!(ys, vec![4.0]);
    }

    #[test]
    fn order_is_event_then_element() {
        let col = jagged(&[&[1.0, 2.0], &[3.0]]);
        let (xs, ys) = flatten_positive(&[10.0, 20.0], &col).unwrap();
        assert_eq!(xs, vec![10.0, 10.0, 20.0]);
        assert_eq!(ys, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn length_mismatch_errors() {
        let col = jagged(&[&[1.0]]);
        let err = flatten_positive(&[1.0, 2.0], &col).unwrap_err();
        assert!(matches!(err, RootError::ColumnMismatch(_)));
    }
}

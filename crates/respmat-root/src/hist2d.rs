//! Uniform-binned 2D counting histogram and the response-matrix binning.

use crate::error::{Result, RootError};

/// Number of bins per axis of the response matrix.
pub const RESPONSE_BINS: usize = 1500;
/// Lower edge of both response-matrix axes (keV).
pub const RESPONSE_MIN: f64 = 0.0;
/// Upper edge of both response-matrix axes (keV).
pub const RESPONSE_MAX: f64 = 150.0;

/// A 2D histogram with uniform equal-width bins and integer counts.
///
/// Fill semantics follow `numpy.histogram2d`: samples outside
/// `[min, max]` on either axis are dropped silently, and a sample exactly
/// at the upper edge lands in the last bin.
#[derive(Debug, Clone)]
pub struct Hist2D {
    n_x: usize,
    n_y: usize,
    x_min: f64,
    x_max: f64,
    y_min: f64,
    y_max: f64,
    /// Counts indexed `ix * n_y + iy`.
    counts: Vec<u64>,
}

impl Hist2D {
    /// Create an empty histogram.
    ///
    /// Errors on zero bin counts or a non-increasing axis range.
    pub fn new(
        n_x: usize,
        x_min: f64,
        x_max: f64,
        n_y: usize,
        y_min: f64,
        y_max: f64,
    ) -> Result<Self> {
        if n_x == 0 || n_y == 0 {
            return Err(RootError::ColumnMismatch(
                "histogram must have at least one bin per axis".into(),
            ));
        }
        if !(x_min < x_max) || !(y_min < y_max) {
            return Err(RootError::ColumnMismatch(format!(
                "invalid histogram range: x=[{x_min}, {x_max}] y=[{y_min}, {y_max}]"
            )));
        }
        Ok(Self {
            n_x,
            n_y,
            x_min,
            x_max,
            y_min,
            y_max,
            counts: vec![0; n_x * n_y],
        })
    }

    /// The fixed response-matrix histogram: 1500×1500 over [0, 150) keV².
    pub fn response() -> Self {
        // The constants satisfy `new`'s checks.
        Self::new(
            RESPONSE_BINS,
            RESPONSE_MIN,
            RESPONSE_MAX,
            RESPONSE_BINS,
            RESPONSE_MIN,
            RESPONSE_MAX,
        )
        .unwrap_or_else(|_| unreachable!("fixed response binning is valid"))
    }

    /// Fill one sample. Out-of-range samples are dropped.
    pub fn fill(&mut self, x: f64, y: f64) {
        let (Some(ix), Some(iy)) = (
            bin_index(x, self.x_min, self.x_max, self.n_x),
            bin_index(y, self.y_min, self.y_max, self.n_y),
        ) else {
            return;
        };
        self.counts[ix * self.n_y + iy] += 1;
    }

    /// Fill from paired coordinate slices.
    ///
    /// Slices must have equal length (as produced by
    /// [`flatten_positive`](crate::filler::flatten_positive)).
    pub fn fill_pairs(&mut self, xs: &[f64], ys: &[f64]) -> Result<()> {
        if xs.len() != ys.len() {
            return Err(RootError::ColumnMismatch(format!(
                "x column has {} values but y column has {}",
                xs.len(),
                ys.len()
            )));
        }
        for (&x, &y) in xs.iter().zip(ys) {
            self.fill(x, y);
        }
        Ok(())
    }

    /// Number of x bins.
    pub fn n_x(&self) -> usize {
        self.n_x
    }

    /// Number of y bins.
    pub fn n_y(&self) -> usize {
        self.n_y
    }

    /// Count in bin `(ix, iy)`.
    pub fn count(&self, ix: usize, iy: usize) -> u64 {
        self.counts[ix * self.n_y + iy]
    }

    /// Flat counts slice, indexed `ix * n_y + iy`.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Sum of all bin counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Largest single-bin count.
    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }

    /// Bin centers along x.
    pub fn x_centers(&self) -> Vec<f64> {
        centers(self.x_min, self.x_max, self.n_x)
    }

    /// Bin centers along y.
    pub fn y_centers(&self) -> Vec<f64> {
        centers(self.y_min, self.y_max, self.n_y)
    }

    /// Bin edges along x (`n_x + 1` values).
    pub fn x_edges(&self) -> Vec<f64> {
        edges(self.x_min, self.x_max, self.n_x)
    }

    /// Bin edges along y (`n_y + 1` values).
    pub fn y_edges(&self) -> Vec<f64> {
        edges(self.y_min, self.y_max, self.n_y)
    }

    /// X axis range.
    pub fn x_range(&self) -> (f64, f64) {
        (self.x_min, self.x_max)
    }

    /// Y axis range.
    pub fn y_range(&self) -> (f64, f64) {
        (self.y_min, self.y_max)
    }
}

/// Bin index for a uniform axis, or `None` when the value falls outside.
///
/// A value exactly at `max` belongs to the last bin.
fn bin_index(v: f64, min: f64, max: f64, n: usize) -> Option<usize> {
    if !(v >= min) || !(v <= max) {
        return None;
    }
    if v == max {
        return Some(n - 1);
    }
    let idx = ((v - min) / (max - min) * n as f64) as usize;
    // Float rounding near the upper edge can overshoot by one.
    Some(idx.min(n - 1))
}

fn centers(min: f64, max: f64, n: usize) -> Vec<f64> {
    let width = (max - min) / n as f64;
    (0..n).map(|i| min + (i as f64 + 0.5) * width).collect()
}

fn edges(min: f64, max: f64, n: usize) -> Vec<f64> {
    let width = (max - min) / n as f64;
    (0..=n).map(|i| min + i as f64 * width).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_binning() {
        let h = Hist2D::response();
        assert_eq!(h.n_x(), 1500);
        assert_eq!(h.n_y(), 1500);
        let cx = h.x_centers();
        assert_eq!(cx.len(), 1500);
        assert!((cx[0] - 0.05).abs() < 1e-12);
        assert!((cx[1499] - 149.95).abs() < 1e-12);
    }

    #[test]
    fn edges_bracket_centers() {
        let h = Hist2D::new(4, 0.0, 2.0, 4, 0.0, 2.0).unwrap();
        assert_eq!(h.x_edges(), vec![0.0, 0.5, 1.0, 1.5, 2.0]);
        let c = h.y_centers();
        let e = h.y_edges();
        for i in 0..4 {
            assert!((c[i] - (e[i] + e[i + 1]) / 2.0).abs() < 1e-12);
        }
    }

    #[test]
    fn fill_counts_land_in_expected_cell() {
        let mut h = Hist2D::response();
        // bin width 0.1: x = 10.0 → ix 100, y = 5.0 → iy 50
        h.fill(10.0, 5.0);
        h.fill(10.0, 5.0);
        assert_eq!(h.count(100, 50), 2);
        assert_eq!(h.total(), 2);
    }

    #[test]
    fn out_of_range_is_dropped() {
        let mut h = Hist2D::new(10, 0.0, 1.0, 10, 0.0, 1.0).unwrap();
        h.fill(-0.1, 0.5);
        h.fill(0.5, 1.5);
        h.fill(f64::NAN, 0.5);
        assert_eq!(h.total(), 0);
    }

    #[test]
    fn upper_edge_goes_to_last_bin() {
        let mut h = Hist2D::new(10, 0.0, 1.0, 10, 0.0, 1.0).unwrap();
        h.fill(1.0, 1.0);
        assert_eq!(h.count(9, 9), 1);
    }

    #[test]
    fn interior_edges_go_right() {
        // numpy.histogram2d convention: inner edges belong to the upper bin.
        assert_eq!(bin_index(0.2, 0.0, 1.0, 10), Some(2));
        assert_eq!(bin_index(0.0, 0.0, 1.0, 10), Some(0));
    }

    #[test]
    fn fill_pairs_requires_equal_lengths() {
        let mut h = Hist2D::new(2, 0.0, 1.0, 2, 0.0, 1.0).unwrap();
        assert!(h.fill_pairs(&[0.5], &[0.5, 0.6]).is_err());
        h.fill_pairs(&[0.1, 0.9], &[0.1, 0.9]).unwrap();
        assert_eq!(h.count(0, 0), 1);
        assert_eq!(h.count(1, 1), 1);
    }

    #[test]
    fn invalid_binning_is_rejected() {
        assert!(Hist2D::new(0, 0.0, 1.0, 2, 0.0, 1.0).is_err());
        assert!(Hist2D::new(2, 1.0, 1.0, 2, 0.0, 1.0).is_err());
        assert!(Hist2D::new(2, 0.0, 1.0, 2, 2.0, 1.0).is_err());
    }
}

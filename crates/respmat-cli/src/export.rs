//! CSV export of the response matrix.

use std::path::Path;

use anyhow::Result;
use respmat_root::Hist2D;

/// Write the bin-count table.
///
/// The table is transposed relative to fill order: one row per energy
/// deposition bin, one column per photon energy bin, both labelled with
/// 2-decimal bin centers. The corner cell names the row axis. Headers are
/// written even when every count is zero.
pub fn write_table(path: &Path, hist: &Hist2D) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let x_centers = hist.x_centers();
    let y_centers = hist.y_centers();

    let mut header = Vec::with_capacity(x_centers.len() + 1);
    header.push("Energy_Bin_Center".to_string());
    header.extend(x_centers.iter().map(|c| format!("{c:.2}")));
    wtr.write_record(&header)?;

    let mut row: Vec<String> = Vec::with_capacity(x_centers.len() + 1);
    for (iy, yc) in y_centers.iter().enumerate() {
        row.clear();
        row.push(format!("{yc:.2}"));
        for ix in 0..hist.n_x() {
            row.push(hist.count(ix, iy).to_string());
        }
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

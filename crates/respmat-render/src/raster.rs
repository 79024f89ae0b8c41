//! Per-bin rasterization of heatmap grids.
//!
//! A 1500×1500 grid is 2.25M cells; emitting one SVG rect per cell makes
//! renderers crawl. Instead the grid is rasterized one pixel per bin into
//! a small PNG that the SVG embeds and stretches over the plot area.

use crate::color::{self, Color};
use crate::plots::heatmap::HeatmapGrid;
use crate::{RenderError, Result};

/// Rasterize a grid to PNG bytes, one pixel per bin.
///
/// Pixel row 0 is the top of the image, so the y axis is flipped to put
/// bin `iy = 0` at the bottom. Zero-count bins are masked to white.
pub fn rasterize(grid: &HeatmapGrid, cmap: impl Fn(f64) -> Color) -> Result<Vec<u8>> {
    let w = grid.n_x as u32;
    let h = grid.n_y as u32;
    let mut pixmap = tiny_skia::Pixmap::new(w, h)
        .ok_or_else(|| RenderError::Png("failed to create pixmap".into()))?;

    let max = grid.max_count().max(1) as f64;
    let pixels = pixmap.pixels_mut();
    for iy in 0..grid.n_y {
        let row = grid.n_y - 1 - iy;
        for ix in 0..grid.n_x {
            let count = grid.count(ix, iy);
            let c = if count == 0 { color::MASKED } else { cmap(count as f64 / max) };
            let px = tiny_skia::PremultipliedColorU8::from_rgba(c.r, c.g, c.b, 255)
                .ok_or_else(|| RenderError::Png("invalid pixel color".into()))?;
            pixels[row * grid.n_x + ix] = px;
        }
    }

    pixmap.encode_png().map_err(|e| RenderError::Png(e.to_string()))
}

pub mod canvas;
pub mod color;
pub mod config;
pub mod layout;
pub mod output;
pub mod plots;
pub mod primitives;
pub mod raster;
pub mod text;

use config::VizConfig;
use plots::heatmap::HeatmapGrid;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("config error: {0}")]
    Config(String),
    #[error("layout error: {0}")]
    Layout(String),
    #[error("PNG encoding error: {0}")]
    Png(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RenderError>;

/// Render a heatmap grid to an SVG string.
pub fn render_svg(grid: &HeatmapGrid, config: &VizConfig) -> Result<String> {
    plots::heatmap::render(grid, config)
}

/// Render a heatmap grid to PNG bytes at `config.output.dpi`.
pub fn render_png(grid: &HeatmapGrid, config: &VizConfig) -> Result<Vec<u8>> {
    let svg = render_svg(grid, config)?;
    output::png::svg_to_png(&svg, config.output.dpi)
}

/// Render a heatmap grid to a file (format inferred from extension).
pub fn render_to_file(
    grid: &HeatmapGrid,
    path: &std::path::Path,
    config: &VizConfig,
) -> Result<()> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("png");
    let bytes = match ext {
        "svg" => render_svg(grid, config)?.into_bytes(),
        _ => render_png(grid, config)?,
    };
    std::fs::write(path, bytes)?;
    Ok(())
}

use crate::canvas::Canvas;
use crate::color::{self, Color};
use crate::config::VizConfig;
use crate::layout::axes::Axis;
use crate::layout::margins::PlotArea;
use crate::plots::axes_draw::draw_axes;
use crate::primitives::*;
use crate::raster;
use crate::{RenderError, Result};

/// A 2D counts grid with axis metadata, ready for display.
///
/// Counts are indexed `ix * n_y + iy` with bin `(0, 0)` at the lower-left
/// corner of the plot.
#[derive(Debug, Clone)]
pub struct HeatmapGrid {
    pub counts: Vec<u64>,
    pub n_x: usize,
    pub n_y: usize,
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub x_label: String,
    pub y_label: String,
    pub title: String,
}

impl HeatmapGrid {
    pub fn count(&self, ix: usize, iy: usize) -> u64 {
        self.counts[ix * self.n_y + iy]
    }

    pub fn max_count(&self) -> u64 {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

fn colormap(name: &str) -> fn(f64) -> Color {
    match name {
        "viridis" => color::viridis,
        _ => color::viridis,
    }
}

/// Render a counts heatmap with colorbar.
pub fn render(grid: &HeatmapGrid, config: &VizConfig) -> Result<String> {
    if grid.n_x == 0 || grid.n_y == 0 || grid.counts.len() != grid.n_x * grid.n_y {
        return Err(RenderError::Layout(format!(
            "grid dimensions {}x{} do not match {} cells",
            grid.n_x,
            grid.n_y,
            grid.counts.len()
        )));
    }

    let mut canvas = Canvas::new(config.figure.width, config.figure.height);

    let x_axis = Axis::ticked(grid.x_min, grid.x_max, 8).with_label(&grid.x_label);
    let y_axis = Axis::ticked(grid.y_min, grid.y_max, 8).with_label(&grid.y_label);

    let colorbar_w = config.heatmap.colorbar_width;
    let colorbar_gap = 8.0;
    let colorbar_labels = 38.0;
    let right_reserve = colorbar_gap + colorbar_w + colorbar_labels;

    let has_title = !grid.title.is_empty();
    let area =
        PlotArea::auto(&canvas, Some(&y_axis), Some(&x_axis), has_title, right_reserve, config);

    // Raster layer first so the frame is drawn over its edges.
    let cmap = colormap(&config.heatmap.cmap);
    let png = raster::rasterize(grid, cmap)?;
    canvas.image_png(area.left, area.top, area.width, area.height, &png);

    draw_axes(&mut canvas, &area, &x_axis, &y_axis, config);

    if has_title {
        let title_style = TextStyle {
            size: config.font.title_size,
            anchor: TextAnchor::Middle,
            ..Default::default()
        };
        canvas.text(area.left + area.width / 2.0, area.top - 8.0, &grid.title, &title_style);
    }

    draw_colorbar(&mut canvas, &area, grid.max_count(), cmap, config);

    Ok(canvas.finish_svg())
}

/// Vertical colorbar right of the plot area: max at the top, zero at the
/// bottom, with the configured quantity label rotated alongside.
fn draw_colorbar(
    canvas: &mut Canvas,
    area: &PlotArea,
    max_count: u64,
    cmap: fn(f64) -> Color,
    config: &VizConfig,
) {
    let cb_x = area.right() + 8.0;
    let cb_w = config.heatmap.colorbar_width;
    let steps = 50;
    let step_h = area.height / steps as f64;

    for i in 0..steps {
        let frac = 1.0 - i as f64 / (steps - 1) as f64; // top → bottom
        let c = cmap(frac);
        let y = area.top + i as f64 * step_h;
        canvas.rect(cb_x, y, cb_w, step_h + 0.5, &Style::filled(c));
    }

    canvas.rect(
        cb_x,
        area.top,
        cb_w,
        area.height,
        &Style::stroked(Color::rgb(0, 0, 0), 0.6),
    );

    let tick_style = TextStyle {
        size: config.font.tick_size,
        anchor: TextAnchor::Start,
        baseline: TextBaseline::Central,
        ..Default::default()
    };
    canvas.text(cb_x + cb_w + 3.0, area.top, &max_count.to_string(), &tick_style);
    canvas.text(cb_x + cb_w + 3.0, area.bottom(), "0", &tick_style);

    if !config.heatmap.colorbar_label.is_empty() {
        let label_style = TextStyle {
            size: config.font.label_size,
            anchor: TextAnchor::Middle,
            ..Default::default()
        };
        canvas.text_rotated(
            cb_x + cb_w + 28.0,
            area.top + area.height / 2.0,
            &config.heatmap.colorbar_label,
            &label_style,
            90.0,
        );
    }
}

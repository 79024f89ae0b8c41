pub mod heatmap;

mod axes_draw;

//! respmat CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use respmat_render::plots::heatmap::HeatmapGrid;
use respmat_root::{Hist2D, RootFile, flatten_positive};

mod export;

#[derive(Parser)]
#[command(name = "respmat")]
#[command(about = "respmat - Detector response matrix builder")]
#[command(version)]
struct Cli {
    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "warn")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the response matrix: read the events tree, fill the 2D
    /// histogram, write the heatmap image and the bin-count table
    Build {
        /// Input ROOT file
        #[arg(short, long, default_value = "response.root")]
        input: PathBuf,

        /// Name of the events TTree
        #[arg(long, default_value = "events")]
        tree: String,

        /// Scalar branch with the primary photon energy (keV)
        #[arg(long, default_value = "E0")]
        energy_branch: String,

        /// Variable-length branch with per-event energy depositions (keV)
        #[arg(long, default_value = "edep")]
        edep_branch: String,

        /// Output heatmap image path (PNG, or SVG by extension)
        #[arg(long, default_value = "response_matrix.png")]
        plot_out: PathBuf,

        /// Output bin-count table path (CSV)
        #[arg(long, default_value = "response_matrix.csv")]
        table_out: PathBuf,

        /// Optional YAML file with style overrides (figure size, DPI, ...)
        #[arg(long)]
        style: Option<PathBuf>,
    },

    /// Print version information
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt().with_max_level(cli.log_level).with_target(false).init();

    match cli.command {
        Commands::Build { input, tree, energy_branch, edep_branch, plot_out, table_out, style } => {
            cmd_build(
                &input,
                &tree,
                &energy_branch,
                &edep_branch,
                &plot_out,
                &table_out,
                style.as_ref(),
            )
        }
        Commands::Version => {
            println!("respmat {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_build(
    input: &PathBuf,
    tree: &str,
    energy_branch: &str,
    edep_branch: &str,
    plot_out: &PathBuf,
    table_out: &PathBuf,
    style: Option<&PathBuf>,
) -> Result<()> {
    tracing::info!(path = %input.display(), "opening ROOT file");
    let file = RootFile::open(input)
        .with_context(|| format!("failed to open {}", input.display()))?;

    let events = file.get_tree(tree)?;
    tracing::info!(tree, entries = events.entries, "tree loaded");

    let energies = file.branch_data(&events, energy_branch)?;
    let deps = file.branch_data_jagged(&events, edep_branch)?;

    let (xs, ys) = flatten_positive(&energies, &deps)?;
    tracing::info!(pairs = xs.len(), "positive depositions paired");

    let mut hist = Hist2D::response();
    hist.fill_pairs(&xs, &ys)?;
    tracing::info!(filled = hist.total(), dropped = xs.len() as u64 - hist.total(), "histogram filled");

    let style_yaml = match style {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read style file {}", path.display()))?,
        ),
        None => None,
    };
    let config = respmat_render::config::resolve_config(style_yaml.as_deref())?;

    let grid = heatmap_grid(&hist);
    respmat_render::render_to_file(&grid, plot_out, &config)?;
    tracing::info!(path = %plot_out.display(), dpi = config.output.dpi, "heatmap written");

    export::write_table(table_out, &hist)
        .with_context(|| format!("failed to write table {}", table_out.display()))?;
    tracing::info!(path = %table_out.display(), "table written");

    Ok(())
}

fn heatmap_grid(hist: &Hist2D) -> HeatmapGrid {
    let (x_min, x_max) = hist.x_range();
    let (y_min, y_max) = hist.y_range();
    HeatmapGrid {
        counts: hist.counts().to_vec(),
        n_x: hist.n_x(),
        n_y: hist.n_y(),
        x_min,
        x_max,
        y_min,
        y_max,
        x_label: "Photon energy (keV)".into(),
        y_label: "Energy deposition (keV)".into(),
        title: "2D Histogram: Energy deposition (bin center) vs Photon energy (white = zero)"
            .into(),
    }
}

//! `restyle` — offline snapshot inspector.
//!
//! Runs the engine's extraction and remapping passes against a captured
//! document snapshot (the JSON form of the in-memory surface), without a
//! rendering host. Useful for debugging what the live preview would do to a
//! page, straight from a terminal.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use restyle_core::style::{self, StyleSources};
use restyle_core::surface::MemorySurface;
use restyle_core::{extract, remap};
use restyle_protocol::{ColorMapping, Rgb, StyleReport};

#[derive(Parser)]
#[command(name = "restyle", about = "Inspect and restyle captured page snapshots")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract the style report from a snapshot.
    Extract {
        /// Snapshot JSON file.
        snapshot: PathBuf,
        /// Emit the full report as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
    /// Remap a snapshot's palette and print the resulting mapping and css.
    Remap {
        /// Snapshot JSON file.
        snapshot: PathBuf,
        /// Replacement palette as comma-separated hex colors. Falls back to
        /// the built-in palette when omitted.
        #[arg(long, value_delimiter = ',')]
        palette: Vec<String>,
        /// Source colors to remap (defaults to the extracted palette).
        #[arg(long, value_delimiter = ',')]
        selected: Vec<String>,
    },
    /// Compose the injected style block from a style-sources JSON file.
    Compose {
        /// `StyleSources` JSON file.
        sources: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match Cli::parse().command {
        Command::Extract { snapshot, json } => run_extract(&snapshot, json),
        Command::Remap {
            snapshot,
            palette,
            selected,
        } => run_remap(&snapshot, &palette, &selected),
        Command::Compose { sources } => run_compose(&sources),
    }
}

fn load_surface(path: &Path) -> Result<MemorySurface> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading snapshot {}", path.display()))?;
    MemorySurface::from_json(&json).with_context(|| format!("parsing snapshot {}", path.display()))
}

fn parse_colors(values: &[String]) -> Result<Vec<Rgb>> {
    values
        .iter()
        .map(|v| {
            v.parse::<Rgb>()
                .with_context(|| format!("invalid color {v:?}"))
        })
        .collect()
}

fn run_extract(path: &Path, json: bool) -> Result<()> {
    let surface = load_surface(path)?;
    let report = extract::extract(&surface);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn run_remap(path: &Path, palette: &[String], selected: &[String]) -> Result<()> {
    let mut surface = load_surface(path)?;
    let report = extract::extract(&surface);

    let selected = if selected.is_empty() {
        report.palette()
    } else {
        parse_colors(selected)?
    };
    if selected.is_empty() {
        bail!("snapshot has no observable colors and none were selected");
    }
    let targets = if palette.is_empty() {
        tracing::warn!("no palette given, using the built-in fallback");
        remap::BUILTIN_PALETTE.to_vec()
    } else {
        parse_colors(palette)?
    };

    let mut mapping = ColorMapping::new();
    mapping.merge(remap::assign(&selected, &targets));
    let outcome = remap::apply(&mut surface, &mapping);

    println!("mapping:");
    for (source, target) in mapping.iter() {
        println!("  {source} -> {target}");
    }
    println!(
        "rewrote {} stylesheet rules, {} elements, {} vector nodes",
        outcome.rules_rewritten, outcome.nodes_restyled, outcome.svg_nodes_restyled
    );
    if !outcome.css.is_empty() {
        println!("color-remap layer:\n{}", outcome.css);
    }
    Ok(())
}

fn run_compose(path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading sources {}", path.display()))?;
    let sources: StyleSources =
        serde_json::from_str(&json).with_context(|| format!("parsing sources {}", path.display()))?;
    let layers = style::compose_layers(&sources, "");
    println!("{}", style::pipeline::combined_css(&layers));
    Ok(())
}

fn print_summary(report: &StyleReport) {
    println!("colors:");
    for usage in &report.colors {
        println!(
            "  {}  ×{}  ({})",
            usage.color,
            usage.count,
            usage.properties.join(", ")
        );
    }
    println!("fonts:");
    for font in &report.fonts {
        println!(
            "  {}  ×{}  weights [{}]  sizes [{}]",
            font.family,
            font.count,
            font.weights.join(", "),
            font.sizes.join(", ")
        );
    }
    if !report.scale.is_empty() {
        println!("type scale:");
        for step in &report.scale {
            println!("  {}  ×{}  <{}>", step.size, step.count, step.tags.join("> <"));
        }
    }
    if !report.layouts.is_empty() {
        println!("layout:");
        for layout in &report.layouts {
            let detail = if layout.details.is_empty() {
                String::new()
            } else {
                format!("  ({})", layout.details.join(", "))
            };
            println!("  {}  ×{}{}", layout.display, layout.count, detail);
        }
    }
    if !report.image_urls.is_empty() {
        println!("images: {}", report.image_urls.join(", "));
    }
    if !report.link_urls.is_empty() {
        println!("links: {}", report.link_urls.join(", "));
    }
}

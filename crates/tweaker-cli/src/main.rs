//! tweaker: find a good print orientation for STL and 3MF files.
//!
//! # Logging
//!
//! `-v` enables info output from the search, `-vv` debug output with
//! per-candidate scores. `RUST_LOG` overrides both.
//!
//! # Example
//!
//! ```bash
//! # Rotate and write part_tweaked.stl
//! tweaker -i part.stl
//!
//! # Both heuristics, print the result only
//! tweaker -i part.3mf -b -r
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use tweaker::{tweak, TweakSettings};
use tweaker_io::{default_output_path, load_mesh, write_output, MeshFormat, WriteOptions};

mod report;

use report::Report;

/// Orientation tool for better 3D prints.
#[derive(Parser)]
#[command(name = "tweaker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input mesh (.stl or .3mf)
    #[arg(short, long)]
    input: PathBuf,

    /// Output file [default: <input>_tweaked.<ext>]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Critical overhang angle in degrees [default: 45]
    #[arg(short, long)]
    angle: Option<f64>,

    /// Run random sampling next to area cumulation
    #[arg(short, long)]
    bi: bool,

    /// Print the result and exit without writing a file
    #[arg(short, long)]
    result: bool,

    /// Increase output verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Write STL output in the binary encoding
    #[arg(long)]
    binary: bool,

    /// Unprintability above which support structures are suggested
    #[arg(long, default_value = "8.0")]
    support_threshold: f64,

    /// Seed for random sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Run the heuristics one after the other
    #[arg(long)]
    sequential: bool,

    /// Refuse meshes with more triangles than this
    #[arg(long)]
    max_triangles: Option<usize>,

    /// TOML file with search settings; flags take precedence
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Search settings from the config file, then the flags.
    fn settings(&self) -> Result<TweakSettings> {
        // Sampling is opt-in from the command line, with or without a file
        let base = TweakSettings {
            use_both_heuristics: false,
            ..Default::default()
        };
        let mut settings = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                base.with_toml_str(&text)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => base,
        };
        if let Some(angle) = self.angle {
            settings.critical_angle = angle;
        }
        if self.bi {
            settings.use_both_heuristics = true;
        }
        if self.seed.is_some() {
            settings.seed = self.seed;
        }
        if self.sequential {
            settings.parallel = false;
        }
        settings.validate()?;
        Ok(settings)
    }
}

fn init_tracing(verbose: u8) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "tweaker=info,tweaker_io=info",
            2 => "tweaker=debug,tweaker_io=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let settings = cli.settings()?;
    let loaded = load_mesh(&cli.input)
        .with_context(|| format!("failed to load {}", cli.input.display()))?;

    let triangles = loaded.triangle_count();
    if let Some(max) = cli.max_triangles {
        if triangles > max {
            bail!("{} has {triangles} triangles, more than the limit of {max}", cli.input.display());
        }
    }
    info!(input = %cli.input.display(), triangles, "calculating orientation");

    let started = Instant::now();
    let orientation = tweak(&loaded.points, &settings)
        .with_context(|| format!("orientation search failed for {}", cli.input.display()))?;

    let report = Report::new(
        cli.input.display().to_string(),
        triangles,
        &orientation,
        cli.support_threshold,
        started.elapsed(),
    );
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if cli.result || cli.verbose > 0 {
        println!("{}", report.to_text());
    }
    if cli.result {
        return Ok(());
    }

    if cli.binary && loaded.format == MeshFormat::ThreeMf {
        warn!("--binary only applies to STL output, writing 3MF");
    }
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&cli.input, loaded.format));
    let options = WriteOptions {
        binary: cli.binary,
        support_threshold: cli.support_threshold,
    };
    let bytes = write_output(&loaded, &orientation, &options)
        .with_context(|| format!("failed to encode {}", output.display()))?;
    std::fs::write(&output, bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    if !cli.json {
        println!("Wrote {}", output.display());
    }
    Ok(())
}

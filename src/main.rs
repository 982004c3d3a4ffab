use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod config;
mod derive;
mod error;
mod export;
mod ingest;
mod model;
mod render;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "load-report")]
#[command(about = "Per-second load aggregation and comparison charts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(clap::Args)]
struct SourceArgs {
    /// Directory holding the per-server sample files.
    #[arg(long)]
    dir: PathBuf,

    /// Regex on file names; overrides `ingest.pattern` from the config.
    #[arg(long)]
    pattern: Option<String>,

    /// TOML file with capacity, power and display constants.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate sample files and write one count per second.
    Export {
        #[command(flatten)]
        sources: SourceArgs,

        #[arg(short = 'o', long)]
        out: PathBuf,
    },

    /// Aggregate, derive load/power series and write an HTML chart report.
    Report {
        #[command(flatten)]
        sources: SourceArgs,

        #[arg(short = 'o', long)]
        out: PathBuf,

        /// Also export the aggregated counts here.
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Also dump the chart data as JSON here.
        #[arg(long)]
        json: Option<PathBuf>,

        /// One live-server count per line.
        #[arg(long)]
        live_servers: Option<PathBuf>,

        /// One server-transition count per line.
        #[arg(long)]
        transitions: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Export { sources, out } => {
            let cfg = load_config(&sources)?;
            let (_, series) = aggregate_dir(&sources.dir, &cfg)?;

            export::write_counts_csv(&series, &out)
                .with_context(|| format!("export counts to {}", out.display()))?;
            println!("Wrote {}", out.display());
        }

        Commands::Report {
            sources,
            out,
            csv,
            json,
            live_servers,
            transitions,
        } => {
            // 1) Constants.
            let cfg = load_config(&sources)?;

            // 2) Ingest + aggregate every source before deriving anything.
            let (source_count, series) = aggregate_dir(&sources.dir, &cfg)?;

            if let Some(csv) = &csv {
                export::write_counts_csv(&series, csv)
                    .with_context(|| format!("export counts to {}", csv.display()))?;
                println!("Wrote {}", csv.display());
            }

            // 3) Auxiliary positional series.
            let aux = derive::AuxiliaryInputs {
                live_servers: read_column(live_servers.as_deref())?,
                transitions: read_column(transitions.as_deref())?,
            };

            // 4) Derive.
            let derived = derive::DerivedSeries::compute(
                &series,
                &aux,
                cfg.capacity,
                &cfg.power,
                &cfg.display,
            )
            .context("derive load and power series")?;

            // 5) Render.
            let data = model::build_report_data(&derived, source_count, cfg.capacity.value());
            let html = render::render_html_report(&data)?;
            std::fs::write(&out, html).with_context(|| format!("write {}", out.display()))?;
            println!("Wrote {}", out.display());

            if let Some(json) = &json {
                let text = render::render_json_report(&data)?;
                std::fs::write(json, text).with_context(|| format!("write {}", json.display()))?;
                println!("Wrote {}", json.display());
            }
        }
    }

    Ok(())
}

fn load_config(sources: &SourceArgs) -> Result<config::ValidatedConfig> {
    let mut raw = match &sources.config {
        Some(path) => config::RawConfig::from_file(path)
            .with_context(|| format!("read config {}", path.display()))?,
        None => config::RawConfig::default(),
    };
    if let Some(pattern) = &sources.pattern {
        raw.ingest.pattern = pattern.clone();
    }

    let cfg = raw.validate_and_build().context("validate config")?;
    info!(capacity = cfg.capacity.value(), pattern = %cfg.pattern, "configuration loaded");
    Ok(cfg)
}

fn aggregate_dir(
    dir: &Path,
    cfg: &config::ValidatedConfig,
) -> Result<(usize, aggregate::AggregatedSeries)> {
    let paths = ingest::discover_sources(dir, &cfg.pattern)
        .with_context(|| format!("scan {}", dir.display()))?;
    let series = aggregate::aggregate_sources(&paths, cfg.skip_header)
        .with_context(|| format!("aggregate sources in {}", dir.display()))?;
    Ok((paths.len(), series))
}

fn read_column(path: Option<&Path>) -> Result<Option<Vec<u64>>> {
    path.map(|p| {
        ingest::parse_integer_column(p).with_context(|| format!("read {}", p.display()))
    })
    .transpose()
}

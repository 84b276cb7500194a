//! Batch place normalizer.
//!
//! Reads one raw place per line, resolves every line through a single
//! registry and writes the canonical form with its fuzzy keys.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use flate2::read::GzDecoder;
use hashbrown::HashSet;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use locus::{Level, PlaceId, Registry, Settings};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "locus")]
#[command(about = "Normalize genealogy place names")]
struct Args {
    /// File with one place per line (`-` for stdin, `.gz` accepted)
    #[arg(short, long)]
    input: PathBuf,

    /// Settings file (TOML)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Rule file or directory, overrides the settings file
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    format: Format,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    raw: &'a str,
    canonical: &'a str,
    level: Level,
    fuzzy: &'a str,
    fuzzy_no_subregion: &'a str,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => Settings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };
    if args.rules.is_some() {
        settings.rules = args.rules.clone();
    }

    let lines = read_lines(&args.input)?;
    info!("Read {} lines from {}", lines.len(), args.input.display());

    let mut registry = Registry::new(settings);

    let pb = ProgressBar::new(lines.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")?
            .progress_chars("#>-"),
    );
    let resolved: Vec<(&str, PlaceId)> = lines
        .iter()
        .map(|line| {
            pb.inc(1);
            (line.as_str(), registry.resolve(line))
        })
        .collect();
    pb.finish_and_clear();

    // Registry is read-only from here on
    let distinct: HashSet<PlaceId> = resolved.iter().map(|(_, id)| *id).collect();
    let places: Vec<_> = distinct
        .into_iter()
        .filter_map(|id| registry.place(id).map(|place| (id, place)))
        .collect();
    let keys: HashMap<PlaceId, (String, String)> = places
        .par_iter()
        .map(|(id, place)| (*id, (place.fuzzy_key(), place.fuzzy_key_no_sub_region())))
        .collect();

    let rows: Vec<Row> = resolved
        .iter()
        .filter_map(|&(raw, id)| {
            let place = registry.place(id)?;
            let (fuzzy, fuzzy_no_subregion) = keys
                .get(&id)
                .map(|(a, b)| (a.as_str(), b.as_str()))
                .unwrap_or(("", ""));
            Some(Row {
                raw,
                canonical: place.canonical(),
                level: place.level(),
                fuzzy,
                fuzzy_no_subregion,
            })
        })
        .collect();

    let stdout = io::stdout();
    match args.format {
        Format::Csv => {
            let mut writer = csv::Writer::from_writer(stdout.lock());
            for row in &rows {
                writer.serialize(row)?;
            }
            writer.flush()?;
        }
        Format::Json => {
            let mut out = stdout.lock();
            for row in &rows {
                serde_json::to_writer(&mut out, row)?;
                out.write_all(b"\n")?;
            }
            out.flush()?;
        }
    }

    let stats = registry.stats();
    info!(
        "{} locations, {} geocoded, {} from source ({} with coordinates)",
        stats.locations, stats.geocoded, stats.sourced, stats.sourced_with_coordinates
    );
    Ok(())
}

fn read_lines(path: &Path) -> Result<Vec<String>> {
    let reader: Box<dyn Read> = if path.as_os_str() == "-" {
        Box::new(io::stdin())
    } else {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input file {}", path.display()))?;
        if path.extension().map_or(false, |e| e == "gz") {
            Box::new(GzDecoder::new(file))
        } else {
            Box::new(file)
        }
    };

    let mut lines = Vec::new();
    for line in BufReader::new(reader).lines() {
        let line = line.context("Failed to read input")?;
        lines.push(line);
    }
    Ok(lines)
}

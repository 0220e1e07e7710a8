use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{info, info_span, warn};
use tracing_subscriber::EnvFilter;

use batchpoa::aligner::print_alignment;
use batchpoa::batch::process_windows;
use batchpoa::config::WindowConfig;
use batchpoa::errors::PoaError;
use batchpoa::io::{graph_to_dot, read_fasta_file, save_graph};
use batchpoa::window::Window;

mod cli;

use cli::{AlignArgs, BatchArgs, CliArgs, CliSubcommand, OutputType, WindowArgs};

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();
}

/// Window configuration from the config file, if any, with command line overrides applied
fn window_config(args: &WindowArgs) -> Result<WindowConfig> {
    let mut config = match &args.config {
        Some(path) => WindowConfig::from_json_file(path)
            .with_context(|| format!("Could not load configuration from {}", path.display()))?,
        None => WindowConfig::default(),
    };

    if let Some(m) = args.match_score {
        config.scoring.match_score = m as i32;
    }

    if let Some(n) = args.cost_mismatch {
        config.scoring.mismatch_score = -(n as i32);
    }

    if let Some(g) = args.cost_gap {
        config.scoring.gap_score = -(g as i32);
    }

    config.validate().context("Invalid window configuration")?;

    Ok(config)
}

fn align_subcommand(args: &AlignArgs) -> Result<()> {
    let config = window_config(&args.window)?;
    let records = read_fasta_file(&args.sequences)
        .with_context(|| format!("Could not read sequences from {}", args.sequences.display()))?;

    let mut window = Window::new(config)?;
    for (i, record) in records.iter().enumerate() {
        let span = info_span!("add_read", seq_id = i);
        let _enter = span.enter();

        match window.add_read(&record.sequence) {
            Ok(result) => {
                info!("Added {}. Alignment score: {}", record.name, result.score);

                if args.show_alignments {
                    info!("\n{}", print_alignment(window.graph(), &record.sequence, result.forward()));
                }
            },
            Err(PoaError::WindowContaminated) => {
                warn!("Window is contaminated, skipping the remaining {} sequences.", records.len() - i);
                break;
            },
            Err(e) => warn!("Could not add {}: {e}", record.name),
        }
    }

    info!(
        "Window done: {} of {} sequences, {} nodes, {} edges.",
        window.num_reads(), records.len(), window.graph().node_count(), window.graph().edge_count()
    );

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(File::create(path).map(BufWriter::new)
            .with_context(|| format!("Could not create {}", path.display()))?),
        None => Box::new(io::stdout().lock()),
    };

    match args.output_type {
        OutputType::Binary => {
            if args.output.is_none() && io::stdout().is_terminal() {
                eprintln!("WARNING: not writing binary graph data to terminal standard output!");
                return Ok(());
            }

            save_graph(window.graph(), &mut writer)?;
        },
        OutputType::Dot => {
            let mut dot = String::new();
            graph_to_dot(&mut dot, window.graph())?;
            writer.write_all(dot.as_bytes())?;
        },
    }

    writer.flush()?;

    Ok(())
}

#[derive(Serialize)]
struct WindowSummary<'a> {
    file: &'a PathBuf,
    sequences: usize,
    reads: usize,
    nodes: usize,
    edges: usize,
    failed_reads: usize,
    contaminated: bool,
}

fn batch_subcommand(args: &BatchArgs) -> Result<()> {
    let config = window_config(&args.window)?;

    let mut windows = Vec::with_capacity(args.windows.len());
    for path in &args.windows {
        let records = read_fasta_file(path)
            .with_context(|| format!("Could not read sequences from {}", path.display()))?;

        windows.push(records.into_iter().map(|r| r.sequence).collect::<Vec<_>>());
    }

    let reports = process_windows(config, &windows, args.num_threads);

    let mut out = io::stdout().lock();
    for ((path, reads), report) in args.windows.iter().zip(&windows).zip(reports) {
        let report = report.with_context(|| format!("Could not build window for {}", path.display()))?;

        for (i, e) in &report.failed_reads {
            warn!("{}: could not add sequence #{i}: {e}", path.display());
        }

        let summary = WindowSummary {
            file: path,
            sequences: reads.len(),
            reads: report.window.num_reads(),
            nodes: report.window.graph().node_count(),
            edges: report.window.graph().edge_count(),
            failed_reads: report.failed_reads.len(),
            contaminated: report.window.is_contaminated(),
        };

        serde_json::to_writer(&mut out, &summary)?;
        writeln!(out)?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.verbose);

    match &args.command {
        Some(CliSubcommand::Align(v)) => align_subcommand(v)?,
        Some(CliSubcommand::Batch(v)) => batch_subcommand(v)?,
        None => anyhow::bail!("No subcommand given."),
    };

    Ok(())
}

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// The output formats for a window graph
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputType {
    /// Binary graph file, can be loaded again
    Binary,

    /// Output the graph in DOT format for visualization
    Dot,
}

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct CliArgs {
    /// Set verbosity level. Use multiple times to increase the verbosity level.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<CliSubcommand>,
}

#[derive(Subcommand, Debug)]
pub enum CliSubcommand {
    /// Build a single window graph from all sequences in a FASTA file
    Align(AlignArgs),

    /// Build one window per FASTA file in parallel, and report a summary per window
    Batch(BatchArgs),
}

#[derive(Args, Debug)]
pub struct WindowArgs {
    /// JSON file with window limits and scoring. Scoring options given on
    /// the command line take precedence.
    #[arg(short, long)]
    #[clap(help_heading = "Window configuration")]
    pub config: Option<PathBuf>,

    /// Score for matching bases
    #[arg(short = 'M', long)]
    #[clap(help_heading = "Window configuration")]
    pub match_score: Option<u8>,

    /// Penalty for mismatching bases
    #[arg(short = 'n', long)]
    #[clap(help_heading = "Window configuration")]
    pub cost_mismatch: Option<u8>,

    /// Penalty for a gap of length one
    #[arg(short = 'g', long)]
    #[clap(help_heading = "Window configuration")]
    pub cost_gap: Option<u8>,
}

#[derive(Args, Debug)]
pub struct AlignArgs {
    /// Sequences to align in FASTA format, optionally gzipped.
    #[clap(help_heading = "Inputs")]
    pub sequences: PathBuf,

    /// Output filename. If not given, defaults to stdout
    #[arg(short, long)]
    #[clap(help_heading = "Outputs")]
    pub output: Option<PathBuf>,

    /// Output file type.
    #[arg(value_enum, short = 'O', long, default_value = "binary")]
    #[clap(help_heading = "Outputs")]
    pub output_type: OutputType,

    /// Print each alignment to the log
    #[arg(long)]
    #[clap(help_heading = "Outputs")]
    pub show_alignments: bool,

    #[command(flatten)]
    pub window: WindowArgs,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// FASTA files, each forming an independent window
    #[arg(required = true)]
    #[clap(help_heading = "Inputs")]
    pub windows: Vec<PathBuf>,

    /// Number of worker threads
    #[arg(short = 't', long, default_value = "1")]
    pub num_threads: usize,

    #[command(flatten)]
    pub window: WindowArgs,
}

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Instant;

use orthoquoll_rs::pool::default_worker_count;
use orthoquoll_rs::{run_pipeline, PipelineConfig};

/// Extract statistics from a directory of alignments.
#[derive(Parser)]
#[command(name = "orthoquoll-rs", version, about)]
struct Args {
    /// Path to a directory that contains multiple FASTA files or one or
    /// more FASTA files
    #[arg(value_name = "PATH", required = true)]
    alignments: Vec<PathBuf>,

    /// Give this supermatrix a custom name
    #[arg(long, value_name = "STRING", default_value = "unknown")]
    id: String,

    /// Realign all alignments using MAFFT's LINSI algorithm
    #[arg(long)]
    realign: bool,

    /// Search for files in subdirectories
    #[arg(long)]
    subdirs: bool,

    /// Do not infer phylogenetic trees and do not report tree diameter
    /// statistics (much faster)
    #[arg(long)]
    no_trees: bool,

    /// Do not include a header in the CSV output
    #[arg(long)]
    no_header: bool,

    /// Number of threads used for running MAFFT and FastTree
    /// (default: all available)
    #[arg(long, value_name = "COUNT")]
    threads: Option<usize>,

    /// Overwrite any existing file with the same output path
    #[arg(long)]
    overwrite: bool,

    /// Path to the output file
    #[arg(long, value_name = "PATH", default_value = "supermatrix_stats.csv")]
    output: PathBuf,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let start = Instant::now();

    println!("OrthoQuoll {}\n", env!("CARGO_PKG_VERSION"));

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&[
                "⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏",
            ])
            .template("{spinner:.green} {msg}")
            .expect("Invalid spinner template"),
    );
    spinner.set_message(match (args.realign, args.no_trees) {
        (true, false) => "Realigning, inferring trees, and gathering statistics...",
        (true, true) => "Realigning and gathering statistics...",
        (false, false) => "Inferring trees and gathering statistics...",
        (false, true) => "Gathering statistics...",
    });

    let config = PipelineConfig {
        id: args.id,
        realign: args.realign,
        infer_trees: !args.no_trees,
        subdirs: args.subdirs,
        worker_count: args.threads.unwrap_or_else(default_worker_count),
        write_header: !args.no_header,
        overwrite: args.overwrite,
        output: args.output,
        ..PipelineConfig::default()
    };

    match run_pipeline(&args.alignments, &config) {
        Ok(_) => {
            spinner.finish_and_clear();
            println!("\ncompleted in {:.2} seconds", start.elapsed().as_secs_f64());
        }
        Err(err) => {
            spinner.finish_and_clear();
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

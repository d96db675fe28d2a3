use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "gridcore-cmd")]
#[command(about = "Command-line utility for exercising the gridcore data engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print synthetic rows as newline-delimited JSON
    Generate {
        /// Number of rows
        #[arg(short, long, default_value_t = 10)]
        rows: usize,

        /// Number of columns per row
        #[arg(short, long, default_value_t = 6)]
        cols: usize,

        /// Rows generated per batch
        #[arg(long, default_value_t = 1000)]
        chunk: usize,
    },

    /// Ingest a synthetic dataset into an engine worker and time sort and filter
    Bench {
        /// Number of rows
        #[arg(short, long, default_value_t = 100_000)]
        rows: usize,

        /// Number of columns per row
        #[arg(short, long, default_value_t = 6)]
        cols: usize,

        /// Column to sort by
        #[arg(long, default_value = "c2")]
        sort_col: String,

        /// Sort in descending order
        #[arg(long)]
        desc: bool,

        /// Filter query applied to the sorted order
        #[arg(short, long, default_value = "penang")]
        query: String,
    },

    /// Stream a synthetic dataset through the batching client
    Stream {
        /// Number of rows
        #[arg(short, long, default_value_t = 100_000)]
        rows: usize,

        /// Number of columns per row
        #[arg(short, long, default_value_t = 5)]
        cols: usize,

        /// Rows per producer batch
        #[arg(long, default_value_t = 500)]
        chunk: usize,

        /// Minimum milliseconds between two deliveries
        #[arg(long, default_value_t = 16)]
        flush_ms: u64,

        /// Cancel the stream after this many deliveries
        #[arg(long)]
        cancel_after: Option<usize>,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { rows, cols, chunk } => commands::generate::run(rows, cols, chunk),
        Commands::Bench {
            rows,
            cols,
            sort_col,
            desc,
            query,
        } => commands::block_on(commands::bench::run(rows, cols, sort_col, desc, query)),
        Commands::Stream {
            rows,
            cols,
            chunk,
            flush_ms,
            cancel_after,
        } => commands::block_on(commands::stream::run(
            rows,
            cols,
            chunk,
            flush_ms,
            cancel_after,
        )),
    }
}

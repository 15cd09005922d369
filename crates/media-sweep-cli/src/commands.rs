use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "media-sweep")]
#[command(about = "Find the largest items in a media library and export or delete them", long_about = None)]
pub struct Cli {
    /// Configuration file to load instead of ./Config.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the library and list its largest assets
    Scan {
        /// Number of assets to keep (overrides max_results)
        #[arg(long)]
        limit: Option<usize>,
        /// Also write the ranked list as CSV
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
    },
    /// Scan, pick assets by rank, then export and/or delete them
    Sweep {
        /// Ranks to export, e.g. "1,3-5"
        #[arg(long, value_name = "RANKS")]
        export: Option<String>,
        /// Ranks to delete, e.g. "2,7"
        #[arg(long, value_name = "RANKS")]
        delete: Option<String>,
        /// Don't ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Write the PNG thumbnail of a ranked asset
    Thumbnail {
        /// 1-based rank from a fresh scan
        rank: usize,
        output: PathBuf,
        /// Longest edge in pixels (overrides thumbnail_size)
        #[arg(long)]
        size: Option<u32>,
    },
    /// Print configuration values
    PrintConfig,
}

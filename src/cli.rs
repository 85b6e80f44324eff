use std::path::PathBuf;

use clap::Parser;

/// A digital gift: open the box, read the message, play for the finale.
#[derive(Debug, Parser)]
#[command(name = "giftbox", version, about)]
pub struct Cli {
    /// Config file (defaults to giftbox.toml next to the executable)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Seed for every random draw; same seed, same run
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Never ring the terminal bell
    #[arg(long)]
    pub no_audio: bool,

    /// Log file path
    #[arg(long, value_name = "PATH")]
    pub log: Option<PathBuf>,
}

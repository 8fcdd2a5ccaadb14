use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "songstash",
    about = "HTTP service that turns a YouTube link into a stored, tagged track",
    version,
)]
pub struct Cli {
    /// Path to a settings file (defaults to ~/.config/songstash/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listen port (overrides the settings file)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,
}

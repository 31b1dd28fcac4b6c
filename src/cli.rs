use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Manage camera pictures across internal and external storage.
#[derive(Debug, Parser)]
#[command(name = "shutter", version, about)]
pub struct Cli {
    /// Configuration file (defaults to `config.toml` in the platform
    /// configuration directory)
    #[arg(long, short, env = "SHUTTER_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Agree to moving pictures to external storage without asking
    #[arg(long, short, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List pictures, oldest first
    List,
    /// Add a picture from a file
    Save {
        file: PathBuf,
        /// The file is a video
        #[arg(long)]
        video: bool,
    },
    /// Delete a picture and its thumbnail
    Delete { name: String },
    /// Copy a picture out of the library
    Export { name: String, target: PathBuf },
    /// Drop pictures removed outside of shutter from the end of the list
    Check,
    /// Print a URL the picture (or its thumbnail) can be viewed from
    Url {
        name: String,
        #[arg(long)]
        thumbnail: bool,
    },
}

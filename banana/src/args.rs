use std::{net::SocketAddr, path::PathBuf};

use clap::{Parser, Subcommand};

/// Banana image generation service
#[derive(Debug, Parser)]
#[command(name = "banana", about = "Image generation dispatch for Gemini and Imagen")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "banana.toml", env = "BANANA_CONFIG", global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serve the HTTP endpoint (default)
    Serve {
        /// Override the listen address
        #[arg(long, env = "BANANA_LISTEN")]
        listen: Option<SocketAddr>,
    },
    /// Generate a single image and write it to disk
    Generate(GenerateArgs),
}

#[derive(Debug, clap::Args)]
pub struct GenerateArgs {
    /// Provider mode (e.g. banana, banana_pro, imagen); defaults to the first configured one
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Text description of the image
    #[arg(short, long)]
    pub prompt: String,

    /// Reference image file, repeatable
    #[arg(long = "ref", value_name = "FILE")]
    pub references: Vec<PathBuf>,

    /// Aspect ratio such as 16:9
    #[arg(long)]
    pub aspect_ratio: Option<String>,

    /// Resolution tier (1K, 2K, 4K)
    #[arg(long)]
    pub resolution: Option<String>,

    /// Sampling temperature
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Send the prompt to the model verbatim
    #[arg(long)]
    pub skip_optimization: bool,

    /// Output file
    #[arg(short, long)]
    pub out: PathBuf,
}

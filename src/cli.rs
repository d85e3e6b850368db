//! Command-line interface implementation for PromptForge.
//! Provides argument parsing and help text formatting using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments structure for PromptForge.
#[derive(Parser, Debug)]
#[command(author, version, about = "PromptForge: prompt template library and composition tool", long_about = None)]
pub struct Args {
    /// Directory searched for the promptforge configuration file
    #[arg(long, value_name = "DIR", default_value = ".", global = true)]
    pub config_dir: PathBuf,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a template file with placeholder values
    Render {
        /// Path to the template file
        template: PathBuf,

        /// Read a JSON value mapping from stdin instead of prompting
        #[arg(short, long)]
        stdin: bool,

        /// Path to a JSON placeholder schema for the template
        #[arg(long, value_name = "FILE")]
        schema: Option<PathBuf>,
    },

    /// Compose a stored prompt and send it to a backend
    Run {
        /// Name of the stored prompt
        name: String,

        /// Backend to execute against (defaults to the configured one)
        #[arg(short, long)]
        backend: Option<String>,

        /// Model identifier (defaults per backend)
        #[arg(short, long)]
        model: Option<String>,

        /// System prompt sent alongside the rendered text
        #[arg(long)]
        system: Option<String>,

        #[arg(long)]
        temperature: Option<f64>,

        #[arg(long)]
        max_tokens: Option<u32>,

        /// Wait for the full response instead of streaming chunks
        #[arg(long)]
        no_stream: bool,

        /// Read a JSON value mapping from stdin instead of prompting
        #[arg(short, long)]
        stdin: bool,
    },

    /// Import prompts from a CSV file
    Import {
        /// Path to the CSV file
        file: PathBuf,

        /// Update existing prompts instead of skipping them
        #[arg(long)]
        update: bool,
    },

    /// List stored prompts
    List {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        tag: Option<String>,

        /// Show only favorites
        #[arg(long)]
        favorites: bool,
    },

    /// List the models a backend offers
    Models {
        /// Backend name
        backend: String,
    },

    /// Round-trip test a backend with a short prompt
    Probe {
        /// Backend name
        backend: String,
    },
}

/// Parses command line arguments and returns the Args structure.
pub fn get_args() -> Args {
    Args::parse()
}

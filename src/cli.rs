// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "funcdock")]
#[command(about = "Local serverless function platform backend for Docker and Podman")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Namespace to operate in (defaults to the platform namespace)
    #[arg(short, long, global = true, default_value = "")]
    pub namespace: String,

    /// Directory holding the function record store
    #[arg(long, global = true, default_value = ".funcdock")]
    pub state_dir: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress progress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Emit results as JSON
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy a function from a config file
    Deploy {
        /// Path to the function config (YAML)
        #[arg(short, long, default_value = "function.yaml")]
        file: PathBuf,
    },

    /// List functions and their status
    Get {
        /// Only this function
        name: Option<String>,

        /// Only functions in this project
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Delete a function, its events, and its containers
    Delete {
        /// Function name
        name: String,
    },
}

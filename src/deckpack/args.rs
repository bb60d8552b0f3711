use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "deckpack")]
#[command(about = "Build flashcard packages from JSON manifests", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding deckpack.json (defaults to $DECKPACK_CONFIG_DIR, then the user config dir)
    #[arg(long, global = true)]
    pub config_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build a package from a manifest
    #[command(alias = "b")]
    Build {
        /// Path to the manifest JSON
        manifest: PathBuf,

        /// Output path (defaults to the manifest path with an .apkg extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Build timestamp in seconds since the epoch, for reproducible output
        #[arg(long)]
        timestamp: Option<f64>,

        /// Skip the malformed HTML scan
        #[arg(long)]
        no_html_check: bool,
    },

    /// Show requirements, cards and GUIDs without writing anything
    #[command(alias = "i")]
    Inspect {
        /// Path to the manifest JSON
        manifest: PathBuf,
    },

    /// Print the GUID derived from field values
    Guid {
        /// Hash the fields only, without the model id
        #[arg(long)]
        legacy: bool,

        /// Model id appended to the fields (required unless --legacy)
        #[arg(long, allow_hyphen_values = true)]
        model_id: Option<i64>,

        /// Field values, in model order
        #[arg(required = true, num_args = 1..)]
        fields: Vec<String>,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (check_html or compression)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

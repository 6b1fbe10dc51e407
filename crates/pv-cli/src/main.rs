//! CLI frontend for the Palaver conversation engine.

mod commands;
mod ui;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pv",
    about = "Palaver: check and play NPC dialogue documents",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile documents and report diagnostics
    Check {
        /// A .json document or a directory of them
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List the compiled topics
    Topics {
        /// Only list topics whose id contains this text
        #[arg(short, long)]
        filter: Option<String>,

        /// A .json document or a directory of them
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List the topics a topic's responses lead to
    Reach {
        /// Topic id
        topic: String,

        /// Skip responses that are gated by a condition
        #[arg(short, long)]
        unconditional: bool,

        /// A .json document or a directory of them
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Hold a conversation with a sandbox NPC
    Play {
        /// Topic the NPC opens with
        topic: String,

        /// A .json document or a directory of them
        #[arg(default_value = ".")]
        path: PathBuf,

        /// RNG seed for deterministic trials and lines
        #[arg(short, long)]
        seed: Option<u64>,

        /// Scripted choices instead of stdin: option numbers, `q`, or a
        /// special key such as `LOOK_AT`
        #[arg(short, long, value_delimiter = ',')]
        choices: Option<Vec<String>>,

        /// The NPC's name
        #[arg(long)]
        npc: Option<String>,

        /// Load the NPC from a JSON file of sandbox character fields
        #[arg(long)]
        npc_file: Option<PathBuf>,

        /// Your name
        #[arg(long, default_value = "You")]
        name: String,

        /// Cash you carry, in cents
        #[arg(long, default_value = "0")]
        cash: i64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { path } => commands::check::run(&path),
        Commands::Topics { filter, path } => commands::topics::run(&path, filter.as_deref()),
        Commands::Reach {
            topic,
            unconditional,
            path,
        } => commands::reach::run(&path, &topic, unconditional),
        Commands::Play {
            topic,
            path,
            seed,
            choices,
            npc,
            npc_file,
            name,
            cash,
        } => commands::play::run(
            &path,
            &topic,
            &commands::play::PlayOptions {
                seed,
                choices,
                npc,
                npc_file,
                name,
                cash,
            },
        ),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

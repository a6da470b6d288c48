//! CLI argument parsing and command dispatch.

pub mod args;
pub mod commands;

use args::{SessionArgs, SpansOutputFormat};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "chatex")]
#[command(about = "Find and typeset LaTeX math in chat messages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the math spans found in an HTML fragment
    Spans {
        /// The file to scan; reads stdin when omitted
        file: Option<PathBuf>,
        #[arg(short, long, default_value = "json")]
        format: SpansOutputFormat,
    },

    /// Wrap the math spans of an HTML fragment in `span.latex` elements
    Wrap {
        /// The file to wrap; reads stdin when omitted
        file: Option<PathBuf>,
        /// Output file to write the wrapped fragment to
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Flip the persisted on/off preference and print the new state
    Toggle {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Append messages to a chat page one at a time and typeset them the way
    /// a live page would
    Render {
        #[command(flatten)]
        session: SessionArgs,

        /// The chat page containing the message container
        page: PathBuf,

        /// HTML fragments appended as messages, in order
        messages: Vec<PathBuf>,

        /// Delay between two appended messages. Messages arriving within one
        /// quiet period of each other are coalesced; only the last is
        /// typeset
        #[arg(long, default_value = "400")]
        interval_ms: u64,

        /// Output file for the resulting page
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Spans { file, format } => commands::spans::run(file, format),
        Commands::Wrap { file, output } => commands::wrap::run(file, output),
        Commands::Toggle { session } => commands::toggle::run(session),
        Commands::Render {
            session,
            page,
            messages,
            interval_ms,
            output,
        } => commands::render::run(session, page, messages, interval_ms, output),
    }
}

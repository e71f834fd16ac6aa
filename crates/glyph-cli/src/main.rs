//! Glyph CLI - links parsed Glyph programs into metadata images

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "glyph")]
#[command(about = "Link Glyph programs into metadata images", long_about = None)]
#[command(version)]
struct Cli {
    /// Color output: auto, always, never
    #[arg(long, global = true)]
    color: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Link a program and write the metadata image
    Link {
        /// Declaration file produced by the parser
        input: PathBuf,

        /// Output path (default: input with .glyphc extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Configuration file (default: nearest glyph.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Treat warnings as errors
        #[arg(long)]
        warnings_as_errors: bool,
    },

    /// Link a program and report diagnostics without writing anything
    Check {
        /// Declaration file produced by the parser
        input: PathBuf,

        /// Configuration file (default: nearest glyph.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Treat warnings as errors
        #[arg(long)]
        warnings_as_errors: bool,
    },

    /// Print the contents of a metadata image
    Dump {
        /// Metadata image
        file: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

/// A timer that outputs nothing but still enables span timing calculation
struct NoTimestamp;

impl FormatTime for NoTimestamp {
    fn format_time(&self, _w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        Ok(())
    }
}

/// Tracing is enabled by GLYPH_LOG (an `EnvFilter` directive).
/// GLYPH_LOG_STYLE: "compact" (default) or "full" (with timestamps).
fn init_tracing() {
    let Ok(filter) = EnvFilter::try_from_env("GLYPH_LOG") else {
        return;
    };
    let style = std::env::var("GLYPH_LOG_STYLE").unwrap_or_default();
    if style == "full" {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_level(true)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .with_timer(NoTimestamp)
            .with_span_events(FmtSpan::NEW | FmtSpan::CLOSE)
            .with_writer(std::io::stderr)
            .init();
    }
    tracing::debug!("tracing initialized");
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let color = output::resolve_color_choice(cli.color.as_deref());

    let result = match cli.command {
        Commands::Link {
            input,
            output,
            config,
            warnings_as_errors,
        } => commands::link::execute(&input, output, config, warnings_as_errors, color),
        Commands::Check {
            input,
            config,
            warnings_as_errors,
        } => commands::check::execute(&input, config, warnings_as_errors, color),
        Commands::Dump { file, json } => commands::dump::execute(&file, json),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            let mut out = output::StyledOutput::new(color);
            out.error("error");
            out.plain(&format!(": {:#}", error));
            out.newline();
            ExitCode::FAILURE
        }
    }
}

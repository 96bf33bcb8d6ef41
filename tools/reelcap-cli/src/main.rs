//! Reelcap CLI: turn a source video into a captioned, re-framed short.
//!
//! Usage:
//!   reelcap render <INPUT> [OPTIONS]     Render a short
//!   reelcap plan <INPUT> [OPTIONS]       Print the composition timeline as JSON
//!   reelcap captions <INPUT> -o <FILE>   Write SRT/VTT captions
//!   reelcap tracks                       List known background tracks
//!   reelcap check                        Check external tools
//!   reelcap init-config                  Write the default config file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use reelcap_common::config::AppConfig;
use reelcap_project_model::caption::CaptionMode;

mod commands;

use commands::ShortArgs;

#[derive(Parser)]
#[command(
    name = "reelcap",
    about = "Caption, re-frame, and score short vertical videos",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to $XDG_CONFIG_HOME/reelcap/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a captioned short from a source video
    Render {
        /// Source video
        input: PathBuf,

        /// Output file (defaults to <output_dir>/<input>-short.<ext>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the cues as a .srt or .vtt sidecar
        #[arg(long)]
        subtitles: Option<PathBuf>,

        /// Write a <output>.render.json summary
        #[arg(long)]
        report: bool,

        #[command(flatten)]
        short: ShortArgs,
    },

    /// Print the composition timeline as JSON without rendering
    Plan {
        /// Source video
        input: PathBuf,

        #[command(flatten)]
        short: ShortArgs,
    },

    /// Transcribe a video and write caption cues as SRT or VTT
    Captions {
        /// Source video
        input: PathBuf,

        /// Output .srt or .vtt file
        #[arg(short, long)]
        output: PathBuf,

        /// Caption grouping: words|segments
        #[arg(long, default_value = "words")]
        mode: CaptionMode,

        /// Use a saved whisper JSON transcript instead of transcribing
        #[arg(long)]
        transcript: Option<PathBuf>,

        /// Save the transcript as whisper JSON
        #[arg(long)]
        save_transcript: Option<PathBuf>,
    },

    /// List known background tracks
    Tracks,

    /// Check external tools
    Check,

    /// Write the default config file
    InitConfig {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };

    let mut logging = app.logging.clone();
    if cli.verbose {
        logging.level = "debug".to_string();
    }
    reelcap_common::logging::init_logging(&logging);

    match cli.command {
        Commands::Render {
            input,
            output,
            subtitles,
            report,
            short,
        } => commands::render::run(&app, input, output, subtitles, report, short).await,
        Commands::Plan { input, short } => commands::plan::run(&app, input, short),
        Commands::Captions {
            input,
            output,
            mode,
            transcript,
            save_transcript,
        } => commands::captions::run(&app, input, output, mode, transcript, save_transcript),
        Commands::Tracks => commands::tracks::run(&app),
        Commands::Check => commands::check::run(&app),
        Commands::InitConfig { force } => commands::init_config::run(force),
    }
}

// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use vislab::app::AppModel;
use vislab::i18n;

mod cli;

#[derive(Parser)]
#[command(name = "vislab")]
#[command(about = "Image processing workbench with live camera effects")]
#[command(version = vislab::constants::app_info::version())]
#[command(subcommand_required = false)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live camera with adjustments in the terminal
    Terminal {
        /// Camera device path (from 'vislab list')
        #[arg(short, long)]
        camera: Option<String>,
    },

    /// List operations and available cameras
    List,

    /// Run an operation on an image file
    Apply {
        /// Operation id (from 'vislab list')
        operation: String,

        /// Input image
        #[arg(short, long)]
        input: PathBuf,

        /// Output image; multi-panel results are written next to it
        #[arg(short, long)]
        output: PathBuf,

        /// Operation parameter as key=value (repeatable)
        #[arg(short, long = "param")]
        param: Vec<String>,

        /// Directory with the Haar cascade files (faces operation)
        #[arg(long)]
        cascades: Option<PathBuf>,
    },

    /// Save one camera frame
    Snapshot {
        /// Camera device path (from 'vislab list')
        #[arg(short, long)]
        camera: Option<String>,

        /// Output file or directory (default: configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Record a video clip
    Record {
        /// Camera device path (from 'vislab list')
        #[arg(short, long)]
        camera: Option<String>,

        /// Recording duration in seconds
        #[arg(short, long, default_value = "10")]
        duration: u64,

        /// Output file or directory (default: configured output directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check the Haar cascade files used for face detection
    CheckCascades {
        /// Cascade directory (default: configured directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=vislab=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Terminal { camera }) => vislab::terminal::run(camera),
        Some(Commands::List) => cli::list(),
        Some(Commands::Apply {
            operation,
            input,
            output,
            param,
            cascades,
        }) => cli::apply(&operation, input, output, param, cascades),
        Some(Commands::Snapshot { camera, output }) => cli::snapshot(camera, output),
        Some(Commands::Record {
            camera,
            duration,
            output,
        }) => cli::record(camera, duration, output),
        Some(Commands::CheckCascades { dir }) => cli::check_cascades(dir),
        None => run_gui(),
    }
}

fn run_gui() -> Result<(), Box<dyn std::error::Error>> {
    // Get the system's preferred languages.
    let requested_languages = i18n_embed::DesktopLanguageRequester::requested_languages();

    // Enable localizations to be applied.
    i18n::init(&requested_languages);

    let settings = cosmic::app::Settings::default().size_limits(
        cosmic::iced::Limits::NONE
            .min_width(900.0)
            .min_height(600.0),
    );

    cosmic::app::run::<AppModel>(settings, ())?;

    Ok(())
}

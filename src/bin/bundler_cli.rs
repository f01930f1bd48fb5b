//! Plugin bundler CLI.
//!
//! `plugin-bundler build` runs the full pipeline against a project
//! directory. Exit status 0 means a fully populated output directory;
//! any fatal error exits non-zero with a message naming the offending
//! file and stage (or cycle path, or undeletable path).

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use plugin_bundler::{run_build, BuildConfig, BuildMode, BuildOptions};

#[derive(Parser)]
#[command(name = "plugin-bundler")]
#[command(about = "Compiles plugin sources into self-contained artifacts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full build
    Build {
        /// Build mode: development or production
        #[arg(short, long, default_value = "development")]
        mode: BuildMode,

        /// Project directory containing the sources
        #[arg(short, long, default_value = ".")]
        project_dir: PathBuf,

        /// Optional build config file (JSON); compiled-in defaults
        /// otherwise
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Disable the incremental transform cache
        #[arg(long)]
        no_cache: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            mode,
            project_dir,
            config,
            no_cache,
        } => {
            let config = match config {
                Some(path) => match BuildConfig::load(&path) {
                    Ok(c) => c,
                    Err(e) => {
                        eprintln!("error: {}", e);
                        return ExitCode::FAILURE;
                    }
                },
                None => BuildConfig::default(),
            };

            let mut options = BuildOptions::new(project_dir, mode, config);
            options.use_cache = !no_cache;

            match run_build(&options) {
                Ok(report) => {
                    println!(
                        "built {} ({} mode): {}",
                        report.out_dir.display(),
                        report.mode,
                        report.files.join(", ")
                    );
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("build failed: {}", e);
                    ExitCode::FAILURE
                }
            }
        }
    }
}

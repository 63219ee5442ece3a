use std::io;
use std::process::ExitCode;

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use dashreel::cli::{Args, Prompter};
use dashreel::logging::init_tracing;
use dashreel::{Ffmpeg, Outcome};

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match compile_from_args(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn compile_from_args(args: Args) -> dashreel::Result<()> {
    let tool = Ffmpeg::new(&args.ffmpeg, &args.ffprobe);
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let stdin = io::stdin();
    let mut prompter = Prompter::new(stdin.lock(), io::stdout());
    let config = args.into_config(&mut prompter)?;

    tracing::info!("Input directory: {}", config.input_dir.display());
    tracing::info!("Target duration: {} seconds", config.target_duration);
    tracing::info!("Output file: {}", config.output_path().display());

    let progress = ProgressBar::new(config.target_duration.ceil() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {wide_bar} {pos}/{len}s")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    match dashreel::run(&config, &tool, rng, progress)? {
        Outcome::NothingToDo { discovered: 0 } => {
            tracing::warn!(
                "No matching media files found in {} or its subdirectories",
                config.input_dir.display()
            );
        }
        Outcome::NothingToDo { discovered } => {
            tracing::warn!("None of the {} media files match the date filter", discovered);
        }
        Outcome::Compiled(summary) => {
            tracing::info!(
                "Successfully compiled {} clips ({:.1}s) into {}",
                summary.clips,
                summary.total_duration,
                summary.output.display()
            );
        }
    }
    Ok(())
}

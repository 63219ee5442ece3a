//! One compilation run: discover, filter, sample, compile.

use std::fs;
use std::path::PathBuf;

use indicatif::ProgressBar;
use rand::Rng;
use tempfile::TempDir;

use crate::compiler::compile;
use crate::config::Config;
use crate::discovery::find_media_files;
use crate::error::Result;
use crate::media::{MediaFile, MediaTool};
use crate::sampler::Sampler;

/// What a run produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// No file survived discovery and filtering. `discovered` is the number of
    /// media files found before the date filter was applied.
    NothingToDo { discovered: usize },
    Compiled(Summary),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub output: PathBuf,
    pub clips: usize,
    pub skipped: usize,
    pub total_duration: f64,
    pub target_duration: f64,
}

/// Run the whole compilation.
///
/// Clips are written into a scratch directory that is removed when this
/// function returns, on success and on every error path.
pub fn run<R: Rng>(
    config: &Config,
    tool: &dyn MediaTool,
    rng: R,
    progress: ProgressBar,
) -> Result<Outcome> {
    config.validate()?;

    let discovered: Vec<PathBuf> =
        find_media_files(&config.input_dir, &config.extensions, &excluded_paths(config))?
            .collect();
    tracing::info!(
        "Found {} media files in {}",
        discovered.len(),
        config.input_dir.display()
    );

    let discovered_count = discovered.len();
    let mut eligible: Vec<MediaFile> = discovered
        .into_iter()
        .map(MediaFile::new)
        .filter(|file| config.date_range.includes_date(file.date()))
        .collect();

    if config.date_range.is_active() {
        tracing::info!(
            "{} of {} files fall within the date range",
            eligible.len(),
            discovered_count
        );
    }
    if eligible.is_empty() {
        tracing::warn!("No eligible media files, nothing to do");
        return Ok(Outcome::NothingToDo {
            discovered: discovered_count,
        });
    }

    fs::create_dir_all(&config.output_dir)?;
    let scratch = scratch_dir(config)?;
    // The concat demuxer resolves relative entries against the list file.
    let scratch_path = fs::canonicalize(scratch.path())?;

    let plan = Sampler::new(tool, config.sampler, rng)
        .with_progress(progress)
        .sample(&mut eligible, config.target_duration, &scratch_path)?;

    tracing::info!(
        "Created {} clips, skipped {} attempts, total {:.1}s (target {:.1}s)",
        plan.len(),
        plan.skipped(),
        plan.total(),
        config.target_duration
    );

    let output = config.output_path();
    compile(tool, &plan, &output)?;

    if let Err(e) = scratch.close() {
        tracing::warn!("Could not remove scratch directory: {}", e);
    }

    Ok(Outcome::Compiled(Summary {
        output,
        clips: plan.len(),
        skipped: plan.skipped(),
        total_duration: plan.total(),
        target_duration: config.target_duration,
    }))
}

/// Our own output and scratch locations, so earlier compilations are never
/// sampled as footage. Paths that do not exist yet cannot hold anything.
fn excluded_paths(config: &Config) -> Vec<PathBuf> {
    [
        Some(config.output_dir.clone()),
        Some(config.output_path()),
        config.temp_root.clone(),
    ]
    .into_iter()
    .flatten()
    .filter_map(|path| fs::canonicalize(path).ok())
    .collect()
}

fn scratch_dir(config: &Config) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("dashreel-");
    let dir = match config.temp_root() {
        Some(root) => {
            fs::create_dir_all(root)?;
            builder.tempdir_in(root)?
        }
        None => builder.tempdir()?,
    };
    tracing::debug!("Scratch directory: {}", dir.path().display());
    Ok(dir)
}

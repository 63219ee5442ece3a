//! Random clip selection.
//!
//! The sampler draws a source file uniformly at random (with replacement),
//! picks a clip length from the configured range and a start offset that
//! keeps the clip inside the file, and asks the media tool to cut it. Clips
//! are appended until their summed length reaches the target. The last clip
//! is never trimmed, so the plan may overshoot by less than one clip.
//!
//! A source that cannot be probed, is shorter than the minimum clip, or fails
//! to extract costs one attempt and the loop moves on. Only a run of
//! `max_consecutive_failures` failed attempts in a row, or every source being
//! known to be unusable, ends the run with
//! [`Error::InsufficientSourceDuration`].

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use rand::Rng;

use crate::config::SamplerConfig;
use crate::error::{Error, Result};
use crate::media::{MediaFile, MediaTool};

/// An extracted segment of one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub source: PathBuf,
    /// Offset into the source, in seconds.
    pub start: f64,
    /// Length in seconds.
    pub length: f64,
    /// Where the extracted clip was written.
    pub path: PathBuf,
}

/// Ordered clips plus their running total.
#[derive(Debug, Clone, Default)]
pub struct CompilationPlan {
    clips: Vec<Clip>,
    total: f64,
    skipped: usize,
}

impl CompilationPlan {
    fn push(&mut self, clip: Clip) {
        self.total += clip.length;
        self.clips.push(clip);
    }

    pub fn clips(&self) -> &[Clip] {
        &self.clips
    }

    pub fn clip_paths(&self) -> Vec<PathBuf> {
        self.clips.iter().map(|clip| clip.path.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Summed clip length in seconds.
    pub fn total(&self) -> f64 {
        self.total
    }

    /// Attempts that produced no clip.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Delete the extracted clip files. Best effort.
    pub fn remove_clip_files(&self) {
        for clip in &self.clips {
            if let Err(e) = fs::remove_file(&clip.path) {
                tracing::debug!("Could not remove {}: {}", clip.path.display(), e);
            }
        }
    }
}

enum Attempt {
    Clip(Clip),
    /// The file can never yield a clip.
    Unusable,
    /// Extraction failed; the file may still work with another offset.
    Failed,
}

pub struct Sampler<'a, R> {
    tool: &'a dyn MediaTool,
    config: SamplerConfig,
    rng: R,
    progress: ProgressBar,
}

impl<'a, R: Rng> Sampler<'a, R> {
    pub fn new(tool: &'a dyn MediaTool, config: SamplerConfig, rng: R) -> Self {
        Self {
            tool,
            config,
            rng,
            progress: ProgressBar::hidden(),
        }
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// Cut clips from `files` into `scratch` until `target` seconds are reached.
    ///
    /// Files found to be unusable are dropped from the draw. They are
    /// discovered at most once each, so they do not count toward the failure
    /// ceiling; only failed extractions do.
    pub fn sample(
        &mut self,
        files: &mut [MediaFile],
        target: f64,
        scratch: &Path,
    ) -> Result<CompilationPlan> {
        self.progress.set_length(target.ceil() as u64);

        let result = self.fill(files, target, scratch);
        self.progress.finish_and_clear();
        result
    }

    fn fill(
        &mut self,
        files: &mut [MediaFile],
        target: f64,
        scratch: &Path,
    ) -> Result<CompilationPlan> {
        let mut plan = CompilationPlan::default();
        let mut candidates: Vec<usize> = (0..files.len()).collect();
        let mut consecutive_failures = 0;

        while plan.total() < target {
            if consecutive_failures >= self.config.max_consecutive_failures {
                return Err(Error::InsufficientSourceDuration {
                    attempts: consecutive_failures,
                });
            }
            if candidates.is_empty() {
                tracing::error!("None of the {} eligible files can produce a clip", files.len());
                return Err(Error::InsufficientSourceDuration {
                    attempts: consecutive_failures,
                });
            }

            let slot = self.rng.gen_range(0..candidates.len());
            let dest = scratch.join(format!("clip_{:04}.mp4", plan.len()));

            match self.attempt(&mut files[candidates[slot]], &dest) {
                Attempt::Clip(clip) => {
                    tracing::debug!(
                        "Added clip {} from {} ({:.1}s at {:.1}s)",
                        plan.len(),
                        clip.source.display(),
                        clip.length,
                        clip.start
                    );
                    consecutive_failures = 0;
                    plan.push(clip);
                    self.progress.set_position(plan.total().min(target) as u64);
                }
                Attempt::Unusable => {
                    candidates.swap_remove(slot);
                    plan.skipped += 1;
                }
                Attempt::Failed => {
                    consecutive_failures += 1;
                    plan.skipped += 1;
                }
            }
        }

        Ok(plan)
    }

    fn attempt(&mut self, file: &mut MediaFile, dest: &Path) -> Attempt {
        let Some(duration) = file.duration(self.tool) else {
            return Attempt::Unusable;
        };
        let range = self.config.clip_range;

        if duration < range.min() {
            tracing::debug!(
                "Skipping {}: duration {:.1}s is shorter than the {:.1}s minimum clip",
                file.path().display(),
                duration,
                range.min()
            );
            return Attempt::Unusable;
        }

        // duration >= min > 0, so the clamped length stays positive.
        let length = self.rng.gen_range(range.min()..=range.max()).min(duration);
        let start = self.rng.gen_range(0.0..=duration - length);

        match self.tool.extract_clip(file.path(), start, length, dest) {
            Ok(()) => Attempt::Clip(Clip {
                source: file.path().to_path_buf(),
                start,
                length,
                path: dest.to_path_buf(),
            }),
            Err(e) => {
                tracing::warn!("Error creating clip from {}: {}", file.path().display(), e);
                if dest.exists() {
                    if let Err(e) = fs::remove_file(dest) {
                        tracing::debug!("Could not remove {}: {}", dest.display(), e);
                    }
                }
                Attempt::Failed
            }
        }
    }
}

//! The seam between the sampler and the external media tool.
//!
//! Everything that touches audio or video bytes goes through [`MediaTool`].
//! The production implementation shells out to `ffprobe` and `ffmpeg`, always
//! with `-c copy` so nothing is re-encoded.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use chrono::NaiveDate;
use thiserror::Error;

use crate::date_filter::date_from_filename;

/// Failure of a single external tool invocation.
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with status {code:?}: {stderr}")]
    Failed {
        tool: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("could not parse {tool} output: {output:?}")]
    Parse { tool: String, output: String },

    #[error("output file is missing or empty: {}", .0.display())]
    OutputMissing(PathBuf),

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Operations the compilation needs from a media processing backend.
pub trait MediaTool {
    /// Container duration in seconds.
    fn probe_duration(&self, path: &Path) -> Result<f64, ToolError>;

    /// Copy `[start, start + length)` of `source` into `dest` without re-encoding.
    fn extract_clip(
        &self,
        source: &Path,
        start: f64,
        length: f64,
        dest: &Path,
    ) -> Result<(), ToolError>;

    /// Join `clips` in order into `output` without re-encoding.
    fn concatenate(&self, clips: &[PathBuf], output: &Path) -> Result<(), ToolError>;
}

/// `ffprobe`/`ffmpeg` backed [`MediaTool`].
#[derive(Debug, Clone)]
pub struct Ffmpeg {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for Ffmpeg {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl Ffmpeg {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    fn run(&self, program: &Path, command: &mut Command) -> Result<Output, ToolError> {
        let tool = program.display().to_string();
        tracing::debug!("Running: {:?}", command);

        let output = command.output().map_err(|source| ToolError::Spawn {
            tool: tool.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output)
    }
}

impl MediaTool for Ffmpeg {
    fn probe_duration(&self, path: &Path) -> Result<f64, ToolError> {
        let mut command = Command::new(&self.ffprobe);
        command
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("format=duration")
            .arg("-of")
            .arg("default=noprint_wrappers=1:nokey=1")
            .arg(path);
        let output = self.run(&self.ffprobe, &mut command)?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_duration(&stdout).ok_or_else(|| ToolError::Parse {
            tool: self.ffprobe.display().to_string(),
            output: stdout.trim().to_string(),
        })
    }

    fn extract_clip(
        &self,
        source: &Path,
        start: f64,
        length: f64,
        dest: &Path,
    ) -> Result<(), ToolError> {
        let mut command = Command::new(&self.ffmpeg);
        command
            .arg("-v")
            .arg("error")
            .arg("-ss")
            .arg(format!("{start:.3}"))
            .arg("-t")
            .arg(format!("{length:.3}"))
            .arg("-i")
            .arg(source)
            .arg("-c")
            .arg("copy")
            .arg("-y")
            .arg(dest);
        self.run(&self.ffmpeg, &mut command)?;
        ensure_non_empty(dest)
    }

    fn concatenate(&self, clips: &[PathBuf], output: &Path) -> Result<(), ToolError> {
        let list_dir = clips
            .first()
            .and_then(|clip| clip.parent())
            .unwrap_or_else(|| Path::new("."));
        let list_path = list_dir.join("concat_list.txt");
        write_concat_list(&list_path, clips)?;

        let mut command = Command::new(&self.ffmpeg);
        command
            .arg("-v")
            .arg("error")
            .arg("-f")
            .arg("concat")
            .arg("-safe")
            .arg("0")
            .arg("-i")
            .arg(&list_path)
            .arg("-c")
            .arg("copy")
            .arg("-y")
            .arg(output);
        let result = self.run(&self.ffmpeg, &mut command);

        if let Err(e) = fs::remove_file(&list_path) {
            tracing::debug!("Could not remove {}: {}", list_path.display(), e);
        }
        result?;
        ensure_non_empty(output)
    }
}

fn parse_duration(stdout: &str) -> Option<f64> {
    let secs: f64 = stdout.lines().next()?.trim().parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then_some(secs)
}

/// Write an ffmpeg concat demuxer list, one `file '<path>'` line per clip.
pub fn write_concat_list(list_path: &Path, clips: &[PathBuf]) -> io::Result<()> {
    let mut file = File::create(list_path)?;
    for clip in clips {
        writeln!(file, "file '{}'", escape_concat_path(clip))?;
    }
    file.flush()
}

/// The concat demuxer reads single-quoted strings; a literal `'` becomes `'\''`.
fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

fn ensure_non_empty(path: &Path) -> Result<(), ToolError> {
    match fs::metadata(path) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(ToolError::OutputMissing(path.to_path_buf())),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Probe {
    Pending,
    Known(f64),
    Unreadable,
}

/// A discovered source file.
///
/// The path and filename date are fixed at discovery; the duration is probed
/// the first time it is asked for and cached, including a failed probe.
#[derive(Debug, Clone)]
pub struct MediaFile {
    path: PathBuf,
    date: Option<NaiveDate>,
    probe: Probe,
}

impl MediaFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let date = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(date_from_filename);
        Self {
            path,
            date,
            probe: Probe::Pending,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Duration if it has already been probed successfully.
    pub fn known_duration(&self) -> Option<f64> {
        match self.probe {
            Probe::Known(secs) => Some(secs),
            _ => None,
        }
    }

    /// True once a probe has failed for this file.
    pub fn is_unreadable(&self) -> bool {
        self.probe == Probe::Unreadable
    }

    /// Probe the duration on first use; later calls return the cached result.
    pub fn duration(&mut self, tool: &dyn MediaTool) -> Option<f64> {
        if self.probe == Probe::Pending {
            self.probe = match tool.probe_duration(&self.path) {
                Ok(secs) => Probe::Known(secs),
                Err(e) => {
                    tracing::warn!("Could not get duration for {}: {}", self.path.display(), e);
                    Probe::Unreadable
                }
            };
        }
        self.known_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct CountingProbe {
        calls: Cell<usize>,
        result: Option<f64>,
    }

    impl MediaTool for CountingProbe {
        fn probe_duration(&self, _path: &Path) -> Result<f64, ToolError> {
            self.calls.set(self.calls.get() + 1);
            self.result.ok_or_else(|| ToolError::Parse {
                tool: "probe".into(),
                output: "N/A".into(),
            })
        }

        fn extract_clip(&self, _: &Path, _: f64, _: f64, _: &Path) -> Result<(), ToolError> {
            unreachable!()
        }

        fn concatenate(&self, _: &[PathBuf], _: &Path) -> Result<(), ToolError> {
            unreachable!()
        }
    }

    #[test]
    fn parses_ffprobe_duration() {
        assert_eq!(parse_duration("62.480000\n"), Some(62.48));
        assert_eq!(parse_duration("N/A\n"), None);
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("-1.0"), None);
    }

    #[test]
    fn escapes_single_quotes_in_concat_list() {
        assert_eq!(
            escape_concat_path(Path::new("/tmp/it's/clip.mp4")),
            r"/tmp/it'\''s/clip.mp4"
        );
    }

    #[test]
    fn concat_list_lists_clips_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let list = dir.path().join("list.txt");
        let clips = vec![PathBuf::from("/a/0001.mp4"), PathBuf::from("/a/0000.mp4")];
        write_concat_list(&list, &clips).unwrap();

        let contents = fs::read_to_string(&list).unwrap();
        assert_eq!(contents, "file '/a/0001.mp4'\nfile '/a/0000.mp4'\n");
    }

    #[test]
    fn media_file_reads_date_from_name_only() {
        let file = MediaFile::new("/footage/2020-01-01/20250515_120000_F.mp4");
        assert_eq!(file.date(), NaiveDate::from_ymd_opt(2025, 5, 15));

        let undated = MediaFile::new("/footage/2020-01-01/front.mp4");
        assert_eq!(undated.date(), None);
    }

    #[test]
    fn duration_is_probed_once() {
        let tool = CountingProbe {
            calls: Cell::new(0),
            result: Some(12.5),
        };
        let mut file = MediaFile::new("a.mp4");
        assert_eq!(file.duration(&tool), Some(12.5));
        assert_eq!(file.duration(&tool), Some(12.5));
        assert_eq!(tool.calls.get(), 1);
    }

    #[test]
    fn failed_probe_is_cached() {
        let tool = CountingProbe {
            calls: Cell::new(0),
            result: None,
        };
        let mut file = MediaFile::new("broken.mp4");
        assert_eq!(file.duration(&tool), None);
        assert_eq!(file.duration(&tool), None);
        assert!(file.is_unreadable());
        assert_eq!(tool.calls.get(), 1);
    }

    #[test]
    fn empty_output_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let empty = dir.path().join("empty.mp4");
        File::create(&empty).unwrap();
        assert!(matches!(ensure_non_empty(&empty), Err(ToolError::OutputMissing(_))));
        assert!(matches!(
            ensure_non_empty(&dir.path().join("nope.mp4")),
            Err(ToolError::OutputMissing(_))
        ));
    }
}

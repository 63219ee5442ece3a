//! Joins the sampled clips into the final video.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::media::MediaTool;
use crate::sampler::CompilationPlan;

/// Concatenate the plan's clips, in order, into `output` using stream copy.
///
/// The join is written to a temporary file next to `output` and renamed into
/// place on success, so a failed run never touches an existing file at that
/// path. The clip files are removed whether or not the join succeeds. On
/// failure the tool's diagnostic is returned as [`Error::Concatenation`].
pub fn compile(tool: &dyn MediaTool, plan: &CompilationPlan, output: &Path) -> Result<()> {
    if plan.is_empty() {
        return Err(Error::Concatenation("no clips to compile".to_string()));
    }

    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let extension = output
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();
    // Dropping the path deletes whatever a failed run left there.
    let partial = tempfile::Builder::new()
        .prefix(".dashreel-")
        .suffix(&extension)
        .tempfile_in(parent)?
        .into_temp_path();
    // Only the name is reserved; the tool creates the file with normal permissions.
    fs::remove_file(&partial)?;

    tracing::info!("Compiling {} clips into {}", plan.len(), output.display());
    let result = tool.concatenate(&plan.clip_paths(), &partial);
    plan.remove_clip_files();

    if let Err(e) = result {
        return Err(Error::Concatenation(e.to_string()));
    }
    partial.persist(output).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClipRange, SamplerConfig};
    use crate::media::MediaFile;
    use crate::sampler::Sampler;
    use crate::testing::FakeTool;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn sampled_plan(tool: &FakeTool, scratch: &Path) -> CompilationPlan {
        let config = SamplerConfig {
            clip_range: ClipRange::new(3.0, 5.0).unwrap(),
            max_consecutive_failures: 10,
        };
        let mut files = vec![MediaFile::new("/src/a.mp4")];
        Sampler::new(tool, config, StdRng::seed_from_u64(2))
            .sample(&mut files, 12.0, scratch)
            .unwrap()
    }

    #[test]
    fn joins_clips_in_plan_order() {
        let tool = FakeTool::new().with_file("a.mp4", 120.0);
        let scratch = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("out.mp4");

        let plan = sampled_plan(&tool, scratch.path());
        compile(&tool, &plan, &output).unwrap();

        let expected: String = plan
            .clips()
            .iter()
            .map(|clip| format!("a.mp4@{:.3}+{:.3}\n", clip.start, clip.length))
            .collect();
        assert_eq!(fs::read_to_string(&output).unwrap(), expected);
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn failure_discards_partial_output_and_clips() {
        let tool = FakeTool::new()
            .with_file("a.mp4", 120.0)
            .failing_concat("Non-monotonous DTS in output stream");
        let scratch = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("out.mp4");

        let plan = sampled_plan(&tool, scratch.path());
        let err = compile(&tool, &plan, &output).unwrap_err();

        match err {
            Error::Concatenation(msg) => assert!(msg.contains("Non-monotonous DTS")),
            other => panic!("unexpected error: {other}"),
        }
        assert!(!output.exists());
        assert_eq!(fs::read_dir(scratch.path()).unwrap().count(), 0);
    }

    #[test]
    fn failure_keeps_an_existing_output() {
        let tool = FakeTool::new()
            .with_file("a.mp4", 120.0)
            .failing_concat("Unsafe file name");
        let scratch = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("out.mp4");
        fs::write(&output, b"last week's reel").unwrap();

        let plan = sampled_plan(&tool, scratch.path());
        assert!(compile(&tool, &plan, &output).is_err());

        assert_eq!(fs::read(&output).unwrap(), b"last week's reel");
        assert_eq!(fs::read_dir(out_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn success_replaces_an_existing_output() {
        let tool = FakeTool::new().with_file("a.mp4", 120.0);
        let scratch = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let output = out_dir.path().join("out.mp4");
        fs::write(&output, b"old").unwrap();

        let plan = sampled_plan(&tool, scratch.path());
        compile(&tool, &plan, &output).unwrap();

        assert!(fs::read_to_string(&output).unwrap().starts_with("a.mp4@"));
        assert_eq!(fs::read_dir(out_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn empty_plan_is_rejected() {
        let tool = FakeTool::new();
        let out_dir = tempfile::tempdir().unwrap();
        let err = compile(&tool, &CompilationPlan::default(), &out_dir.path().join("o.mp4"));
        assert!(matches!(err, Err(Error::Concatenation(_))));
    }
}

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{FrankError, Result};

use super::{Chapter, ManifestEntry};

/// Executes an external command line, failing on a non-zero exit.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &[String]) -> Result<()>;
}

/// Runs commands as child processes with captured output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &[String]) -> Result<()> {
        let command_line = command.join(" ");
        let Some((program, args)) = command.split_first() else {
            return Err(FrankError::ExternalTool {
                command: command_line,
                code: None,
                stderr: "empty command".to_string(),
            });
        };

        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| FrankError::ExternalTool {
                command: command_line.clone(),
                code: None,
                stderr: format!("Failed to start {program}: {e}"),
            })?;

        if !output.status.success() {
            return Err(FrankError::ExternalTool {
                command: command_line,
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        Ok(())
    }
}

/// Splits an `.m4b` audiobook into one `.m4a` file per chapter using ffmpeg
/// stream copy.
pub struct M4bSplitter {
    input: PathBuf,
    chapters: Vec<Chapter>,
    output_dir: PathBuf,
    ffmpeg_path: String,
    runner: Box<dyn CommandRunner>,
}

impl M4bSplitter {
    /// Create a splitter, creating `output_dir` if needed.
    pub fn new(
        input: impl Into<PathBuf>,
        chapters: Vec<Chapter>,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;

        Ok(Self {
            input: input.into(),
            chapters,
            output_dir,
            ffmpeg_path: "ffmpeg".to_string(),
            runner: Box::new(ProcessRunner),
        })
    }

    /// Create a splitter from manifest entries, numbering chapters from 1.
    pub fn from_manifest(
        input: impl Into<PathBuf>,
        manifest: &[ManifestEntry],
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let chapters = manifest
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                Chapter::new(entry.title.clone(), entry.start, entry.end, Some(index + 1))
            })
            .collect();

        Self::new(input, chapters, output_dir)
    }

    pub fn with_ffmpeg_path(mut self, ffmpeg_path: impl Into<String>) -> Self {
        self.ffmpeg_path = ffmpeg_path.into();
        self
    }

    pub fn with_runner(mut self, runner: Box<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    /// Build the ffmpeg command line that extracts `[start, end]` without re-encoding.
    pub fn build_ffmpeg_command(
        ffmpeg_path: &str,
        input: &Path,
        output: &Path,
        start: f64,
        end: f64,
    ) -> Vec<String> {
        vec![
            ffmpeg_path.to_string(),
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-ss".to_string(),
            start.to_string(),
            "-to".to_string(),
            end.to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().into_owned(),
        ]
    }

    /// Destination path: `NN_Title_With_Underscores.m4a`, without the prefix
    /// when the chapter has no ordinal.
    pub fn output_path_for_chapter(&self, chapter: &Chapter) -> PathBuf {
        let safe_title = chapter.title.replace(' ', "_");
        let file_name = match chapter.num {
            Some(num) => format!("{num:02}_{safe_title}.m4a"),
            None => format!("{safe_title}.m4a"),
        };
        self.output_dir.join(file_name)
    }

    /// Extract every chapter in order, returning the written paths.
    ///
    /// Stops at the first failing command; chapters already written stay on disk.
    pub async fn split(&self) -> Result<Vec<PathBuf>> {
        info!(
            "Splitting {} into {} chapters",
            self.input.display(),
            self.chapters.len()
        );

        let mut outputs = Vec::with_capacity(self.chapters.len());
        for chapter in &self.chapters {
            let output = self.output_path_for_chapter(chapter);
            let command = Self::build_ffmpeg_command(
                &self.ffmpeg_path,
                &self.input,
                &output,
                chapter.start,
                chapter.end,
            );

            debug!("Running command: {}", command.join(" "));
            self.runner.run(&command).await?;
            debug!("Wrote {}", chapter);

            outputs.push(output);
        }

        info!("Wrote {} chapter files to {}", outputs.len(), self.output_dir.display());
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingRunner {
        calls: Arc<Mutex<Vec<Vec<String>>>>,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl CommandRunner for RecordingRunner {
        async fn run(&self, command: &[String]) -> Result<()> {
            let mut calls = self.calls.lock().unwrap();
            calls.push(command.to_vec());
            if Some(calls.len()) == self.fail_on {
                return Err(FrankError::ExternalTool {
                    command: command.join(" "),
                    code: Some(1),
                    stderr: "simulated failure".to_string(),
                });
            }
            Ok(())
        }
    }

    #[test]
    fn test_build_ffmpeg_command() {
        let cmd = M4bSplitter::build_ffmpeg_command(
            "ffmpeg",
            Path::new("in.m4b"),
            Path::new("out.m4a"),
            0.0,
            10.5,
        );
        assert_eq!(
            cmd,
            vec!["ffmpeg", "-y", "-i", "in.m4b", "-ss", "0", "-to", "10.5", "-c", "copy", "out.m4a"]
        );
    }

    #[test]
    fn test_output_path_for_chapter() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let splitter = M4bSplitter::new("book.m4b", Vec::new(), &out).unwrap();
        assert!(out.is_dir());

        let numbered = Chapter::new("Intro", 0.0, 1.5, Some(1));
        assert_eq!(splitter.output_path_for_chapter(&numbered), out.join("01_Intro.m4a"));

        let spaced = Chapter::new("The Long Goodbye", 0.0, 1.0, Some(12));
        assert_eq!(
            splitter.output_path_for_chapter(&spaced),
            out.join("12_The_Long_Goodbye.m4a")
        );

        let unnumbered = Chapter::new("Epilogue part", 0.0, 1.0, None);
        assert_eq!(
            splitter.output_path_for_chapter(&unnumbered),
            out.join("Epilogue_part.m4a")
        );
    }

    #[test]
    fn test_from_manifest_numbers_chapters() {
        let dir = tempfile::tempdir().unwrap();
        let manifest = vec![
            ManifestEntry { title: "One".to_string(), start: 0.0, end: 1.0 },
            ManifestEntry { title: "Two".to_string(), start: 1.0, end: 2.0 },
        ];

        let splitter = M4bSplitter::from_manifest("book.m4b", &manifest, dir.path()).unwrap();
        let nums: Vec<Option<usize>> = splitter.chapters().iter().map(|c| c.num).collect();
        assert_eq!(nums, vec![Some(1), Some(2)]);
    }

    #[tokio::test]
    async fn test_split_invokes_runner_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner::default();
        let chapters = vec![
            Chapter::new("One", 0.0, 1.0, Some(1)),
            Chapter::new("Two", 1.0, 2.0, Some(2)),
        ];

        let splitter = M4bSplitter::new("input.m4b", chapters, dir.path())
            .unwrap()
            .with_ffmpeg_path("/usr/local/bin/ffmpeg")
            .with_runner(Box::new(runner.clone()));

        let outputs = splitter.split().await.unwrap();
        assert_eq!(outputs, vec![dir.path().join("01_One.m4a"), dir.path().join("02_Two.m4a")]);

        let calls = runner.calls.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0][0], "/usr/local/bin/ffmpeg");
        assert_eq!(calls[1][5], "1");
        assert_eq!(calls[1][7], "2");
        assert!(calls[1].last().unwrap().ends_with("02_Two.m4a"));
    }

    #[tokio::test]
    async fn test_split_stops_at_first_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = RecordingRunner {
            fail_on: Some(2),
            ..RecordingRunner::default()
        };
        let chapters = vec![
            Chapter::new("One", 0.0, 1.0, Some(1)),
            Chapter::new("Two", 1.0, 2.0, Some(2)),
            Chapter::new("Three", 2.0, 3.0, Some(3)),
        ];

        let splitter = M4bSplitter::new("input.m4b", chapters, dir.path())
            .unwrap()
            .with_runner(Box::new(runner.clone()));

        let result = splitter.split().await;
        assert!(matches!(result, Err(FrankError::ExternalTool { code: Some(1), .. })));
        assert_eq!(runner.calls.lock().unwrap().len(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_reports_exit_code() {
        let command = vec!["sh".to_string(), "-c".to_string(), "echo oops >&2; exit 3".to_string()];
        match ProcessRunner.run(&command).await {
            Err(FrankError::ExternalTool { command, code, stderr }) => {
                assert_eq!(command, "sh -c echo oops >&2; exit 3");
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "oops");
            }
            other => panic!("Expected ExternalTool error, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_process_runner_missing_binary() {
        let command = vec!["/nonexistent/ffmpeg-binary".to_string(), "-version".to_string()];
        let result = ProcessRunner.run(&command).await;
        assert!(matches!(result, Err(FrankError::ExternalTool { code: None, .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_success() {
        let command = vec!["true".to_string()];
        assert!(ProcessRunner.run(&command).await.is_ok());
    }
}

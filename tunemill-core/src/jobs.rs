//! Conversion jobs and the converter boundary.
//!
//! A [`Job`] is one unit of work: an input file, an output file, a unique
//! identifier and a display label. The scheduler owns the job and its state;
//! what "conversion" means is behind the [`Converter`] trait, so the
//! scheduler works for any unit of work with an `execute -> Result`
//! contract. [`FfmpegConverter`] is the production implementation.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::config::CoreConfig;

/// Lifecycle of a job: `Queued → Active → {Completed, Failed}`.
/// Completed and Failed are terminal; no transition leaves them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Queued,
    Active,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

/// One conversion unit of work.
#[derive(Debug, Clone)]
pub struct Job {
    /// Unique within a batch.
    pub id: String,
    pub input: PathBuf,
    pub output: PathBuf,
    /// Short human-readable form shown in the terminal view.
    pub label: String,
    pub state: JobState,
}

impl Job {
    pub fn new<S: Into<String>>(id: S, input: PathBuf, output: PathBuf, label: S) -> Self {
        Self {
            id: id.into(),
            input,
            output,
            label: label.into(),
            state: JobState::Queued,
        }
    }
}

/// Why a single conversion failed. Opaque to the scheduler beyond its
/// string form, which is what ends up in the error log.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("failed to launch ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("{0}")]
    Encoder(String),
}

/// Capability that turns one job into success or a typed failure.
///
/// Implementations must be callable from multiple worker threads at once;
/// each call receives a distinct job.
pub trait Converter: Send + Sync {
    fn execute(&self, job: &Job) -> Result<(), ConvertError>;
}

/// Converts audio files by spawning ffmpeg.
pub struct FfmpegConverter {
    codec_args: Vec<String>,
}

impl FfmpegConverter {
    pub fn new(config: &CoreConfig) -> Self {
        let mut codec_args = vec!["-c:a".to_string(), config.format.codec().to_string()];
        if config.format.is_lossy() {
            if let Some(kbps) = config.quality_kbps {
                codec_args.push("-b:a".to_string());
                codec_args.push(format!("{kbps}k"));
            }
        }
        Self { codec_args }
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-y")
            .arg("-i")
            .arg(input)
            // Carry source tags over to the converted file.
            .arg("-map_metadata")
            .arg("0")
            .arg("-vn");
        for arg in &self.codec_args {
            cmd.arg(arg);
        }
        cmd.arg(output);
        cmd
    }
}

impl Converter for FfmpegConverter {
    fn execute(&self, job: &Job) -> Result<(), ConvertError> {
        let output = self
            .command(&job.input, &job.output)
            .output()
            .map_err(ConvertError::Spawn)?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let cause = stderr
            .lines()
            .rev()
            .find(|line| !line.trim().is_empty())
            .unwrap_or("ffmpeg exited with an error")
            .trim()
            .to_string();
        Err(ConvertError::Encoder(cause))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::ffi::OsStr;

    fn test_config(format: OutputFormat, quality_kbps: Option<u32>) -> CoreConfig {
        let mut config = CoreConfig::new(PathBuf::from("a"), PathBuf::from("b"));
        config.format = format;
        config.quality_kbps = quality_kbps;
        config
    }

    #[test]
    fn test_job_starts_queued() {
        let job = Job::new("a/b.flac", PathBuf::from("in"), PathBuf::from("out"), "b.flac");
        assert_eq!(job.state, JobState::Queued);
        assert!(!job.state.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }

    #[test]
    fn test_ffmpeg_command_structure() {
        let converter = FfmpegConverter::new(&test_config(OutputFormat::Opus, Some(128)));
        let cmd = converter.command(Path::new("in.flac"), Path::new("out.opus"));

        assert_eq!(cmd.get_program(), "ffmpeg");
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert!(args.contains(&OsStr::new("libopus")));
        assert!(args.contains(&OsStr::new("128k")));
        assert!(args.contains(&OsStr::new("-map_metadata")));
        assert_eq!(args.last(), Some(&OsStr::new("out.opus")));
    }

    #[test]
    fn test_lossless_ignores_bitrate() {
        let converter = FfmpegConverter::new(&test_config(OutputFormat::Flac, Some(128)));
        let cmd = converter.command(Path::new("in.wav"), Path::new("out.flac"));
        let args: Vec<&OsStr> = cmd.get_args().collect();
        assert!(!args.contains(&OsStr::new("128k")));
        assert!(args.contains(&OsStr::new("flac")));
    }
}

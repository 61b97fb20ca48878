//! Core configuration for a conversion run.
//!
//! `CoreConfig` collects everything the library needs to mirror an archive
//! into a portable copy: the two library roots, where log files go, the
//! target audio format, an optional encoder bitrate, and the worker count.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{CoreError, CoreResult};

/// Target audio formats, each tied to its file extension and ffmpeg encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Aiff,
    Alac,
    Au,
    Flac,
    M4a,
    Mp2,
    Mp3,
    Opus,
    Speex,
    Vorbis,
    Wav,
    WavPack,
}

impl OutputFormat {
    /// File extension used for converted files.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Aiff => "aiff",
            OutputFormat::Alac => "m4a",
            OutputFormat::Au => "au",
            OutputFormat::Flac => "flac",
            OutputFormat::M4a => "m4a",
            OutputFormat::Mp2 => "mp2",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Opus => "opus",
            OutputFormat::Speex => "spx",
            OutputFormat::Vorbis => "ogg",
            OutputFormat::Wav => "wav",
            OutputFormat::WavPack => "wv",
        }
    }

    /// ffmpeg "-c:a" encoder name for this format.
    pub fn codec(&self) -> &'static str {
        match self {
            OutputFormat::Aiff => "pcm_s16be",
            OutputFormat::Alac => "alac",
            OutputFormat::Au => "pcm_s16be",
            OutputFormat::Flac => "flac",
            OutputFormat::M4a => "aac",
            OutputFormat::Mp2 => "mp2",
            OutputFormat::Mp3 => "libmp3lame",
            OutputFormat::Opus => "libopus",
            OutputFormat::Speex => "libspeex",
            OutputFormat::Vorbis => "libvorbis",
            OutputFormat::Wav => "pcm_s16le",
            OutputFormat::WavPack => "wavpack",
        }
    }

    /// Whether a bitrate setting is meaningful for this format.
    pub fn is_lossy(&self) -> bool {
        matches!(
            self,
            OutputFormat::M4a
                | OutputFormat::Mp2
                | OutputFormat::Mp3
                | OutputFormat::Opus
                | OutputFormat::Speex
                | OutputFormat::Vorbis
        )
    }

    /// All supported formats, for help text.
    pub const ALL: [OutputFormat; 12] = [
        OutputFormat::Aiff,
        OutputFormat::Alac,
        OutputFormat::Au,
        OutputFormat::Flac,
        OutputFormat::M4a,
        OutputFormat::Mp2,
        OutputFormat::Mp3,
        OutputFormat::Opus,
        OutputFormat::Speex,
        OutputFormat::Vorbis,
        OutputFormat::Wav,
        OutputFormat::WavPack,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OutputFormat::Aiff => "aiff",
            OutputFormat::Alac => "alac",
            OutputFormat::Au => "au",
            OutputFormat::Flac => "flac",
            OutputFormat::M4a => "m4a",
            OutputFormat::Mp2 => "mp2",
            OutputFormat::Mp3 => "mp3",
            OutputFormat::Opus => "opus",
            OutputFormat::Speex => "speex",
            OutputFormat::Vorbis => "vorbis",
            OutputFormat::Wav => "wav",
            OutputFormat::WavPack => "wavpack",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for OutputFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        OutputFormat::ALL
            .iter()
            .find(|fmt| fmt.name() == lower)
            .copied()
            .ok_or_else(|| {
                CoreError::Config(format!(
                    "unknown output format '{}' (expected one of: {})",
                    s,
                    OutputFormat::ALL.map(|f| f.name()).join(", ")
                ))
            })
    }
}

/// Configuration for one conversion run.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Root of the source (archive) library.
    pub archive_dir: PathBuf,
    /// Root of the portable library being mirrored into.
    pub portable_dir: PathBuf,
    /// Directory for the per-run log files.
    pub log_dir: PathBuf,
    /// Target audio format for converted files.
    pub format: OutputFormat,
    /// Optional encoder bitrate in kbit/s; ignored for lossless formats.
    pub quality_kbps: Option<u32>,
    /// Number of concurrent conversion workers.
    pub workers: usize,
}

impl CoreConfig {
    /// Creates a configuration with the default format (opus) and a worker
    /// per logical CPU, logs under `<portable>/logs`.
    pub fn new(archive_dir: PathBuf, portable_dir: PathBuf) -> Self {
        let log_dir = portable_dir.join("logs");
        Self {
            archive_dir,
            portable_dir,
            log_dir,
            format: OutputFormat::Opus,
            quality_kbps: None,
            workers: num_cpus::get().max(1),
        }
    }

    /// Validates the configuration before a run.
    pub fn validate(&self) -> CoreResult<()> {
        if self.workers == 0 {
            return Err(CoreError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        if !self.archive_dir.is_dir() {
            return Err(CoreError::Config(format!(
                "archive path '{}' is not a directory",
                self.archive_dir.display()
            )));
        }
        if self.archive_dir == self.portable_dir {
            return Err(CoreError::Config(
                "archive and portable paths must differ".to_string(),
            ));
        }
        if let Some(kbps) = self.quality_kbps {
            if kbps == 0 {
                return Err(CoreError::Config("bitrate must be non-zero".to_string()));
            }
            if !self.format.is_lossy() {
                log::warn!(
                    "bitrate setting ignored for lossless format {}",
                    self.format
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_round_trip() {
        for fmt in OutputFormat::ALL {
            assert_eq!(fmt.name().parse::<OutputFormat>().unwrap(), fmt);
        }
        assert_eq!("OPUS".parse::<OutputFormat>().unwrap(), OutputFormat::Opus);
        assert!("shorten".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_lossy_formats_take_bitrate() {
        assert!(OutputFormat::Opus.is_lossy());
        assert!(OutputFormat::Mp3.is_lossy());
        assert!(!OutputFormat::Flac.is_lossy());
        assert!(!OutputFormat::Wav.is_lossy());
    }

    #[test]
    fn test_validate_rejects_zero_workers() {
        let tmp = std::env::temp_dir();
        let mut config = CoreConfig::new(tmp.clone(), tmp.join("portable"));
        config.workers = 0;
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_same_roots() {
        let tmp = std::env::temp_dir();
        let config = CoreConfig::new(tmp.clone(), tmp);
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }
}

//! Core library for mirroring a music archive into a portable, transcoded
//! copy.
//!
//! The interesting machinery is the batch subsystem: a bounded worker pool
//! with a single coordinating thread ([`scheduler`]), a pure progress
//! estimator ([`progress`]), a buffered leveled log sink ([`logging`]) and
//! an in-place terminal view ([`terminal`]). Discovery, directory mirroring
//! and the actual ffmpeg invocation feed that core but stay behind small
//! seams (`LibraryPlan`, the [`Converter`] trait), so the scheduler works
//! for any unit of work with an `execute -> Result` contract.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use tunemill_core::{convert_library, CoreConfig, NullRenderer};
//!
//! let mut config = CoreConfig::new(
//!     PathBuf::from("/music/archive"),
//!     PathBuf::from("/music/portable"),
//! );
//! config.quality_kbps = Some(128);
//!
//! let report = convert_library(&config, &mut NullRenderer).unwrap();
//! println!(
//!     "{} converted, {} failed",
//!     report.summary.succeeded,
//!     report.summary.failed.len()
//! );
//! ```

pub mod config;
pub mod discovery;
pub mod error;
pub mod jobs;
pub mod library;
pub mod logging;
pub mod progress;
pub mod scheduler;
pub mod sync;
pub mod terminal;
pub mod utils;

// Re-exports for public API
pub use config::{CoreConfig, OutputFormat};
pub use discovery::{scan_library, LibraryPlan};
pub use error::{CoreError, CoreResult};
pub use jobs::{ConvertError, Converter, FfmpegConverter, Job, JobState};
pub use library::{convert_library, ConvertReport};
pub use logging::{Level, LogSink};
pub use progress::{estimate, ProgressSnapshot};
pub use scheduler::{JobFailure, JobScheduler, Summary};
pub use sync::{copy_images, mirror_directories};
pub use terminal::{NullRenderer, ProgressRender, TerminalRenderer};
pub use utils::{format_clock, format_duration};

//! Top-level orchestration of one sync run.

use crate::config::CoreConfig;
use crate::discovery::scan_library;
use crate::error::CoreResult;
use crate::jobs::FfmpegConverter;
use crate::logging::{Level, LogSink};
use crate::scheduler::{JobScheduler, Summary};
use crate::sync::{copy_images, mirror_directories};
use crate::terminal::ProgressRender;

/// Everything a run did, for the caller's final report.
#[derive(Debug, Clone, Default)]
pub struct ConvertReport {
    pub dirs_created: usize,
    pub images_copied: usize,
    pub summary: Summary,
}

impl ConvertReport {
    /// True when there was nothing to convert at all.
    pub fn up_to_date(&self) -> bool {
        self.summary.total() == 0
    }
}

/// Mirrors the archive into the portable library: scan, create directories,
/// copy images, then convert audio through the worker pool. Job failures are
/// contained in the returned summary; only configuration, I/O and scheduler
/// integrity problems surface as errors.
pub fn convert_library(
    config: &CoreConfig,
    renderer: &mut dyn ProgressRender,
) -> CoreResult<ConvertReport> {
    config.validate()?;

    let plan = scan_library(config)?;
    let dirs_created = mirror_directories(&plan)?;
    let images_copied = copy_images(&plan)?;

    let sink = LogSink::new(&config.log_dir);
    sink.append(
        Level::Debug,
        format!(
            "sync plan — {dirs_created} directories created, {images_copied} images copied, {} conversions",
            plan.jobs.len()
        ),
    );

    let converter = FfmpegConverter::new(config);
    let summary =
        JobScheduler::new(&sink).run(plan.jobs, &converter, config.workers, renderer)?;

    Ok(ConvertReport {
        dirs_created,
        images_copied,
        summary,
    })
}

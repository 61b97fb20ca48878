//! Applies the non-conversion half of a [`LibraryPlan`]: mirroring the
//! directory tree and copying image files. Audio conversion is the
//! scheduler's job.

use std::fs;

use crate::discovery::LibraryPlan;
use crate::error::CoreResult;

/// Creates every missing portable directory. Directories that appeared
/// since the scan are fine; `create_dir_all` tolerates them.
pub fn mirror_directories(plan: &LibraryPlan) -> CoreResult<usize> {
    for dir in &plan.dirs {
        log::debug!("creating directory {}", dir.display());
        fs::create_dir_all(dir)?;
    }
    Ok(plan.dirs.len())
}

/// Copies every missing image into the mirror.
pub fn copy_images(plan: &LibraryPlan) -> CoreResult<usize> {
    for (src, dest) in &plan.images {
        log::debug!("copying {} -> {}", src.display(), dest.display());
        fs::copy(src, dest)?;
    }
    Ok(plan.images.len())
}

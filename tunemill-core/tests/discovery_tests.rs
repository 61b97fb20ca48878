// tunemill-core/tests/discovery_tests.rs

use std::fs::{self, File};

use tempfile::tempdir;
use tunemill_core::{
    convert_library, copy_images, mirror_directories, scan_library, CoreConfig, NullRenderer,
    OutputFormat,
};

/// Builds a small archive: two albums with audio, art, and noise files.
fn build_archive(archive: &std::path::Path) {
    fs::create_dir_all(archive.join("Album One")).unwrap();
    fs::create_dir_all(archive.join("Album Two/Disc 1")).unwrap();
    File::create(archive.join("Album One/01 - Intro.flac")).unwrap();
    File::create(archive.join("Album One/02 - Theme.MP3")).unwrap();
    File::create(archive.join("Album One/cover.jpg")).unwrap();
    File::create(archive.join("Album Two/Disc 1/01 - Opening.wav")).unwrap();
    File::create(archive.join("Album Two/folder.PNG")).unwrap();
    File::create(archive.join("Album Two/rip-notes.txt")).unwrap();
}

fn config_for(root: &std::path::Path) -> CoreConfig {
    let mut config = CoreConfig::new(root.join("archive"), root.join("portable"));
    config.format = OutputFormat::Opus;
    config.workers = 2;
    config
}

#[test]
fn test_scan_partitions_the_archive() {
    let root = tempdir().unwrap();
    build_archive(&root.path().join("archive"));
    let config = config_for(root.path());

    let plan = scan_library(&config).unwrap();

    let dirs: Vec<String> = plan
        .dirs
        .iter()
        .map(|d| {
            d.strip_prefix(&config.portable_dir)
                .unwrap()
                .display()
                .to_string()
        })
        .collect();
    assert_eq!(dirs, vec!["Album One", "Album Two", "Album Two/Disc 1"]);

    let job_ids: Vec<&str> = plan.jobs.iter().map(|j| j.id.as_str()).collect();
    assert_eq!(
        job_ids,
        vec![
            "Album One/01 - Intro.flac",
            "Album One/02 - Theme.MP3",
            "Album Two/Disc 1/01 - Opening.wav",
        ]
    );
    // Destinations carry the target extension.
    for job in &plan.jobs {
        assert_eq!(job.output.extension().unwrap(), "opus");
        assert!(job.output.starts_with(&config.portable_dir));
    }

    assert_eq!(plan.images.len(), 2);
    // The .txt file appears nowhere.
    assert!(plan.jobs.iter().all(|j| !j.id.contains("rip-notes")));
    assert!(plan.images.iter().all(|(src, _)| !src.ends_with("rip-notes.txt")));
}

#[test]
fn test_scan_skips_existing_destinations() {
    let root = tempdir().unwrap();
    build_archive(&root.path().join("archive"));
    let config = config_for(root.path());

    // Pre-populate part of the mirror.
    fs::create_dir_all(config.portable_dir.join("Album One")).unwrap();
    File::create(config.portable_dir.join("Album One/01 - Intro.opus")).unwrap();
    File::create(config.portable_dir.join("Album One/cover.jpg")).unwrap();

    let plan = scan_library(&config).unwrap();

    assert!(plan.dirs.iter().all(|d| !d.ends_with("Album One")));
    assert!(plan.jobs.iter().all(|j| j.id != "Album One/01 - Intro.flac"));
    // The other Album One track is still pending.
    assert!(plan.jobs.iter().any(|j| j.id == "Album One/02 - Theme.MP3"));
    assert_eq!(plan.images.len(), 1, "existing cover.jpg is skipped");
}

#[test]
fn test_mirror_and_copy_apply_the_plan() {
    let root = tempdir().unwrap();
    build_archive(&root.path().join("archive"));
    let config = config_for(root.path());

    let plan = scan_library(&config).unwrap();
    let dirs_created = mirror_directories(&plan).unwrap();
    let images_copied = copy_images(&plan).unwrap();

    assert_eq!(dirs_created, 3);
    assert_eq!(images_copied, 2);
    assert!(config.portable_dir.join("Album Two/Disc 1").is_dir());
    assert!(config.portable_dir.join("Album One/cover.jpg").is_file());
    assert!(config.portable_dir.join("Album Two/folder.PNG").is_file());

    // Re-scan: the non-audio work is done, only conversions remain.
    let rescan = scan_library(&config).unwrap();
    assert!(rescan.dirs.is_empty());
    assert!(rescan.images.is_empty());
    assert_eq!(rescan.jobs.len(), 3);
}

#[test]
fn test_empty_archive_yields_empty_plan() {
    let root = tempdir().unwrap();
    fs::create_dir_all(root.path().join("archive")).unwrap();
    let config = config_for(root.path());

    let plan = scan_library(&config).unwrap();
    assert!(plan.is_empty());
}

#[test]
fn test_up_to_date_library_converts_nothing() {
    let root = tempdir().unwrap();
    let archive = root.path().join("archive");
    fs::create_dir_all(archive.join("Album")).unwrap();
    File::create(archive.join("Album/song.flac")).unwrap();
    let config = config_for(root.path());

    // Mirror is already complete, so convert_library never reaches ffmpeg.
    fs::create_dir_all(config.portable_dir.join("Album")).unwrap();
    File::create(config.portable_dir.join("Album/song.opus")).unwrap();

    let report = convert_library(&config, &mut NullRenderer).unwrap();
    assert!(report.up_to_date());
    assert_eq!(report.dirs_created, 0);
    assert_eq!(report.images_copied, 0);
}

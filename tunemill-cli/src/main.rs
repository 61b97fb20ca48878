// tunemill-cli/src/main.rs
//
// Command-line interface for the tunemill music library converter.
//
// Responsibilities:
// - Defining the CLI argument structures (`Cli`, `Commands`, `SyncArgs`).
// - Validating paths and assembling the `CoreConfig`.
// - Choosing a progress renderer (live block on a tty, silent otherwise).
// - Invoking `tunemill_core::convert_library` and printing the final tally.
// - Mapping outcomes to exit codes (1 fatal error, 2 when jobs failed).

use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::Instant;

use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use tunemill_core::{
    convert_library, format_duration, scan_library, ConvertReport, CoreConfig, NullRenderer,
    OutputFormat, ProgressRender, TerminalRenderer,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Tunemill: portable music library converter",
    long_about = "Mirrors a music archive into a portable copy, transcoding audio with ffmpeg \
                  while keeping directory structure and album art."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mirrors the archive into the portable library, converting audio
    Sync(SyncArgs),
}

#[derive(Parser, Debug)]
struct SyncArgs {
    /// Root of the source (archive) music library
    #[arg(required = true, value_name = "ARCHIVE_DIR")]
    archive_dir: PathBuf,

    /// Root of the portable library to mirror into
    #[arg(required = true, value_name = "PORTABLE_DIR")]
    portable_dir: PathBuf,

    /// Target audio format (aiff, alac, au, flac, m4a, mp2, mp3, opus,
    /// speex, vorbis, wav, wavpack)
    #[arg(short, long, value_name = "FORMAT", default_value = "opus")]
    format: OutputFormat,

    /// Encoder bitrate in kbit/s (lossy formats only)
    #[arg(short, long, value_name = "KBPS")]
    quality: Option<u32>,

    /// Number of concurrent conversions (defaults to the logical CPU count)
    #[arg(short, long, value_name = "COUNT")]
    jobs: Option<usize>,

    /// Directory for log files (defaults to PORTABLE_DIR/logs)
    #[arg(long, value_name = "LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Disable the live progress block
    #[arg(long)]
    no_progress: bool,

    /// Scan and report what would be done without writing anything
    #[arg(long)]
    dry_run: bool,
}

fn run_sync(args: SyncArgs) -> Result<ConvertReport, Box<dyn std::error::Error>> {
    let start = Instant::now();

    let archive_dir = args
        .archive_dir
        .canonicalize()
        .map_err(|e| format!("Invalid archive path '{}': {}", args.archive_dir.display(), e))?;
    if !args.dry_run {
        fs::create_dir_all(&args.portable_dir).map_err(|e| {
            format!(
                "Cannot create portable directory '{}': {}",
                args.portable_dir.display(),
                e
            )
        })?;
    }

    let mut config = CoreConfig::new(archive_dir, args.portable_dir);
    config.format = args.format;
    config.quality_kbps = args.quality;
    if let Some(jobs) = args.jobs {
        config.workers = jobs;
    }
    if let Some(log_dir) = args.log_dir {
        config.log_dir = log_dir;
    }

    println!(
        "{} {}",
        "Tunemill sync started:".bold(),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    println!("{} {}", "Archive:".bold(), config.archive_dir.display());
    println!("{} {}", "Portable:".bold(), config.portable_dir.display());
    println!(
        "{} {} ({} workers)",
        "Format:".bold(),
        config.format,
        config.workers
    );
    println!("{} {}", "Logs:".bold(), config.log_dir.display());
    println!();

    if args.dry_run {
        config.validate()?;
        let plan = scan_library(&config)?;
        println!(
            "{} {} directories to create, {} images to copy, {} files to convert.",
            "Dry run:".bold(),
            plan.dirs.len(),
            plan.images.len(),
            plan.jobs.len()
        );
        for job in &plan.jobs {
            println!("  {} -> {}", job.input.display(), job.output.display());
        }
        return Ok(ConvertReport::default());
    }

    let mut live;
    let mut silent;
    let renderer: &mut dyn ProgressRender =
        if args.no_progress || !console::user_attended_stderr() {
            silent = NullRenderer;
            &mut silent
        } else {
            live = TerminalRenderer::new();
            &mut live
        };

    let report = convert_library(&config, renderer)?;

    println!();
    if report.dirs_created > 0 || report.images_copied > 0 {
        println!(
            "Mirrored {} new directories, copied {} images.",
            report.dirs_created, report.images_copied
        );
    }
    if report.up_to_date() {
        println!("{}", "0 files converted. Your library is up to date.".green());
    } else {
        let converted = format!("{} file(s) converted", report.summary.succeeded);
        if report.summary.is_clean() {
            println!("{}.", converted.green());
        } else {
            println!(
                "{}, {}:",
                converted.green(),
                format!("{} failed", report.summary.failed.len()).red().bold()
            );
            for failure in &report.summary.failed {
                println!("  {} {} — {}", "✗".red(), failure.id, failure.cause);
            }
        }
    }
    println!(
        "Total sync time: {}",
        format_duration(start.elapsed()).bold()
    );

    Ok(report)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Sync(args) => run_sync(args),
    };

    match result {
        Ok(report) if report.summary.is_clean() => {}
        Ok(_) => process::exit(2),
        Err(e) => {
            eprintln!("{} {}", "Error:".red().bold(), e);
            process::exit(1);
        }
    }
}

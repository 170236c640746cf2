use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use walkdir::WalkDir;

use crate::ui::prelude::*;

use super::encoder::EncoderKind;
use super::error::ConvertError;
use super::planner::{self, Dimensions, FilterPlan};
use super::probe::{self, MediaDescriptor};
use super::runner::{EncodeRunOptions, EncodeRunner, SystemFfmpegRunner};

const SUPPORTED_EXTENSIONS: &[&str] = &["mp4", "mkv"];
const OUTPUT_EXTENSION: &str = "mp4";

/// Fully resolved settings for one batch run, assembled from CLI flags and
/// the persisted config before the loop starts.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub target: Dimensions,
    pub subtitle_font_size: u32,
    pub encoder: EncoderKind,
    pub burn_subtitles: bool,
    pub force: bool,
    pub dry_run: bool,
    pub verbose: bool,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub converted: usize,
    pub skipped: usize,
    pub failed: usize,
}

enum FileOutcome {
    Converted(PathBuf),
    Skipped(String),
}

/// Convert every supported video in the input directory, one at a time.
///
/// Per-file probe and encode failures are reported and the batch continues;
/// an interrupt aborts between files.
pub fn run(settings: &BatchSettings) -> Result<RunSummary> {
    let files = find_video_files(&settings.input_dir)?;
    if files.is_empty() {
        emit(
            Level::Warn,
            "convert.empty",
            &format!(
                "No supported video files ({}) found in {}",
                SUPPORTED_EXTENSIONS.join(", "),
                settings.input_dir.display()
            ),
            None,
        );
        return Ok(RunSummary::default());
    }

    emit(
        Level::Info,
        "convert.found",
        &format!("Found {} video file(s)", files.len()),
        None,
    );
    emit(
        Level::Info,
        "convert.output_dir",
        &format!("Output directory: {}", settings.output_dir.display()),
        None,
    );

    fs::create_dir_all(&settings.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            settings.output_dir.display()
        )
    })?;

    let interrupted = install_interrupt_handler()?;
    let runner = SystemFfmpegRunner;
    let total = files.len();
    let mut summary = RunSummary::default();

    for (index, input) in files.iter().enumerate() {
        if interrupted.load(Ordering::SeqCst) {
            return Err(ConvertError::Interrupted.into());
        }

        separator(true);
        emit(
            Level::Info,
            "convert.file.start",
            &format!(
                "[{}/{}] Processing: {}",
                index + 1,
                total,
                display_name(input)
            ),
            None,
        );

        match convert_one(settings, &runner, input) {
            Ok(FileOutcome::Converted(output)) => {
                summary.converted += 1;
                emit(
                    Level::Success,
                    "convert.file.done",
                    &format!("Conversion completed: {}", display_name(&output)),
                    None,
                );
            }
            Ok(FileOutcome::Skipped(reason)) => {
                summary.skipped += 1;
                emit(Level::Info, "convert.file.skipped", &format!("Skipping: {reason}"), None);
            }
            Err(err @ ConvertError::Probe { .. }) => {
                summary.failed += 1;
                emit(
                    Level::Warn,
                    "convert.file.probe_failed",
                    &format!("{err}, skipping file"),
                    None,
                );
            }
            Err(err) => {
                summary.failed += 1;
                emit(
                    Level::Error,
                    "convert.file.failed",
                    &format!("Conversion failed: {err}"),
                    None,
                );
            }
        }
    }

    separator(false);
    emit(
        Level::Info,
        "convert.summary",
        &format!(
            "Converted: {}, skipped: {}, failed: {} ({} file(s) total)",
            summary.converted, summary.skipped, summary.failed, total
        ),
        None,
    );
    if summary.converted > 0 {
        emit(
            Level::Success,
            "convert.summary.done",
            &format!("Output directory: {}", settings.output_dir.display()),
            None,
        );
    }

    Ok(summary)
}

fn convert_one(
    settings: &BatchSettings,
    runner: &dyn EncodeRunner,
    input: &Path,
) -> Result<FileOutcome, ConvertError> {
    let media = probe::probe_media(input)?;
    emit(
        Level::Info,
        "convert.file.media",
        &format!(
            "{}x{}, {:.1} seconds",
            media.width, media.height, media.duration_seconds
        ),
        None,
    );

    let subtitle = if settings.burn_subtitles {
        find_sidecar_subtitle(input)
    } else {
        None
    };
    if settings.burn_subtitles {
        match &subtitle {
            Some(path) => emit(
                Level::Info,
                "convert.file.subtitles",
                &format!("Found subtitles: {}", display_name(path)),
                None,
            ),
            None => emit(Level::Info, "convert.file.subtitles", "No subtitle file found", None),
        }
    }

    if at_target_resolution(&media, settings.target) && subtitle.is_none() {
        return Ok(FileOutcome::Skipped(format!(
            "already {}x{} with no subtitles to embed",
            settings.target.width, settings.target.height
        )));
    }

    let output = output_path(settings, input, subtitle.is_some());
    if output.exists() && !settings.force {
        return Ok(FileOutcome::Skipped(format!(
            "output already exists: {}",
            display_name(&output)
        )));
    }

    let plan = planner::plan_filters(
        &media,
        settings.target,
        subtitle.as_deref(),
        settings.subtitle_font_size,
    )?;

    let args = ffmpeg_args(input, &output, settings.encoder, &plan);
    if settings.dry_run {
        emit(
            Level::Info,
            "convert.file.command",
            &format!("ffmpeg {}", args.join(" ")),
            None,
        );
        return Ok(FileOutcome::Skipped("dry run".to_string()));
    }
    if is_debug_enabled() {
        emit(
            Level::Debug,
            "convert.file.command",
            &format!("ffmpeg {}", args.join(" ")),
            None,
        );
    }

    let options = EncodeRunOptions {
        duration_seconds: media.duration_seconds,
        verbose: settings.verbose,
    };
    if let Err(err) = runner.run(&args, options) {
        // Remove the partial output so a re-run does not skip the file.
        if output.exists() {
            let _ = fs::remove_file(&output);
        }
        return Err(err);
    }

    Ok(FileOutcome::Converted(output))
}

/// Assemble the full ffmpeg invocation: input, optional filter chain,
/// encoder selection with its quality table, audio pass-through and the
/// web-optimization flag.
fn ffmpeg_args(
    input: &Path,
    output: &Path,
    encoder: EncoderKind,
    plan: &FilterPlan,
) -> Vec<String> {
    let mut args = vec![
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
    ];

    if let Some(filter) = plan.render() {
        args.push("-vf".to_string());
        args.push(filter);
    }

    args.push("-c:v".to_string());
    args.push(encoder.codec_name().to_string());
    args.extend(encoder.quality_args().iter().map(|arg| arg.to_string()));

    args.push("-c:a".to_string());
    args.push("copy".to_string());
    args.push("-movflags".to_string());
    args.push("+faststart".to_string());

    args.push(output.to_string_lossy().into_owned());
    args
}

/// Supported video files directly inside the input directory, sorted by
/// name. Extension matching is case-insensitive so `.MP4` uploads from
/// cameras are picked up too.
fn find_video_files(input_dir: &Path) -> Result<Vec<PathBuf>> {
    if !input_dir.is_dir() {
        anyhow::bail!(
            "Input path {} does not exist or is not a directory",
            input_dir.display()
        );
    }

    let mut files: Vec<PathBuf> = WalkDir::new(input_dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| has_supported_extension(path))
        .collect();

    files.sort();
    Ok(files)
}

fn has_supported_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// Same-stem `.srt` file next to the input, if any.
pub(super) fn find_sidecar_subtitle(input: &Path) -> Option<PathBuf> {
    let candidate = input.with_extension("srt");
    candidate.exists().then_some(candidate)
}

fn at_target_resolution(media: &MediaDescriptor, target: Dimensions) -> bool {
    media.width == target.width && media.height == target.height
}

/// Output file name derived from the input stem plus a suffix recording
/// whether subtitles were burned in. The container is always MP4.
fn output_path(settings: &BatchSettings, input: &Path, with_subtitles: bool) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let suffix = if with_subtitles {
        format!("_{}p_subs", settings.target.height)
    } else {
        format!("_{}p", settings.target.height)
    };
    settings
        .output_dir
        .join(format!("{stem}{suffix}.{OUTPUT_EXTENSION}"))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Flag-based Ctrl-C handling: the first interrupt finishes the current
/// file and aborts before the next one, a second interrupt exits
/// immediately.
fn install_interrupt_handler() -> Result<Arc<AtomicBool>> {
    let interrupted = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&interrupted);

    ctrlc::set_handler(move || {
        if handler_flag.load(Ordering::SeqCst) {
            std::process::exit(1);
        }
        eprintln!("\nInterrupt received, finishing current file (press Ctrl-C again to force quit)");
        handler_flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to install interrupt handler")?;

    Ok(interrupted)
}

use std::env;

use anyhow::{Context, Result};
use serde_json::json;

use crate::ui::prelude::*;

use super::batch::{self, BatchSettings};
use super::cli::{ConvertArgs, InspectArgs};
use super::config::ConvertConfig;
use super::encoder;
use super::error::ConvertError;
use super::planner;
use super::probe;

pub fn handle_convert(args: ConvertArgs) -> Result<()> {
    ensure_ffmpeg_tools()?;

    let config = ConvertConfig::load()?;

    let encoder = match args.encoder.or(config.encoder) {
        Some(kind) => kind,
        None => encoder::detect_encoder()?,
    };
    emit(
        Level::Info,
        "convert.encoder",
        &format!("Using encoder: {} ({})", encoder.label(), encoder.codec_name()),
        None,
    );

    let input_dir = match args.input_dir {
        Some(dir) => dir,
        None => env::current_dir().context("Failed to determine current directory")?,
    };
    let output_dir = args
        .output_dir
        .or(config.output_dir)
        .unwrap_or_else(|| input_dir.join("converted"));

    let settings = BatchSettings {
        input_dir,
        output_dir,
        target: planner::TARGET,
        subtitle_font_size: args.font_size.unwrap_or(config.subtitle_font_size),
        encoder,
        burn_subtitles: !args.no_subtitles,
        force: args.force,
        dry_run: args.dry_run,
        verbose: args.verbose,
    };

    batch::run(&settings)?;
    Ok(())
}

pub fn handle_inspect(args: InspectArgs) -> Result<()> {
    ensure_ffmpeg_tools()?;

    let media = probe::probe_media(&args.file)?;
    let subtitle = args
        .subtitles
        .or_else(|| batch::find_sidecar_subtitle(&args.file));

    let config = ConvertConfig::load()?;
    let plan = planner::plan_filters(
        &media,
        planner::TARGET,
        subtitle.as_deref(),
        config.subtitle_font_size,
    )?;

    emit(
        Level::Info,
        "inspect.media",
        &format!(
            "{}: {}x{}, {:.1} seconds",
            args.file.display(),
            media.width,
            media.height,
            media.duration_seconds
        ),
        Some(json!({
            "width": media.width,
            "height": media.height,
            "duration_seconds": media.duration_seconds,
        })),
    );

    match &subtitle {
        Some(path) => emit(
            Level::Info,
            "inspect.subtitles",
            &format!("Subtitles would be burned in from {}", path.display()),
            None,
        ),
        None => emit(Level::Info, "inspect.subtitles", "No subtitle file found", None),
    }

    if plan.is_empty() {
        emit(
            Level::Success,
            "inspect.plan",
            "No filtering needed, file would be skipped",
            None,
        );
    } else if let Some(filter) = plan.render() {
        emit(
            Level::Info,
            "inspect.plan",
            &format!("Filter chain: {filter}"),
            Some(json!({ "filter": filter })),
        );
    }

    Ok(())
}

fn ensure_ffmpeg_tools() -> Result<(), ConvertError> {
    for tool in ["ffmpeg", "ffprobe"] {
        which::which(tool).map_err(|_| ConvertError::MissingDependency { tool })?;
    }
    Ok(())
}

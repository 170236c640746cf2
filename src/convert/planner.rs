use std::path::{Path, PathBuf};

use super::error::ConvertError;
use super::probe::MediaDescriptor;

/// Frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The fixed output frame all conversions target.
pub const TARGET: Dimensions = Dimensions::new(1920, 1080);

/// One stage of the `-vf` chain.
///
/// Stage order is significant: scaling and padding must come before subtitle
/// burn-in so subtitles are rendered at the final frame geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterStage {
    ScalePad {
        scaled: Dimensions,
        target: Dimensions,
        pad_x: u32,
        pad_y: u32,
    },
    SubtitleBurn {
        path: PathBuf,
        font_size: u32,
    },
}

impl FilterStage {
    fn render(&self) -> String {
        match self {
            FilterStage::ScalePad {
                scaled,
                target,
                pad_x,
                pad_y,
            } => {
                if scaled == target {
                    format!("scale={}:{}", scaled.width, scaled.height)
                } else {
                    format!(
                        "scale={}:{},pad={}:{}:{}:{}:black",
                        scaled.width, scaled.height, target.width, target.height, pad_x, pad_y
                    )
                }
            }
            FilterStage::SubtitleBurn { path, font_size } => {
                format!(
                    "subtitles='{}':force_style='FontSize={}'",
                    escape_filter_path(path),
                    font_size
                )
            }
        }
    }
}

/// Ordered filter stages for one conversion. An empty plan means the file
/// needs no filtering at all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterPlan {
    stages: Vec<FilterStage>,
}

impl FilterPlan {
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn stages(&self) -> &[FilterStage] {
        &self.stages
    }

    /// Render the combined `-vf` argument, or `None` when no filtering is
    /// needed.
    pub fn render(&self) -> Option<String> {
        if self.stages.is_empty() {
            return None;
        }
        Some(
            self.stages
                .iter()
                .map(FilterStage::render)
                .collect::<Vec<_>>()
                .join(","),
        )
    }
}

/// Compute the filter plan for one source file.
///
/// Scaling is uniform (`min` of the per-axis ratios) so the aspect ratio is
/// preserved and the result never exceeds the target box. Scaled dimensions
/// are rounded down to even values since most H.264 encoders reject odd
/// dimensions with 4:2:0 chroma subsampling. The centering pad uses integer
/// division; an odd leftover pixel lands on the right/bottom edge, which is
/// an accepted asymmetry.
pub fn plan_filters(
    media: &MediaDescriptor,
    target: Dimensions,
    subtitle: Option<&Path>,
    font_size: u32,
) -> Result<FilterPlan, ConvertError> {
    if media.width == 0 || media.height == 0 {
        return Err(ConvertError::InvalidMediaDescriptor {
            width: media.width,
            height: media.height,
        });
    }

    let mut stages = Vec::new();

    if media.width != target.width || media.height != target.height {
        let scale = f64::min(
            target.width as f64 / media.width as f64,
            target.height as f64 / media.height as f64,
        );

        let scaled = Dimensions::new(
            even_floor((media.width as f64 * scale) as u32),
            even_floor((media.height as f64 * scale) as u32),
        );

        let pad_x = (target.width - scaled.width) / 2;
        let pad_y = (target.height - scaled.height) / 2;

        stages.push(FilterStage::ScalePad {
            scaled,
            target,
            pad_x,
            pad_y,
        });
    }

    if let Some(path) = subtitle {
        stages.push(FilterStage::SubtitleBurn {
            path: path.to_path_buf(),
            font_size,
        });
    }

    Ok(FilterPlan { stages })
}

fn even_floor(value: u32) -> u32 {
    value - value % 2
}

/// Escape a subtitle path for the ffmpeg filter syntax: backslashes become
/// forward slashes and colons (Windows drive letters) are escaped so the
/// string survives the filter-graph parser.
fn escape_filter_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").replace(':', "\\:")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(width: u32, height: u32) -> MediaDescriptor {
        MediaDescriptor {
            width,
            height,
            duration_seconds: 60.0,
        }
    }

    fn scale_pad(plan: &FilterPlan) -> (Dimensions, u32, u32) {
        match plan.stages().first() {
            Some(FilterStage::ScalePad {
                scaled,
                pad_x,
                pad_y,
                ..
            }) => (*scaled, *pad_x, *pad_y),
            other => panic!("expected scale/pad stage, got {other:?}"),
        }
    }

    #[test]
    fn target_resolution_without_subtitles_needs_no_plan() {
        let plan = plan_filters(&media(1920, 1080), TARGET, None, 20).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.render(), None);
    }

    #[test]
    fn target_resolution_with_subtitles_gets_subtitle_stage_only() {
        let srt = PathBuf::from("/videos/movie.srt");
        let plan = plan_filters(&media(1920, 1080), TARGET, Some(&srt), 20).unwrap();
        assert_eq!(plan.stages().len(), 1);
        assert_eq!(
            plan.render().unwrap(),
            "subtitles='/videos/movie.srt':force_style='FontSize=20'"
        );
    }

    #[test]
    fn upscale_720p_is_pure_scale_with_no_padding() {
        let plan = plan_filters(&media(1280, 720), TARGET, None, 20).unwrap();
        let (scaled, pad_x, pad_y) = scale_pad(&plan);
        assert_eq!(scaled, Dimensions::new(1920, 1080));
        assert_eq!((pad_x, pad_y), (0, 0));
        assert_eq!(plan.render().unwrap(), "scale=1920:1080");
    }

    #[test]
    fn wide_source_is_letterboxed_vertically() {
        let plan = plan_filters(&media(1920, 800), TARGET, None, 20).unwrap();
        let (scaled, pad_x, pad_y) = scale_pad(&plan);
        assert_eq!(scaled, Dimensions::new(1920, 800));
        assert_eq!((pad_x, pad_y), (0, 140));
        assert_eq!(
            plan.render().unwrap(),
            "scale=1920:800,pad=1920:1080:0:140:black"
        );
    }

    #[test]
    fn narrow_source_is_pillarboxed_horizontally() {
        let plan = plan_filters(&media(1080, 1080), TARGET, None, 20).unwrap();
        let (scaled, pad_x, pad_y) = scale_pad(&plan);
        assert_eq!(scaled, Dimensions::new(1080, 1080));
        assert_eq!((pad_x, pad_y), (420, 0));
    }

    #[test]
    fn scaled_dimensions_are_even_and_inside_the_target_box() {
        let sources = [
            (853, 480),
            (1279, 719),
            (701, 567),
            (3840, 2160),
            (999, 1001),
        ];
        for (width, height) in sources {
            let plan = plan_filters(&media(width, height), TARGET, None, 20).unwrap();
            let (scaled, _, _) = scale_pad(&plan);
            assert_eq!(scaled.width % 2, 0, "odd width for {width}x{height}");
            assert_eq!(scaled.height % 2, 0, "odd height for {width}x{height}");
            assert!(scaled.width <= TARGET.width);
            assert!(scaled.height <= TARGET.height);
        }
    }

    #[test]
    fn scaling_preserves_aspect_ratio_within_rounding() {
        // Even-rounding moves each axis by at most one pixel relative to the
        // exact uniform scale.
        let sources = [(853, 480), (1440, 1080), (2560, 1080), (640, 360)];
        for (width, height) in sources {
            let plan = plan_filters(&media(width, height), TARGET, None, 20).unwrap();
            let (scaled, _, _) = scale_pad(&plan);
            let scale = f64::min(
                TARGET.width as f64 / width as f64,
                TARGET.height as f64 / height as f64,
            );
            assert!((scaled.width as f64 - width as f64 * scale).abs() < 2.0);
            assert!((scaled.height as f64 - height as f64 * scale).abs() < 2.0);
        }
    }

    #[test]
    fn scale_stage_precedes_subtitle_stage() {
        let srt = PathBuf::from("episode.srt");
        let plan = plan_filters(&media(1280, 720), TARGET, Some(&srt), 24).unwrap();
        assert_eq!(plan.stages().len(), 2);
        assert!(matches!(plan.stages()[0], FilterStage::ScalePad { .. }));
        assert!(matches!(plan.stages()[1], FilterStage::SubtitleBurn { .. }));
        assert_eq!(
            plan.render().unwrap(),
            "scale=1920:1080,subtitles='episode.srt':force_style='FontSize=24'"
        );
    }

    #[test]
    fn subtitle_path_separators_and_colons_are_escaped() {
        let srt = PathBuf::from(r"C:\videos\show.srt");
        let plan = plan_filters(&media(1920, 1080), TARGET, Some(&srt), 20).unwrap();
        assert_eq!(
            plan.render().unwrap(),
            r"subtitles='C\:/videos/show.srt':force_style='FontSize=20'"
        );
    }

    #[test]
    fn zero_dimensions_are_rejected_before_any_arithmetic() {
        for (width, height) in [(0, 1080), (1920, 0), (0, 0)] {
            let err = plan_filters(&media(width, height), TARGET, None, 20).unwrap_err();
            assert!(matches!(
                err,
                ConvertError::InvalidMediaDescriptor { .. }
            ));
        }
    }

    #[test]
    fn planning_is_deterministic() {
        let srt = PathBuf::from("movie.srt");
        let first = plan_filters(&media(853, 480), TARGET, Some(&srt), 20).unwrap();
        let second = plan_filters(&media(853, 480), TARGET, Some(&srt), 20).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.render(), second.render());
    }
}

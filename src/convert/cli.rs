use clap::{Args, ValueHint};
use std::path::PathBuf;

use super::encoder::EncoderKind;

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    /// Directory containing videos to convert (defaults to the current directory)
    #[arg(value_hint = ValueHint::DirPath)]
    pub input_dir: Option<PathBuf>,

    /// Output directory; defaults to <input>/converted
    #[arg(short = 'o', long = "output-dir", value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Encoder to use instead of auto-detection
    #[arg(long, value_enum)]
    pub encoder: Option<EncoderKind>,

    /// Font size for burned-in subtitles
    #[arg(long)]
    pub font_size: Option<u32>,

    /// Do not look for or burn in sidecar subtitle files
    #[arg(long)]
    pub no_subtitles: bool,

    /// Re-encode even when the output file already exists
    #[arg(long)]
    pub force: bool,

    /// Print the ffmpeg commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Show raw encoder output instead of a progress bar
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    /// Video file to probe
    #[arg(value_hint = ValueHint::FilePath)]
    pub file: PathBuf,

    /// Subtitle file to assume for the plan (defaults to the sidecar .srt if present)
    #[arg(short = 's', long = "subtitles", value_hint = ValueHint::FilePath)]
    pub subtitles: Option<PathBuf>,
}

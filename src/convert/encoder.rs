use std::process::Command;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use super::error::ConvertError;

/// Video encoders the converter knows how to drive, in detection
/// preference order (hardware first, software fallback last).
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncoderKind {
    /// NVIDIA NVENC hardware encoder
    #[value(name = "nvenc")]
    H264Nvenc,
    /// AMD AMF hardware encoder
    #[value(name = "amf")]
    H264Amf,
    /// Intel QuickSync hardware encoder
    #[value(name = "qsv")]
    H264Qsv,
    /// Software x264 encoder
    #[value(name = "x264")]
    Libx264,
}

impl EncoderKind {
    pub const DETECTION_ORDER: [EncoderKind; 4] = [
        EncoderKind::H264Nvenc,
        EncoderKind::H264Amf,
        EncoderKind::H264Qsv,
        EncoderKind::Libx264,
    ];

    /// The `-c:v` codec name ffmpeg expects.
    pub fn codec_name(self) -> &'static str {
        match self {
            EncoderKind::H264Nvenc => "h264_nvenc",
            EncoderKind::H264Amf => "h264_amf",
            EncoderKind::H264Qsv => "h264_qsv",
            EncoderKind::Libx264 => "libx264",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EncoderKind::H264Nvenc => "NVIDIA NVENC",
            EncoderKind::H264Amf => "AMD AMF",
            EncoderKind::H264Qsv => "Intel QuickSync",
            EncoderKind::Libx264 => "CPU (libx264)",
        }
    }

    /// Fixed speed/quality argument table per encoder.
    pub fn quality_args(self) -> &'static [&'static str] {
        match self {
            EncoderKind::H264Nvenc => &[
                "-preset", "p1", "-tune", "hq", "-rc", "vbr", "-cq", "23", "-b:v", "0", "-maxrate",
                "10M", "-bufsize", "20M",
            ],
            EncoderKind::H264Amf => &[
                "-quality", "speed", "-rc", "vbr_peak", "-qp_i", "23", "-qp_p", "23",
            ],
            EncoderKind::H264Qsv => &["-preset", "veryfast", "-global_quality", "23"],
            EncoderKind::Libx264 => &["-preset", "veryfast", "-crf", "23"],
        }
    }
}

/// Ask ffmpeg which encoders it was built with and pick the best one we
/// know, preferring hardware encoders.
pub fn detect_encoder() -> Result<EncoderKind, ConvertError> {
    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-encoders"])
        .output()
        .map_err(|_| ConvertError::MissingDependency { tool: "ffmpeg" })?;

    let listing = String::from_utf8_lossy(&output.stdout);
    Ok(select_encoder(&listing))
}

fn select_encoder(listing: &str) -> EncoderKind {
    EncoderKind::DETECTION_ORDER
        .into_iter()
        .find(|kind| listing.contains(kind.codec_name()))
        .unwrap_or(EncoderKind::Libx264)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_hardware_encoder_when_listed() {
        let listing = " V....D h264_qsv\n V....D h264_nvenc\n V....D libx264\n";
        assert_eq!(select_encoder(listing), EncoderKind::H264Nvenc);
    }

    #[test]
    fn picks_next_candidate_when_nvenc_is_missing() {
        let listing = " V....D h264_qsv\n V....D libx264\n";
        assert_eq!(select_encoder(listing), EncoderKind::H264Qsv);
    }

    #[test]
    fn falls_back_to_software_when_nothing_matches() {
        assert_eq!(select_encoder("no encoders here"), EncoderKind::Libx264);
    }

    #[test]
    fn every_kind_has_quality_args_in_pairs() {
        for kind in EncoderKind::DETECTION_ORDER {
            assert_eq!(kind.quality_args().len() % 2, 0, "{kind:?}");
        }
    }
}

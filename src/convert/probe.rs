use std::path::Path;
use std::process::Command;

use serde::Deserialize;

use super::error::ConvertError;

/// Facts about a source file gathered before planning. Read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaDescriptor {
    pub width: u32,
    pub height: u32,
    pub duration_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Run ffprobe and extract the first video stream's geometry plus the
/// container duration. Every failure shape maps to `ConvertError::Probe`
/// so the batch can skip the file and continue.
pub fn probe_media(path: &Path) -> Result<MediaDescriptor, ConvertError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path)
        .output()
        .map_err(|err| probe_error(path, format!("failed to run ffprobe: {err}")))?;

    if !output.status.success() {
        return Err(probe_error(
            path,
            format!(
                "ffprobe exited with status {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        ));
    }

    let parsed: ProbeOutput = serde_json::from_slice(&output.stdout)
        .map_err(|err| probe_error(path, format!("unparseable ffprobe output: {err}")))?;

    descriptor_from_probe(parsed).map_err(|reason| probe_error(path, reason.to_string()))
}

fn descriptor_from_probe(parsed: ProbeOutput) -> Result<MediaDescriptor, &'static str> {
    let stream = parsed
        .streams
        .iter()
        .find(|stream| stream.codec_type.as_deref() == Some("video"))
        .ok_or("no video stream found")?;

    let (Some(width), Some(height)) = (stream.width, stream.height) else {
        return Err("video stream is missing dimensions");
    };

    let duration_seconds = parsed
        .format
        .as_ref()
        .and_then(|format| format.duration.as_deref())
        .and_then(|duration| duration.trim().parse::<f64>().ok())
        .ok_or("missing or unparseable duration")?;

    Ok(MediaDescriptor {
        width,
        height,
        duration_seconds,
    })
}

fn probe_error(path: &Path, reason: String) -> ConvertError {
    ConvertError::Probe {
        path: path.to_path_buf(),
        reason,
    }
}

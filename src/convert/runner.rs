use std::io::Read;
use std::process::{Command, Stdio};

use indicatif::{ProgressBar, ProgressStyle};

use super::error::ConvertError;
use super::progress::EncodeMonitor;

/// Narrow seam between the batch loop and the external encoder process so
/// the invocation and progress-reading strategy can be swapped out.
pub trait EncodeRunner {
    fn run(&self, args: &[String], options: EncodeRunOptions) -> Result<(), ConvertError>;
}

#[derive(Debug, Clone, Default)]
pub struct EncodeRunOptions {
    /// Expected media duration, used to compute progress percentages.
    pub duration_seconds: f64,
    /// Stream raw encoder output instead of the progress bar.
    pub verbose: bool,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemFfmpegRunner;

impl EncodeRunner for SystemFfmpegRunner {
    fn run(&self, args: &[String], options: EncodeRunOptions) -> Result<(), ConvertError> {
        let mut child = Command::new("ffmpeg")
            .args(args)
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr was piped");

        let pb = if options.verbose || options.duration_seconds <= 0.0 {
            None
        } else {
            Some(create_progress_bar())
        };

        let mut monitor = EncodeMonitor::new(options.duration_seconds);
        let mut last_line = String::new();
        let mut error_lines: Vec<String> = Vec::new();
        let read_result = drain_stderr(
            stderr,
            options.verbose,
            &pb,
            &mut monitor,
            &mut last_line,
            &mut error_lines,
        );

        let status = child.wait()?;
        read_result?;

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        monitor.complete(status.success());
        if monitor.verdict() != Some(true) {
            let detail = if error_lines.is_empty() {
                last_line
            } else {
                error_lines.join("\n")
            };
            return Err(ConvertError::Encode {
                status: status.code(),
                detail: detail.trim().to_string(),
            });
        }

        Ok(())
    }
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏ "),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message("encoding");
    pb
}

/// Read the encoder's diagnostic stream to EOF. ffmpeg terminates status
/// updates with `\r`, so lines are split on both `\r` and `\n`.
fn drain_stderr<R: Read>(
    mut stderr: R,
    verbose: bool,
    pb: &Option<ProgressBar>,
    monitor: &mut EncodeMonitor,
    last_line: &mut String,
    error_lines: &mut Vec<String>,
) -> Result<(), ConvertError> {
    let mut buffer = [0u8; 4096];
    let mut accumulated = String::new();

    loop {
        let bytes_read = stderr.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }

        let chunk = String::from_utf8_lossy(&buffer[..bytes_read]);
        accumulated.push_str(&chunk);

        while let Some(pos) = accumulated.find(|c| c == '\r' || c == '\n') {
            let line = accumulated[..pos].to_string();
            accumulated = accumulated[pos + 1..].to_string();

            if line.is_empty() {
                continue;
            }

            *last_line = line.clone();

            if verbose {
                eprintln!("{}", line);
            }

            if line.contains("error") || line.contains("Error") || line.contains("ERROR") {
                error_lines.push(line.clone());
            }

            if let Some(sample) = monitor.observe_line(&line) {
                if let Some(pb) = pb {
                    pb.set_position(sample.percent as u64);
                    pb.set_message(format!("{:.0} fps", sample.fps));
                }
            }
        }
    }

    Ok(())
}

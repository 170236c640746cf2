use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TIME_RE: Regex =
        Regex::new(r"time=(\d+):(\d+):(\d+(?:\.\d+)?)").expect("valid time pattern");
    static ref FPS_RE: Regex = Regex::new(r"fps=\s*(\d+\.?\d*)").expect("valid fps pattern");
}

/// One throttled progress reading. Derived per stderr line, displayed,
/// then discarded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressSample {
    pub percent: f64,
    pub fps: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum MonitorState {
    Running,
    Done { success: bool },
}

/// Turns the encoder's raw stderr lines into throttled progress samples.
///
/// ffmpeg's stderr format is not a stable contract, so all pattern matching
/// lives here; a format change stays contained in this module. A monitor
/// serves exactly one encode: once `complete` moves it to the terminal
/// state there is no way back, and a new encode gets a new monitor.
#[derive(Debug)]
pub struct EncodeMonitor {
    duration_seconds: f64,
    last_percent: f64,
    state: MonitorState,
}

impl EncodeMonitor {
    pub fn new(duration_seconds: f64) -> Self {
        Self {
            duration_seconds,
            last_percent: 0.0,
            state: MonitorState::Running,
        }
    }

    /// Feed one stderr line. Returns a sample only when the computed
    /// percentage exceeds the last surfaced one by more than one point,
    /// which bounds output volume for long encodes. Lines without a time
    /// match, and all lines when the duration is unknown, yield nothing.
    pub fn observe_line(&mut self, line: &str) -> Option<ProgressSample> {
        if matches!(self.state, MonitorState::Done { .. }) {
            return None;
        }
        if self.duration_seconds <= 0.0 {
            return None;
        }

        let elapsed = parse_elapsed_seconds(line)?;
        let percent = f64::min(elapsed / self.duration_seconds * 100.0, 100.0);
        if percent <= self.last_percent + 1.0 {
            return None;
        }

        self.last_percent = percent;
        Some(ProgressSample {
            percent,
            fps: parse_frames_per_second(line),
        })
    }

    /// The diagnostic stream closed and the process exited. Records the
    /// final verdict.
    pub fn complete(&mut self, success: bool) {
        self.state = MonitorState::Done { success };
    }

    /// `None` while running, `Some(success)` once complete.
    pub fn verdict(&self) -> Option<bool> {
        match self.state {
            MonitorState::Running => None,
            MonitorState::Done { success } => Some(success),
        }
    }
}

fn parse_elapsed_seconds(line: &str) -> Option<f64> {
    let caps = TIME_RE.captures(line)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn parse_frames_per_second(line: &str) -> f64 {
    FPS_RE
        .captures(line)
        .and_then(|caps| caps[1].parse().ok())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_line(time: &str, fps: &str) -> String {
        format!("frame= 1024 fps={fps} q=23.0 size=  2048KiB time={time} bitrate=2000.0kbits/s speed=2.1x")
    }

    #[test]
    fn elapsed_seconds_come_from_the_time_field() {
        let line = status_line("01:02:03.50", "60");
        assert_eq!(parse_elapsed_seconds(&line), Some(3723.5));
    }

    #[test]
    fn missing_fps_defaults_to_zero_without_failing_the_line() {
        let mut monitor = EncodeMonitor::new(100.0);
        let sample = monitor
            .observe_line("size= 1000KiB time=00:00:10.00 bitrate= 800kbits/s")
            .unwrap();
        assert_eq!(sample.fps, 0.0);
        assert!((sample.percent - 10.0).abs() < 1e-9);
    }

    #[test]
    fn line_with_no_match_produces_no_sample() {
        let mut monitor = EncodeMonitor::new(100.0);
        assert_eq!(
            monitor.observe_line("Stream mapping: Stream #0:0 -> #0:0 (h264 -> h264)"),
            None
        );
    }

    #[test]
    fn samples_are_throttled_to_steps_larger_than_one_point() {
        let mut monitor = EncodeMonitor::new(200.0);

        // 0.5% -> below the first threshold
        assert_eq!(monitor.observe_line(&status_line("00:00:01.00", "30")), None);
        // 2% -> first surfaced sample
        let first = monitor
            .observe_line(&status_line("00:00:04.00", "30"))
            .unwrap();
        assert!((first.percent - 2.0).abs() < 1e-9);
        // 2.5% -> within one point of the last surfaced value, suppressed
        assert_eq!(monitor.observe_line(&status_line("00:00:05.00", "30")), None);
        // 3.5% -> more than one point above, surfaced
        let second = monitor
            .observe_line(&status_line("00:00:07.00", "30"))
            .unwrap();
        assert!((second.percent - 3.5).abs() < 1e-9);
    }

    #[test]
    fn increasing_times_yield_increasing_percentages_capped_at_100() {
        let mut monitor = EncodeMonitor::new(60.0);
        let mut surfaced = Vec::new();
        for seconds in (0..=90).step_by(3) {
            let line = status_line(&format!("00:00:{seconds:02}.00"), "120");
            if let Some(sample) = monitor.observe_line(&line) {
                surfaced.push(sample.percent);
            }
        }
        assert!(!surfaced.is_empty());
        for pair in surfaced.windows(2) {
            assert!(pair[1] > pair[0] + 1.0);
        }
        assert!(surfaced.iter().all(|percent| *percent <= 100.0));
        assert_eq!(*surfaced.last().unwrap(), 100.0);
    }

    #[test]
    fn unknown_duration_reports_nothing() {
        let mut monitor = EncodeMonitor::new(0.0);
        assert_eq!(
            monitor.observe_line(&status_line("00:10:00.00", "30")),
            None
        );
    }

    #[test]
    fn completion_is_terminal() {
        let mut monitor = EncodeMonitor::new(100.0);
        assert_eq!(monitor.verdict(), None);
        monitor.complete(true);
        assert_eq!(monitor.verdict(), Some(true));
        // No samples once done, even for lines that would otherwise match.
        assert_eq!(
            monitor.observe_line(&status_line("00:01:00.00", "30")),
            None
        );
    }
}

use std::io::{self, Write};
use std::time::{Duration, Instant};

/// Timestamped status lines on stderr for batch jobs. Silent when disabled.
pub struct ConsoleProgress {
    enabled: bool,
    started: Instant,
}

impl ConsoleProgress {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started: Instant::now(),
        }
    }

    pub fn quiet() -> Self {
        Self::new(false)
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn info(&self, msg: impl AsRef<str>) {
        self.line(msg.as_ref());
    }

    pub fn warn(&self, msg: impl AsRef<str>) {
        self.line(&format!("warning: {}", msg.as_ref()));
    }

    /// `label current/total (pct%)`; only every `step`-th item and the last one are shown.
    pub fn progress(&self, label: &str, current: usize, total: usize) {
        let total = total.max(1);
        let current = current.min(total);
        let step = (total / 20).max(1);
        if current != total && current % step != 0 {
            return;
        }
        let pct = (current as f64 / total as f64) * 100.0;
        self.line(&format!("{label} {current}/{total} ({pct:5.1}%)"));
    }

    fn line(&self, msg: &str) {
        if !self.enabled {
            return;
        }
        let ts = fmt_elapsed(self.elapsed());
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "[{ts}] {msg}");
    }
}

fn fmt_elapsed(elapsed: Duration) -> String {
    let seconds = elapsed.as_secs();
    let h = seconds / 3600;
    let m = (seconds % 3600) / 60;
    let s = seconds % 60;
    if h > 0 {
        format!("{h:02}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::fmt_elapsed;
    use std::time::Duration;

    #[test]
    fn formats_minutes_and_hours() {
        assert_eq!(fmt_elapsed(Duration::from_secs(0)), "00:00");
        assert_eq!(fmt_elapsed(Duration::from_secs(75)), "01:15");
        assert_eq!(fmt_elapsed(Duration::from_secs(3600 + 62)), "01:01:02");
    }
}

//! Step timing utilities.

use std::time::{Duration, Instant};

/// A simple timer for measuring long-running steps.
pub struct Timer {
    name: String,
    start: Instant,
}

impl Timer {
    /// Start a new timer with the given step name.
    pub fn start(name: &str) -> Self {
        Self {
            name: name.to_string(),
            start: Instant::now(),
        }
    }

    /// Finish the timer, print and return the elapsed time.
    pub fn finish(self) -> String {
        let elapsed = format_elapsed(self.start.elapsed());
        println!("  [{}] {}", elapsed, self.name);
        elapsed
    }
}

/// Seconds below a minute, fractional minutes above.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs >= 60.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_elapsed(Duration::from_secs(90)), "1.5m");
    }
}

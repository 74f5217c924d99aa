//! A pausable countdown.
//!
//! Time is passed in explicitly so callers (and tests) control the clock.

use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CountdownStatus {
    Idle,
    Running,
    Paused,
    Finished,
}

/// What a display needs to render the timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountdownSnapshot {
    pub status: CountdownStatus,
    pub duration_ms: u64,
    pub remaining_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    duration: Duration,
    /// Time consumed before the current run.
    banked: Duration,
    running_since: Option<Instant>,
}

impl Countdown {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            banked: Duration::ZERO,
            running_since: None,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Changing the duration resets the timer.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
        self.reset();
    }

    fn elapsed(&self, now: Instant) -> Duration {
        let running = self
            .running_since
            .map_or(Duration::ZERO, |since| now.saturating_duration_since(since));
        self.banked + running
    }

    pub fn remaining(&self, now: Instant) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        self.remaining(now).is_zero()
    }

    pub fn is_running(&self) -> bool {
        self.running_since.is_some()
    }

    pub fn status(&self, now: Instant) -> CountdownStatus {
        if self.is_finished(now) {
            CountdownStatus::Finished
        } else if self.is_running() {
            CountdownStatus::Running
        } else if self.banked.is_zero() {
            CountdownStatus::Idle
        } else {
            CountdownStatus::Paused
        }
    }

    /// Starts from idle or continues from paused. No-op when running or finished.
    pub fn start(&mut self, now: Instant) {
        if self.running_since.is_none() && !self.is_finished(now) {
            self.running_since = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.banked = (self.banked + now.saturating_duration_since(since)).min(self.duration);
        }
    }

    pub fn resume(&mut self, now: Instant) {
        self.start(now);
    }

    pub fn reset(&mut self) {
        self.banked = Duration::ZERO;
        self.running_since = None;
    }

    /// Returns true exactly once, on the tick where a running timer reaches zero.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.is_running() && self.is_finished(now) {
            self.banked = self.duration;
            self.running_since = None;
            return true;
        }
        false
    }

    pub fn snapshot(&self, now: Instant) -> CountdownSnapshot {
        CountdownSnapshot {
            status: self.status(now),
            duration_ms: self.duration.as_millis() as u64,
            remaining_ms: self.remaining(now).as_millis() as u64,
        }
    }
}

/// `MM:SS`, or `H:MM:SS` from one hour up. Partial seconds round up.
pub fn format_clock(remaining: Duration) -> String {
    let total = remaining.as_millis().div_ceil(1000) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m:02}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_runs_down() {
        let t0 = Instant::now();
        let mut c = Countdown::new(secs(60));
        assert_eq!(c.status(t0), CountdownStatus::Idle);
        assert_eq!(c.remaining(t0 + secs(30)), secs(60));

        c.start(t0);
        assert_eq!(c.status(t0), CountdownStatus::Running);
        assert_eq!(c.remaining(t0 + secs(25)), secs(35));
        assert!(!c.tick(t0 + secs(59)));
        assert!(c.tick(t0 + secs(61)));
        assert!(!c.tick(t0 + secs(62)));
        assert_eq!(c.status(t0 + secs(62)), CountdownStatus::Finished);
        assert_eq!(c.remaining(t0 + secs(100)), Duration::ZERO);
    }

    #[test]
    fn test_pause_and_resume() {
        let t0 = Instant::now();
        let mut c = Countdown::new(secs(60));
        c.start(t0);
        c.pause(t0 + secs(10));
        assert_eq!(c.status(t0 + secs(40)), CountdownStatus::Paused);
        assert_eq!(c.remaining(t0 + secs(40)), secs(50));

        c.resume(t0 + secs(40));
        assert_eq!(c.remaining(t0 + secs(50)), secs(40));

        // second start while running keeps the original anchor
        c.start(t0 + secs(45));
        assert_eq!(c.remaining(t0 + secs(50)), secs(40));
    }

    #[test]
    fn test_reset_and_finished_start() {
        let t0 = Instant::now();
        let mut c = Countdown::new(secs(5));
        c.start(t0);
        assert!(c.tick(t0 + secs(6)));
        c.start(t0 + secs(7));
        assert!(!c.is_running());

        c.reset();
        assert_eq!(c.status(t0 + secs(8)), CountdownStatus::Idle);
        assert_eq!(c.remaining(t0 + secs(8)), secs(5));

        c.set_duration(secs(90));
        assert_eq!(c.snapshot(t0).remaining_ms, 90_000);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(secs(0)), "00:00");
        assert_eq!(format_clock(Duration::from_millis(59_001)), "01:00");
        assert_eq!(format_clock(secs(25 * 60)), "25:00");
        assert_eq!(format_clock(secs(3600 + 62)), "1:01:02");
    }

    #[test]
    fn test_snapshot_json() {
        let c = Countdown::new(secs(3));
        let json = serde_json::to_value(c.snapshot(Instant::now())).unwrap();
        assert_eq!(json["status"], "idle");
        assert_eq!(json["remainingMs"], 3000);
    }
}

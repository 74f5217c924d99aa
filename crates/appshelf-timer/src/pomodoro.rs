//! Work/break cycle built on [`Countdown`].

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::countdown::{Countdown, CountdownSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    pub fn label(&self) -> &'static str {
        match self {
            Phase::Work => "Focus",
            Phase::ShortBreak => "Short break",
            Phase::LongBreak => "Long break",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PomodoroConfig {
    pub work: Duration,
    pub short_break: Duration,
    pub long_break: Duration,
    /// Every n-th completed work session is followed by a long break.
    pub long_break_every: u32,
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work: Duration::from_secs(25 * 60),
            short_break: Duration::from_secs(5 * 60),
            long_break: Duration::from_secs(15 * 60),
            long_break_every: 4,
        }
    }
}

impl PomodoroConfig {
    pub fn duration_of(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Work => self.work,
            Phase::ShortBreak => self.short_break,
            Phase::LongBreak => self.long_break,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroSnapshot {
    pub phase: Phase,
    pub completed: u32,
    #[serde(flatten)]
    pub timer: CountdownSnapshot,
}

#[derive(Debug, Clone)]
pub struct Pomodoro {
    config: PomodoroConfig,
    phase: Phase,
    completed: u32,
    timer: Countdown,
}

impl Default for Pomodoro {
    fn default() -> Self {
        Self::new(PomodoroConfig::default())
    }
}

impl Pomodoro {
    pub fn new(config: PomodoroConfig) -> Self {
        Self {
            timer: Countdown::new(config.work),
            config,
            phase: Phase::Work,
            completed: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Work sessions that ran to zero. Skipped sessions are not counted.
    pub fn completed(&self) -> u32 {
        self.completed
    }

    pub fn timer(&self) -> &Countdown {
        &self.timer
    }

    pub fn start(&mut self, now: Instant) {
        self.timer.start(now);
    }

    pub fn pause(&mut self, now: Instant) {
        self.timer.pause(now);
    }

    /// Back to the first work session with the count cleared.
    pub fn reset(&mut self) {
        self.completed = 0;
        self.enter(Phase::Work);
    }

    /// Abandons the current phase and loads the next one, paused.
    pub fn skip(&mut self) -> Phase {
        let next = self.next_phase(false);
        self.enter(next);
        next
    }

    /// Advances when the running phase reaches zero. The next phase is
    /// loaded paused; returns it on the transition tick only.
    pub fn tick(&mut self, now: Instant) -> Option<Phase> {
        if !self.timer.tick(now) {
            return None;
        }
        if self.phase == Phase::Work {
            self.completed += 1;
        }
        let next = self.next_phase(true);
        tracing::debug!(from = ?self.phase, to = ?next, completed = self.completed, "pomodoro phase finished");
        self.enter(next);
        Some(next)
    }

    fn next_phase(&self, work_completed: bool) -> Phase {
        match self.phase {
            Phase::Work => {
                let every = self.config.long_break_every.max(1);
                if work_completed && self.completed > 0 && self.completed % every == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        }
    }

    fn enter(&mut self, phase: Phase) {
        self.phase = phase;
        self.timer = Countdown::new(self.config.duration_of(phase));
    }

    pub fn snapshot(&self, now: Instant) -> PomodoroSnapshot {
        PomodoroSnapshot {
            phase: self.phase,
            completed: self.completed,
            timer: self.timer.snapshot(now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: Duration = Duration::from_secs(60);

    /// Runs the current phase to completion starting at `now`; returns the end time.
    fn finish_phase(p: &mut Pomodoro, now: Instant) -> (Instant, Option<Phase>) {
        p.start(now);
        let end = now + p.timer().duration() + Duration::from_millis(1);
        (end, p.tick(end))
    }

    #[test]
    fn test_default_durations() {
        let cfg = PomodoroConfig::default();
        assert_eq!(cfg.work, 25 * MIN);
        assert_eq!(cfg.short_break, 5 * MIN);
        assert_eq!(cfg.long_break, 15 * MIN);
        assert_eq!(cfg.long_break_every, 4);
    }

    #[test]
    fn test_cycle_with_long_break() {
        let mut p = Pomodoro::default();
        let mut now = Instant::now();
        let mut phases = Vec::new();
        for _ in 0..8 {
            let (end, next) = finish_phase(&mut p, now);
            now = end;
            phases.push(next.unwrap());
        }
        assert_eq!(
            phases,
            vec![
                Phase::ShortBreak,
                Phase::Work,
                Phase::ShortBreak,
                Phase::Work,
                Phase::ShortBreak,
                Phase::Work,
                Phase::LongBreak,
                Phase::Work,
            ]
        );
        assert_eq!(p.completed(), 4);
        assert_eq!(p.timer().duration(), 25 * MIN);
    }

    #[test]
    fn test_next_phase_loads_paused() {
        let mut p = Pomodoro::default();
        let (end, _) = finish_phase(&mut p, Instant::now());
        assert_eq!(p.phase(), Phase::ShortBreak);
        assert!(!p.timer().is_running());
        assert_eq!(p.timer().remaining(end + MIN), 5 * MIN);
        assert_eq!(p.tick(end + 10 * MIN), None);
    }

    #[test]
    fn test_skip_does_not_count() {
        let mut p = Pomodoro::default();
        p.start(Instant::now());
        assert_eq!(p.skip(), Phase::ShortBreak);
        assert_eq!(p.completed(), 0);
        assert_eq!(p.skip(), Phase::Work);
        assert_eq!(p.skip(), Phase::ShortBreak);
        assert_eq!(p.completed(), 0);
    }

    #[test]
    fn test_reset() {
        let mut p = Pomodoro::default();
        let (_, _) = finish_phase(&mut p, Instant::now());
        assert_eq!(p.completed(), 1);
        p.reset();
        assert_eq!(p.completed(), 0);
        assert_eq!(p.phase(), Phase::Work);
        let snap = p.snapshot(Instant::now());
        assert_eq!(snap.timer.remaining_ms, 25 * 60 * 1000);
    }
}

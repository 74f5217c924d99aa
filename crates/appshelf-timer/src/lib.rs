//! Countdown and pomodoro timers.
//!
//! The timers are plain state machines over `Instant`; [`ticker`] drives
//! them from a tokio task that is torn down with its handle.

pub mod countdown;
pub mod pomodoro;
pub mod ticker;

pub use countdown::{format_clock, Countdown, CountdownSnapshot, CountdownStatus};
pub use pomodoro::{Phase, Pomodoro, PomodoroConfig, PomodoroSnapshot};
pub use ticker::{spawn_ticker, TickerHandle, DEFAULT_TICK};

//! Periodic tick task for driving timers.
//!
//! The task stops when its token is cancelled, when the callback returns
//! `ControlFlow::Break`, or when the [`TickerHandle`] is dropped.

use std::ops::ControlFlow;
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::debug;

/// Display refresh period used by the timer screens.
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

pub struct TickerHandle {
    token: CancellationToken,
    _guard: DropGuard,
    task: JoinHandle<u64>,
}

impl TickerHandle {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels the task and waits for it. Returns the number of ticks delivered.
    pub async fn stop(self) -> u64 {
        self.token.cancel();
        self.task.await.unwrap_or(0)
    }

    /// Waits for the task to end on its own.
    pub async fn join(self) -> u64 {
        let TickerHandle { _guard, task, .. } = self;
        let ticks = task.await.unwrap_or(0);
        drop(_guard.disarm());
        ticks
    }
}

/// Spawns a task calling `on_tick` every `period` until stopped.
///
/// Must be called inside a tokio runtime. The token is a child of `parent`,
/// so cancelling the parent stops this ticker too.
pub fn spawn_ticker<F>(period: Duration, parent: &CancellationToken, mut on_tick: F) -> TickerHandle
where
    F: FnMut(Instant) -> ControlFlow<()> + Send + 'static,
{
    let token = parent.child_token();
    let task_token = token.clone();
    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // first tick completes immediately
        interval.tick().await;
        let mut ticks = 0u64;
        loop {
            tokio::select! {
                biased;
                _ = task_token.cancelled() => {
                    debug!(ticks, "ticker cancelled");
                    break;
                }
                _ = interval.tick() => {
                    ticks += 1;
                    if on_tick(Instant::now()).is_break() {
                        debug!(ticks, "ticker finished");
                        break;
                    }
                }
            }
        }
        ticks
    });

    TickerHandle {
        _guard: token.clone().drop_guard(),
        token,
        task,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::countdown::Countdown;

    const FAST: Duration = Duration::from_millis(5);

    #[tokio::test]
    async fn test_break_ends_task() {
        let handle = spawn_ticker(FAST, &CancellationToken::new(), {
            let mut n = 0;
            move |_| {
                n += 1;
                if n == 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        });
        assert_eq!(handle.join().await, 3);
    }

    #[tokio::test]
    async fn test_stop_cancels() {
        let count = Arc::new(AtomicU64::new(0));
        let seen = count.clone();
        let handle = spawn_ticker(FAST, &CancellationToken::new(), move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            ControlFlow::Continue(())
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        let ticks = handle.stop().await;
        assert_eq!(ticks, count.load(Ordering::SeqCst));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(ticks, count.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_drop_cancels() {
        let parent = CancellationToken::new();
        let handle = spawn_ticker(FAST, &parent, |_| ControlFlow::Continue(()));
        let token = handle.token().clone();
        drop(handle);
        assert!(token.is_cancelled());
        assert!(!parent.is_cancelled());
    }

    #[tokio::test]
    async fn test_parent_cancel_propagates() {
        let parent = CancellationToken::new();
        let handle = spawn_ticker(FAST, &parent, |_| ControlFlow::Continue(()));
        parent.cancel();
        tokio::time::timeout(Duration::from_secs(2), handle.join())
            .await
            .expect("ticker should stop after parent cancel");
    }

    #[tokio::test]
    async fn test_drives_countdown_to_zero() {
        let countdown = Arc::new(Mutex::new(Countdown::new(Duration::from_millis(40))));
        countdown.lock().unwrap().start(Instant::now());
        let driven = countdown.clone();
        let handle = spawn_ticker(FAST, &CancellationToken::new(), move |now| {
            if driven.lock().unwrap().tick(now) {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        });
        tokio::time::timeout(Duration::from_secs(2), handle.join())
            .await
            .expect("countdown should finish");
        assert!(countdown.lock().unwrap().is_finished(Instant::now()));
    }
}

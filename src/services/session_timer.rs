// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Re-armable one-shot timer that drives forced credential refresh.
//!
//! At most one timer is pending at any time: arming aborts the previous task
//! before spawning a new one, and a generation counter stops a task that
//! already woke up from firing after it was superseded.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Armed,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

pub struct SessionTimer {
    interval: Duration,
    slot: Arc<Mutex<Slot>>,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Cancel any pending timer and schedule `on_fire` after the interval.
    ///
    /// The timer counts as idle while `on_fire` runs, so `on_fire` may
    /// re-arm it.
    pub fn arm<F, Fut>(&self, on_fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = lock(&self.slot);
        if let Some(previous) = slot.handle.take() {
            previous.abort();
        }
        slot.generation += 1;

        let generation = slot.generation;
        let shared = Arc::clone(&self.slot);
        let interval = self.interval;

        // The slot lock is held until the handle is stored, so the task
        // can't observe its own slot before it exists.
        slot.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(interval).await;
            {
                let mut slot = lock(&shared);
                if slot.generation != generation {
                    return;
                }
                slot.handle = None;
            }
            tracing::debug!(generation, "Session timer fired");
            on_fire().await;
        }));
    }

    /// Cancel the pending timer, if any.
    pub fn disarm(&self) {
        let mut slot = lock(&self.slot);
        slot.generation += 1;
        if let Some(handle) = slot.handle.take() {
            handle.abort();
        }
    }

    pub fn state(&self) -> TimerState {
        if lock(&self.slot).handle.is_some() {
            TimerState::Armed
        } else {
            TimerState::Idle
        }
    }
}

impl Drop for SessionTimer {
    fn drop(&mut self) {
        self.disarm();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const INTERVAL: Duration = Duration::from_secs(30 * 60);

    fn counter_task(counter: &Arc<AtomicUsize>) -> impl FnOnce() -> std::future::Ready<()> {
        let counter = Arc::clone(counter);
        move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_after_interval() {
        let timer = SessionTimer::new(INTERVAL);
        let fired = Arc::new(AtomicUsize::new(0));

        timer.arm(counter_task(&fired));
        assert_eq!(timer.state(), TimerState::Armed);

        tokio::time::sleep(INTERVAL - Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(timer.state(), TimerState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_leaves_one_pending() {
        let timer = SessionTimer::new(INTERVAL);
        let fired = Arc::new(AtomicUsize::new(0));

        timer.arm(counter_task(&fired));
        timer.arm(counter_task(&fired));

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_restarts_interval() {
        let timer = SessionTimer::new(INTERVAL);
        let fired = Arc::new(AtomicUsize::new(0));

        timer.arm(counter_task(&fired));
        tokio::time::sleep(INTERVAL / 2).await;
        timer.arm(counter_task(&fired));

        tokio::time::sleep(INTERVAL / 2 + Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(INTERVAL / 2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disarm_cancels() {
        let timer = SessionTimer::new(INTERVAL);
        let fired = Arc::new(AtomicUsize::new(0));

        timer.arm(counter_task(&fired));
        timer.disarm();
        assert_eq!(timer.state(), TimerState::Idle);

        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}

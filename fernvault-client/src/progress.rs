//! Simulated progress bar.
//!
//! The percentage is not derived from bytes transferred. It climbs on a fixed
//! tick up to a ceiling below 100 while an operation is pending, snaps to 100
//! on finish and hides shortly after.

use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Snapshot of the bar as a front-end would draw it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgressState {
    pub visible: bool,
    pub percent: u8,
    /// Bumped on every `start`, so a stale hide timer cannot hide a newer run.
    pub generation: u64,
}

#[derive(Clone, Copy, Debug)]
pub struct ProgressSettings {
    pub tick: Duration,
    pub step: u8,
    pub ceiling: u8,
    pub hide_delay: Duration,
}

impl ProgressSettings {
    pub fn from_config(config: &crate::ClientConfig) -> Self {
        Self {
            tick: Duration::from_millis(config.progress_tick_ms),
            step: config.progress_step,
            ceiling: config.progress_ceiling.min(99),
            hide_delay: Duration::from_millis(config.progress_hide_delay_ms),
        }
    }
}

pub struct ProgressIndicator {
    settings: ProgressSettings,
    state: watch::Sender<ProgressState>,
}

/// Running animation. Dropping it cancels the ticker, same as `finish`
/// minus the snap to 100.
#[must_use = "an unfinished progress handle stops the bar where it is"]
pub struct ProgressHandle {
    generation: u64,
    ticker: JoinHandle<()>,
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

impl ProgressIndicator {
    pub fn new(settings: ProgressSettings) -> Self {
        let (state, _) = watch::channel(ProgressState::default());
        Self { settings, state }
    }

    /// Shows the bar at 0% and starts the ticker. Must run inside a tokio runtime.
    pub fn start(&self) -> ProgressHandle {
        let mut generation = 0;
        self.state.send_modify(|s| {
            s.generation += 1;
            s.visible = true;
            s.percent = 0;
            generation = s.generation;
        });

        let state = self.state.clone();
        let ProgressSettings { tick, step, ceiling, .. } = self.settings;
        let ticker = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + tick, tick);
            loop {
                interval.tick().await;
                let mut reached = false;
                state.send_if_modified(|s| {
                    if s.generation != generation || s.percent >= ceiling {
                        reached = true;
                        return false;
                    }
                    s.percent = s.percent.saturating_add(step).min(ceiling);
                    true
                });
                if reached {
                    break;
                }
            }
        });

        ProgressHandle { generation, ticker }
    }

    /// Stops the ticker, snaps to 100% and schedules the hide.
    pub fn finish(&self, handle: ProgressHandle) {
        handle.ticker.abort();
        let generation = handle.generation;
        let mut current = false;
        self.state.send_if_modified(|s| {
            current = s.generation == generation;
            if current {
                s.percent = 100;
            }
            current
        });
        if !current {
            return;
        }

        let state = self.state.clone();
        let delay = self.settings.hide_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            state.send_if_modified(|s| {
                if s.generation != generation {
                    return false;
                }
                s.visible = false;
                s.percent = 0;
                true
            });
        });
    }

    pub fn snapshot(&self) -> ProgressState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.state.subscribe()
    }
}

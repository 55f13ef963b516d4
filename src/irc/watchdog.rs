//! Idle-connection watchdog.
//!
//! One timer per watchdog. `arm` and `reset` both restart the full countdown;
//! `reset` does nothing while disarmed. Each restart bumps an epoch, and an
//! expiring timer only fires if its epoch is still current, so a timer that
//! races with `reset` or `disarm` never fires.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

type Callback = Arc<dyn Fn() + Send + Sync>;

#[derive(Default)]
struct Timer {
    epoch: u64,
    task: Option<JoinHandle<()>>,
}

pub struct Watchdog {
    idle: Duration,
    timer: Arc<Mutex<Timer>>,
    on_timeout: Callback,
}

impl Watchdog {
    pub fn new<F>(idle: Duration, on_timeout: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self {
            idle,
            timer: Arc::new(Mutex::new(Timer::default())),
            on_timeout: Arc::new(on_timeout),
        }
    }

    /// Start the countdown, replacing any running one. Must be called from
    /// within a tokio runtime.
    pub fn arm(&self) {
        let mut timer = self.timer.lock();
        self.restart(&mut timer);
    }

    /// Restart the countdown if armed.
    pub fn reset(&self) {
        let mut timer = self.timer.lock();
        if timer.task.is_some() {
            self.restart(&mut timer);
        }
    }

    pub fn disarm(&self) {
        let mut timer = self.timer.lock();
        timer.epoch += 1;
        if let Some(task) = timer.task.take() {
            task.abort();
            debug!("Watchdog disarmed");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.timer.lock().task.is_some()
    }

    fn restart(&self, timer: &mut Timer) {
        timer.epoch += 1;
        if let Some(task) = timer.task.take() {
            task.abort();
        }

        let epoch = timer.epoch;
        let idle = self.idle;
        let shared = Arc::clone(&self.timer);
        let on_timeout = Arc::clone(&self.on_timeout);
        timer.task = Some(tokio::spawn(async move {
            tokio::time::sleep(idle).await;
            {
                let mut timer = shared.lock();
                if timer.epoch != epoch {
                    return;
                }
                timer.task = None;
            }
            debug!(idle_secs = idle.as_secs(), "Watchdog expired");
            on_timeout();
        }));
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        if let Some(task) = self.timer.lock().task.take() {
            task.abort();
        }
    }
}

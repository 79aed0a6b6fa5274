use crate::controller::Controller;
use log::{error, info, warn};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

/// A running periodic task.
///
/// The stop flag is checked before every tick. A tick already in progress,
/// including its network request, always runs to completion.
pub struct LoopHandle {
    name: &'static str,
    stop: Arc<AtomicBool>,
    wake: Arc<Notify>,
    task: JoinHandle<()>,
}

impl LoopHandle {
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Asks the loop to stop and waits until it has.
    pub async fn stop(self) {
        self.stop.store(true, Ordering::Release);
        self.wake.notify_one();
        if let Err(e) = self.task.await {
            error!("{} loop ended abnormally: {}", self.name, e);
        }
        info!("{} loop stopped", self.name);
    }
}

/// Runs `tick`, then waits `period`, until stopped. The wait begins only after
/// the tick has finished, so ticks never overlap.
fn spawn_periodic<F, Fut>(name: &'static str, period: Duration, mut tick: F) -> LoopHandle
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let wake = Arc::new(Notify::new());

    let task = {
        let stop = stop.clone();
        let wake = wake.clone();
        tokio::spawn(async move {
            info!("{} loop started, every {:?}", name, period);
            while !stop.load(Ordering::Acquire) {
                tick().await;
                tokio::select! {
                    _ = tokio::time::sleep(period) => {}
                    _ = wake.notified() => {}
                }
            }
        })
    };

    LoopHandle { name, stop, wake, task }
}

/// Pushes the tilt-derived angle to the actuator every `period` while the
/// controller is in automatic mode with a confirmed offset.
pub fn spawn_dispatch(controller: Arc<Controller>, period: Duration) -> LoopHandle {
    spawn_periodic("dispatch", period, move || {
        let controller = controller.clone();
        async move {
            if let Some(result) = controller.dispatch_tick().await {
                if let Some(message) = result.error_message() {
                    warn!("dispatch failed: {}", message);
                }
            }
        }
    })
}

/// Polls the actuator for its current angle every `period`.
pub fn spawn_monitor(controller: Arc<Controller>, period: Duration) -> LoopHandle {
    spawn_periodic("monitor", period, move || {
        let controller = controller.clone();
        async move {
            if let Err(e) = controller.refresh_current_angle().await {
                warn!("status poll failed: {}", e);
            }
        }
    })
}

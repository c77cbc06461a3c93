//! Background clipboard polling
//!
//! A tokio task ticks on a fixed interval and runs [`Manager::check`] on the
//! blocking pool. Cancellation goes through a `CancellationToken`; dropping the
//! poller cancels it, so a poller can never outlive its owner.

use once_cell::sync::Lazy;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::interface::SimpleCpResult;
use crate::manager::Manager;

/// Runtime used when the poller is spawned outside any tokio runtime.
/// Shared by all pollers and never dropped.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("simplecp-poller")
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

pub struct ClipboardPoller {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl ClipboardPoller {
    /// Start polling. Uses the current runtime if there is one.
    pub fn spawn(manager: Arc<Manager>, interval: Duration) -> Self {
        let runtime = tokio::runtime::Handle::try_current()
            .unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone());
        let token = CancellationToken::new();
        let handle = runtime.spawn(poll_loop(manager, interval, token.clone()));
        log::info!("Clipboard poller started ({:?} interval)", interval);
        Self {
            token,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Request termination without waiting
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Cancel and wait for the loop to exit
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                log::error!("Clipboard poller task failed: {}", e);
            }
        }
    }
}

impl Drop for ClipboardPoller {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Poll until `shutdown` resolves, then stop polling and save both stores.
/// The CLI passes a future that resolves on Ctrl-C or SIGTERM.
pub async fn watch_until<F>(manager: Arc<Manager>, shutdown: F) -> SimpleCpResult<()>
where
    F: Future<Output = ()>,
{
    let poller = ClipboardPoller::spawn(Arc::clone(&manager), manager.config().check_interval());
    shutdown.await;
    poller.shutdown().await;
    manager.save_stores()
}

async fn poll_loop(manager: Arc<Manager>, interval: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {
                let manager = Arc::clone(&manager);
                match tokio::task::spawn_blocking(move || manager.try_check()).await {
                    Ok(Ok(_)) => {}
                    Ok(Err(e)) => log::warn!("Clipboard check failed: {}", e),
                    Err(e) => log::error!("Clipboard check aborted: {}", e),
                }
            }
        }
    }

    log::info!("Clipboard poller stopped");
}

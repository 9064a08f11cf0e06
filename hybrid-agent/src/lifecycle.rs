//! Start/stop wrapper around the reverse agent.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::agent::ReverseAgent;
use crate::hub::HubClient;

struct RunState {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the background run of a [`ReverseAgent`].
///
/// Each `start` gets a fresh cancellation token; tokens are never reused.
pub struct HybridAgentService<H> {
    agent: Arc<ReverseAgent<H>>,
    run: Mutex<Option<RunState>>,
}

impl<H: HubClient> HybridAgentService<H> {
    pub fn new(agent: ReverseAgent<H>) -> Self {
        Self {
            agent: Arc::new(agent),
            run: Mutex::new(None),
        }
    }

    pub fn agent(&self) -> &Arc<ReverseAgent<H>> {
        &self.agent
    }

    /// Spawn the receive loop and return immediately.
    ///
    /// A run that is still active is cancelled first.
    pub fn start(&self) {
        info!("Hybrid agent service starting");
        let mut run = self.lock();
        if let Some(previous) = run.take() {
            debug!("Cancelling previous run");
            previous.token.cancel();
        }

        let token = CancellationToken::new();
        let agent = Arc::clone(&self.agent);
        let run_token = token.clone();
        let handle = tokio::spawn(async move { agent.run(run_token).await });
        *run = Some(RunState { token, handle });
        info!("Hybrid agent service started");
    }

    /// Cancel the active run without waiting for it.
    ///
    /// Returns the run's handle so a caller can observe the loop exiting.
    /// Requests still in flight are not drained.
    pub fn stop(&self) -> Option<JoinHandle<()>> {
        info!("Hybrid agent service stopping");
        let handle = self.lock().take().map(|run| {
            run.token.cancel();
            run.handle
        });
        info!("Hybrid agent service stopped");
        handle
    }

    /// Whether a run was started, not stopped, and has not exited.
    pub fn is_running(&self) -> bool {
        self.lock()
            .as_ref()
            .is_some_and(|run| !run.handle.is_finished())
    }

    fn lock(&self) -> MutexGuard<'_, Option<RunState>> {
        self.run.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<H> Drop for HybridAgentService<H> {
    fn drop(&mut self) {
        let run = self.run.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(run) = run.take() {
            run.token.cancel();
        }
    }
}

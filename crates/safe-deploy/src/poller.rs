//! Periodic relay task status polling.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use safe_relay::{TaskHandle, TaskStatus, TaskStatusService};

/// Called with each successfully fetched status.
pub type StatusObserver = Arc<dyn Fn(&TaskHandle, &TaskStatus) + Send + Sync>;

/// How a polling run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The relay reported a terminal state.
    Terminal(TaskStatus),
    /// `max_polls` queries ran without reaching a terminal state.
    TimedOut { polls: u32 },
    /// The cancellation token fired before a terminal state.
    Cancelled,
}

#[derive(Clone)]
pub struct TaskPoller {
    service: Arc<dyn TaskStatusService>,
    interval: Duration,
    max_polls: Option<u32>,
    observer: Option<StatusObserver>,
}

impl TaskPoller {
    pub fn new(service: Arc<dyn TaskStatusService>, interval: Duration, max_polls: Option<u32>) -> Self {
        Self {
            service,
            interval,
            max_polls,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: StatusObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Query `task` immediately and then once per interval until it is terminal.
    ///
    /// Failed queries are logged and retried on the next tick.
    pub async fn run(&self, task: &TaskHandle, token: CancellationToken) -> PollOutcome {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut polls: u32 = 0;

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    debug!(task_id = %task.task_id, polls, "polling cancelled");
                    return PollOutcome::Cancelled;
                }
                _ = ticker.tick() => {}
            }

            if let Some(max) = self.max_polls {
                if polls >= max {
                    warn!(task_id = %task.task_id, polls, "task did not finish in time");
                    return PollOutcome::TimedOut { polls };
                }
            }
            polls += 1;

            let result = tokio::select! {
                _ = token.cancelled() => return PollOutcome::Cancelled,
                r = self.service.get_task_status(task) => r,
            };

            match result {
                Ok(status) => {
                    debug!(task_id = %task.task_id, state = ?status.task_state, "task status");
                    if let Some(observer) = &self.observer {
                        observer(task, &status);
                    }
                    if status.task_state.is_terminal() {
                        info!(task_id = %task.task_id, state = ?status.task_state, polls, "task finished");
                        return PollOutcome::Terminal(status);
                    }
                }
                Err(e) => {
                    warn!(task_id = %task.task_id, error = %e, "task status query failed");
                }
            }
        }
    }

    /// Spawn [`TaskPoller::run`] and hand its outcome to `on_finish`.
    pub fn start<F, Fut>(&self, task: TaskHandle, on_finish: F) -> PollingTask
    where
        F: FnOnce(PollOutcome) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        let poller = self.clone();
        let child = token.clone();
        let handle = tokio::spawn(async move {
            let outcome = poller.run(&task, child).await;
            on_finish(outcome).await;
        });
        PollingTask {
            token,
            handle: Some(handle),
        }
    }
}

/// A spawned polling run. Dropping it cancels the run.
pub struct PollingTask {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl PollingTask {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for PollingTask {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

//! The deployment flow for one user session.

use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use safe_payload::PayloadService;
use safe_relay::{RelayService, TaskHandle, TaskStatus, TaskStatusService};
use safe_store::ProfileStore;
use safe_types::{Address, Result, SafeError};
use safe_wallet::{ReceiptSource, WalletProvider};

use crate::attempt::DeploymentAttempt;
use crate::poller::{PollingTask, TaskPoller};
use crate::reconcile::{Reconciler, Reconciliation};
use crate::submitter::{RelaySubmitter, SubmissionStep};
use crate::{DeployerConfig, DeploymentEvent, DeploymentEventHandler};

/// External services the flow talks to.
pub struct Collaborators {
    pub payload: Arc<dyn PayloadService>,
    pub relay: Arc<dyn RelayService>,
    pub task_status: Arc<dyn TaskStatusService>,
    pub profile: Arc<dyn ProfileStore>,
    /// `None` when no wallet is connected.
    pub wallet: Option<Arc<dyn WalletProvider>>,
    pub receipts: Option<Arc<dyn ReceiptSource>>,
}

/// Owns the single deployment attempt of a session.
///
/// [`Deployer::create_safe`] is a no-op while an attempt is in flight, after a
/// Safe was deployed, or while a submitted relay task may still execute.
/// Dropping the deployer cancels polling; the relay task itself keeps running.
pub struct Deployer {
    config: DeployerConfig,
    submitter: RelaySubmitter,
    poller: TaskPoller,
    reconciler: Arc<Reconciler>,
    state: Arc<watch::Sender<DeploymentAttempt>>,
    polling: Mutex<Option<PollingTask>>,
    on_event: Option<DeploymentEventHandler>,
}

fn emit(handler: &Option<DeploymentEventHandler>, event: DeploymentEvent) {
    if let Some(h) = handler {
        h(event);
    }
}

fn fail(state: &watch::Sender<DeploymentAttempt>, on_event: &Option<DeploymentEventHandler>, err: SafeError) {
    warn!(kind = ?err.kind(), error = %err, "deployment failed");
    let event = DeploymentEvent::Failed {
        kind: err.kind(),
        message: err.to_string(),
    };
    state.send_modify(|a| {
        if let SafeError::ProfilePersistFailed { address: Some(address), .. } = &err {
            a.resolved_address = Some(*address);
        }
        a.error = Some(err);
        a.loading = false;
    });
    emit(on_event, event);
    emit(on_event, DeploymentEvent::LoadingChanged { loading: false });
}

fn finish(state: &watch::Sender<DeploymentAttempt>, on_event: &Option<DeploymentEventHandler>, result: Reconciliation) {
    match result {
        Reconciliation::Deployed(address) => {
            state.send_modify(|a| {
                a.resolved_address = Some(address);
                a.loading = false;
            });
            emit(on_event, DeploymentEvent::Completed { address });
            emit(on_event, DeploymentEvent::LoadingChanged { loading: false });
        }
        Reconciliation::Failed(err) => fail(state, on_event, err),
        Reconciliation::Abandoned => {
            debug!("deployment polling abandoned");
            state.send_modify(|a| a.loading = false);
            emit(on_event, DeploymentEvent::LoadingChanged { loading: false });
        }
    }
}

impl Deployer {
    pub fn new(config: DeployerConfig, services: Collaborators, on_event: Option<DeploymentEventHandler>) -> Self {
        let (tx, _) = watch::channel(DeploymentAttempt::default());
        let state = Arc::new(tx);

        let submitter = RelaySubmitter::new(
            services.wallet,
            services.payload,
            services.relay,
            config.target_chain_id,
        );

        let observer_state = state.clone();
        let observer_events = on_event.clone();
        let poller = TaskPoller::new(services.task_status, config.poll_interval(), config.max_polls)
            .with_observer(Arc::new(move |task: &TaskHandle, status: &TaskStatus| {
                observer_state.send_modify(|a| a.last_status = Some(status.clone()));
                emit(
                    &observer_events,
                    DeploymentEvent::StatusPolled {
                        task_id: task.task_id.clone(),
                        state: status.task_state,
                    },
                );
            }));

        let reconciler = Arc::new(Reconciler::new(services.profile, services.receipts));

        Self {
            config,
            submitter,
            poller,
            reconciler,
            state,
            polling: Mutex::new(None),
            on_event,
        }
    }

    pub fn config(&self) -> &DeployerConfig {
        &self.config
    }

    /// Snapshot of the current attempt.
    pub fn attempt(&self) -> DeploymentAttempt {
        self.state.borrow().clone()
    }

    /// Receiver notified on every attempt change.
    pub fn subscribe(&self) -> watch::Receiver<DeploymentAttempt> {
        self.state.subscribe()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn is_polling(&self) -> bool {
        self.polling
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|p| !p.is_finished())
    }

    /// Start a deployment attempt and return once the relay accepted it.
    ///
    /// Returns `Ok(None)` without side effects if an attempt is already in
    /// flight, a Safe was already deployed, or an earlier relay task was
    /// abandoned without a terminal failure. Polling continues in the
    /// background; use [`Deployer::wait_until_settled`] or
    /// [`Deployer::subscribe`] to follow it.
    pub async fn create_safe(&self) -> Result<Option<TaskHandle>> {
        let started = self.state.send_if_modified(|a| {
            if !a.can_start() {
                return false;
            }
            *a = DeploymentAttempt::started();
            true
        });
        if !started {
            debug!("deployment already in progress or completed");
            return Ok(None);
        }
        info!(chain_id = self.config.target_chain_id, "starting Safe deployment");
        emit(&self.on_event, DeploymentEvent::LoadingChanged { loading: true });

        let state = &self.state;
        let on_event = &self.on_event;
        let submitted = self
            .submitter
            .submit(|step| match step {
                SubmissionStep::PayloadReceived { owner, payload } => {
                    let predicted = payload.predicted_address;
                    state.send_modify(|a| {
                        a.owner = Some(owner);
                        a.payload = Some(payload);
                    });
                    emit(on_event, DeploymentEvent::PayloadReceived { owner, predicted });
                }
                SubmissionStep::RequestPrepared(request) => {
                    state.send_modify(|a| a.request = Some(request));
                }
                SubmissionStep::Signed(signature) => {
                    state.send_modify(|a| a.signature = Some(signature));
                }
            })
            .await;

        let handle = match submitted {
            Ok(handle) => handle,
            Err(e) => {
                fail(&self.state, &self.on_event, e.clone());
                return Err(e);
            }
        };

        let predicted = self
            .state
            .borrow()
            .payload
            .as_ref()
            .map_or(Address::ZERO, |p| p.predicted_address);
        self.state.send_modify(|a| a.task_handle = Some(handle.clone()));
        emit(
            &self.on_event,
            DeploymentEvent::Submitted {
                task_id: handle.task_id.clone(),
            },
        );

        let reconciler = self.reconciler.clone();
        let state = self.state.clone();
        let on_event = self.on_event.clone();
        let task = handle.clone();
        let polling = self.poller.start(handle.clone(), move |outcome| async move {
            let result = reconciler.reconcile(&task, predicted, outcome).await;
            finish(&state, &on_event, result);
        });
        *self.polling.lock().unwrap() = Some(polling);

        Ok(Some(handle))
    }

    /// Wait until no attempt is in flight and return its final state.
    pub async fn wait_until_settled(&self) -> DeploymentAttempt {
        let mut rx = self.state.subscribe();
        let settled = match rx.wait_for(|a| !a.loading).await {
            Ok(attempt) => attempt.clone(),
            Err(_) => self.attempt(),
        };
        settled
    }

    /// Stop polling. The relay task is not affected.
    pub fn cancel(&self) {
        if let Some(polling) = self.polling.lock().unwrap().as_ref() {
            info!("cancelling deployment polling");
            polling.cancel();
        }
    }
}

use safe_payload::DeploymentPayload;
use safe_relay::{RelayRequest, TaskHandle, TaskState, TaskStatus};
use safe_types::{Address, ErrorKind, Hex, SafeError};

/// State of the single deployment attempt owned by a [`crate::Deployer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentAttempt {
    pub owner: Option<Address>,
    pub payload: Option<DeploymentPayload>,
    pub request: Option<RelayRequest>,
    pub signature: Option<Hex>,
    pub task_handle: Option<TaskHandle>,
    pub last_status: Option<TaskStatus>,
    pub error: Option<SafeError>,
    pub resolved_address: Option<Address>,
    pub loading: bool,
}

impl DeploymentAttempt {
    pub(crate) fn started() -> Self {
        Self {
            loading: true,
            ..Self::default()
        }
    }

    /// The relay reported the deployment as executed.
    pub fn is_deployed(&self) -> bool {
        self.last_status
            .as_ref()
            .is_some_and(|s| s.task_state == TaskState::ExecSuccess)
    }

    /// The relay reported that the submitted task will never execute.
    pub fn task_failed(&self) -> bool {
        self.last_status
            .as_ref()
            .is_some_and(|s| matches!(s.task_state, TaskState::ExecReverted | TaskState::Cancelled))
    }

    /// A new attempt may only start when none is in flight and no relay task
    /// can still deploy a Safe.
    ///
    /// Once a task was submitted, only a reverted or cancelled task frees the
    /// slot. A task that was abandoned or timed out may still execute.
    pub fn can_start(&self) -> bool {
        if self.loading || self.is_deployed() {
            return false;
        }
        self.task_handle.is_none() || self.task_failed()
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(SafeError::kind)
    }

    /// Resolved address that was deployed but could not be saved, for manual recovery.
    pub fn unsaved_address(&self) -> Option<Address> {
        match &self.error {
            Some(SafeError::ProfilePersistFailed { address, .. }) => *address,
            _ => None,
        }
    }
}

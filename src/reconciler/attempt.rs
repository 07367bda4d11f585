use crate::benchmarks::types::SyncState;
use crate::error::ClientError;
use crate::reconciler::ReconcileSettings;

/// Local bookkeeping for one create or delete call. Discarded when the call returns.
///
/// The poll counter is shared by every resubmission of the same call, so
/// self-heal cycles draw from one budget.
#[derive(Debug, Clone)]
pub struct ReconciliationAttempt {
    pub operation: &'static str,
    target_id: Option<String>,
    polls: u32,
    max_polls: u32,
    self_heals: u32,
    last_state: Option<SyncState>,
}

impl ReconciliationAttempt {
    pub fn new(operation: &'static str, settings: &ReconcileSettings) -> Self {
        Self {
            operation,
            target_id: None,
            polls: 0,
            max_polls: settings.max_attempts,
            self_heals: 0,
            last_state: None,
        }
    }

    pub fn set_target(&mut self, id: &str) {
        self.target_id = Some(id.to_owned());
        self.last_state = None;
    }

    pub fn target_id(&self) -> &str {
        self.target_id.as_deref().unwrap_or_default()
    }

    pub fn record_poll(&mut self) -> u32 {
        self.polls += 1;
        self.polls
    }

    pub fn observe(&mut self, state: &SyncState) {
        self.last_state = Some(state.clone());
    }

    pub fn record_self_heal(&mut self) -> u32 {
        self.self_heals += 1;
        self.self_heals
    }

    pub fn polls(&self) -> u32 {
        self.polls
    }

    pub fn self_heals(&self) -> u32 {
        self.self_heals
    }

    pub fn exhausted(&self) -> bool {
        self.polls >= self.max_polls
    }

    pub fn timeout_error(&self) -> ClientError {
        ClientError::Timeout {
            operation: self.operation,
            id: self.target_id().to_owned(),
            attempts: self.polls,
            last_state: self
                .last_state
                .as_ref()
                .map(|state| state.to_string())
                .unwrap_or_else(|| "unknown".to_owned()),
        }
    }
}

use std::sync::Arc;

use crate::{jobs::runner::JobRunner, workflow::approval::ApprovalWorkflow};

/// Shared state handed to every handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<ApprovalWorkflow>,
    pub jobs: JobRunner,
}

impl AppState {
    pub fn new(workflow: Arc<ApprovalWorkflow>, jobs: JobRunner) -> Self {
        Self { workflow, jobs }
    }
}

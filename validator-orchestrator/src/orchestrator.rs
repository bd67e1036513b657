//! Two-stage submission pipeline: generate IR, then validate it
//!
//! Each accepted submission starts a run with a fresh id. The pipeline state
//! is one [`PipelineSnapshot`] value that is replaced on every transition; a
//! run whose id is no longer current drops its late results.

use crate::model::{IrPair, Submission, ValidationResult};
use crate::relay::{RelayBackend, RelayError};
use crate::ValidatorConfig;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Reasons a submission is turned away before any request is made
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmitError {
    #[error("{0} code is empty")]
    EmptyField(&'static str),

    /// Also moves the pipeline to `Failed`
    #[error("{field} is {len} characters long, exceeding the limit of {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

/// Where the pipeline currently is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    #[default]
    Idle,
    GeneratingIr,
    Validating,
    Succeeded,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Succeeded | PipelineState::Failed)
    }

    pub fn is_busy(self) -> bool {
        matches!(self, PipelineState::GeneratingIr | PipelineState::Validating)
    }
}

/// Pipeline stage a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Input,
    IrGeneration,
    Validation,
}

/// Failure categories, from input checks to the verifier's own verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A size limit was exceeded
    InvalidInput,
    /// Network failure, non-2xx status or an unreadable payload
    Transport,
    /// The relay answered with an `error` field
    Reported,
    /// The verifier ran and found the translation incorrect
    Verification,
}

/// Normalized failure shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub stage: Stage,
    pub kind: FailureKind,
    pub message: String,
    pub num_errors: u32,
}

impl Failure {
    fn new(stage: Stage, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            stage,
            kind,
            message: message.into(),
            num_errors: 1,
        }
    }

    fn from_relay(stage: Stage, error: &RelayError) -> Self {
        let kind = match error {
            RelayError::Reported(_) => FailureKind::Reported,
            _ => FailureKind::Transport,
        };
        Self::new(stage, kind, error.to_string())
    }

    fn from_verdict(result: &ValidationResult) -> Self {
        Self {
            stage: Stage::Validation,
            kind: FailureKind::Verification,
            message: result
                .error_message
                .clone()
                .unwrap_or_else(|| "Verification failed".to_string()),
            num_errors: result.num_errors.max(1),
        }
    }
}

/// Everything the pipeline knows about the current run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineSnapshot {
    pub run_id: u64,
    pub state: PipelineState,
    pub ir_pair: Option<IrPair>,
    pub result: Option<ValidationResult>,
    pub failure: Option<Failure>,
}

impl PipelineSnapshot {
    /// A fresh run with nothing carried over from earlier runs
    pub fn started(run_id: u64) -> Self {
        Self {
            run_id,
            state: PipelineState::GeneratingIr,
            ..Default::default()
        }
    }

    pub fn ir_generated(self, ir: IrPair) -> Self {
        Self {
            state: PipelineState::Validating,
            ir_pair: Some(ir),
            ..self
        }
    }

    /// IR arrived but cannot be validated; it stays available for display
    pub fn ir_rejected(self, ir: IrPair, failure: Failure) -> Self {
        Self {
            ir_pair: Some(ir),
            ..self
        }
        .failed(failure)
    }

    pub fn validated(self, result: ValidationResult) -> Self {
        let (state, failure) = if result.success {
            (PipelineState::Succeeded, None)
        } else {
            (PipelineState::Failed, Some(Failure::from_verdict(&result)))
        };
        Self {
            state,
            result: Some(result),
            failure,
            ..self
        }
    }

    pub fn failed(self, failure: Failure) -> Self {
        // Validation-stage errors still produce a result body to render
        let result = match (&self.result, failure.stage) {
            (None, Stage::Validation) => Some(ValidationResult::from_failure(&failure.message)),
            _ => self.result,
        };
        Self {
            state: PipelineState::Failed,
            result,
            failure: Some(failure),
            ..self
        }
    }

    pub fn failure_message(&self) -> Option<&str> {
        self.failure.as_ref().map(|f| f.message.as_str())
    }
}

/// Transient status updates, one per transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Generating { run_id: u64 },
    Validating { run_id: u64 },
    Succeeded { run_id: u64 },
    Failed { run_id: u64, message: String },
}

impl Notification {
    pub fn run_id(&self) -> u64 {
        match self {
            Notification::Generating { run_id }
            | Notification::Validating { run_id }
            | Notification::Succeeded { run_id }
            | Notification::Failed { run_id, .. } => *run_id,
        }
    }
}

/// An accepted submission waiting to be driven by [`Orchestrator::run`]
#[derive(Debug)]
pub struct RunTicket {
    run_id: u64,
    submission: Submission,
}

impl RunTicket {
    pub fn run_id(&self) -> u64 {
        self.run_id
    }
}

/// How a run ended from the caller's point of view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The run reached a terminal state
    Completed(PipelineSnapshot),
    /// A newer submission replaced this run before it finished
    Superseded { run_id: u64 },
}

impl RunOutcome {
    pub fn snapshot(&self) -> Option<&PipelineSnapshot> {
        match self {
            RunOutcome::Completed(snapshot) => Some(snapshot),
            RunOutcome::Superseded { .. } => None,
        }
    }
}

/// Submission orchestrator
pub struct Orchestrator {
    config: ValidatorConfig,
    relay: Arc<dyn RelayBackend>,
    snapshot: Mutex<PipelineSnapshot>,
    last_run: AtomicU64,
    notifier: Option<mpsc::UnboundedSender<Notification>>,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(config: ValidatorConfig, relay: Arc<dyn RelayBackend>) -> Self {
        Self {
            config,
            relay,
            snapshot: Mutex::new(PipelineSnapshot::default()),
            last_run: AtomicU64::new(0),
            notifier: None,
        }
    }

    /// Attach a channel that receives a [`Notification`] per transition
    pub fn with_notifications(mut self) -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.notifier = Some(tx);
        (self, rx)
    }

    pub fn snapshot(&self) -> PipelineSnapshot {
        self.lock().clone()
    }

    pub fn state(&self) -> PipelineState {
        self.lock().state
    }

    /// Accept a submission and move to `GeneratingIr` without awaiting anything
    pub fn begin(&self, submission: Submission) -> Result<RunTicket, SubmitError> {
        if submission.source_code.trim().is_empty() {
            return Err(SubmitError::EmptyField("C++"));
        }
        if submission.translated_code.trim().is_empty() {
            return Err(SubmitError::EmptyField("Rust"));
        }

        let submission = self.apply_default_hints(submission);
        let run_id = self.last_run.fetch_add(1, Ordering::SeqCst) + 1;

        let too_long = check_length("C++ code", &submission.source_code, self.config.max_code_length)
            .or_else(|| {
                check_length("Rust code", &submission.translated_code, self.config.max_code_length)
            });
        if let Some(err) = too_long {
            warn!(run_id, error = %err, "Submission rejected");
            let failure = Failure::new(Stage::Input, FailureKind::InvalidInput, err.to_string());
            self.replace(PipelineSnapshot::started(run_id).failed(failure));
            self.notify(Notification::Failed {
                run_id,
                message: err.to_string(),
            });
            return Err(err);
        }

        if self.state().is_busy() {
            debug!(run_id, "Superseding the run in flight");
        }
        info!(
            run_id,
            cpp_len = submission.source_code.len(),
            rust_len = submission.translated_code.len(),
            "Submission accepted"
        );
        self.replace(PipelineSnapshot::started(run_id));
        self.notify(Notification::Generating { run_id });

        Ok(RunTicket { run_id, submission })
    }

    /// Drive an accepted run through both remote calls
    pub async fn run(&self, ticket: RunTicket) -> RunOutcome {
        let RunTicket { run_id, submission } = ticket;

        debug!(run_id, relay = self.relay.name(), "Requesting IR generation");
        let ir = match self.relay.generate_ir(&submission).await {
            Ok(ir) => ir,
            Err(e) => {
                warn!(run_id, error = %e, "IR generation failed");
                let failure = Failure::from_relay(Stage::IrGeneration, &e);
                return self.finish(run_id, |s| s.failed(failure));
            }
        };

        let too_long = check_length("C++ IR", &ir.source_ir, self.config.max_ir_length)
            .or_else(|| check_length("Rust IR", &ir.target_ir, self.config.max_ir_length));
        if let Some(err) = too_long {
            warn!(run_id, error = %err, "Generated IR rejected");
            let failure = Failure::new(Stage::IrGeneration, FailureKind::InvalidInput, err.to_string());
            return self.finish(run_id, |s| s.ir_rejected(ir, failure));
        }

        if self.advance(run_id, |s| s.ir_generated(ir.clone())).is_none() {
            return RunOutcome::Superseded { run_id };
        }
        info!(
            run_id,
            cpp_ir_len = ir.source_ir.len(),
            rust_ir_len = ir.target_ir.len(),
            "IR generated, validating"
        );
        self.notify(Notification::Validating { run_id });

        match self.relay.validate(&ir, &submission.hints()).await {
            Ok(result) => {
                info!(run_id, success = result.success, num_errors = result.num_errors, "Validation finished");
                self.finish(run_id, |s| s.validated(result))
            }
            Err(e) => {
                warn!(run_id, error = %e, "Validation failed");
                let failure = Failure::from_relay(Stage::Validation, &e);
                self.finish(run_id, |s| s.failed(failure))
            }
        }
    }

    /// Accept and run a submission in one call
    pub async fn submit(&self, submission: Submission) -> Result<RunOutcome, SubmitError> {
        let ticket = self.begin(submission)?;
        Ok(self.run(ticket).await)
    }

    /// Forget the current run; anything still in flight is ignored
    pub fn clear(&self) {
        let run_id = self.last_run.fetch_add(1, Ordering::SeqCst) + 1;
        self.replace(PipelineSnapshot {
            run_id,
            ..Default::default()
        });
    }

    fn apply_default_hints(&self, mut submission: Submission) -> Submission {
        if submission.source_function_name.is_none() {
            submission.source_function_name = self.config.default_cpp_function.clone();
        }
        if submission.target_function_name.is_none() {
            submission.target_function_name = self.config.default_rust_function.clone();
        }
        submission
    }

    fn finish(
        &self,
        run_id: u64,
        transition: impl FnOnce(PipelineSnapshot) -> PipelineSnapshot,
    ) -> RunOutcome {
        let Some(snapshot) = self.advance(run_id, transition) else {
            debug!(run_id, "Dropping result of superseded run");
            return RunOutcome::Superseded { run_id };
        };

        let notification = match &snapshot.failure {
            Some(failure) => Notification::Failed {
                run_id,
                message: failure.message.clone(),
            },
            None => Notification::Succeeded { run_id },
        };
        self.notify(notification);
        RunOutcome::Completed(snapshot)
    }

    /// Apply a transition if `run_id` is still the current run
    ///
    /// Returns the resulting snapshot, copied under the same lock.
    fn advance(
        &self,
        run_id: u64,
        transition: impl FnOnce(PipelineSnapshot) -> PipelineSnapshot,
    ) -> Option<PipelineSnapshot> {
        let mut guard = self.lock();
        if guard.run_id != run_id {
            return None;
        }
        let current = std::mem::take(&mut *guard);
        *guard = transition(current);
        Some(guard.clone())
    }

    /// Install the snapshot of a new run unless a newer run already took over
    fn replace(&self, snapshot: PipelineSnapshot) {
        let mut guard = self.lock();
        if guard.run_id <= snapshot.run_id {
            *guard = snapshot;
        }
    }

    fn lock(&self) -> MutexGuard<'_, PipelineSnapshot> {
        self.snapshot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn notify(&self, notification: Notification) {
        if let Some(tx) = &self.notifier {
            // Nobody listening is fine
            let _ = tx.send(notification);
        }
    }
}

fn check_length(field: &'static str, text: &str, max: usize) -> Option<SubmitError> {
    let len = text.chars().count();
    (len > max).then_some(SubmitError::TooLong { field, len, max })
}

//! Workflow Sequencer: ordered, dependent multi-step engine procedures.
//!
//! # Design
//! - Steps are lazy: a step's future is only created once every earlier step
//!   succeeded, so later steps never reach the engine after a failure.
//! - Branches are decided when the workflow is built, not while it runs.
//! - Progress is reported through an optional observer as [`WorkflowState`]
//!   transitions: `Pending -> Running(0) -> ... -> Completed | Failed(i)`.

use std::future::Future;
use std::pin::Pin;

use floodgate_telemetry::Metrics;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

type StepFuture<'a, T> = Pin<Box<dyn Future<Output = ClientResult<T>> + Send + 'a>>;
type StepFn<'a, T> = Box<dyn FnOnce() -> StepFuture<'a, T> + Send + 'a>;
type Observer<'a> = Box<dyn FnMut(&WorkflowState) + Send + 'a>;

/// Progress of a running workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    /// Built but not started.
    Pending,
    /// Executing the step at `index`.
    Running {
        /// Zero-based step position.
        index: usize,
        /// Step name.
        step: &'static str,
    },
    /// Stopped at the step at `index`; later steps never ran.
    Failed {
        /// Zero-based step position.
        index: usize,
        /// Step name.
        step: &'static str,
    },
    /// Every step succeeded.
    Completed,
}

/// One named, lazily started step.
pub struct WorkflowStep<'a, T> {
    name: &'static str,
    run: StepFn<'a, T>,
}

impl<'a, T> WorkflowStep<'a, T> {
    /// Wrap `run`, which is called only when the step is reached.
    pub fn new<F, Fut>(name: &'static str, run: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'a,
        Fut: Future<Output = ClientResult<T>> + Send + 'a,
    {
        Self {
            name,
            run: Box::new(move || Box::pin(run())),
        }
    }

    /// Step name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

/// Ordered list of steps whose result is the last step's output.
pub struct Workflow<'a, T> {
    name: &'static str,
    steps: Vec<WorkflowStep<'a, T>>,
    observer: Option<Observer<'a>>,
    metrics: Option<Metrics>,
}

impl<'a, T> Workflow<'a, T>
where
    T: Send + 'a,
{
    /// Start an empty workflow.
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            steps: Vec::new(),
            observer: None,
            metrics: None,
        }
    }

    /// Append a step.
    #[must_use]
    pub fn step(mut self, step: WorkflowStep<'a, T>) -> Self {
        self.steps.push(step);
        self
    }

    /// Append a step only when `enabled`.
    #[must_use]
    pub fn step_if(self, enabled: bool, step: WorkflowStep<'a, T>) -> Self {
        if enabled { self.step(step) } else { self }
    }

    /// Report every state transition to `observer`.
    #[must_use]
    pub fn observe(mut self, observer: impl FnMut(&WorkflowState) + Send + 'a) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Count step outcomes in `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Option<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Names of the steps that will run, in order.
    #[must_use]
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(WorkflowStep::name).collect()
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the failing step's error unchanged, or
    /// [`ClientError::InvalidInput`] when the workflow has no steps.
    pub async fn run(self) -> ClientResult<T> {
        let Self {
            name,
            steps,
            mut observer,
            metrics,
        } = self;
        let mut notify = |state: WorkflowState| {
            if let Some(observer) = observer.as_mut() {
                observer(&state);
            }
        };
        notify(WorkflowState::Pending);

        let total = steps.len();
        let mut last = None;
        for (index, step) in steps.into_iter().enumerate() {
            let step_name = step.name;
            notify(WorkflowState::Running {
                index,
                step: step_name,
            });
            debug!(workflow = name, step = step_name, index, total, "workflow step started");
            match (step.run)().await {
                Ok(output) => {
                    if let Some(metrics) = &metrics {
                        metrics.inc_workflow_step(name, "ok");
                    }
                    last = Some(output);
                }
                Err(err) => {
                    if let Some(metrics) = &metrics {
                        metrics.inc_workflow_step(name, "failed");
                    }
                    warn!(
                        workflow = name,
                        step = step_name,
                        index,
                        error = %err,
                        "workflow aborted"
                    );
                    notify(WorkflowState::Failed {
                        index,
                        step: step_name,
                    });
                    return Err(err);
                }
            }
        }

        let output = last.ok_or(ClientError::InvalidInput {
            field: "workflow",
            reason: "no_steps",
        })?;
        notify(WorkflowState::Completed);
        info!(workflow = name, steps = total, "workflow completed");
        Ok(output)
    }
}

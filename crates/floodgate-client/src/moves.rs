//! The `move_torrents` workflow.
//!
//! `stop -> set_directory -> [move_files] -> check_hash -> start`. The file move
//! is chosen once from the request; nothing is rolled back when a later step
//! fails, so a failed move can leave torrents stopped.

use std::path::Path;

use floodgate_fsops::{Relocation, relocate_payloads};
use floodgate_rpc::{BatchExecutor, Operation, RpcValue, commands};
use floodgate_telemetry::Metrics;
use floodgate_torrent_core::{MoveTorrents, TorrentResult};

use crate::error::ClientError;
use crate::workflow::{Workflow, WorkflowStep};

const WORKFLOW: &str = "move_torrents";

/// Individual stage of a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveStep {
    /// Stop and close the torrents.
    Stop,
    /// Point the engine at the new directory.
    SetDirectory,
    /// Physically relocate payloads on disk.
    MoveFiles,
    /// Re-verify pieces at the new location.
    CheckHash,
    /// Restart the torrents.
    Start,
}

impl MoveStep {
    /// Step name used in logs, metrics, and workflow state.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::SetDirectory => "set_directory",
            Self::MoveFiles => "move_files",
            Self::CheckHash => "check_hash",
            Self::Start => "start",
        }
    }
}

/// Validated move request with its branch already selected.
#[derive(Debug, Clone)]
pub struct MoveTorrentsPlan {
    request: MoveTorrents,
    steps: Vec<MoveStep>,
}

impl MoveTorrentsPlan {
    /// Validate `request` and fix the step list.
    ///
    /// # Errors
    ///
    /// Returns the request's validation error.
    pub fn new(request: MoveTorrents) -> TorrentResult<Self> {
        request.validate()?;
        let mut steps = vec![MoveStep::Stop, MoveStep::SetDirectory];
        if request.move_files {
            steps.push(MoveStep::MoveFiles);
        }
        steps.extend([MoveStep::CheckHash, MoveStep::Start]);
        Ok(Self { request, steps })
    }

    /// Steps this plan will run, in order.
    #[must_use]
    pub fn steps(&self) -> &[MoveStep] {
        &self.steps
    }

    /// Source and target pairs for the on-disk move.
    #[must_use]
    pub fn relocations(&self) -> Vec<Relocation> {
        let destination = Path::new(&self.request.destination);
        self.request
            .sources
            .iter()
            .zip(&self.request.filenames)
            .map(|(source, filename)| Relocation {
                source: source.into(),
                destination: destination.join(filename),
            })
            .collect()
    }

    /// Build the runnable workflow; its output is the start step's rows.
    #[must_use]
    pub fn into_workflow(
        self,
        executor: &BatchExecutor,
        metrics: Option<Metrics>,
    ) -> Workflow<'_, Vec<RpcValue>> {
        let workflow = Workflow::new(WORKFLOW).with_metrics(metrics);
        self.steps
            .iter()
            .fold(workflow, |workflow, step| workflow.step(self.step(*step, executor)))
    }

    fn step<'a>(
        &self,
        step: MoveStep,
        executor: &'a BatchExecutor,
    ) -> WorkflowStep<'a, Vec<RpcValue>> {
        let hashes = &self.request.hashes;
        let operation = match step {
            MoveStep::Stop => commands::stop(hashes),
            MoveStep::SetDirectory => commands::set_directory(
                hashes,
                &self.request.destination,
                self.request.is_base_path,
            ),
            MoveStep::CheckHash => commands::check_hash(hashes),
            MoveStep::Start => commands::start(hashes),
            MoveStep::MoveFiles => {
                let relocations = self.relocations();
                return WorkflowStep::new(step.name(), move || async move {
                    relocate_payloads(relocations)
                        .await
                        .map_err(|err| ClientError::fs(WORKFLOW, err))?;
                    Ok(Vec::new())
                });
            }
        };
        engine_step(step, executor, operation)
    }
}

fn engine_step(
    step: MoveStep,
    executor: &BatchExecutor,
    operation: Operation,
) -> WorkflowStep<'_, Vec<RpcValue>> {
    WorkflowStep::new(step.name(), move || async move {
        executor
            .execute(operation)
            .await
            .map_err(|err| ClientError::engine(WORKFLOW, err))
    })
}

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};

use crate::corpus::definition::{TestDefinition, TestId};
use crate::foundation::error::{SuiteError, SuiteResult, panic_message};
use crate::persist::writer::{PersistReport, ResultPersister};
use crate::render::cancel::CancelToken;
use crate::render::engine::{JobId, JobOutcome, JobReply, RenderEngine, RenderJob};
use crate::run::notify::{CompletionNotifier, RunOutcome};
use crate::run::results::ResultMap;

/// Messages delivered to a run's coordinator. Every asynchronous unit of a run reports back
/// through one channel, so the coordinator handles them strictly one at a time.
#[derive(Debug)]
pub(crate) enum DriverEvent {
    Loaded(Vec<TestDefinition>),
    Job { job: JobId, outcome: JobOutcome },
    Persisted(SuiteResult<PersistReport>),
    Cancel,
}

/// Driver lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DriverState {
    Idle,
    /// Exactly one job is outstanding: the one at `index`.
    Running { index: usize },
    Canceled,
    /// All jobs settled; the persist phase is running.
    Finalizing,
    Done,
}

/// A job that reported failure. It is recorded as absent and the run moves on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailedTest {
    pub id: TestId,
    pub message: String,
}

/// Summary returned when a run ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    /// Qualifying sequence, in run order.
    pub qualifying: Vec<TestId>,
    /// Successfully rendered tests, in completion order.
    pub rendered: Vec<TestId>,
    pub failed: Vec<FailedTest>,
    /// Files written by the persist phase.
    pub written: Vec<PathBuf>,
}

impl RunReport {
    pub(crate) fn canceled_before_start() -> Self {
        Self {
            outcome: RunOutcome::Canceled,
            qualifying: Vec::new(),
            rendered: Vec::new(),
            failed: Vec::new(),
            written: Vec::new(),
        }
    }
}

/// Runs the qualifying sequence one job at a time, then hands the results to the persister.
pub(crate) struct SequentialDriver {
    definitions: Vec<TestDefinition>,
    results: ResultMap,
    rendered: Vec<TestId>,
    failed: Vec<FailedTest>,
    written: Vec<PathBuf>,
    state: DriverState,
    cancel: CancelToken,
    engine: Box<dyn RenderEngine>,
    persister: ResultPersister,
    tx: Sender<DriverEvent>,
}

impl SequentialDriver {
    pub(crate) fn new(
        definitions: Vec<TestDefinition>,
        engine: Box<dyn RenderEngine>,
        persister: ResultPersister,
        cancel: CancelToken,
        tx: Sender<DriverEvent>,
    ) -> Self {
        Self {
            definitions,
            results: ResultMap::new(),
            rendered: Vec::new(),
            failed: Vec::new(),
            written: Vec::new(),
            state: DriverState::Idle,
            cancel,
            engine,
            persister,
            tx,
        }
    }

    /// Drive the run to a terminal state, signal completion once, and report.
    pub(crate) fn run(
        mut self,
        events: &Receiver<DriverEvent>,
        notifier: &mut CompletionNotifier,
    ) -> RunReport {
        let outcome = self.drive(events);
        if self.state != DriverState::Canceled {
            self.state = DriverState::Done;
        }
        tracing::info!(
            %outcome,
            rendered = self.rendered.len(),
            failed = self.failed.len(),
            "render run finished"
        );
        notifier.notify(&outcome);

        RunReport {
            outcome,
            qualifying: self.definitions.iter().map(|d| d.id().clone()).collect(),
            rendered: self.rendered,
            failed: self.failed,
            written: self.written,
        }
    }

    fn drive(&mut self, events: &Receiver<DriverEvent>) -> RunOutcome {
        if self.definitions.is_empty() {
            tracing::info!("no qualifying tests; skipping render and persist");
            return RunOutcome::Empty;
        }
        if self.cancel.is_canceled() {
            self.state = DriverState::Canceled;
            return RunOutcome::Canceled;
        }

        tracing::info!(tests = self.definitions.len(), "starting render run");
        self.launch(0);

        loop {
            let Ok(event) = events.recv() else {
                // Unreachable while `self.tx` is alive; treat it like a teardown.
                tracing::error!("run event channel closed");
                self.state = DriverState::Canceled;
                return RunOutcome::Canceled;
            };

            match event {
                DriverEvent::Cancel => {
                    if let DriverState::Running { index } = self.state {
                        tracing::info!(index, "run canceled");
                        self.engine.stop();
                        self.state = DriverState::Canceled;
                        return RunOutcome::Canceled;
                    }
                    tracing::debug!(state = ?self.state, "cancel ignored during finalization");
                }
                DriverEvent::Job { job, outcome } => {
                    let DriverState::Running { index } = self.state else {
                        tracing::debug!(job = job.0, "ignoring late job outcome");
                        continue;
                    };
                    if job.0 != index {
                        tracing::warn!(job = job.0, expected = index, "ignoring stale job outcome");
                        continue;
                    }
                    if self.cancel.is_canceled() {
                        self.engine.stop();
                        self.state = DriverState::Canceled;
                        return RunOutcome::Canceled;
                    }

                    self.settle(index, outcome);
                    if self.settled() == self.definitions.len() {
                        if let Some(outcome) = self.finalize() {
                            return outcome;
                        }
                    } else {
                        tracing::debug!(
                            next = index + 1,
                            total = self.definitions.len(),
                            "next test"
                        );
                        self.launch(index + 1);
                    }
                }
                DriverEvent::Persisted(result) => {
                    if self.state != DriverState::Finalizing {
                        continue;
                    }
                    return match result {
                        Ok(report) => {
                            self.written = report.files;
                            RunOutcome::Completed
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "persisting results failed");
                            RunOutcome::PersistFailed(e.to_string())
                        }
                    };
                }
                DriverEvent::Loaded(_) => {
                    tracing::warn!("ignoring corpus load delivered after the run started");
                }
            }
        }
    }

    fn settled(&self) -> usize {
        self.results.len() + self.failed.len()
    }

    fn launch(&mut self, index: usize) {
        let def = &self.definitions[index];
        tracing::debug!(test = %def.id(), index, "render test");

        let job = RenderJob {
            id: JobId(index),
            test: def.id().clone(),
            options: def.to_options(),
            cancel: self.cancel.clone(),
        };
        self.state = DriverState::Running { index };
        self.engine
            .start(job, JobReply::new(JobId(index), self.tx.clone()));
    }

    fn settle(&mut self, index: usize, outcome: JobOutcome) {
        let def = self.definitions[index].clone();
        match outcome {
            JobOutcome::Rendered(image) => {
                let id = def.id().clone();
                match self.results.insert(def, image) {
                    Ok(()) => self.rendered.push(id),
                    Err(e) => {
                        tracing::error!(test = %id, error = %e, "cannot record result");
                        self.failed.push(FailedTest {
                            id,
                            message: e.to_string(),
                        });
                    }
                }
            }
            JobOutcome::Failed(e) => {
                tracing::error!(test = %def.id(), error = %e, "render failed");
                self.failed.push(FailedTest {
                    id: def.id().clone(),
                    message: e.to_string(),
                });
            }
        }
        debug_assert!(self.results.len() <= index + 1);
    }

    /// Start the persist phase. Returns an outcome only when the phase could not be started.
    fn finalize(&mut self) -> Option<RunOutcome> {
        self.state = DriverState::Finalizing;
        let results = std::mem::take(&mut self.results);
        let persister = self.persister.clone();
        let tx = self.tx.clone();

        let spawned = std::thread::Builder::new()
            .name("snapsuite-persist".to_owned())
            .spawn(move || {
                let persisted =
                    std::panic::catch_unwind(AssertUnwindSafe(|| persister.persist(&results)));
                let result = persisted.unwrap_or_else(|payload| {
                    Err(SuiteError::persist(format!(
                        "persist worker panicked: {}",
                        panic_message(&*payload)
                    )))
                });
                let _ = tx.send(DriverEvent::Persisted(result));
            });
        match spawned {
            Ok(_) => None,
            Err(e) => {
                tracing::error!(error = %e, "cannot spawn persist worker");
                Some(RunOutcome::PersistFailed(format!(
                    "cannot spawn persist worker: {e}"
                )))
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/run/driver.rs"]
mod tests;

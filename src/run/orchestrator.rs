use std::panic::AssertUnwindSafe;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use crate::corpus::loader::CorpusLoader;
use crate::foundation::error::{SuiteError, SuiteResult, panic_message};
use crate::persist::writer::ResultPersister;
use crate::render::cancel::CancelToken;
use crate::render::engine::RenderEngine;
use crate::run::driver::{DriverEvent, RunReport, SequentialDriver};
use crate::run::notify::{CompletionNotifier, RunOutcome};

/// One render-test run: load the corpus, render every qualifying test in order, persist results,
/// signal completion.
///
/// Loading, each render job, and persistence run off the coordinating thread and report back over
/// a single channel; no two of them overlap.
pub struct RenderTestRun {
    loader: CorpusLoader,
    engine: Box<dyn RenderEngine>,
    persister: ResultPersister,
    notifier: CompletionNotifier,
}

impl std::fmt::Debug for RenderTestRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderTestRun")
            .field("loader", &self.loader)
            .field("persister", &self.persister)
            .field("notifier", &self.notifier)
            .finish()
    }
}

impl RenderTestRun {
    pub fn new(
        loader: CorpusLoader,
        engine: impl RenderEngine + 'static,
        persister: ResultPersister,
    ) -> Self {
        Self {
            loader,
            engine: Box::new(engine),
            persister,
            notifier: CompletionNotifier::noop(),
        }
    }

    /// Register the completion callback. It is invoked exactly once per run, whatever the outcome.
    pub fn on_complete(mut self, callback: impl FnOnce(&RunOutcome) + Send + 'static) -> Self {
        self.notifier = CompletionNotifier::new(callback);
        self
    }

    /// Start the run on a coordinator thread and return a handle for cancellation and joining.
    pub fn start(self) -> SuiteResult<RunHandle> {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::new();

        let coordinator = {
            let tx = tx.clone();
            let cancel = cancel.clone();
            std::thread::Builder::new()
                .name("snapsuite-run".to_owned())
                .spawn(move || self.coordinate(tx, rx, cancel))
                .map_err(|e| {
                    SuiteError::Other(anyhow::anyhow!("cannot spawn run coordinator: {e}"))
                })?
        };

        Ok(RunHandle {
            canceler: RunCanceler { cancel, tx },
            coordinator,
        })
    }

    /// Run to completion on the calling thread.
    pub fn run(self) -> RunReport {
        let (tx, rx) = mpsc::channel();
        self.coordinate(tx, rx, CancelToken::new())
    }

    fn coordinate(
        self,
        tx: Sender<DriverEvent>,
        rx: Receiver<DriverEvent>,
        cancel: CancelToken,
    ) -> RunReport {
        let Self {
            loader,
            engine,
            persister,
            mut notifier,
        } = self;

        let loader_tx = tx.clone();
        let spawned = std::thread::Builder::new()
            .name("snapsuite-load".to_owned())
            .spawn(move || {
                // A crashed loader behaves like an unlistable corpus: nothing qualifies.
                let definitions = std::panic::catch_unwind(AssertUnwindSafe(|| loader.load()))
                    .unwrap_or_else(|payload| {
                        let panic = panic_message(&*payload);
                        tracing::error!(%panic, "corpus loader panicked");
                        Vec::new()
                    });
                let _ = loader_tx.send(DriverEvent::Loaded(definitions));
            });

        let definitions = match spawned {
            Ok(_) => loop {
                match rx.recv() {
                    Ok(DriverEvent::Loaded(definitions)) => break definitions,
                    Ok(DriverEvent::Cancel) => {
                        tracing::info!("run canceled while loading the corpus");
                        notifier.notify(&RunOutcome::Canceled);
                        return RunReport::canceled_before_start();
                    }
                    Ok(_) => tracing::warn!("unexpected event while loading the corpus"),
                    Err(_) => break Vec::new(),
                }
            },
            Err(e) => {
                tracing::error!(error = %e, "cannot spawn corpus loader");
                Vec::new()
            }
        };

        SequentialDriver::new(definitions, engine, persister, cancel, tx).run(&rx, &mut notifier)
    }
}

/// Cloneable cancellation handle for a started run.
#[derive(Clone, Debug)]
pub struct RunCanceler {
    cancel: CancelToken,
    tx: Sender<DriverEvent>,
}

impl RunCanceler {
    /// Request cancellation. The in-flight job is asked to stop, no further job starts, and the
    /// persist phase never runs. Has no effect once persistence has begun.
    pub fn cancel(&self) {
        self.cancel.cancel();
        let _ = self.tx.send(DriverEvent::Cancel);
    }

    pub fn is_canceled(&self) -> bool {
        self.cancel.is_canceled()
    }
}

/// Handle to a run started with [`RenderTestRun::start`].
#[derive(Debug)]
pub struct RunHandle {
    canceler: RunCanceler,
    coordinator: JoinHandle<RunReport>,
}

impl RunHandle {
    pub fn cancel(&self) {
        self.canceler.cancel();
    }

    pub fn canceler(&self) -> RunCanceler {
        self.canceler.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.coordinator.is_finished()
    }

    /// Wait for the run to end.
    pub fn join(self) -> SuiteResult<RunReport> {
        self.coordinator
            .join()
            .map_err(|_| SuiteError::Other(anyhow::anyhow!("run coordinator panicked")))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/run/orchestrator.rs"]
mod tests;

use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::thread::JoinHandle;

use crate::corpus::definition::TestId;
use crate::corpus::options::RenderOptions;
use crate::foundation::error::{SuiteError, SuiteResult, panic_message};
use crate::render::cancel::CancelToken;
use crate::render::image::RenderedImage;
use crate::run::driver::DriverEvent;

/// Position of a job in the qualifying sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub usize);

/// One render request.
#[derive(Clone, Debug)]
pub struct RenderJob {
    pub id: JobId,
    pub test: TestId,
    pub options: RenderOptions,
    /// Set when the run is canceled; engines should stop early when they see it.
    pub cancel: CancelToken,
}

/// Terminal outcome of one render job.
#[derive(Debug)]
pub(crate) enum JobOutcome {
    Rendered(RenderedImage),
    Failed(SuiteError),
}

/// Completion handle for one job.
///
/// Consuming methods guarantee at most one outcome per job. Dropping the reply without answering
/// reports a failure, so a job always produces exactly one outcome.
#[derive(Debug)]
pub struct JobReply {
    job: JobId,
    tx: Option<Sender<DriverEvent>>,
}

impl JobReply {
    pub(crate) fn new(job: JobId, tx: Sender<DriverEvent>) -> Self {
        Self { job, tx: Some(tx) }
    }

    pub fn job(&self) -> JobId {
        self.job
    }

    pub fn succeed(self, image: RenderedImage) {
        self.send(JobOutcome::Rendered(image));
    }

    pub fn fail(self, err: SuiteError) {
        self.send(JobOutcome::Failed(err));
    }

    pub fn finish(self, result: SuiteResult<RenderedImage>) {
        match result {
            Ok(image) => self.succeed(image),
            Err(e) => self.fail(e),
        }
    }

    fn send(mut self, outcome: JobOutcome) {
        if let Some(tx) = self.tx.take() {
            // The coordinator may already be gone (run canceled); nothing left to tell.
            let _ = tx.send(DriverEvent::Job {
                job: self.job,
                outcome,
            });
        }
    }
}

impl Drop for JobReply {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(DriverEvent::Job {
                job: self.job,
                outcome: JobOutcome::Failed(SuiteError::render(
                    "engine dropped the job without reporting an outcome",
                )),
            });
        }
    }
}

/// Asynchronous rendering engine driven by the sequential driver.
///
/// `start` must return promptly; the outcome is delivered later through `reply`. The driver never
/// has more than one job outstanding.
pub trait RenderEngine: Send {
    fn start(&mut self, job: RenderJob, reply: JobReply);

    /// Ask the in-flight job to stop. The job's cancel token is already set when this is called.
    fn stop(&mut self) {}
}

/// Synchronous renderer that [`ThreadedEngine`] runs off the coordinator thread.
pub trait Renderer: Send + Sync + 'static {
    fn render(&self, options: &RenderOptions, cancel: &CancelToken) -> SuiteResult<RenderedImage>;
}

impl<F> Renderer for F
where
    F: Fn(&RenderOptions, &CancelToken) -> SuiteResult<RenderedImage> + Send + Sync + 'static,
{
    fn render(&self, options: &RenderOptions, cancel: &CancelToken) -> SuiteResult<RenderedImage> {
        self(options, cancel)
    }
}

/// Adapts a [`Renderer`] into a [`RenderEngine`] by running each job on its own worker thread.
pub struct ThreadedEngine<R: Renderer> {
    renderer: Arc<R>,
    in_flight: Option<JoinHandle<()>>,
}

impl<R: Renderer> std::fmt::Debug for ThreadedEngine<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreadedEngine")
            .field("in_flight", &self.in_flight.is_some())
            .finish()
    }
}

impl<R: Renderer> ThreadedEngine<R> {
    pub fn new(renderer: R) -> Self {
        Self {
            renderer: Arc::new(renderer),
            in_flight: None,
        }
    }

    fn reap(&mut self) {
        if let Some(handle) = self.in_flight.take()
            && let Err(payload) = handle.join()
        {
            tracing::error!(panic = %panic_message(&*payload), "render worker panicked");
        }
    }
}

impl<R: Renderer> RenderEngine for ThreadedEngine<R> {
    fn start(&mut self, job: RenderJob, reply: JobReply) {
        // The previous job has already replied, so its worker is about to exit.
        self.reap();

        let renderer = self.renderer.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("snapsuite-render-{}", job.id.0))
            .spawn(move || {
                if job.cancel.is_canceled() {
                    reply.fail(SuiteError::Canceled);
                    return;
                }
                let result = renderer.render(&job.options, &job.cancel);
                reply.finish(result);
            });

        match spawned {
            Ok(handle) => self.in_flight = Some(handle),
            // The closure (and the reply inside it) is dropped, which reports the failure.
            Err(e) => tracing::error!(error = %e, "cannot spawn render worker"),
        }
    }

    fn stop(&mut self) {
        // Workers observe the cancel token; do not block on a renderer that ignores it.
        if self.in_flight.take().is_some() {
            tracing::debug!("detaching in-flight render worker");
        }
    }
}

impl<R: Renderer> Drop for ThreadedEngine<R> {
    fn drop(&mut self) {
        if let Some(handle) = self.in_flight.take()
            && handle.is_finished()
        {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/engine.rs"]
mod tests;

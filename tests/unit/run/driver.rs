use super::*;
use crate::corpus::style::StyleDocument;
use crate::render::image::RenderedImage;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

#[derive(Clone, Copy, Debug)]
enum Step {
    Succeed,
    Fail,
    /// Keep the reply and cancel the run.
    CancelWhileRunning,
    /// Reply successfully but cancel before the driver sees the reply.
    CancelThenSucceed,
}

struct ScriptedEngine {
    steps: Vec<Step>,
    log: Arc<Mutex<Vec<String>>>,
    cancel: CancelToken,
    tx: Sender<DriverEvent>,
    held: Vec<JobReply>,
    stopped: Arc<Mutex<bool>>,
}

impl RenderEngine for ScriptedEngine {
    fn start(&mut self, job: RenderJob, reply: JobReply) {
        self.log.lock().unwrap().push(format!("start {}", job.test));
        assert_eq!(reply.job(), job.id);
        match self.steps[job.id.0] {
            Step::Succeed => {
                self.log.lock().unwrap().push(format!("done {}", job.test));
                let image = RenderedImage::solid(1, 1, [job.id.0 as u8, 0, 0, 255]).unwrap();
                reply.succeed(image);
            }
            Step::Fail => {
                self.log.lock().unwrap().push(format!("done {}", job.test));
                reply.fail(SuiteError::render("engine exploded"));
            }
            Step::CancelWhileRunning => {
                self.held.push(reply);
                self.cancel.cancel();
                self.tx.send(DriverEvent::Cancel).unwrap();
            }
            Step::CancelThenSucceed => {
                self.cancel.cancel();
                reply.succeed(RenderedImage::solid(1, 1, [0; 4]).unwrap());
            }
        }
    }

    fn stop(&mut self) {
        *self.stopped.lock().unwrap() = true;
    }
}

struct Harness {
    log: Arc<Mutex<Vec<String>>>,
    outcomes: Arc<Mutex<Vec<RunOutcome>>>,
    stopped: Arc<Mutex<bool>>,
    root: PathBuf,
}

fn defs(n: usize) -> Vec<TestDefinition> {
    (0..n)
        .map(|i| TestDefinition::new("cat", format!("t{i}"), "{}", StyleDocument::default()))
        .collect()
}

fn run_script(name: &str, definitions: Vec<TestDefinition>, steps: &[Step]) -> (RunReport, Harness) {
    let root = PathBuf::from("target").join("unit_driver").join(name);
    let _ = std::fs::remove_dir_all(&root);

    let (tx, rx) = mpsc::channel();
    let cancel = CancelToken::new();
    let log = Arc::new(Mutex::new(Vec::new()));
    let stopped = Arc::new(Mutex::new(false));
    let engine = ScriptedEngine {
        steps: steps.to_vec(),
        log: log.clone(),
        cancel: cancel.clone(),
        tx: tx.clone(),
        held: Vec::new(),
        stopped: stopped.clone(),
    };

    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let seen = outcomes.clone();
    let mut notifier = CompletionNotifier::new(move |o| seen.lock().unwrap().push(o.clone()));

    let driver = SequentialDriver::new(
        definitions,
        Box::new(engine),
        ResultPersister::new(&root),
        cancel,
        tx,
    );
    let report = driver.run(&rx, &mut notifier);
    (
        report,
        Harness {
            log,
            outcomes,
            stopped,
            root,
        },
    )
}

#[test]
fn jobs_run_strictly_in_sequence_order() {
    let (report, h) = run_script("order", defs(3), &[Step::Succeed; 3]);
    assert_eq!(
        *h.log.lock().unwrap(),
        vec![
            "start cat/t0",
            "done cat/t0",
            "start cat/t1",
            "done cat/t1",
            "start cat/t2",
            "done cat/t2",
        ]
    );
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.rendered, report.qualifying);
    assert_eq!(report.written.len(), 3);
    assert!(h.root.join("cat").join("t2").join("actual.png").is_file());
    assert_eq!(*h.outcomes.lock().unwrap(), vec![RunOutcome::Completed]);
}

#[test]
fn failed_job_is_recorded_as_absent_and_run_advances() {
    let (report, h) = run_script(
        "failure",
        defs(3),
        &[Step::Succeed, Step::Fail, Step::Succeed],
    );
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(
        report.rendered,
        vec![TestId::new("cat", "t0"), TestId::new("cat", "t2")]
    );
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].id, TestId::new("cat", "t1"));
    assert!(report.failed[0].message.contains("engine exploded"));

    assert!(h.root.join("cat").join("t0").join("actual.png").is_file());
    assert!(!h.root.join("cat").join("t1").exists());
    assert!(h.root.join("cat").join("t2").join("actual.png").is_file());
}

#[test]
fn all_jobs_failing_still_persists_and_completes() {
    let (report, h) = run_script("all_fail", defs(2), &[Step::Fail, Step::Fail]);
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert!(report.rendered.is_empty());
    assert!(report.written.is_empty());
    assert!(h.root.is_dir());
    assert_eq!(h.outcomes.lock().unwrap().len(), 1);
}

#[test]
fn empty_sequence_notifies_once_without_touching_output() {
    let (report, h) = run_script("empty", Vec::new(), &[]);
    assert_eq!(report.outcome, RunOutcome::Empty);
    assert!(h.log.lock().unwrap().is_empty());
    assert!(!h.root.exists());
    assert_eq!(*h.outcomes.lock().unwrap(), vec![RunOutcome::Empty]);
}

#[test]
fn cancel_while_running_stops_engine_and_skips_persist() {
    let (report, h) = run_script(
        "cancel_running",
        defs(3),
        &[Step::Succeed, Step::CancelWhileRunning, Step::Succeed],
    );
    assert_eq!(report.outcome, RunOutcome::Canceled);
    assert_eq!(
        *h.log.lock().unwrap(),
        vec!["start cat/t0", "done cat/t0", "start cat/t1"]
    );
    assert!(*h.stopped.lock().unwrap());
    assert!(!h.root.exists());
    assert_eq!(*h.outcomes.lock().unwrap(), vec![RunOutcome::Canceled]);
}

#[test]
fn cancel_observed_before_completion_prevents_advance() {
    let (report, h) = run_script(
        "cancel_then_reply",
        defs(2),
        &[Step::CancelThenSucceed, Step::Succeed],
    );
    assert_eq!(report.outcome, RunOutcome::Canceled);
    assert_eq!(*h.log.lock().unwrap(), vec!["start cat/t0"]);
    assert!(report.rendered.is_empty());
    assert!(!h.root.exists());
}

#[test]
fn last_job_cancel_never_reaches_persist() {
    let (report, h) = run_script("cancel_last", defs(1), &[Step::CancelThenSucceed]);
    assert_eq!(report.outcome, RunOutcome::Canceled);
    assert!(!h.root.exists());
}

#[test]
fn persist_failure_is_reported_distinctly() {
    let root = PathBuf::from("target").join("unit_driver").join("persist_fail_root");
    let _ = std::fs::remove_dir_all(&root);
    std::fs::create_dir_all(root.parent().unwrap()).unwrap();
    std::fs::write(&root, "a file where the output root should be").unwrap();

    struct Instant;
    impl RenderEngine for Instant {
        fn start(&mut self, _job: RenderJob, reply: JobReply) {
            reply.succeed(RenderedImage::solid(1, 1, [0; 4]).unwrap());
        }
    }

    let (tx, rx) = mpsc::channel();
    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let seen = outcomes.clone();
    let mut notifier = CompletionNotifier::new(move |o| seen.lock().unwrap().push(o.clone()));
    let report = SequentialDriver::new(
        defs(1),
        Box::new(Instant),
        ResultPersister::new(&root),
        CancelToken::new(),
        tx,
    )
    .run(&rx, &mut notifier);

    assert!(matches!(report.outcome, RunOutcome::PersistFailed(_)));
    assert_eq!(outcomes.lock().unwrap().len(), 1);
    assert!(!outcomes.lock().unwrap()[0].is_success());
}

#[test]
fn dropped_reply_counts_as_failure() {
    struct Forgetful;
    impl RenderEngine for Forgetful {
        fn start(&mut self, _job: RenderJob, reply: JobReply) {
            drop(reply);
        }
    }

    let root = PathBuf::from("target").join("unit_driver").join("dropped");
    let (tx, rx) = mpsc::channel();
    let report = SequentialDriver::new(
        defs(2),
        Box::new(Forgetful),
        ResultPersister::new(&root),
        CancelToken::new(),
        tx,
    )
    .run(&rx, &mut CompletionNotifier::noop());

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed[0].message.contains("without reporting an outcome"));
}

#[test]
fn stale_outcomes_are_ignored() {
    struct Chatty {
        tx: Sender<DriverEvent>,
    }
    impl RenderEngine for Chatty {
        fn start(&mut self, job: RenderJob, reply: JobReply) {
            // A reply for a job that is not outstanding must not advance the run.
            self.tx
                .send(DriverEvent::Job {
                    job: JobId(job.id.0 + 10),
                    outcome: JobOutcome::Failed(SuiteError::render("stale")),
                })
                .unwrap();
            reply.succeed(RenderedImage::solid(1, 1, [0; 4]).unwrap());
        }
    }

    let root = PathBuf::from("target").join("unit_driver").join("stale");
    let (tx, rx) = mpsc::channel();
    let report = SequentialDriver::new(
        defs(2),
        Box::new(Chatty { tx: tx.clone() }),
        ResultPersister::new(&root),
        CancelToken::new(),
        tx,
    )
    .run(&rx, &mut CompletionNotifier::noop());

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert!(report.failed.is_empty());
    assert_eq!(report.rendered.len(), 2);
}

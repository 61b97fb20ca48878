//! Bounded-concurrency job scheduling with live progress.
//!
//! [`JobScheduler::run`] drives a batch of conversion [`Job`]s through a
//! fixed pool of worker threads. All shared counters live in one
//! `Mutex<SchedulerState>`; workers take the next queued job under that lock
//! (the dequeue and the Queued→Active transition are a single critical
//! section) and run the converter outside it, so a slow conversion never
//! blocks bookkeeping. Results come back over an mpsc channel and the
//! coordinating thread is the only code that applies terminal transitions,
//! appends terminal log entries, and touches the renderer, so each job gets
//! exactly one terminal transition and one terminal log line.
//!
//! A job failure is contained: it is logged at ERROR and the batch carries
//! on. A failure of the scheduler's own bookkeeping (a report for a job that
//! is not active, or the result channel closing with jobs unresolved) is
//! logged at CRITICAL and aborts the run, since state integrity can no
//! longer be trusted.
//!
//! There is no cancellation of in-flight conversions; a run either completes
//! every job or aborts on a bookkeeping failure.

use std::collections::VecDeque;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

use crate::error::{CoreError, CoreResult};
use crate::jobs::{ConvertError, Converter, Job, JobState};
use crate::logging::{Level, LogSink};
use crate::progress::{estimate, ProgressSnapshot};
use crate::terminal::ProgressRender;

/// How often the coordinator repaints and flushes while jobs are running.
const DEFAULT_TICK: Duration = Duration::from_millis(100);

/// One failed job: its identifier and the underlying cause, as logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub id: String,
    pub cause: String,
}

/// Outcome of a batch: the only programmatic return value of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    /// Jobs that completed successfully.
    pub succeeded: usize,
    /// Failed jobs, in completion order.
    pub failed: Vec<JobFailure>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Message a worker sends after finishing one job.
struct WorkerReport {
    id: String,
    result: Result<(), ConvertError>,
}

/// All mutable batch state, guarded by a single lock. A job is always in
/// exactly one of: queued, active, completed count, failed list.
struct SchedulerState {
    queued: VecDeque<Job>,
    /// (id, label) pairs, in dispatch order. Never larger than the pool.
    active: Vec<(String, String)>,
    completed: usize,
    failed: Vec<JobFailure>,
    total: usize,
    latest_completed: Option<String>,
}

impl SchedulerState {
    fn new(jobs: Vec<Job>) -> Self {
        let total = jobs.len();
        Self {
            queued: jobs.into(),
            active: Vec::new(),
            completed: 0,
            failed: Vec::new(),
            total,
            latest_completed: None,
        }
    }

    /// Dequeues the next job and marks it Active in one critical section.
    fn take_next(&mut self) -> Option<Job> {
        let mut job = self.queued.pop_front()?;
        job.state = JobState::Active;
        self.active.push((job.id.clone(), job.label.clone()));
        Some(job)
    }

    /// Applies one terminal transition. A report for a job that is not in
    /// the active set is a bookkeeping failure.
    fn finish(&mut self, report: WorkerReport) -> CoreResult<()> {
        let pos = self
            .active
            .iter()
            .position(|(id, _)| *id == report.id)
            .ok_or_else(|| {
                CoreError::Bookkeeping(format!(
                    "terminal report for job '{}' which is not active",
                    report.id
                ))
            })?;
        let (id, label) = self.active.remove(pos);
        match report.result {
            Ok(()) => {
                self.completed += 1;
                self.latest_completed = Some(label);
            }
            Err(cause) => self.failed.push(JobFailure {
                id,
                cause: cause.to_string(),
            }),
        }
        Ok(())
    }

    fn terminal_count(&self) -> usize {
        self.completed + self.failed.len()
    }

    fn snapshot(&self, elapsed: Duration, worker_slots: usize) -> ProgressSnapshot {
        let terminal = self.terminal_count();
        debug_assert_eq!(
            self.queued.len() + self.active.len() + terminal,
            self.total,
            "job sets must partition the batch"
        );
        let (fraction, eta) = estimate(
            self.total,
            terminal,
            self.active.len(),
            self.queued.len(),
            elapsed,
        );
        ProgressSnapshot {
            fraction,
            elapsed,
            eta,
            total: self.total,
            completed: self.completed,
            failed: self.failed.len(),
            worker_slots,
            active: self.active.iter().map(|(_, label)| label.clone()).collect(),
            latest_completed: self.latest_completed.clone(),
        }
    }

    fn into_summary(self) -> Summary {
        Summary {
            succeeded: self.completed,
            failed: self.failed,
        }
    }
}

/// Orchestrates a batch: owns the job queue, the worker pool, and the state
/// transitions, and drives the log sink and renderer from them.
pub struct JobScheduler<'s> {
    sink: &'s LogSink,
    tick: Duration,
}

impl<'s> JobScheduler<'s> {
    pub fn new(sink: &'s LogSink) -> Self {
        Self {
            sink,
            tick: DEFAULT_TICK,
        }
    }

    /// Overrides the repaint/flush interval (tests use a short tick).
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Runs every job to a terminal state and returns the tally.
    ///
    /// Returns only after all submitted jobs are Completed or Failed, or
    /// with an error after a bookkeeping failure. The sink is flushed before
    /// returning in either case; flush problems are reported via the `log`
    /// facade and never fail the batch.
    pub fn run<C: Converter + ?Sized>(
        &self,
        jobs: Vec<Job>,
        converter: &C,
        worker_count: usize,
        renderer: &mut dyn ProgressRender,
    ) -> CoreResult<Summary> {
        if worker_count == 0 {
            return Err(CoreError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        let total = jobs.len();
        if total == 0 {
            // Nothing to do and nothing to render, but earlier buffered
            // entries still belong in the run's log files.
            self.flush_best_effort();
            return Ok(Summary::default());
        }

        let start = Instant::now();
        self.sink.append(
            Level::Info,
            format!("starting batch of {total} jobs with {worker_count} workers"),
        );

        let state = Mutex::new(SchedulerState::new(jobs));
        let (tx, rx) = mpsc::channel::<WorkerReport>();

        let outcome: CoreResult<()> = thread::scope(|scope| {
            for _ in 0..worker_count {
                let tx = tx.clone();
                let state = &state;
                let sink = self.sink;
                scope.spawn(move || worker_loop(state, converter, sink, tx));
            }
            // The coordinator holds no sender; disconnect then means every
            // worker has exited.
            drop(tx);

            let first = lock_state(&state).snapshot(start.elapsed(), worker_count);
            renderer.render(&first);

            loop {
                if lock_state(&state).terminal_count() == total {
                    break Ok(());
                }
                match rx.recv_timeout(self.tick) {
                    Ok(report) => {
                        let logged = self.terminal_log_line(&report);
                        let applied = {
                            let mut st = lock_state(&state);
                            st.finish(report)
                                .map(|()| st.snapshot(start.elapsed(), worker_count))
                        };
                        match applied {
                            Ok(snapshot) => {
                                let (level, line) = logged;
                                self.sink.append(level, line);
                                renderer.render(&snapshot);
                            }
                            Err(err) => {
                                break Err(self.abort(&state, err));
                            }
                        }
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        let snapshot = lock_state(&state).snapshot(start.elapsed(), worker_count);
                        renderer.render(&snapshot);
                        self.flush_best_effort();
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        let unresolved = total - lock_state(&state).terminal_count();
                        let err = CoreError::Bookkeeping(format!(
                            "worker pool exited with {unresolved} jobs unresolved"
                        ));
                        break Err(self.abort(&state, err));
                    }
                }
            }
        });

        let state = state
            .into_inner()
            .map_err(|_| CoreError::Bookkeeping("scheduler state lock poisoned".to_string()))?;

        match outcome {
            Ok(()) => {
                let summary = state.into_summary();
                renderer.render(&ProgressSnapshot {
                    fraction: 1.0,
                    elapsed: start.elapsed(),
                    eta: None,
                    total,
                    completed: summary.succeeded,
                    failed: summary.failed.len(),
                    worker_slots: worker_count,
                    active: Vec::new(),
                    latest_completed: None,
                });
                renderer.finish();
                self.sink.append(
                    Level::Info,
                    format!(
                        "batch finished — {} succeeded, {} failed",
                        summary.succeeded,
                        summary.failed.len()
                    ),
                );
                self.flush_best_effort();
                Ok(summary)
            }
            Err(err) => {
                renderer.finish();
                self.flush_best_effort();
                Err(err)
            }
        }
    }

    fn terminal_log_line(&self, report: &WorkerReport) -> (Level, String) {
        match &report.result {
            Ok(()) => (Level::Info, format!("job completed — {}", report.id)),
            Err(cause) => (
                Level::Error,
                format!("job failed — {} — {}", report.id, cause),
            ),
        }
    }

    /// Records a fatal bookkeeping failure and drains the queue so workers
    /// wind down instead of converting files whose outcome nobody tracks.
    fn abort(&self, state: &Mutex<SchedulerState>, err: CoreError) -> CoreError {
        self.sink
            .append(Level::Critical, format!("aborting batch — {err}"));
        lock_state(state).queued.clear();
        err
    }

    fn flush_best_effort(&self) {
        if let Err(err) = self.sink.flush() {
            log::warn!("log flush failed (continuing): {err}");
        }
    }
}

fn lock_state<'a>(state: &'a Mutex<SchedulerState>) -> std::sync::MutexGuard<'a, SchedulerState> {
    state.lock().expect("scheduler state lock poisoned")
}

/// One worker: pull a job under the lock, convert outside it, report back.
/// Exits when the queue is empty or the coordinator has gone away.
fn worker_loop<C: Converter + ?Sized>(
    state: &Mutex<SchedulerState>,
    converter: &C,
    sink: &LogSink,
    tx: Sender<WorkerReport>,
) {
    loop {
        let job = lock_state(state).take_next();
        let Some(job) = job else { break };
        sink.append(Level::Info, format!("job started — {}", job.id));
        let result = converter.execute(&job);
        let report = WorkerReport { id: job.id, result };
        if tx.send(report).is_err() {
            // Coordinator aborted; nothing left to report to.
            break;
        }
    }
}

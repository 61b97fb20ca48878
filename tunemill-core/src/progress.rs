//! Progress estimation for a running batch.
//!
//! [`estimate`] is a pure function over the scheduler's counters; the
//! scheduler packages its output (plus the active labels) into a
//! [`ProgressSnapshot`] for the renderer. Snapshots are recomputed fresh on
//! every tick and never mutated.

use std::time::Duration;

/// A consistent, point-in-time view of a batch used for rendering.
#[derive(Debug, Clone)]
pub struct ProgressSnapshot {
    /// Fraction of jobs that reached a terminal state, 0.0..=1.0.
    pub fraction: f64,
    /// Time since the batch started.
    pub elapsed: Duration,
    /// Estimated time remaining; `None` while undefined (nothing finished
    /// yet, or nothing left).
    pub eta: Option<Duration>,
    /// Total number of jobs in the batch.
    pub total: usize,
    /// Jobs completed successfully.
    pub completed: usize,
    /// Jobs that failed.
    pub failed: usize,
    /// Number of worker slots (fixes the height of the rendered block).
    pub worker_slots: usize,
    /// Labels of the jobs currently being converted.
    pub active: Vec<String>,
    /// Label of the most recently completed job, if any.
    pub latest_completed: Option<String>,
}

/// Estimates completion fraction and time remaining.
///
/// `completed` counts jobs in a terminal state (successes and failures
/// alike, since both consume worker throughput); `active` and `queued` are
/// the current set sizes. The ETA assumes active jobs are on average half
/// finished and projects the observed rate linearly:
///
/// `eta = elapsed * (remaining - active/2) / (total - remaining)`
///
/// This is a heuristic, advisory only. It is `None` (undefined) when nothing
/// has finished yet or when nothing remains.
pub fn estimate(
    total: usize,
    completed: usize,
    active: usize,
    queued: usize,
    elapsed: Duration,
) -> (f64, Option<Duration>) {
    if total == 0 {
        return (1.0, Some(Duration::ZERO));
    }

    let fraction = completed as f64 / total as f64;
    let remaining = queued + active;
    if remaining == total || remaining == 0 {
        return (fraction, None);
    }

    let effective_remaining = remaining as f64 - active as f64 / 2.0;
    let finished = (total - remaining) as f64;
    let eta_secs = elapsed.as_secs_f64() * effective_remaining / finished;
    (fraction, Some(Duration::from_secs_f64(eta_secs.max(0.0))))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_batch_is_done() {
        let (fraction, eta) = estimate(0, 0, 0, 0, Duration::from_secs(5));
        assert_eq!(fraction, 1.0);
        assert_eq!(eta, Some(Duration::ZERO));
    }

    #[test]
    fn test_nothing_finished_yet_has_no_eta() {
        let (fraction, eta) = estimate(10, 0, 0, 10, Duration::from_secs(5));
        assert_eq!(fraction, 0.0);
        assert_eq!(eta, None);
    }

    #[test]
    fn test_nothing_remaining_has_no_eta() {
        let (fraction, eta) = estimate(10, 10, 0, 0, Duration::from_secs(30));
        assert_eq!(fraction, 1.0);
        assert_eq!(eta, None);
    }

    #[test]
    fn test_halfway_projects_linearly() {
        // 5 of 10 done in 10s with nothing active: 10s to go.
        let (fraction, eta) = estimate(10, 5, 0, 5, Duration::from_secs(10));
        assert_eq!(fraction, 0.5);
        let eta = eta.expect("eta defined once something finished");
        assert!((eta.as_secs_f64() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_active_jobs_count_as_half_done() {
        // 4 done in 8s, 2 active, 4 queued: remaining 6, effective 5,
        // eta = 8 * 5 / 4 = 10s.
        let (_, eta) = estimate(10, 4, 2, 4, Duration::from_secs(8));
        let eta = eta.expect("eta defined");
        assert!((eta.as_secs_f64() - 10.0).abs() < 1e-9);
    }
}

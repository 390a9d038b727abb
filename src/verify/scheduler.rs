//! Verification scheduling
//!
//! Runs one comparator call per request on a dedicated background thread
//! and delivers the decision through a [`VerificationHandle`]. At most one
//! request is in flight system-wide; a submit while one is pending is
//! rejected with [`SchedulerError::Busy`]. The in-flight slot is freed
//! before the result is delivered, so a caller that has observed a result
//! can always submit again immediately.
//!
//! There is no cancellation once a request is running; `wait_timeout` lets
//! callers stop waiting on a hung comparator, but the slot stays occupied
//! until the comparator call returns.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde::Serialize;

use crate::audio::AudioBuffer;
use crate::error::{ComparatorError, SchedulerError};
use crate::verify::comparator::SpeakerComparator;

/// Scores at or above this are classified as the same speaker
pub const MATCH_THRESHOLD: f32 = 0.5;

/// A reference/test buffer pair submitted together
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    pub reference: AudioBuffer,
    pub test: AudioBuffer,
}

impl VerificationRequest {
    pub fn new(reference: AudioBuffer, test: AudioBuffer) -> Self {
        Self { reference, test }
    }
}

/// Outcome of a completed request
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VerificationResult {
    /// Raw similarity score from the comparator (conventionally in [0, 1])
    pub score: f32,
    /// `score >= MATCH_THRESHOLD`
    pub matched: bool,
}

impl VerificationResult {
    fn from_score(score: f32) -> Self {
        Self {
            score,
            matched: score >= MATCH_THRESHOLD,
        }
    }
}

/// Lifecycle of a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RequestState {
    Submitted = 0,
    Running = 1,
    Completed = 2,
    Failed = 3,
}

impl RequestState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => RequestState::Submitted,
            1 => RequestState::Running,
            2 => RequestState::Completed,
            _ => RequestState::Failed,
        }
    }

    /// Completed or Failed
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Completed | RequestState::Failed)
    }
}

/// Receiving end of one verification request.
///
/// The result is delivered exactly once: whichever of `try_result`,
/// `wait` or `wait_timeout` first observes it consumes it.
pub struct VerificationHandle {
    rx: Receiver<Result<VerificationResult, SchedulerError>>,
    state: Arc<AtomicU8>,
}

impl VerificationHandle {
    /// Current request state
    pub fn state(&self) -> RequestState {
        RequestState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Non-blocking poll; `None` while the request is still pending
    pub fn try_result(&self) -> Option<Result<VerificationResult, SchedulerError>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(worker_lost())),
        }
    }

    /// Block until the result arrives
    pub fn wait(self) -> Result<VerificationResult, SchedulerError> {
        self.rx.recv().unwrap_or_else(|_| Err(worker_lost()))
    }

    /// Block for at most `timeout`; `None` if the comparator has still not
    /// answered. The request keeps running, and the scheduler stays busy,
    /// until it does.
    pub fn wait_timeout(
        &self,
        timeout: Duration,
    ) -> Option<Result<VerificationResult, SchedulerError>> {
        match self.rx.recv_timeout(timeout) {
            Ok(outcome) => Some(outcome),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(worker_lost())),
        }
    }
}

/// The worker hung up without delivering; only happens if it panicked.
fn worker_lost() -> SchedulerError {
    SchedulerError::ComparatorFailed {
        source: ComparatorError::Backend(
            "verification worker terminated without a result".to_string(),
        ),
    }
}

/// Clears the in-flight flag when dropped, including on worker panic
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Schedules verification requests against a shared comparator.
///
/// The comparator is constructed once at startup and passed in by `Arc`;
/// the scheduler never holds any other mutable state between requests.
pub struct VerificationScheduler {
    comparator: Arc<dyn SpeakerComparator>,
    in_flight: Arc<AtomicBool>,
}

impl VerificationScheduler {
    pub fn new(comparator: Arc<dyn SpeakerComparator>) -> Self {
        Self {
            comparator,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a request is currently pending
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Submit a request for background verification.
    ///
    /// # Errors
    /// * `SchedulerError::Busy` - if another request is still in flight
    pub fn submit(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationHandle, SchedulerError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(SchedulerError::Busy);
        }

        let (tx, rx) = mpsc::channel();
        let state = Arc::new(AtomicU8::new(RequestState::Submitted as u8));
        let worker_state = Arc::clone(&state);
        let comparator = Arc::clone(&self.comparator);
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        thread::spawn(move || {
            worker_state.store(RequestState::Running as u8, Ordering::Release);
            debug!(
                "Comparing {} reference samples against {} test samples",
                request.reference.len(),
                request.test.len()
            );

            let outcome =
                match comparator.compare(request.reference.samples(), request.test.samples()) {
                    Ok(similarity) => {
                        let result = VerificationResult::from_score(similarity.score());
                        worker_state.store(RequestState::Completed as u8, Ordering::Release);
                        Ok(result)
                    }
                    Err(source) => {
                        warn!("Comparator failed: {source}");
                        worker_state.store(RequestState::Failed as u8, Ordering::Release);
                        Err(SchedulerError::ComparatorFailed { source })
                    }
                };

            // Free the slot before delivery: a caller that has seen the
            // result must be able to submit the next request right away.
            drop(guard);
            // The caller may have dropped the handle; nothing to do then.
            let _ = tx.send(outcome);
        });

        Ok(VerificationHandle { rx, state })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::mock::{FailingComparator, FixedComparator, SlowComparator};

    fn request() -> VerificationRequest {
        VerificationRequest::new(
            AudioBuffer::sine_wave(440.0, 0.5),
            AudioBuffer::sine_wave(450.0, 0.5),
        )
    }

    #[test]
    fn test_high_score_matches() {
        let scheduler = VerificationScheduler::new(Arc::new(FixedComparator::scoring(0.92)));
        let result = scheduler.submit(request()).unwrap().wait().unwrap();

        assert_eq!(result.score, 0.92);
        assert!(result.matched);
    }

    #[test]
    fn test_low_score_does_not_match() {
        let scheduler = VerificationScheduler::new(Arc::new(FixedComparator::scoring(0.31)));
        let result = scheduler.submit(request()).unwrap().wait().unwrap();

        assert!(!result.matched);
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let scheduler = VerificationScheduler::new(Arc::new(FixedComparator::scoring(0.5)));
        let result = scheduler.submit(request()).unwrap().wait().unwrap();

        assert!(result.matched);
    }

    #[test]
    fn test_decided_shape_is_rethresholded() {
        // The backend claims a match at 0.2; the scheduler only trusts the
        // scalar and overrides the decision.
        let scheduler =
            VerificationScheduler::new(Arc::new(FixedComparator::decided(0.2, true)));
        let result = scheduler.submit(request()).unwrap().wait().unwrap();

        assert_eq!(result.score, 0.2);
        assert!(!result.matched);
    }

    #[test]
    fn test_second_submit_while_running_is_busy() {
        let scheduler = VerificationScheduler::new(Arc::new(SlowComparator::new(
            Duration::from_millis(200),
            0.9,
        )));

        let handle = scheduler.submit(request()).unwrap();
        let second = scheduler.submit(request());
        assert!(matches!(second, Err(SchedulerError::Busy)));

        // After completion a fresh submission succeeds
        let result = handle.wait().unwrap();
        assert!(result.matched);
        let third = scheduler.submit(request()).unwrap();
        assert!(third.wait().is_ok());
    }

    #[test]
    fn test_comparator_failure_surfaces_and_frees_slot() {
        let scheduler =
            VerificationScheduler::new(Arc::new(FailingComparator::new("tensor shape mismatch")));

        let handle = scheduler.submit(request()).unwrap();
        let outcome = handle.wait();
        assert!(matches!(
            outcome,
            Err(SchedulerError::ComparatorFailed { .. })
        ));

        // A failed request does not wedge the scheduler
        assert!(scheduler.submit(request()).is_ok());
    }

    #[test]
    fn test_state_reaches_completed() {
        let scheduler = VerificationScheduler::new(Arc::new(FixedComparator::scoring(0.8)));
        let handle = scheduler.submit(request()).unwrap();

        let result = handle.wait_timeout(Duration::from_secs(5));
        assert!(matches!(result, Some(Ok(_))));
        assert_eq!(handle.state(), RequestState::Completed);
        assert!(handle.state().is_terminal());
    }

    #[test]
    fn test_state_reaches_failed() {
        let scheduler = VerificationScheduler::new(Arc::new(FailingComparator::new("broken")));
        let handle = scheduler.submit(request()).unwrap();

        let outcome = handle.wait_timeout(Duration::from_secs(5));
        assert!(matches!(outcome, Some(Err(_))));
        assert_eq!(handle.state(), RequestState::Failed);
    }

    #[test]
    fn test_wait_timeout_leaves_request_running() {
        let scheduler = VerificationScheduler::new(Arc::new(SlowComparator::new(
            Duration::from_millis(300),
            0.7,
        )));

        let handle = scheduler.submit(request()).unwrap();
        assert!(handle.wait_timeout(Duration::from_millis(10)).is_none());
        assert!(scheduler.is_busy());

        // The result still arrives once the comparator finishes
        let outcome = handle.wait_timeout(Duration::from_secs(5));
        assert!(matches!(outcome, Some(Ok(_))));
    }

    #[test]
    fn test_try_result_polls_without_blocking() {
        let scheduler = VerificationScheduler::new(Arc::new(SlowComparator::new(
            Duration::from_millis(150),
            0.9,
        )));

        let handle = scheduler.submit(request()).unwrap();
        assert!(handle.try_result().is_none());

        let mut outcome = None;
        for _ in 0..100 {
            if let Some(result) = handle.try_result() {
                outcome = Some(result);
                break;
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert!(matches!(outcome, Some(Ok(_))));
    }
}

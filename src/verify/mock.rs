//! Mock comparators for testing
//!
//! These do no real signal comparison; they return canned outcomes so
//! scheduler and pipeline behavior can be exercised without a model.

use std::thread;
use std::time::Duration;

use crate::error::ComparatorError;
use crate::verify::comparator::{Similarity, SpeakerComparator};

/// Always returns the same similarity, in either shape
pub struct FixedComparator {
    similarity: Similarity,
}

impl FixedComparator {
    pub fn scoring(score: f32) -> Self {
        Self {
            similarity: Similarity::Score(score),
        }
    }

    pub fn decided(score: f32, matched: bool) -> Self {
        Self {
            similarity: Similarity::Decided { score, matched },
        }
    }
}

impl SpeakerComparator for FixedComparator {
    fn compare(&self, _reference: &[f32], _test: &[f32]) -> Result<Similarity, ComparatorError> {
        Ok(self.similarity)
    }
}

/// Sleeps before answering, to hold the scheduler busy in tests
pub struct SlowComparator {
    delay: Duration,
    score: f32,
}

impl SlowComparator {
    pub fn new(delay: Duration, score: f32) -> Self {
        Self { delay, score }
    }
}

impl SpeakerComparator for SlowComparator {
    fn compare(&self, _reference: &[f32], _test: &[f32]) -> Result<Similarity, ComparatorError> {
        thread::sleep(self.delay);
        Ok(Similarity::Score(self.score))
    }
}

/// Always fails, simulating a model error
pub struct FailingComparator {
    reason: String,
}

impl FailingComparator {
    pub fn new(reason: &str) -> Self {
        Self {
            reason: reason.to_string(),
        }
    }
}

impl SpeakerComparator for FailingComparator {
    fn compare(&self, _reference: &[f32], _test: &[f32]) -> Result<Similarity, ComparatorError> {
        Err(ComparatorError::Backend(self.reason.clone()))
    }
}

use super::models::{RecordedStep, StepSequence};
use crate::{RecorderError, Result};

/// Append-only log of the steps of one recording, with a read cursor for
/// inspecting individual steps.
#[derive(Debug, Default)]
pub struct StepStore {
    steps: Vec<RecordedStep>,
    sealed: bool,
    cursor: usize,
}

impl StepStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sealed store over an already finished sequence.
    pub fn from_sequence(sequence: &StepSequence) -> Self {
        Self {
            steps: sequence.to_vec(),
            sealed: true,
            cursor: 0,
        }
    }

    /// Appends at the tail and returns the step's index.
    ///
    /// Delivery order is authoritative: a timestamp older than the tail is raised
    /// to the tail's value instead of reordering.
    pub fn append(&mut self, mut step: RecordedStep) -> Result<usize> {
        if self.sealed {
            return Err(RecorderError::StoreSealed);
        }

        if let Some(last) = self.steps.last()
            && step.timestamp < last.timestamp
        {
            tracing::debug!(
                "Step '{}' arrived with timestamp {} behind tail {}, clamping",
                step.action,
                step.timestamp,
                last.timestamp
            );
            step.timestamp = last.timestamp;
        }

        self.steps.push(step);
        Ok(self.steps.len() - 1)
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[RecordedStep] {
        &self.steps
    }

    /// Moves the cursor. Out-of-range indices fail and leave the cursor unchanged.
    pub fn set_cursor(&mut self, index: usize) -> Result<&RecordedStep> {
        let len = self.steps.len();
        let step = self
            .steps
            .get(index)
            .ok_or(RecorderError::IndexOutOfRange { index, len })?;
        self.cursor = index;
        Ok(step)
    }

    pub fn cursor(&self) -> Option<usize> {
        (!self.steps.is_empty()).then_some(self.cursor)
    }

    pub fn current(&self) -> Option<&RecordedStep> {
        self.steps.get(self.cursor)
    }

    /// Copy of the steps recorded so far.
    pub fn snapshot(&self) -> StepSequence {
        StepSequence::from(self.steps.clone())
    }
}

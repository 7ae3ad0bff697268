use crate::{data::ResponseEnvelope, error::Error};
use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ScenarioStatus {
    Pending,
    Running,
    Passed,
    /// The remote service violated its contract.
    Failed,
    /// The scenario could not be carried out: configuration, request construction or transport.
    Aborted,
}

impl fmt::Display for ScenarioStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScenarioStatus::Pending => "pending",
            ScenarioStatus::Running => "running",
            ScenarioStatus::Passed => "passed",
            ScenarioStatus::Failed => "failed",
            ScenarioStatus::Aborted => "aborted",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FailureKind {
    Configuration,
    MalformedRequest,
    Transport,
    Decode,
    Assertion,
    Interrupted,
}

impl FailureKind {
    pub fn status(self) -> ScenarioStatus {
        match self {
            FailureKind::Configuration
            | FailureKind::MalformedRequest
            | FailureKind::Transport
            | FailureKind::Interrupted => ScenarioStatus::Aborted,
            FailureKind::Decode | FailureKind::Assertion => ScenarioStatus::Failed,
        }
    }
}

/// Where and why a scenario stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// `None` when the scenario stopped before its first step.
    pub step_index: Option<usize>,
    pub step: Option<String>,
    pub kind: FailureKind,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub response: Option<ResponseEnvelope>,
}

impl Failure {
    pub(crate) fn from_error(
        step_index: Option<usize>,
        step: Option<String>,
        error: Error,
        response: Option<ResponseEnvelope>,
    ) -> Self {
        let kind = match &error {
            Error::Configuration(_) => FailureKind::Configuration,
            Error::MalformedRequest(_) => FailureKind::MalformedRequest,
            Error::Transport { .. } => FailureKind::Transport,
            Error::Decode { .. } => FailureKind::Decode,
            Error::Assertion(_) => FailureKind::Assertion,
            Error::Interrupted(_) => FailureKind::Interrupted,
        };

        let (message, expected, actual) = match error {
            Error::Assertion(failure) => (
                failure.description,
                Some(failure.expected),
                Some(failure.actual),
            ),
            other => (other.to_string(), None, None),
        };

        Self {
            step_index,
            step,
            kind,
            message,
            expected,
            actual,
            response,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub name: String,
    pub status: ScenarioStatus,
    pub steps_run: usize,
    pub failure: Option<Failure>,
}

impl ScenarioReport {
    pub(crate) fn passed<S: Into<String>>(name: S, steps_run: usize) -> Self {
        Self {
            name: name.into(),
            status: ScenarioStatus::Passed,
            steps_run,
            failure: None,
        }
    }

    pub(crate) fn stopped<S: Into<String>>(name: S, steps_run: usize, failure: Failure) -> Self {
        Self {
            name: name.into(),
            status: failure.kind.status(),
            steps_run,
            failure: Some(failure),
        }
    }

    /// Report for a scenario that could not even be set up.
    pub fn aborted<S: Into<String>>(name: S, error: Error) -> Self {
        let failure = Failure::from_error(None, None, error, None);
        Self {
            name: name.into(),
            status: ScenarioStatus::Aborted,
            steps_run: 0,
            failure: Some(failure),
        }
    }

    pub fn is_passed(&self) -> bool {
        self.status == ScenarioStatus::Passed
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scenario `{}` {}", self.name, self.status)?;

        let failure = match &self.failure {
            Some(failure) => failure,
            None => return Ok(()),
        };

        match (failure.step_index, &failure.step) {
            (Some(index), Some(step)) => write!(f, " at step {} ({})", index, step)?,
            (Some(index), None) => write!(f, " at step {}", index)?,
            _ => write!(f, " before its first step")?,
        }
        write!(f, ": {}", failure.message)?;

        if let (Some(expected), Some(actual)) = (&failure.expected, &failure.actual) {
            write!(f, "\n  expected: {}\n  actual:   {}", expected, actual)?;
        }
        if let Some(response) = &failure.response {
            write!(f, "\n  response: {}", response)?;
        }

        Ok(())
    }
}

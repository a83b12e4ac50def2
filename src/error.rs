use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to run an external program at all.
///
/// A program that ran and exited non-zero is not a `CommandError`; callers
/// inspect [`crate::command::CommandOutput::success`] for that.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} did not finish within {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("could not query the task scheduler: {0}")]
    Query(String),
    #[error("{program} timed out after {timeout_secs}s")]
    Timeout { program: String, timeout_secs: u64 },
    #[error("task creation failed: {stderr}")]
    Creation { stderr: String },
    #[error("task '{task_name}' was created but could not be verified")]
    Verification { task_name: String },
    #[error("immediate shutdown failed: {stderr}")]
    Shutdown { stderr: String },
    #[error("task '{task_name}' is still registered after deletion: {stderr}")]
    Removal { task_name: String, stderr: String },
    #[error("failed to write config {}: {reason}", path.display())]
    Persistence { path: PathBuf, reason: String },
}

impl From<CommandError> for ScheduleError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::Timeout {
                program,
                timeout_secs,
            } => ScheduleError::Timeout {
                program,
                timeout_secs,
            },
            other => ScheduleError::Query(other.to_string()),
        }
    }
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_timeout_maps_to_schedule_timeout() {
        let err: ScheduleError = CommandError::Timeout {
            program: "schtasks".to_string(),
            timeout_secs: 30,
        }
        .into();

        assert!(matches!(
            err,
            ScheduleError::Timeout { ref program, timeout_secs: 30 } if program == "schtasks"
        ));
    }

    #[test]
    fn spawn_failure_maps_to_query_error() {
        let err: ScheduleError = CommandError::Spawn {
            program: "schtasks".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        }
        .into();

        match err {
            ScheduleError::Query(message) => assert!(message.contains("schtasks")),
            other => panic!("expected query error, got {other:?}"),
        }
    }

    #[test]
    fn creation_error_carries_stderr_verbatim() {
        let err = ScheduleError::Creation {
            stderr: "ERROR: Access is denied.".to_string(),
        };
        assert_eq!(err.to_string(), "task creation failed: ERROR: Access is denied.");
    }
}

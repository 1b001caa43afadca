//! CLI-level errors (wraps infrastructure errors)

use thiserror::Error;

use crate::application::ApplicationError;
use crate::domain::DomainError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("{0}")]
    Usage(String),

    #[error("tree check failed: {0} violation(s)")]
    InvalidTree(usize),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::InvalidArgs(_) | CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::InvalidTree(_) => crate::exitcode::INVALID_TREE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::NOINPUT,
                InfraError::Application(ApplicationError::Config { .. }) => crate::exitcode::CONFIG,
                InfraError::Application(ApplicationError::OperationFailed { .. }) => {
                    crate::exitcode::IOERR
                }
                InfraError::Application(ApplicationError::Domain(d)) => match d {
                    DomainError::NodeNotFound(_) | DomainError::InvalidMove { .. } => {
                        crate::exitcode::USAGE
                    }
                    _ => crate::exitcode::DATAERR,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NodeId;

    #[test]
    fn given_errors_when_mapping_exit_codes_then_follow_sysexits() {
        let not_found: CliError = ApplicationError::from(DomainError::NodeNotFound(NodeId(1))).into();
        assert_eq!(not_found.exit_code(), crate::exitcode::USAGE);

        let cycle: CliError = ApplicationError::from(DomainError::CycleDetected(NodeId(1))).into();
        assert_eq!(cycle.exit_code(), crate::exitcode::DATAERR);

        let io = CliError::Infra(InfraError::io(
            "read ordering",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        ));
        assert_eq!(io.exit_code(), crate::exitcode::NOINPUT);
        assert_eq!(CliError::InvalidTree(2).exit_code(), crate::exitcode::INVALID_TREE);
    }
}

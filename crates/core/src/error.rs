use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to spawn `{}`: {}", .command, .original)]
    SpawnFailed {
        command: String,
        original: std::io::Error,
    },

    #[error("`{}` exited with non-success status.", .command)]
    SubProcessExit { command: String },

    #[error("No command was given.")]
    EmptyCommand,

    #[error("Could not parse command template: {}", .0)]
    TemplateParse(String),

    #[error("STDIO error: {}", .0)]
    Stdio(#[from] std::io::Error),

    #[error("Terminal setup failed: {}", .0)]
    TerminalSetup(std::io::Error),

    #[error("Could not open the controlling terminal: {}", .0)]
    Tty(std::io::Error),
}

impl Error {
    pub fn spawn_failed(command: &str, original: std::io::Error) -> Self {
        Self::SpawnFailed {
            command: command.to_string(),
            original,
        }
    }

    pub fn sub_process_exit(command: &str) -> Self {
        Self::SubProcessExit {
            command: command.to_string(),
        }
    }

    /// Whether the error is local to one spawn attempt and the caller may
    /// re-prompt for a corrected command instead of unwinding the session.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::SpawnFailed { .. }
                | Error::SubProcessExit { .. }
                | Error::EmptyCommand
                | Error::TemplateParse(_)
        )
    }
}

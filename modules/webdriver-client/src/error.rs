use thiserror::Error;

pub type Result<T> = std::result::Result<T, DriverError>;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("WebDriver session error: {0}")]
    Session(String),

    #[error("Navigation error: {0}")]
    Navigation(String),

    #[error("WebDriver protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(String),
}

impl From<fantoccini::error::CmdError> for DriverError {
    fn from(err: fantoccini::error::CmdError) -> Self {
        DriverError::Protocol(err.to_string())
    }
}

impl From<fantoccini::error::NewSessionError> for DriverError {
    fn from(err: fantoccini::error::NewSessionError) -> Self {
        DriverError::Session(err.to_string())
    }
}

impl From<std::io::Error> for DriverError {
    fn from(err: std::io::Error) -> Self {
        DriverError::Io(err.to_string())
    }
}

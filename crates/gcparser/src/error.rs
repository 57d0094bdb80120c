use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no parser registered as {0:?}")]
    UnknownParser(String),

    #[error("invalid parser arguments: {0}")]
    InvalidArgs(String),
}

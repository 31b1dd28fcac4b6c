//! Command-line Error Types

use derive_more::{Display, Error};

/// A command error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for command operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not prepare picture storage")]
    Initialize,
    #[display("picture library operation failed")]
    Catalog,
    #[display("no picture named {_0}")]
    UnknownPicture(#[error(not(source))] String),
    #[display("could not read {_0}")]
    Input(#[error(not(source))] String),
}

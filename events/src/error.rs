//! Error types for the `events` layer.
use std::error::Error as StdError;
use std::fmt;

/// Raised by a [`MessageHandler`](crate::MessageHandler) that could not finish
/// processing a consumed message. The consumer treats any such error as a
/// reason to leave the message unacknowledged so the broker redelivers it.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// The message reached the handler but could not be delivered onward.
    Undeliverable,
    Other(String),
}

impl Error {
    pub fn new(error_kind: ErrorKind) -> Self {
        Self {
            source: None,
            error_kind,
        }
    }

    pub fn with_source<E>(error_kind: ErrorKind, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            source: Some(Box::new(source)),
            error_kind,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Undeliverable => write!(f, "Message could not be delivered")?,
            ErrorKind::Other(reason) => write!(f, "Message handling failed: {reason}")?,
        }
        if let Some(source) = &self.source {
            write!(f, " ({source})")?;
        }
        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn StdError + 'static))
    }
}

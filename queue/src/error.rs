//! Error types for the `queue` layer.
use std::error::Error as StdError;
use std::fmt;

/// Queue Gateway error. `error_kind` drives how callers react (the web layer
/// maps it to a status code); `source` keeps the broker client's own error.
#[derive(Debug)]
pub struct Error {
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub error_kind: ErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum ErrorKind {
    /// No usable connection or channel to the broker.
    Unavailable,
    /// The broker refused or failed to accept a published message.
    Publish,
    /// Consuming could not be started or the delivery stream failed.
    Consume(String),
    /// A delivery could not be acknowledged or rejected.
    Acknowledge,
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

    /// Wraps a broker client error. Connection and channel state failures
    /// always become [`ErrorKind::Unavailable`], whatever the operation was.
    pub(crate) fn from_lapin(error_kind: ErrorKind, err: lapin::Error) -> Self {
        let error_kind = match err {
            lapin::Error::InvalidChannelState(_)
            | lapin::Error::InvalidConnectionState(_)
            | lapin::Error::IOError(_) => ErrorKind::Unavailable,
            _ => error_kind,
        };
        Self::with_source(error_kind, err)
    }

    pub fn is_unavailable(&self) -> bool {
        self.error_kind == ErrorKind::Unavailable
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.error_kind {
            ErrorKind::Unavailable => write!(f, "Message queue is unavailable")?,
            ErrorKind::Publish => write!(f, "Failed to publish message to queue")?,
            ErrorKind::Consume(reason) => write!(f, "Failed to consume from queue: {reason}")?,
            ErrorKind::Acknowledge => write!(f, "Failed to settle queue delivery")?,
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_source() {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        let err = Error::with_source(ErrorKind::Unavailable, io);
        assert_eq!(err.to_string(), "Message queue is unavailable (refused)");
        assert!(err.source().is_some());
    }

    #[test]
    fn test_only_unavailable_reports_unavailable() {
        assert!(Error::new(ErrorKind::Unavailable).is_unavailable());
        assert!(!Error::new(ErrorKind::Publish).is_unavailable());
        assert!(!Error::new(ErrorKind::Consume("closed".to_string())).is_unavailable());
    }

    #[test]
    fn test_lost_broker_connection_maps_to_unavailable() {
        let closed = lapin::Error::InvalidConnectionState(lapin::ConnectionState::Closed);
        let err = Error::from_lapin(ErrorKind::Publish, closed);
        assert!(err.is_unavailable());
        assert!(err.source().is_some());

        let io = lapin::Error::IOError(std::sync::Arc::new(std::io::Error::from(
            std::io::ErrorKind::ConnectionReset,
        )));
        assert!(Error::from_lapin(ErrorKind::Acknowledge, io).is_unavailable());
    }

    #[test]
    fn test_other_broker_errors_keep_the_operation_kind() {
        let err = Error::from_lapin(ErrorKind::Publish, lapin::Error::ChannelsLimitReached);
        assert_eq!(err.error_kind, ErrorKind::Publish);
        assert!(!err.is_unavailable());
    }
}

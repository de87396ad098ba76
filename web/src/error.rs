use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use log::*;
use queue::error::{Error as QueueError, ErrorKind as QueueErrorKind};

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(QueueError);

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.0)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

// List of possible StatusCode variants https://docs.rs/http/latest/http/status/struct.StatusCode.html
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);
        match self.0.error_kind {
            QueueErrorKind::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Failed to send message: the message queue is unavailable.",
            )
                .into_response(),
            QueueErrorKind::Publish
            | QueueErrorKind::Consume(_)
            | QueueErrorKind::Acknowledge => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Failed to send message.").into_response()
            }
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<QueueError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

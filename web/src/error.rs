use std::error::Error as StdError;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::*;

use domain::error::{DomainErrorKind, Error as DomainError, InternalErrorKind};

pub type Result<T> = core::result::Result<T, Error>;

/// HTTP-facing error. Only produced before a stream has started; once the
/// first byte is sent, failures travel in-band as error events instead.
#[derive(Debug)]
pub struct Error(DomainError);

impl Error {
    /// An internal failure while assembling a response.
    pub(crate) fn response_build<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self(DomainError {
            source: Some(Box::new(err)),
            error_kind: DomainErrorKind::Internal(InternalErrorKind::Other(
                "Failed to build streaming response".to_string(),
            )),
        })
    }
}

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{}", self.0)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        warn!("Request failed before streaming began: {}", self.0);
        match self.0.error_kind {
            DomainErrorKind::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL SERVER ERROR").into_response()
            }
            DomainErrorKind::External(_) => {
                (StatusCode::BAD_GATEWAY, "BAD GATEWAY").into_response()
            }
        }
    }
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::error::ExternalErrorKind;

    #[test]
    fn test_internal_errors_map_to_500() {
        let err = Error::from(DomainError::internal(InternalErrorKind::Config));
        assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_external_errors_map_to_502() {
        let err = Error::from(DomainError::external(ExternalErrorKind::Network));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_response_build_is_internal() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "no body");
        assert_eq!(
            Error::response_build(io).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

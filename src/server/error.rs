// imagen/src/server/error.rs
//! HTTP mapping for [`ServiceError`].

use crate::core::ServiceError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
            ServiceError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            ServiceError::Decode(_)
            | ServiceError::Encode(_)
            | ServiceError::Storage(_)
            | ServiceError::Io(_)
            | ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("Request failed: {}", self);
        }

        HttpResponse::build(status).json(ErrorBody {
            error: self.kind(),
            message: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ServiceError::InvalidParameter("x".into()), StatusCode::BAD_REQUEST),
            (ServiceError::UpstreamFetch("x".into()), StatusCode::BAD_GATEWAY),
            (ServiceError::Decode("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Encode("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (ServiceError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error}");
            assert_eq!(error.error_response().status(), status);
        }
    }
}

use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse};
use derive_more::{Display, Error};
use serde::Serialize;
use subscription_types::subscription::SubscriptionError;
use utoipa::ToSchema;

pub type Response = Result<HttpResponse, ControllerError>;

/// JSON body of every error response.
#[derive(Serialize, ToSchema, Debug)]
pub struct ErrorResponse {
    #[schema(example = "subscription not found")]
    pub error: String,
    /// Offending input, set on 400 responses.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    fn new<E: ToString>(error: E) -> Self {
        Self {
            error: error.to_string(),
            field: None,
        }
    }
}

#[derive(Debug, Display, Error)]
pub enum ControllerError {
    #[display("subscription not found")]
    NotFound,
    #[error(ignore)]
    InternalServerError(anyhow::Error),
    #[display("Invalid field {field}: {msg}")]
    InvalidInput { field: String, msg: String },
}

impl ControllerError {
    pub fn invalid<F: ToString, M: ToString>(field: F, msg: M) -> Self {
        Self::InvalidInput {
            field: field.to_string(),
            msg: msg.to_string(),
        }
    }
}

impl From<anyhow::Error> for ControllerError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<SubscriptionError>() {
            Ok(SubscriptionError::Validation { field, msg }) => Self::invalid(field, msg),
            Ok(err) => Self::InternalServerError(err.into()),
            Err(err) => Self::InternalServerError(err),
        }
    }
}

impl From<actix::MailboxError> for ControllerError {
    fn from(err: actix::MailboxError) -> Self {
        Self::InternalServerError(err.into())
    }
}

impl actix_web::error::ResponseError for ControllerError {
    fn status_code(&self) -> StatusCode {
        use ControllerError::*;
        match self {
            NotFound => StatusCode::NOT_FOUND,
            InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            InvalidInput { .. } => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        use ControllerError::*;
        match self {
            NotFound => {
                log::warn!("{self}");
                HttpResponse::NotFound().json(ErrorResponse::new(self))
            }
            InternalServerError(err) => {
                log::error!("{err:?}");
                HttpResponse::InternalServerError().json(ErrorResponse::new(err))
            }
            InvalidInput { field, msg } => {
                log::warn!("{self}");
                HttpResponse::BadRequest().json(ErrorResponse {
                    error: msg.clone(),
                    field: Some(field.clone()),
                })
            }
        }
    }
}

pub fn json_error_handler(
    err: actix_web::error::JsonPayloadError,
    _: &HttpRequest,
) -> actix_web::Error {
    ControllerError::invalid("body", err).into()
}

pub fn query_error_handler(
    err: actix_web::error::QueryPayloadError,
    _: &HttpRequest,
) -> actix_web::Error {
    ControllerError::invalid("query", err).into()
}

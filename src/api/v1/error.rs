use super::handler::{ApiResponse, FailBody};
use crate::application_port::*;
use crate::logger::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    let (status, message) = if let Some(code) = err.find::<ApiErrorCode>() {
        (code.status(), code.to_string())
    } else if err.is_not_found() {
        (StatusCode::NOT_FOUND, "route not found".to_string())
    } else if let Some(e) = err
        .find::<reject::InvalidHeader>()
        .filter(|e| is_credential_header(e.name()))
    {
        debug!(header = e.name(), "unreadable credential header");
        let code = ApiErrorCode::InvalidToken;
        (code.status(), code.to_string())
    } else if let Some(e) = err.find::<warp::body::BodyDeserializeError>() {
        debug!(error = %e, "malformed request body");
        (StatusCode::BAD_REQUEST, "malformed request body".to_string())
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "request body too large".to_string())
    } else if err.find::<reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "expected a JSON body".to_string(),
        )
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "method not allowed".to_string())
    } else {
        error!("unhandled rejection: {:?}", err);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ApiErrorCode::InternalError.to_string(),
        )
    };

    let json = warp::reply::json(&ApiResponse::fail(FailBody { message }));
    Ok(warp::reply::with_status(json, status))
}

fn is_credential_header(name: &str) -> bool {
    name.eq_ignore_ascii_case("cookie") || name.eq_ignore_ascii_case("authorization")
}

/// Client-facing failure. Messages are deliberately coarse: every token and
/// session failure reads "please log in again".
#[derive(Debug, Clone, Error, Serialize)]
pub enum ApiErrorCode {
    #[error("email and password are required")]
    MissingCredentials,
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("please log in again")]
    NotLoggedIn,
    #[error("please log in again")]
    InvalidToken,
    #[error("the user belonging to this token no longer exists")]
    UserGone,
    #[error("something went wrong")]
    TokenCreation,
    #[error("something went wrong")]
    InternalError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::MissingCredentials | ApiErrorCode::InvalidCredentials => {
                StatusCode::BAD_REQUEST
            }
            ApiErrorCode::NotLoggedIn => StatusCode::UNAUTHORIZED,
            ApiErrorCode::InvalidToken | ApiErrorCode::UserGone => StatusCode::FORBIDDEN,
            ApiErrorCode::TokenCreation => StatusCode::UNPROCESSABLE_ENTITY,
            ApiErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::NotLoggedIn => ApiErrorCode::NotLoggedIn,
            AuthError::TokenInvalid | AuthError::SessionRevoked => ApiErrorCode::InvalidToken,
            AuthError::UserNotFound => ApiErrorCode::UserGone,
            AuthError::TokenCreation => ApiErrorCode::TokenCreation,
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::StoreTimeout => ApiErrorCode::internal("session store timed out"),
        }
    }
}

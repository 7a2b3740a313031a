use super::cookie::CookiePolicy;
use super::error::*;
use crate::application_port::*;
use crate::domain_model::{AuthContext, User};
use crate::logger::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use warp::http::HeaderValue;
use warp::http::header::SET_COOKIE;
use warp::{self, Reply, reject};

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiStatus {
    Success,
    Fail,
}

/// `{"status": ..., <body fields>}` envelope shared by every reply.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: ApiStatus,
    #[serde(flatten)]
    pub body: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(body: T) -> Self {
        ApiResponse {
            status: ApiStatus::Success,
            body,
        }
    }

    pub fn fail(body: T) -> Self {
        ApiResponse {
            status: ApiStatus::Fail,
            body,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FailBody {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct NoBody {}

#[derive(Debug, Serialize)]
pub struct TokenBody {
    pub access_token: String,
}

#[derive(Debug, Serialize)]
pub struct UserData {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub data: UserData,
}

fn with_cookies(reply: impl Reply, cookies: Vec<String>) -> Result<warp::reply::Response, warp::Rejection> {
    let mut response = reply.into_response();
    for cookie in cookies {
        let value = HeaderValue::from_str(&cookie)
            .map_err(ApiErrorCode::internal)
            .map_err(reject::custom)?;
        response.headers_mut().append(SET_COOKIE, value);
    }
    Ok(response)
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    /// Emails compare case-insensitively and without stray whitespace.
    pub fn normalized(self) -> Self {
        LoginRequest {
            email: self.email.trim().to_lowercase(),
            password: self.password,
        }
    }
}

pub async fn login(
    body: LoginRequest,
    auth_service: Arc<dyn AuthService>,
    cookies: Arc<CookiePolicy>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let body = body.normalized();
    if body.email.is_empty() || body.password.is_empty() {
        return Err(reject::custom(ApiErrorCode::MissingCredentials));
    }

    let login_input = LoginInput {
        email: body.email,
        password: body.password,
    };
    let login_result = auth_service
        .login(login_input)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let access = &login_result.access_token.signed_value;
    let refresh = &login_result.refresh_token.signed_value;
    let reply = warp::reply::json(&ApiResponse::success(TokenBody {
        access_token: access.clone(),
    }));

    with_cookies(
        reply,
        vec![
            cookies.access(access),
            cookies.refresh(refresh),
            cookies.logged_in(),
        ],
    )
}

pub async fn refresh(
    refresh_cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookies: Arc<CookiePolicy>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let Some(refresh_token) = refresh_cookie.filter(|t| !t.is_empty()) else {
        return Err(reject::custom(ApiErrorCode::InvalidToken));
    };

    let refresh_result = auth_service
        .refresh(&refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    let access = &refresh_result.access_token.signed_value;
    let reply = warp::reply::json(&ApiResponse::success(TokenBody {
        access_token: access.clone(),
    }));

    with_cookies(reply, vec![cookies.access(access), cookies.logged_in()])
}

pub async fn logout(
    ctx: AuthContext,
    refresh_cookie: Option<String>,
    auth_service: Arc<dyn AuthService>,
    cookies: Arc<CookiePolicy>,
) -> Result<warp::reply::Response, warp::Rejection> {
    let Some(refresh_token) = refresh_cookie.filter(|t| !t.is_empty()) else {
        return Err(reject::custom(ApiErrorCode::InvalidToken));
    };

    auth_service
        .logout(&refresh_token, &ctx)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    debug!(user_id = %ctx.user.id, "session cookies cleared");
    let reply = warp::reply::json(&ApiResponse::success(NoBody {}));
    with_cookies(reply, cookies.cleared())
}

pub async fn me(ctx: AuthContext) -> Result<impl warp::Reply, warp::Rejection> {
    let response = ApiResponse::success(UserBody {
        data: UserData { user: ctx.user },
    });
    Ok(warp::reply::json(&response))
}

pub async fn health() -> Result<impl warp::Reply, warp::Rejection> {
    Ok(warp::reply::json(&ApiResponse::success(NoBody {})))
}

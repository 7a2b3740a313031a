use super::cookie::ACCESS_COOKIE;
use super::error::ApiErrorCode;
use crate::application_port::*;
use crate::domain_model::AuthContext;
use crate::logger::*;
use std::sync::Arc;
use warp::http::header::AUTHORIZATION;
use warp::http::{HeaderMap, HeaderValue};
use warp::{Filter, reject};

/// Raw access token from `Authorization: Bearer <token>`, falling back to
/// the access cookie.
pub fn extract_token(authorization: Option<&str>, cookie: Option<&str>) -> Option<String> {
    let bearer = authorization.and_then(|value| {
        let mut fields = value.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some("Bearer"), Some(token)) => Some(token),
            _ => None,
        }
    });

    bearer
        .or(cookie)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Request gate. Extracts the token, checks signature, liveness and owner,
/// and hands the resulting [`AuthContext`] to the next filter.
pub fn with_session(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (AuthContext,), Error = warp::Rejection> + Clone {
    warp::header::headers_cloned()
        .and(warp::cookie::optional::<String>(ACCESS_COOKIE))
        .and_then(move |headers: HeaderMap, cookie: Option<String>| {
            let auth_service = auth_service.clone();
            async move {
                // A header that is present but not text is a malformed credential.
                let authorization = match headers.get(AUTHORIZATION).map(HeaderValue::to_str) {
                    Some(Err(e)) => {
                        debug!(error = %e, "unreadable authorization header");
                        return Err(reject::custom(ApiErrorCode::from(AuthError::TokenInvalid)));
                    }
                    Some(Ok(value)) => Some(value),
                    None => None,
                };

                let Some(token) = extract_token(authorization, cookie.as_deref()) else {
                    return Err(reject::custom(ApiErrorCode::from(AuthError::NotLoggedIn)));
                };

                match auth_service.authenticate(&token).await {
                    Ok(ctx) => Ok(ctx),
                    Err(e) => {
                        debug!(reason = %e, "request rejected");
                        Err(reject::custom(ApiErrorCode::from(e)))
                    }
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_header_wins_over_cookie() {
        assert_eq!(
            extract_token(Some("Bearer header-token"), Some("cookie-token")),
            Some("header-token".to_string())
        );
    }

    #[test]
    fn falls_back_to_cookie() {
        assert_eq!(
            extract_token(None, Some("cookie-token")),
            Some("cookie-token".to_string())
        );
        assert_eq!(
            extract_token(Some("Basic dXNlcjpwdw=="), Some("cookie-token")),
            Some("cookie-token".to_string())
        );
        assert_eq!(
            extract_token(Some("Bearer"), Some("cookie-token")),
            Some("cookie-token".to_string())
        );
    }

    #[test]
    fn nothing_presented() {
        assert_eq!(extract_token(None, None), None);
        assert_eq!(extract_token(Some(""), Some("")), None);
    }
}

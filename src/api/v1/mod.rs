mod cookie;
mod error;
mod gate;
mod handler;
mod router;

pub use cookie::{ACCESS_COOKIE, CookiePolicy, LOGGED_IN_COOKIE, REFRESH_COOKIE};
pub use error::{ApiErrorCode, recover_error};
pub use gate::{extract_token, with_session};
pub use router::routes;

mod auth_service_impl;
mod token_service_impl;

pub use auth_service_impl::*;
pub use token_service_impl::*;

//! Request extractors.

use application::{Caller, Identity};
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::UserId;
use domain::UserRole;
use uuid::Uuid;

use crate::error::ApiError;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The caller resolved from identity headers set by the upstream token
/// service.
///
/// A request without `x-user-id` is anonymous. An identified request must
/// also carry `x-user-email`; `x-user-role` defaults to `user`.
#[derive(Debug, Clone)]
pub struct RequestCaller(pub Caller);

impl<S: Send + Sync> FromRequestParts<S> for RequestCaller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        caller_from_headers(&parts.headers).map(RequestCaller)
    }
}

fn caller_from_headers(headers: &HeaderMap) -> Result<Caller, ApiError> {
    let Some(user_id) = header(headers, USER_ID_HEADER)? else {
        return Ok(Caller::Anonymous);
    };
    let user_id = Uuid::parse_str(user_id)
        .map(UserId::from_uuid)
        .map_err(|e| ApiError::BadRequest(format!("Invalid {USER_ID_HEADER}: {e}")))?;

    let email = header(headers, USER_EMAIL_HEADER)?
        .ok_or_else(|| ApiError::BadRequest(format!("Missing {USER_EMAIL_HEADER} header")))?;

    let role = match header(headers, USER_ROLE_HEADER)? {
        Some(role) => role
            .parse::<UserRole>()
            .map_err(|e| ApiError::BadRequest(format!("Invalid {USER_ROLE_HEADER}: {e}")))?,
        None => UserRole::User,
    };

    Ok(Caller::Authenticated(Identity::new(user_id, email, role)))
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    headers
        .get(name)
        .map(|value| {
            value
                .to_str()
                .map(str::trim)
                .map_err(|_| ApiError::BadRequest(format!("Header {name} is not valid text")))
        })
        .transpose()
}

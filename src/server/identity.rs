use async_trait::async_trait;
use axum::extract::{FromRequest, RequestParts};
use uuid::Uuid;

use crate::auth::{Role, User};
use crate::error::Error;

/// Set by the identity provider in front of this service, which has already
/// authenticated the caller. Requests without them are rejected.
pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";

fn header<'a, B>(req: &'a RequestParts<B>, name: &str) -> Result<&'a str, Error> {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            tracing::info!(header = name, "missing identity header");
            Error::unauthorized_error()
        })
}

#[async_trait]
impl<B> FromRequest<B> for User
where
    B: Send,
{
    type Rejection = Error;

    async fn from_request(req: &mut RequestParts<B>) -> Result<Self, Self::Rejection> {
        let id: Uuid = header(req, USER_ID_HEADER)?
            .trim()
            .parse()
            .map_err(|_| Error::unauthorized_error())?;

        let role: Role = header(req, USER_ROLE_HEADER)?.parse()?;

        Ok(User { id, role })
    }
}

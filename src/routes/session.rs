//! Caller identity extraction.

use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Query},
    http::request::Parts,
};
use serde::Deserialize;

use crate::{error::AppError, state::Session};

/// Header carrying the identity returned when creating or joining a room.
pub const IDENTITY_HEADER: &str = "x-user-identity";

/// Query parameter fallback for clients that cannot set headers (`EventSource`).
#[derive(Debug, Deserialize)]
struct IdentityQuery {
    identity: Option<String>,
}

fn identity_from(parts: &Parts) -> Option<String> {
    let from_header = parts
        .headers
        .get(IDENTITY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned);

    from_header.or_else(|| {
        Query::<IdentityQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.identity)
            .map(|identity| identity.trim().to_owned())
            .filter(|identity| !identity.is_empty())
    })
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        identity_from(parts)
            .map(Session::new)
            .ok_or_else(|| AppError::unauthorized("missing X-User-Identity header"))
    }
}

impl<S> OptionalFromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(identity_from(parts).map(Session::new))
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn header_wins_over_query() {
        let parts = parts(
            Request::builder()
                .uri("/rooms/r1/events?identity=from-query")
                .header(IDENTITY_HEADER, " from-header ")
                .body(())
                .unwrap(),
        );
        assert_eq!(identity_from(&parts).as_deref(), Some("from-header"));
    }

    #[test]
    fn query_is_used_without_header() {
        let parts = parts(
            Request::builder()
                .uri("/rooms/r1/events?identity=abc")
                .body(())
                .unwrap(),
        );
        assert_eq!(identity_from(&parts).as_deref(), Some("abc"));
    }

    #[test]
    fn blank_identity_is_missing() {
        let parts = parts(
            Request::builder()
                .uri("/rooms/r1")
                .header(IDENTITY_HEADER, "  ")
                .body(())
                .unwrap(),
        );
        assert_eq!(identity_from(&parts), None);
    }
}

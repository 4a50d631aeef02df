//! Bearer-token guard for the bridge surface.

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::AppState;
use crate::error::RelayError;

/// Rejects requests that do not carry `Authorization: Bearer <BOT_TOKEN>`.
///
/// # Errors
///
/// Returns [`RelayError::Unauthorized`] if the header is missing or the
/// token does not match.
pub async fn require_bearer(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, RelayError> {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    match presented {
        Some(token) if tokens_match(token.as_bytes(), state.bot_token.as_bytes()) => {
            Ok(next.run(request).await)
        }
        _ => {
            tracing::warn!(path = %request.uri().path(), "rejected unauthenticated bridge request");
            Err(RelayError::Unauthorized)
        }
    }
}

/// Compares without short-circuiting on the first differing byte, so the
/// response time does not reveal how much of the token a caller got right.
fn tokens_match(presented: &[u8], expected: &[u8]) -> bool {
    presented.len() == expected.len()
        && presented
            .iter()
            .zip(expected)
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_compare_by_content() {
        assert!(tokens_match(b"secret", b"secret"));
        assert!(!tokens_match(b"secreT", b"secret"));
        assert!(!tokens_match(b"secret2", b"secret"));
        assert!(!tokens_match(b"", b"secret"));
    }
}

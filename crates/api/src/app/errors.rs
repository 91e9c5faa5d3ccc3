use axum::http::{header, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde_json::json;

use toolrent_core::{DomainError, DomainResult};

/// Retryable errors (conflicts, unavailable collaborators) carry `Retry-After`.
pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let retryable = err.is_retryable();
    let mut res = match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::Unavailable(detail) => {
            // Transport detail stays in the logs.
            tracing::error!(detail = %detail, "collaborator unavailable");
            json_error(StatusCode::BAD_GATEWAY, "upstream_unavailable", "upstream unavailable")
        }
    };
    if retryable {
        res.headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
    }
    res
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Run a mutating engine call off the async workers.
///
/// Engine writes wait on bucket/loan locks, so they go through the blocking pool.
pub async fn blocking<T, F>(f: F) -> Result<T, axum::response::Response>
where
    F: FnOnce() -> DomainResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(domain_error_to_response(e)),
        Err(join) => {
            tracing::error!(error = %join, "blocking engine call failed");
            Err(json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal error"))
        }
    }
}

/// Parse a path/query id, turning failures into a 400 response.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: core::str::FromStr<Err = DomainError>,
{
    raw.parse().map_err(domain_error_to_response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolrent_core::BucketId;

    #[test]
    fn unavailable_hides_transport_detail() {
        let res = domain_error_to_response(DomainError::unavailable("tcp reset by 10.0.0.3"));
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn status_mapping() {
        let cases = [
            (DomainError::validation("x"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("x"), StatusCode::NOT_FOUND),
            (DomainError::conflict("x"), StatusCode::CONFLICT),
            (DomainError::invariant("x"), StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (err, status) in cases {
            assert_eq!(domain_error_to_response(err).status(), status);
        }
    }

    #[test]
    fn only_retryable_errors_carry_retry_after() {
        let conflict = domain_error_to_response(DomainError::conflict("stock changed"));
        assert_eq!(conflict.headers().get(header::RETRY_AFTER).unwrap(), "1");

        let down = domain_error_to_response(DomainError::unavailable("inventory down"));
        assert!(down.headers().contains_key(header::RETRY_AFTER));

        let invalid = domain_error_to_response(DomainError::validation("amount must be > 0"));
        assert!(invalid.headers().get(header::RETRY_AFTER).is_none());
    }

    #[tokio::test]
    async fn blocking_maps_engine_errors() {
        let ok = blocking(|| Ok(7)).await.unwrap();
        assert_eq!(ok, 7);

        let res = blocking::<(), _>(|| Err(DomainError::conflict("stale"))).await.unwrap_err();
        assert_eq!(res.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn blocking_panic_is_internal_error() {
        let res = blocking::<(), _>(|| panic!("engine bug")).await.unwrap_err();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn bad_id_is_bad_request() {
        let res = parse_id::<BucketId>("not-a-uuid").unwrap_err();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}

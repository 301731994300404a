use crate::api::schemas::SendResponse;
use crate::domain::body;
use crate::domain::validation::{self, ErrorCode, ValidationError};
use crate::error::Result;
use axum::Json;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

const X_RETURN_HEADER: &str = "x-return";

enum Outcome {
    Accepted,
    Rejected(ValidationError),
}

/// Handles a send call on either vendor route: runs the validation pipeline
/// and renders the simulated reply.
///
/// # Errors
/// Returns [`crate::error::AppError::MalformedBody`] for a JSON body that
/// does not decode; every other failure becomes a classified reply.
pub async fn send_notification(headers: HeaderMap, body: String) -> Result<Response> {
    let mut reply = SendResponse::new();
    let status = match evaluate(&headers, &body)? {
        Outcome::Accepted => {
            reply.accept(&Uuid::new_v4().simple().to_string());
            StatusCode::OK
        }
        Outcome::Rejected(error) => {
            tracing::error!(code = error.code.wire_code(), detail = %error.detail, "{error}");
            reply.reject(error.code.wire_code());
            error.status
        }
    };

    Ok((status, Json(reply)).into_response())
}

fn evaluate(headers: &HeaderMap, body: &str) -> Result<Outcome> {
    // The test-only override bypasses the whole pipeline.
    if let Some(forced) = forced_reply(headers) {
        return Ok(Outcome::Rejected(forced));
    }
    if let Err(error) = validation::validate_headers(headers) {
        return Ok(Outcome::Rejected(error));
    }
    // Presence was checked by validate_headers.
    let content_type = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or_default();
    let parsed = body::parse_body(content_type, body)?;
    if let Err(error) = validation::validate_fields(&parsed) {
        return Ok(Outcome::Rejected(error));
    }
    Ok(Outcome::Accepted)
}

/// Test-only escape hatch: an `x-return` header of the form
/// `"<status> <message>"` forces that reply before any real validation runs.
fn forced_reply(headers: &HeaderMap) -> Option<ValidationError> {
    let value = headers.get(X_RETURN_HEADER)?;
    let raw = value.to_str().unwrap_or_default();

    match parse_forced(raw) {
        Some((status, message)) => Some(ValidationError::new(
            ErrorCode::Custom(message),
            status,
            format!("custom reply forced by x-return: {raw}"),
        )),
        None => Some(ValidationError::new(
            ErrorCode::InvalidXReturn,
            StatusCode::BAD_REQUEST,
            format!("x-return should be \"<status code> <message>\", got {raw:?}"),
        )),
    }
}

fn parse_forced(raw: &str) -> Option<(StatusCode, String)> {
    let (code, message) = raw.split_once(' ')?;
    let status = StatusCode::from_u16(code.parse().ok()?).ok()?;
    Some((status, message.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with_x_return(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(X_RETURN_HEADER, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_no_x_return_header() {
        assert!(forced_reply(&HeaderMap::new()).is_none());
    }

    #[test]
    fn test_x_return_forces_custom_reply() {
        let forced = forced_reply(&headers_with_x_return("200 ok")).unwrap();

        assert_eq!(forced.code, ErrorCode::Custom("ok".to_owned()));
        assert_eq!(forced.code.wire_code(), "ok");
        assert_eq!(forced.status, StatusCode::OK);
    }

    #[test]
    fn test_x_return_message_keeps_spaces() {
        let forced = forced_reply(&headers_with_x_return("503 service is down")).unwrap();

        assert_eq!(forced.code, ErrorCode::Custom("service is down".to_owned()));
        assert_eq!(forced.status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_x_return_without_code_is_invalid() {
        let forced = forced_reply(&headers_with_x_return("invalid")).unwrap();

        assert_eq!(forced.code, ErrorCode::InvalidXReturn);
        assert_eq!(forced.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_x_return_with_unparseable_code_is_invalid() {
        for value in ["abc def", "99 too low", "-1 negative"] {
            let mut headers = HeaderMap::new();
            headers.insert(X_RETURN_HEADER, HeaderValue::from_str(value).unwrap());

            let forced = forced_reply(&headers).unwrap();
            assert_eq!(forced.code, ErrorCode::InvalidXReturn, "expected {value:?} to be rejected");
        }
    }
}

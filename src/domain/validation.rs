use crate::domain::body::ParsedBody;
use axum::http::{HeaderMap, StatusCode, header};
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

pub const JSON_CONTENT_TYPE: &str = "application/json";
/// The form content type clients of this protocol send, four-w typo
/// included; matched verbatim.
pub const FORM_CONTENT_TYPE: &str = "application/x-wwww-form-urlencoded;charset=UTF-8";

const AUTH_KEY_PREFIX: &str = "key=";
const MAX_BODY_BYTES: u64 = 4096;
const MAX_REGISTRATION_IDS: usize = 1000;

const RESERVED_DATA_KEYS: &[&str] =
    &["registration_ids", "collapse_key", "time_to_live", "restricted_package_name", "dry_run", "data"];
const RESERVED_DATA_PREFIXES: &[&str] = &["from", "gcm", "fcm", "google"];

/// One or two `'<topic>' in topics` clauses, optionally joined by `&&` or
/// `||`, anchored start to end.
static CONDITION_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^('[^']+' in topics *(&&|\|\|)? *){1,2}$").expect("condition pattern is valid"));

/// Symbolic classification of a validation failure.
///
/// Variants stay distinct internally even where the wire code collides:
/// `NoTarget` and `ConflictingTargets` both render as `MissingRegistration`,
/// matching the emulated protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    MissingAuthorization,
    InvalidAuthorizationHeader,
    MissingContentType,
    InvalidContentType,
    MessageTooBig,
    TooManyRegistrationIds,
    NoTarget,
    ConflictingTargets,
    ConditionWithTarget,
    InvalidCondition,
    InvalidDataKey,
    InvalidXReturn,
    /// Reply forced through the `x-return` test header.
    Custom(String),
}

impl ErrorCode {
    /// The code string written into the `results` entry of the reply.
    #[must_use]
    pub fn wire_code(&self) -> &str {
        match self {
            Self::MissingAuthorization => "MissingAuthorization",
            Self::InvalidAuthorizationHeader => "InvalidAuthorizationHeader",
            Self::MissingContentType => "MissingContentType",
            Self::InvalidContentType => "InvalidContentType",
            Self::MessageTooBig => "MessageTooBig",
            Self::TooManyRegistrationIds | Self::ConditionWithTarget | Self::InvalidCondition => "InvalidRegistration",
            Self::NoTarget | Self::ConflictingTargets => "MissingRegistration",
            Self::InvalidDataKey => "InvalidDataKey",
            Self::InvalidXReturn => "InvalidXReturn",
            Self::Custom(code) => code,
        }
    }
}

/// A classified validation failure. `detail` is for logs only and never
/// reaches the client.
#[derive(Debug, Clone, Error)]
#[error("Error {}: {}", .status.as_u16(), .code.wire_code())]
pub struct ValidationError {
    pub code: ErrorCode,
    pub status: StatusCode,
    pub detail: String,
}

impl ValidationError {
    pub fn new(code: ErrorCode, status: StatusCode, detail: impl Into<String>) -> Self {
        Self { code, status, detail: detail.into() }
    }
}

/// Checks the request headers in protocol order; the first failing check
/// wins.
///
/// # Errors
/// Returns the classified failure for the first header rule violated.
pub fn validate_headers(headers: &HeaderMap) -> Result<(), ValidationError> {
    let auth = headers.get(header::AUTHORIZATION).ok_or_else(|| {
        ValidationError::new(
            ErrorCode::MissingAuthorization,
            StatusCode::UNAUTHORIZED,
            "authorization header is missing",
        )
    })?;
    if !auth.to_str().is_ok_and(|value| value.starts_with(AUTH_KEY_PREFIX)) {
        return Err(ValidationError::new(
            ErrorCode::InvalidAuthorizationHeader,
            StatusCode::UNAUTHORIZED,
            "invalid authorization header specified (missing 'key=')",
        ));
    }

    let content_type = headers.get(header::CONTENT_TYPE).ok_or_else(|| {
        ValidationError::new(ErrorCode::MissingContentType, StatusCode::BAD_REQUEST, "content-type header missing")
    })?;
    let content_type = content_type.to_str().unwrap_or_default();
    if !(content_type.eq_ignore_ascii_case(JSON_CONTENT_TYPE) || content_type.eq_ignore_ascii_case(FORM_CONTENT_TYPE))
    {
        return Err(ValidationError::new(
            ErrorCode::InvalidContentType,
            StatusCode::BAD_REQUEST,
            format!("unknown content-type specified: {content_type}"),
        ));
    }

    let declared_length =
        headers.get(header::CONTENT_LENGTH).and_then(|v| v.to_str().ok()).and_then(|s| s.parse::<u64>().ok());
    if declared_length.is_some_and(|length| length > MAX_BODY_BYTES) {
        return Err(ValidationError::new(
            ErrorCode::MessageTooBig,
            StatusCode::OK,
            format!("message body exceeds {MAX_BODY_BYTES} bytes"),
        ));
    }

    Ok(())
}

/// Applies the field-level rules to a parsed body, in protocol order; the
/// first failing rule wins.
///
/// # Errors
/// Returns the classified failure for the first rule violated. All field
/// rules are soft failures reported with HTTP 200.
pub fn validate_fields(parsed: &ParsedBody) -> Result<(), ValidationError> {
    if parsed.registration_ids.as_ref().is_some_and(|ids| ids.len() > MAX_REGISTRATION_IDS) {
        return Err(rejected(ErrorCode::TooManyRegistrationIds, "too many registration_ids"));
    }
    if parsed.to.is_none() && parsed.registration_ids.is_none() && parsed.condition.is_none() {
        return Err(rejected(ErrorCode::NoTarget, "missing body field: registration_ids"));
    }
    if parsed.registration_ids.is_some() && parsed.to.is_some() {
        return Err(rejected(ErrorCode::ConflictingTargets, "registration_ids and to present in payload"));
    }
    if parsed.condition.is_some() && parsed.to.is_some() {
        return Err(rejected(ErrorCode::ConditionWithTarget, "condition and to present in payload"));
    }
    if let Some(condition) = &parsed.condition {
        if !CONDITION_PATTERN.is_match(condition) {
            return Err(rejected(ErrorCode::InvalidCondition, format!("condition is invalid: {condition}")));
        }
    }
    for key in parsed.data.keys() {
        if RESERVED_DATA_PREFIXES.iter().any(|prefix| key.starts_with(prefix))
            || RESERVED_DATA_KEYS.contains(&key.as_str())
        {
            return Err(rejected(ErrorCode::InvalidDataKey, format!("invalid keyword in the data field: {key}")));
        }
    }
    Ok(())
}

fn rejected(code: ErrorCode, detail: impl Into<String>) -> ValidationError {
    ValidationError::new(code, StatusCode::OK, detail)
}

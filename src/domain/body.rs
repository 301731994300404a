use crate::domain::validation::JSON_CONTENT_TYPE;
use crate::error::AppError;
use serde_json::{Map, Value};

/// Addressing and payload fields extracted from a send request body. Lives
/// for the duration of one request.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParsedBody {
    pub to: Option<String>,
    pub registration_ids: Option<Vec<String>>,
    pub condition: Option<String>,
    pub data: Map<String, Value>,
}

impl ParsedBody {
    fn from_object(mut object: Map<String, Value>) -> Self {
        let to = take_string(&mut object, "to");
        let registration_ids = match object.remove("registration_ids") {
            Some(Value::Array(items)) if !items.is_empty() => Some(
                items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(id) => id,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            // Form bodies carry a single id as a plain string.
            Some(Value::String(id)) if !id.is_empty() => Some(vec![id]),
            _ => None,
        };
        let condition = take_string(&mut object, "condition");
        let data = match object.remove("data") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Self { to, registration_ids, condition, data }
    }
}

/// Decodes a request body per its content type and extracts the fields the
/// validators care about.
///
/// # Errors
/// Returns [`AppError::MalformedBody`] when a JSON body does not decode to
/// an object. Form bodies always decode.
pub fn parse_body(content_type: &str, raw: &str) -> Result<ParsedBody, AppError> {
    let object = if content_type.eq_ignore_ascii_case(JSON_CONTENT_TYPE) {
        match serde_json::from_str::<Value>(raw).map_err(|e| AppError::MalformedBody(e.to_string()))? {
            Value::Object(object) => object,
            other => return Err(AppError::MalformedBody(format!("expected a JSON object, got: {other}"))),
        }
    } else {
        parse_query(raw)
    };

    Ok(ParsedBody::from_object(object))
}

/// Splits a form-encoded body into a key/value object. Each `&`-delimited
/// pair is percent-decoded and split on the first `=`; a pair without `=`
/// becomes a `true` flag, and keys lose one matching pair of surrounding
/// quotes.
#[must_use]
pub fn parse_query(raw: &str) -> Map<String, Value> {
    let mut object = Map::new();
    for pair in raw.split('&') {
        let decoded = decode_component(pair);
        let (key, value) = match decoded.split_once('=') {
            Some((key, value)) => (key, Value::String(value.to_owned())),
            None => (decoded.as_str(), Value::Bool(true)),
        };
        object.insert(strip_quotes(key).to_owned(), value);
    }
    object
}

fn decode_component(raw: &str) -> String {
    // Form encoding uses '+' for a space; decode it before the percent pass.
    let unplussed = raw.replace('+', " ");
    match urlencoding::decode(&unplussed) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => unplussed,
    }
}

fn strip_quotes(key: &str) -> &str {
    for quote in ['\'', '"'] {
        if key.len() >= 2 && key.starts_with(quote) && key.ends_with(quote) {
            return &key[1..key.len() - 1];
        }
    }
    key
}

fn take_string(object: &mut Map<String, Value>, key: &str) -> Option<String> {
    match object.remove(key) {
        Some(Value::String(value)) if !value.is_empty() => Some(value),
        _ => None,
    }
}

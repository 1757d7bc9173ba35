//! Interpretation of raw backend responses.
//!
//! Every call the client makes ends here, so status handling, message
//! extraction and the non-JSON fallback are defined exactly once.

use serde_json::Value;

use super::ApiError;

/// Characters of a non-JSON body kept in the error message
const NON_JSON_PREVIEW_CHARS: usize = 100;

const NON_JSON_FALLBACK: &str = "Server Error (Non-JSON)";
const GENERIC_FAILURE: &str = "Something went wrong";

/// Turn a status, content type flag and body into the JSON payload or an
/// `ApiError`.
///
/// Order matters: 204 is an empty success, 401 always means the credential
/// was rejected (whatever the body looks like), and only then is the body
/// required to be JSON.
pub fn interpret(status: u16, is_json: bool, body: &str) -> Result<Value, ApiError> {
    if status == 204 {
        return Ok(Value::Null);
    }

    if status == 401 {
        let message = if is_json {
            serde_json::from_str::<Value>(body)
                .ok()
                .and_then(|v| error_field(&v))
        } else {
            None
        };
        return Err(ApiError::Unauthorized { message });
    }

    if !is_json {
        return Err(ApiError::InvalidResponse(non_json_message(body)));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|_| ApiError::InvalidResponse(NON_JSON_FALLBACK.to_string()))?;

    if (200..300).contains(&status) {
        Ok(value)
    } else {
        Err(ApiError::from_status(status, server_message(&value)))
    }
}

/// Human-readable message from an error payload.
///
/// An `error` field wins. Otherwise an object is treated as field errors
/// (`{"field": ["msg", ...]}`) and rendered one `field: msg` per line.
pub fn server_message(value: &Value) -> String {
    if let Some(message) = error_field(value) {
        return message;
    }

    if let Value::Object(map) = value {
        let lines: Vec<String> = map
            .iter()
            .filter(|(field, _)| field.as_str() != "error")
            .map(|(field, val)| format!("{}: {}", field, first_message(val)))
            .collect();
        if !lines.is_empty() {
            return lines.join("\n");
        }
    }

    GENERIC_FAILURE.to_string()
}

/// Non-empty string under `error`. Empty strings and non-string values
/// count as no message.
fn error_field(value: &Value) -> Option<String> {
    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn first_message(value: &Value) -> String {
    match value {
        Value::Array(items) => items.first().map(first_message).unwrap_or_default(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_json_message(body: &str) -> String {
    let preview: String = body.chars().take(NON_JSON_PREVIEW_CHARS).collect();
    if preview.trim().is_empty() {
        NON_JSON_FALLBACK.to_string()
    } else {
        preview
    }
}

//! Interpretation of `POST /api/run/<tool>` replies.

use serde_json::{Map, Value};

/// Candidate locations of the job id in a submit reply, highest priority first.
/// Dotted entries address nested objects.
pub const JOB_ID_FIELDS: [&str; 4] = ["job_id", "jobId", "id", "job.id"];

/// How an accepted submission is framed to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitFraming {
    /// 201/202: accepted for asynchronous processing.
    Accepted,
    /// Any other 2xx: already queued.
    Queued,
}

impl SubmitFraming {
    pub fn from_status(status: u16) -> Self {
        match status {
            201 | 202 => SubmitFraming::Accepted,
            _ => SubmitFraming::Queued,
        }
    }
}

/// Parses a reply body, treating empty or non-JSON content as an empty object.
pub fn parse_lenient(body: &[u8]) -> Value {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Value::Object(Map::new());
    }
    serde_json::from_slice(body).unwrap_or_else(|_| Value::Object(Map::new()))
}

pub fn extract_job_id(body: &Value) -> Option<String> {
    JOB_ID_FIELDS
        .iter()
        .find_map(|field| lookup(body, field).and_then(id_text))
}

/// Server-provided error text, from `error` then `message`.
pub fn server_message(body: &Value) -> Option<String> {
    ["error", "message"].iter().find_map(|field| {
        body.get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(ToOwned::to_owned)
    })
}

fn lookup<'a>(body: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(body, |node, key| node.get(key))
}

fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) if number.is_u64() || number.is_i64() => Some(number.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn id_fields_follow_priority() {
        let body = json!({"id": "c", "jobId": "b", "job_id": "a"});
        assert_eq!(extract_job_id(&body).as_deref(), Some("a"));
        let body = json!({"id": "c", "jobId": "b"});
        assert_eq!(extract_job_id(&body).as_deref(), Some("b"));
        let body = json!({"job": {"id": "d"}});
        assert_eq!(extract_job_id(&body).as_deref(), Some("d"));
    }

    #[test]
    fn empty_candidates_fall_through() {
        let body = json!({"job_id": "", "jobId": null, "id": 42});
        assert_eq!(extract_job_id(&body).as_deref(), Some("42"));
        assert_eq!(extract_job_id(&json!({"status": "queued"})), None);
        assert_eq!(extract_job_id(&json!({"job": "j1"})), None);
    }

    #[test]
    fn job_id_is_kept_verbatim() {
        assert_eq!(extract_job_id(&json!({"job_id": " j1 "})).as_deref(), Some(" j1 "));
        assert_eq!(extract_job_id(&json!({"job_id": "   ", "id": "j2"})).as_deref(), Some("j2"));
    }

    #[test]
    fn lenient_parse_tolerates_garbage() {
        assert_eq!(parse_lenient(b""), json!({}));
        assert_eq!(parse_lenient(b"  \n"), json!({}));
        assert_eq!(parse_lenient(b"<html>bad gateway</html>"), json!({}));
        assert_eq!(parse_lenient(br#"{"job_id":"x"}"#), json!({"job_id": "x"}));
    }

    #[test]
    fn framing_by_status() {
        assert_eq!(SubmitFraming::from_status(202), SubmitFraming::Accepted);
        assert_eq!(SubmitFraming::from_status(201), SubmitFraming::Accepted);
        assert_eq!(SubmitFraming::from_status(200), SubmitFraming::Queued);
    }
}

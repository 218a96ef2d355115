//! Bearer challenge detection in tool results

use serde::Serialize;
use serde_json::Value;

/// `_meta` key carrying `WWW-Authenticate` challenges
pub const WWW_AUTHENTICATE_META_KEY: &str = "mcp/www_authenticate";

/// Parsed OAuth bearer challenge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthChallenge {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// Find and parse a challenge in a tool result's `_meta`.
///
/// The value may be a single string or an array of strings; the first
/// string wins.
pub fn challenge_from_result(result: &Value) -> Option<OAuthChallenge> {
    let raw = match result.get("_meta")?.get(WWW_AUTHENTICATE_META_KEY)? {
        Value::String(s) => s.as_str(),
        Value::Array(items) => items.iter().find_map(Value::as_str)?,
        _ => return None,
    };
    Some(parse_bearer_challenge(raw))
}

/// Parse `Bearer key="value", ...` permissively.
///
/// The scheme is optional, values may be quoted or bare, unknown keys are
/// skipped and garbage between pairs is ignored.
pub fn parse_bearer_challenge(raw: &str) -> OAuthChallenge {
    let mut rest = raw.trim();
    if rest.get(..6).is_some_and(|scheme| scheme.eq_ignore_ascii_case("bearer")) {
        rest = &rest[6..];
    }

    let mut challenge = OAuthChallenge::default();
    for (key, value) in params(rest) {
        match key.to_ascii_lowercase().as_str() {
            "realm" => challenge.realm = Some(value),
            "error" => challenge.error = Some(value),
            "error_description" => challenge.error_description = Some(value),
            _ => {}
        }
    }
    challenge
}

fn params(mut rest: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    loop {
        rest = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace());
        let Some(eq) = rest.find('=') else {
            break;
        };
        // Last token before '=' is the key
        let key = rest[..eq]
            .rsplit(|c: char| c == ',' || c.is_whitespace())
            .next()
            .unwrap_or("")
            .to_string();
        rest = rest[eq + 1..].trim_start();

        let value = if let Some(quoted) = rest.strip_prefix('"') {
            let (value, remaining) = quoted_value(quoted);
            rest = remaining;
            value
        } else {
            let end = rest
                .find(|c: char| c == ',' || c.is_whitespace())
                .unwrap_or(rest.len());
            let value = rest[..end].to_string();
            rest = &rest[end..];
            value
        };

        if !key.is_empty() {
            out.push((key, value));
        }
    }
    out
}

/// Read up to the closing quote, honouring `\"`. An unterminated value runs to the end.
fn quoted_value(input: &str) -> (String, &str) {
    let mut value = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, escaped)) = chars.next() {
                    value.push(escaped);
                }
            }
            '"' => return (value, &input[i + 1..]),
            other => value.push(other),
        }
    }
    (value, "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_full_challenge() {
        let challenge = parse_bearer_challenge(
            r#"Bearer realm="x", error="invalid_token", error_description="expired""#,
        );
        assert_eq!(
            challenge,
            OAuthChallenge {
                realm: Some("x".into()),
                error: Some("invalid_token".into()),
                error_description: Some("expired".into()),
            }
        );
        assert_eq!(
            serde_json::to_value(&challenge).unwrap(),
            json!({"realm": "x", "error": "invalid_token", "errorDescription": "expired"})
        );
    }

    #[test]
    fn test_parse_is_permissive() {
        let challenge = parse_bearer_challenge(
            r#"bearer  resource_metadata="https://a.example/.well-known", error=insufficient_scope,error_description="needs \"write\"""#,
        );
        assert_eq!(challenge.realm, None);
        assert_eq!(challenge.error.as_deref(), Some("insufficient_scope"));
        assert_eq!(challenge.error_description.as_deref(), Some(r#"needs "write""#));
    }

    #[test]
    fn test_parse_garbage() {
        assert_eq!(parse_bearer_challenge(""), OAuthChallenge::default());
        assert_eq!(parse_bearer_challenge("Bearer"), OAuthChallenge::default());
        let unterminated = parse_bearer_challenge(r#"Bearer realm="open"#);
        assert_eq!(unterminated.realm.as_deref(), Some("open"));
    }

    #[test]
    fn test_challenge_from_result_meta() {
        let result = json!({
            "content": [],
            "_meta": {"mcp/www_authenticate": ["Bearer realm=\"api\"", "Basic"]}
        });
        assert_eq!(
            challenge_from_result(&result).unwrap().realm.as_deref(),
            Some("api")
        );
        assert!(challenge_from_result(&json!({"content": []})).is_none());
        assert!(challenge_from_result(&json!({"_meta": {"mcp/www_authenticate": 5}})).is_none());
    }
}

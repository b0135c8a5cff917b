use serde_json::Value;

/// Turn a backend response into chat text
///
/// Looks at `result.response`, `result.text`, `reply` and `message` in that
/// order and takes the first non-empty one. If none is present the whole
/// response is shown as pretty-printed JSON, so this never fails.
pub fn extract_reply(response: &Value) -> String {
    let candidates = [
        response.pointer("/result/response"),
        response.pointer("/result/text"),
        response.get("reply"),
        response.get("message"),
    ];

    candidates
        .into_iter()
        .flatten()
        .find_map(as_reply_text)
        .unwrap_or_else(|| render_json(response))
}

fn as_reply_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Object(map) if map.is_empty() => None,
        other => Some(render_json(other)),
    }
}

fn render_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

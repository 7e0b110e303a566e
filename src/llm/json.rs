//! JSON extraction from model completions.

use crate::error::{LlmError, LlmResult};

/// Extract the JSON payload from a completion string.
///
/// Attempts extraction in this order:
/// 1. Raw JSON (fast path)
/// 2. ```json ... ``` code blocks
/// 3. ``` ... ``` code blocks
/// 4. The outermost `{ ... }` span
pub fn extract_json(completion: &str) -> Result<&str, String> {
    let trimmed = completion.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Ok(trimmed);
    }

    if completion.contains("```json") {
        return completion
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ```json block but content was empty or malformed".to_string());
    }

    if completion.contains("```") {
        return completion
            .split("```")
            .nth(1)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| "Found ``` block but content was empty or malformed".to_string());
    }

    if let (Some(start), Some(end)) = (completion.find('{'), completion.rfind('}')) {
        if end > start {
            return Ok(&completion[start..=end]);
        }
    }

    Err(format!(
        "No JSON found in response. First 100 chars: '{}'",
        completion.chars().take(100).collect::<String>()
    ))
}

/// Parse a completion into a JSON value.
pub fn parse_json_completion(completion: &str) -> LlmResult<serde_json::Value> {
    let json = extract_json(completion).map_err(|message| LlmError::InvalidResponse { message })?;
    serde_json::from_str(json).map_err(|e| LlmError::InvalidResponse {
        message: format!("Failed to parse JSON completion: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_json() {
        assert_eq!(extract_json("  {\"a\": 1} ").unwrap(), "{\"a\": 1}");
        assert_eq!(extract_json("[1,2]").unwrap(), "[1,2]");
    }

    #[test]
    fn test_fenced_json() {
        let completion = "Here you go:\n```json\n{\"a\": 1}\n```\nDone.";
        assert_eq!(extract_json(completion).unwrap(), "{\"a\": 1}");

        let completion = "```\n{\"b\": 2}\n```";
        assert_eq!(extract_json(completion).unwrap(), "{\"b\": 2}");
    }

    #[test]
    fn test_embedded_object() {
        let completion = "The answer is {\"a\": {\"b\": 1}} as requested";
        assert_eq!(extract_json(completion).unwrap(), "{\"a\": {\"b\": 1}}");
    }

    #[test]
    fn test_no_json() {
        let err = extract_json("plain prose").unwrap_err();
        assert!(err.contains("No JSON found"));
    }

    #[test]
    fn test_parse_json_completion() {
        let value = parse_json_completion("```json\n{\"x\": true}\n```").unwrap();
        assert_eq!(value["x"], true);

        let err = parse_json_completion("{not json}").unwrap_err();
        assert!(matches!(err, LlmError::InvalidResponse { .. }));
    }
}

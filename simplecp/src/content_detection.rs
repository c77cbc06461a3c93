//! Content type detection for clipboard items
//!
//! Classifies text as a URL, source code, JSON document, or plain text.
//! The first matching rule wins, in that order.

use crate::interface::ContentType;
use once_cell::sync::Lazy;
use regex::Regex;

/// Protocols that make a clip a link
const LINK_PROTOCOLS: &[&str] = &["http://", "https://"];

/// Declarations that open a line of code in common languages
static CODE_LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^\s*(?:def\s+\w+\s*\(|class\s+\w+|function\b|(?:pub\s+)?fn\s+\w+|import\s+[\w.{*]|from\s+[\w.]+\s+import\b|#include\b|(?:const|let|var)\s+\w+\s*=|(?:public|private|protected)\s+\w+)",
    )
    .unwrap()
});

/// Brace and arrow tokens that rarely show up outside of code.
/// A bare `{` is deliberately absent so JSON objects fall through to the JSON rule.
static CODE_TOKEN_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\)\s*\{|\}\s*;|=>").unwrap()
});

/// Check if text starts with a supported link protocol
pub fn is_url(text: &str) -> bool {
    let trimmed = text.trim_start();
    LINK_PROTOCOLS.iter().any(|p| trimmed.starts_with(p))
}

/// Check if text contains characteristic code tokens
pub fn is_code(text: &str) -> bool {
    CODE_LINE_REGEX.is_match(text) || CODE_TOKEN_REGEX.is_match(text)
}

/// Check if text parses as a JSON object or array
pub fn is_json(text: &str) -> bool {
    let trimmed = text.trim();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return false;
    }
    matches!(
        serde_json::from_str::<serde_json::Value>(trimmed),
        Ok(serde_json::Value::Object(_)) | Ok(serde_json::Value::Array(_))
    )
}

/// Detect the content type from text
pub fn detect_content_type(text: &str) -> ContentType {
    if is_url(text) {
        ContentType::Url
    } else if is_code(text) {
        ContentType::Code
    } else if is_json(text) {
        ContentType::Json
    } else {
        ContentType::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_detection() {
        assert!(is_url("https://example.com"));
        assert!(is_url("http://test.org"));
        assert!(is_url("https://github.com/user/repo"));
        assert!(!is_url("ftp://example.com"));
        assert!(!is_url("see https://example.com"));
    }

    #[test]
    fn test_code_detection() {
        assert!(is_code("def hello():\n    pass"));
        assert!(is_code("function test() {}"));
        assert!(is_code("class MyClass:"));
        assert!(is_code("const x = 5;"));
        assert!(is_code("if (ready) { go(); }"));
        assert!(is_code("items.map(x => x * 2)"));
        assert!(!is_code("Hello World"));
        assert!(!is_code("a classic novel"));
    }

    #[test]
    fn test_json_detection() {
        assert!(is_json(r#"{"key": "value", "number": 42}"#));
        assert!(is_json("[1, 2, 3]"));
        assert!(!is_json("42"));
        assert!(!is_json("\"just a string\""));
        assert!(!is_json("{not json}"));
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(detect_content_type("https://example.com/{a}"), ContentType::Url);
        assert_eq!(
            detect_content_type(r#"{"key": "value", "number": 42}"#),
            ContentType::Json
        );
        assert_eq!(detect_content_type("function f() { return 1; }"), ContentType::Code);
        assert_eq!(detect_content_type("Hello World"), ContentType::Text);
        assert_eq!(detect_content_type(""), ContentType::Text);
    }
}

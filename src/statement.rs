//! Rendering of command documents for the statement span attribute.
use mongodb::bson::Document;

/// Marker appended to statements cut at the configured length.
const TRUNCATION_MARKER: &str = "...";

/// Render a command document as compact JSON, optionally capped at `max_len` bytes.
///
/// Rendering failures degrade to an empty statement, the command is still traced.
pub fn render(command: &Document, max_len: Option<usize>) -> String {
    let mut rendered = serde_json::to_string(command).unwrap_or_default();
    if let Some(max_len) = max_len {
        truncate(&mut rendered, max_len);
    }
    rendered
}

/// Cut the statement at the largest character boundary within `max_len` bytes.
fn truncate(statement: &mut String, max_len: usize) {
    if statement.len() <= max_len {
        return;
    }
    let mut cut = max_len;
    while !statement.is_char_boundary(cut) {
        cut -= 1;
    }
    statement.truncate(cut);
    statement.push_str(TRUNCATION_MARKER);
}

#[cfg(test)]
mod tests {
    use mongodb::bson::doc;

    use super::render;

    #[test]
    fn renders_compact_json() {
        let command = doc! { "insert": "test-collection", "test-item": "test-value" };
        let statement = render(&command, None);
        assert!(statement.contains(r#""test-item":"test-value""#));
        assert!(!statement.contains(": \""));
    }

    #[test]
    fn caps_statement_length() {
        let command = doc! { "insert": "a-rather-long-collection-name" };
        let statement = render(&command, Some(10));
        assert_eq!(statement.len(), 10 + "...".len());
        assert!(statement.ends_with("..."));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let command = doc! { "note": "káva káva káva" };
        // Cut inside a multi-byte character and make sure the result is valid UTF-8.
        for max_len in 1..24 {
            let statement = render(&command, Some(max_len));
            assert!(statement.ends_with("..."));
        }
    }

    #[test]
    fn short_statement_is_untouched() {
        let command = doc! { "ping": 1 };
        let statement = render(&command, Some(1024));
        assert_eq!(statement, r#"{"ping":1}"#);
    }
}

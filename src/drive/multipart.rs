use serde_json::Value;

pub const BOUNDARY: &str = "-------314159265358979323846";

pub fn content_type() -> String {
    format!("multipart/related; boundary={BOUNDARY}")
}

/// `multipart/related` upload body: JSON metadata part, then JSON content.
pub fn related_body(metadata: &Value, content: &str) -> String {
    let delimiter = format!("\r\n--{BOUNDARY}\r\n");
    let close_delimiter = format!("\r\n--{BOUNDARY}--");

    let mut body = String::with_capacity(content.len() + 256);
    body.push_str(&delimiter);
    body.push_str("Content-Type: application/json\r\n\r\n");
    body.push_str(&metadata.to_string());
    body.push_str(&delimiter);
    body.push_str("Content-Type: application/json\r\n\r\n");
    body.push_str(content);
    body.push_str(&close_delimiter);
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_related_body_layout() {
        let body = related_body(&json!({"name": "tasks.json"}), "[]");
        let parts: Vec<&str> = body.split(&format!("--{BOUNDARY}")).collect();

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "\r\n");
        assert!(parts[1].contains("{\"name\":\"tasks.json\"}"));
        assert!(parts[2].ends_with("\r\n\r\n[]\r\n"));
        assert_eq!(parts[3], "--");
    }

    #[test]
    fn test_content_type_names_boundary() {
        assert_eq!(
            content_type(),
            "multipart/related; boundary=-------314159265358979323846"
        );
    }
}

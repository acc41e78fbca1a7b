use serde_json::Value;

const DEFAULT_COLLEGE_NAME: &str = "National College, Bagepalli";

/// Assembles the generation prompt from structured facts, the cached website
/// snapshot and the user question. Deterministic string concatenation; the
/// snapshot is already truncated by the cache and no further budget is
/// applied here.
pub fn compose(facts: &Value, snapshot: &str, question: &str) -> String {
    let structured = serde_json::to_string_pretty(facts).unwrap_or_else(|_| "{}".to_string());

    let mut prompt =
        String::with_capacity(structured.len() + snapshot.len() + question.len() + 64);
    prompt.push_str("College Info: ");
    prompt.push_str(&structured);
    prompt.push_str("\nWebsite Data: ");
    prompt.push_str(snapshot);
    prompt.push_str("\nUser Question: ");
    prompt.push_str(question);
    prompt
}

/// Fixed assistant instruction, parameterized only by the college name from
/// the structured facts.
pub fn system_instruction(facts: &Value) -> String {
    let college_name = facts
        .get("college_name")
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_COLLEGE_NAME);

    format!(
        "You are the official AI Assistant of {college_name}.\n\
         The college was established in July 1978 and is managed by the National Education Society of Karnataka (NES).\n\
         \n\
         Use both:\n\
         - Provided structured college information\n\
         - Real-time scraped website data\n\
         \n\
         Rules:\n\
         - Keep answers short (3-5 lines).\n\
         - Use <strong> for bold text.\n\
         - Be professional and helpful.\n\
         - Never mention Gemini."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn compose_labels_all_sections() {
        let facts = json!({ "college_name": "Test College", "phone": "080-1234" });
        let prompt = compose(&facts, "snapshot text", "what are the fees?");
        assert!(prompt.starts_with("College Info: "));
        assert!(prompt.contains("\"phone\": \"080-1234\""));
        assert!(prompt.contains("\nWebsite Data: snapshot text"));
        assert!(prompt.ends_with("\nUser Question: what are the fees?"));
    }

    #[test]
    fn compose_is_deterministic() {
        let facts = json!({ "a": 1, "b": 2 });
        assert_eq!(compose(&facts, "s", "q"), compose(&facts, "s", "q"));
    }

    #[test]
    fn instruction_uses_configured_college_name() {
        let instruction = system_instruction(&json!({ "college_name": "Test College" }));
        assert!(instruction.contains("official AI Assistant of Test College"));
    }

    #[test]
    fn instruction_falls_back_to_default_name() {
        let instruction = system_instruction(&json!({}));
        assert!(instruction.contains(DEFAULT_COLLEGE_NAME));
    }
}

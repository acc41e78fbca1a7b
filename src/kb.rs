use std::path::Path;
use serde::Deserialize;
use crate::error::{AppError, Result};

/// Static FAQ table consulted before any network or model call.
///
/// Entries are scanned in declaration order and the first keyword hit wins,
/// so the order of categories and questions in the file is part of the
/// routing behavior.
#[derive(Debug, Default, Deserialize)]
pub struct KnowledgeBase {
    #[serde(default)]
    pub knowledge_base: Vec<Category>,
}

#[derive(Debug, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub questions: Vec<QuestionEntry>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionEntry {
    #[serde(default)]
    pub keywords: Vec<String>,
    pub answer: String,
}

impl KnowledgeBase {
    /// Loads the knowledge base from a JSON file. A missing file yields an
    /// empty knowledge base, which routes every message to generation.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("malformed {}: {e}", path.display())))
    }

    /// Returns the answer of the first entry with a keyword appearing as a
    /// substring of the lower-cased message. Keywords are expected to be
    /// lower-case in the file.
    pub fn find_answer(&self, message: &str) -> Option<&str> {
        let msg = message.to_lowercase();
        for category in &self.knowledge_base {
            for question in &category.questions {
                if question.keywords.iter().any(|k| msg.contains(k.as_str())) {
                    return Some(&question.answer);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> KnowledgeBase {
        serde_json::from_value(json!({
            "knowledge_base": [
                {
                    "category": "Admissions",
                    "questions": [
                        {
                            "keywords": ["admission", "apply"],
                            "answer": "Admissions open in May. Visit the office for forms."
                        }
                    ]
                },
                {
                    "category": "General",
                    "questions": [
                        {
                            "keywords": ["timing", "hours"],
                            "answer": "The college is open 9am to 5pm."
                        },
                        {
                            "keywords": ["admission"],
                            "answer": "This answer is shadowed by the earlier entry."
                        }
                    ]
                }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn matches_keyword_substring_case_insensitive() {
        let kb = sample();
        let answer = kb.find_answer("What are the ADMISSION dates?");
        assert_eq!(answer, Some("Admissions open in May. Visit the office for forms."));
    }

    #[test]
    fn first_match_wins_across_categories() {
        let kb = sample();
        // "admission" appears in two entries; the first declared one is returned.
        assert_eq!(
            kb.find_answer("admission"),
            Some("Admissions open in May. Visit the office for forms.")
        );
    }

    #[test]
    fn no_keyword_returns_none() {
        let kb = sample();
        assert_eq!(kb.find_answer("tell me about the campus library"), None);
    }

    #[test]
    fn empty_kb_never_matches() {
        let kb = KnowledgeBase::default();
        assert_eq!(kb.find_answer("admission"), None);
    }
}

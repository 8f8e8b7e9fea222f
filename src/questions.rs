use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Body of `POST /api/questions/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub learning_outcome_id: Number,
    /// `None` when the count input did not parse; sent as JSON `null`.
    pub num_questions: Option<i64>,
    pub question_type: String,
}

/// Question formats the generation endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    ShortAnswer,
    TrueFalse,
    FillInTheBlank,
}

impl QuestionType {
    pub fn as_wire_name(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple_choice",
            Self::ShortAnswer => "short_answer",
            Self::TrueFalse => "true_false",
            Self::FillInTheBlank => "fill_in_the_blank",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::MultipleChoice => "Multiple choice",
            Self::ShortAnswer => "Short answer",
            Self::TrueFalse => "True / false",
            Self::FillInTheBlank => "Fill in the blank",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::MultipleChoice => Self::ShortAnswer,
            Self::ShortAnswer => Self::TrueFalse,
            Self::TrueFalse => Self::FillInTheBlank,
            Self::FillInTheBlank => Self::MultipleChoice,
        }
    }

    pub fn previous(self) -> Self {
        match self {
            Self::MultipleChoice => Self::FillInTheBlank,
            Self::ShortAnswer => Self::MultipleChoice,
            Self::TrueFalse => Self::ShortAnswer,
            Self::FillInTheBlank => Self::TrueFalse,
        }
    }
}

/// Leading-integer parse of the question count input.
///
/// Mirrors a browser's `parseInt(value, 10)`: surrounding whitespace is
/// skipped, an optional sign is honoured, trailing garbage is ignored, and
/// input without leading digits yields `None`.
pub fn parse_question_count(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits: String = rest.chars().take_while(|ch| ch.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let magnitude: i64 = digits.parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Receives generated questions for display.
///
/// Implementations get the exact array the server returned and must treat
/// it as read-only, in server order.
pub trait QuestionRenderer {
    fn render_questions(&mut self, questions: &[Value]);

    /// Drop whatever is currently shown. Called when a new generation starts.
    fn clear(&mut self) {}
}

/// Display projection of one opaque question object.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuestionView {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub options: Vec<Value>,
    #[serde(default)]
    pub answer: Option<Value>,
    #[serde(default)]
    pub taxonomy_level: Option<String>,
}

impl QuestionView {
    /// Best-effort read; unknown shapes fall back to the raw JSON as the prompt.
    pub fn from_value(value: &Value) -> Self {
        match serde_json::from_value::<QuestionView>(value.clone()) {
            Ok(view) if view.question.is_some() => view,
            _ => QuestionView {
                question: Some(value.to_string()),
                ..QuestionView::default()
            },
        }
    }

    pub fn option_texts(&self) -> Vec<String> {
        self.options.iter().map(display_value).collect()
    }

    pub fn answer_text(&self) -> Option<String> {
        self.answer.as_ref().map(display_value)
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn question_count_follows_leading_integer_rules() {
        assert_eq!(parse_question_count("5"), Some(5));
        assert_eq!(parse_question_count("  12"), Some(12));
        assert_eq!(parse_question_count("7abc"), Some(7));
        assert_eq!(parse_question_count("-3"), Some(-3));
        assert_eq!(parse_question_count("3.9"), Some(3));
        assert_eq!(parse_question_count(""), None);
        assert_eq!(parse_question_count("abc"), None);
        assert_eq!(parse_question_count("-"), None);
    }

    #[test]
    fn unparsable_count_serializes_as_null() {
        let request = GenerateRequest {
            learning_outcome_id: Number::from(7),
            num_questions: parse_question_count("lots"),
            question_type: QuestionType::ShortAnswer.as_wire_name().to_string(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "learning_outcome_id": 7,
                "num_questions": null,
                "question_type": "short_answer"
            })
        );
    }

    #[test]
    fn question_type_serde_matches_wire_names() {
        for kind in [
            QuestionType::MultipleChoice,
            QuestionType::ShortAnswer,
            QuestionType::TrueFalse,
            QuestionType::FillInTheBlank,
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), json!(kind.as_wire_name()));
            assert_eq!(kind.next().previous(), kind);
        }
    }

    #[test]
    fn question_view_reads_known_fields() {
        let view = QuestionView::from_value(&json!({
            "type": "multiple_choice",
            "question": "Which of these is a primary color?",
            "options": ["Green", "Orange", "Blue", "Purple"],
            "answer": "Blue",
            "taxonomy_level": "Remembering"
        }));
        assert_eq!(view.kind.as_deref(), Some("multiple_choice"));
        assert_eq!(view.option_texts().len(), 4);
        assert_eq!(view.answer_text().as_deref(), Some("Blue"));
        assert_eq!(view.taxonomy_level.as_deref(), Some("Remembering"));
    }

    #[test]
    fn question_view_falls_back_to_raw_json() {
        let raw = json!({"prompt": "2+2=?"});
        let view = QuestionView::from_value(&raw);
        assert_eq!(view.question, Some(raw.to_string()));
        assert!(view.answer.is_none());
    }
}

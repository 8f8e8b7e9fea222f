use crate::questions::{QuestionRenderer, QuestionView};
use chrono::Local;
use serde_json::Value;

/// The terminal's render target for generated questions.
#[derive(Debug, Clone, Default)]
pub struct QuestionBoard {
    questions: Vec<QuestionView>,
    generated_at: Option<String>,
    pub(crate) index: usize,
    pub(crate) answer_revealed: bool,
}

impl QuestionRenderer for QuestionBoard {
    fn render_questions(&mut self, questions: &[Value]) {
        self.questions = questions.iter().map(QuestionView::from_value).collect();
        self.generated_at = Some(Local::now().format("%Y-%m-%d %H:%M:%S").to_string());
        self.index = 0;
        self.answer_revealed = false;
    }

    fn clear(&mut self) {
        self.questions.clear();
        self.generated_at = None;
        self.index = 0;
        self.answer_revealed = false;
    }
}

impl QuestionBoard {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn generated_at(&self) -> Option<&str> {
        self.generated_at.as_deref()
    }

    pub fn current(&self) -> Option<&QuestionView> {
        self.questions.get(self.index)
    }
}

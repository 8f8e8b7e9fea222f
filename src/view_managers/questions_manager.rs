use crate::app::{App, AppView};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

pub(crate) struct QuestionsManager<'a> {
    app: &'a mut App,
}

impl<'a> QuestionsManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn show_questions(app: &'a mut App) {
        if app.board.is_empty() {
            App::push_error(
                &mut app.error,
                "No questions generated yet. Pick a sub-strand and press g.".to_string(),
            );
            return;
        }
        app.view = AppView::Questions;
        debug!("App: opened questions view");
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Right | KeyCode::Down | KeyCode::Char('n'))
            | (KeyModifiers::NONE, KeyCode::Tab) => self.next_question(),
            (KeyModifiers::NONE, KeyCode::Left | KeyCode::Up | KeyCode::Char('p'))
            | (KeyModifiers::SHIFT, KeyCode::BackTab) => self.previous_question(),
            (KeyModifiers::NONE, KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('a')) => {
                self.toggle_answer()
            }
            (KeyModifiers::NONE, KeyCode::Char('g')) => self.app.view = AppView::Generator,
            (KeyModifiers::NONE, KeyCode::Char('m')) => self.app.return_to_menu(),
            _ => {}
        }
    }

    pub(crate) fn next_question(&mut self) {
        let total = self.app.board.len();
        if total == 0 {
            return;
        }
        self.app.board.index = (self.app.board.index + 1) % total;
        self.app.board.answer_revealed = false;
        debug!(
            "App: moved to question {} of {}",
            self.app.board.index + 1,
            total
        );
    }

    pub(crate) fn previous_question(&mut self) {
        let total = self.app.board.len();
        if total == 0 {
            return;
        }
        if self.app.board.index == 0 {
            self.app.board.index = total - 1;
        } else {
            self.app.board.index -= 1;
        }
        self.app.board.answer_revealed = false;
        debug!(
            "App: moved to question {} of {}",
            self.app.board.index + 1,
            total
        );
    }

    fn toggle_answer(&mut self) {
        if self.app.board.current().is_some() {
            self.app.board.answer_revealed = !self.app.board.answer_revealed;
        }
    }
}

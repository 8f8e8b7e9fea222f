use crate::{
    app::{App, AppView},
    curriculum::FilterLevel,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

const MAX_COUNT_INPUT_LEN: usize = 6;

/// Rows of the generator form, top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormRow {
    Filter(FilterLevel),
    NumQuestions,
    QuestionType,
    Generate,
}

impl FormRow {
    pub(crate) const ALL: [FormRow; 7] = [
        FormRow::Filter(FilterLevel::Subject),
        FormRow::Filter(FilterLevel::Grade),
        FormRow::Filter(FilterLevel::Strand),
        FormRow::Filter(FilterLevel::SubStrand),
        FormRow::NumQuestions,
        FormRow::QuestionType,
        FormRow::Generate,
    ];

    fn position(self) -> usize {
        Self::ALL
            .iter()
            .position(|row| *row == self)
            .unwrap_or_default()
    }

    fn next(self) -> Self {
        Self::ALL[(self.position() + 1) % Self::ALL.len()]
    }

    fn previous(self) -> Self {
        let position = self.position();
        if position == 0 {
            Self::ALL[Self::ALL.len() - 1]
        } else {
            Self::ALL[position - 1]
        }
    }
}

pub(crate) struct GeneratorManager<'a> {
    app: &'a mut App,
}

impl<'a> GeneratorManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn show_generator(app: &'a mut App) {
        app.view = AppView::Generator;
        if app.controller.field(FilterLevel::Subject).options().is_empty()
            && !app.controller.field(FilterLevel::Subject).is_loading()
        {
            app.start_session();
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Tab) => {
                self.app.focus = self.app.focus.next();
            }
            (KeyModifiers::NONE, KeyCode::Up) | (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                self.app.focus = self.app.focus.previous();
            }
            (KeyModifiers::NONE, KeyCode::Right) => self.change_focused(1),
            (KeyModifiers::NONE, KeyCode::Left) => self.change_focused(-1),
            (KeyModifiers::NONE, KeyCode::Enter) => {
                if self.app.focus == FormRow::Generate {
                    self.click_generate();
                } else {
                    self.app.focus = self.app.focus.next();
                }
            }
            (KeyModifiers::NONE, KeyCode::Backspace) if self.app.focus == FormRow::NumQuestions => {
                self.app.num_questions_input.pop();
            }
            (KeyModifiers::NONE, KeyCode::Char(ch))
                if self.app.focus == FormRow::NumQuestions
                    && (ch.is_ascii_digit() || ch == '-') =>
            {
                if self.app.num_questions_input.len() < MAX_COUNT_INPUT_LEN {
                    self.app.num_questions_input.push(ch);
                }
            }
            (KeyModifiers::NONE, KeyCode::Char('g')) => self.click_generate(),
            (KeyModifiers::NONE, KeyCode::Char('r')) => {
                debug!("App: reloading curriculum from subjects");
                self.app.start_session();
            }
            (KeyModifiers::NONE, KeyCode::Char('v')) => {
                super::QuestionsManager::show_questions(self.app)
            }
            (KeyModifiers::NONE, KeyCode::Char('m')) => self.app.return_to_menu(),
            _ => {}
        }
    }

    fn change_focused(&mut self, delta: i64) {
        match self.app.focus {
            FormRow::Filter(level) => self.cycle_filter(level, delta),
            FormRow::QuestionType => {
                self.app.question_type = if delta > 0 {
                    self.app.question_type.next()
                } else {
                    self.app.question_type.previous()
                };
            }
            FormRow::NumQuestions | FormRow::Generate => {}
        }
    }

    /// Step the selector through its selectable values, with the unselected
    /// placeholder as slot zero.
    pub(crate) fn cycle_filter(&mut self, level: FilterLevel, delta: i64) {
        let field = self.app.controller.field(level);
        if !field.is_enabled() {
            return;
        }
        let mut values = field.selectable_values();
        let current = field
            .selected()
            .and_then(|selected| values.iter().position(|value| value == selected))
            .map_or(0, |index| index as i64 + 1);
        let slots = values.len() as i64 + 1;
        let slot = (current + delta).rem_euclid(slots) as usize;
        let value = slot.checked_sub(1).map(|index| values.swap_remove(index));

        let controller = &mut self.app.controller;
        let ticket = match level {
            FilterLevel::Subject => controller.on_subject_change(value.as_deref()),
            FilterLevel::Grade => controller.on_grade_change(value.as_deref()),
            FilterLevel::Strand => controller.on_strand_change(value.as_deref()),
            FilterLevel::SubStrand => controller.on_substrand_change(value.as_deref()),
        };
        if let Some(ticket) = ticket {
            self.app.dispatch(ticket);
        }
    }

    fn click_generate(&mut self) {
        if self.app.controller.is_generating() {
            debug!("App: generate ignored while a request is in flight");
            return;
        }
        self.app.start_generate();
    }
}

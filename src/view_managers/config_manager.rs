use crate::{
    api::CurriculumClient,
    app::{App, AppView},
    config::{self, ConfigForm},
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

pub(crate) struct ConfigManager<'a> {
    app: &'a mut App,
}

impl<'a> ConfigManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn show_config(&mut self) {
        self.app.config_form = ConfigForm::from_config(config::current());
        self.app
            .config_form
            .set_status("Use ←/→ to adjust values, Enter on the URL to edit it, s to save.");
        self.app.view = AppView::Config;
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        if self.app.config_form.is_editing_api_base() {
            self.handle_api_base_key(key);
            return;
        }

        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => {
                self.app.config_form.select_next();
            }
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => {
                self.app.config_form.select_previous();
            }
            (KeyModifiers::NONE, KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('-')) => {
                self.app.config_form.adjust_current(-1);
            }
            (
                KeyModifiers::NONE,
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('+') | KeyCode::Char('='),
            ) => {
                self.app.config_form.adjust_current(1);
            }
            (KeyModifiers::NONE, KeyCode::Enter) if self.app.config_form.is_api_base_selected() => {
                self.app.config_form.start_editing_api_base();
            }
            (KeyModifiers::NONE, KeyCode::Char('s')) | (KeyModifiers::NONE, KeyCode::Enter) => {
                self.save_config_changes();
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => self.reset_config_form(),
            (KeyModifiers::NONE, KeyCode::Char('m')) => self.app.return_to_menu(),
            _ => {}
        }
    }

    fn handle_api_base_key(&mut self, key: KeyEvent) {
        let form = &mut self.app.config_form;
        match key.code {
            KeyCode::Enter => form.apply_api_base_edit(),
            KeyCode::Esc => form.cancel_api_base_edit(),
            KeyCode::Backspace => form.backspace_api_base(),
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                form.push_api_base_char(ch)
            }
            _ => {}
        }
    }

    fn save_config_changes(&mut self) {
        if !self.app.config_form.dirty {
            self.app
                .config_form
                .set_status("No pending changes to save.");
            return;
        }

        let form = self.app.config_form.clone();
        match config::update(|config| {
            config.default_num_questions = form.num_questions;
            config.default_question_type = form.question_type;
            config.request_timeout_secs = form.request_timeout_secs;
            config.api_base_url = form.api_base_url.clone();
        }) {
            Ok(updated) => {
                let backend_changed = updated.api_base_url != self.app.api_base;
                self.app.num_questions_input = updated.default_num_questions.to_string();
                self.app.question_type = updated.default_question_type;
                self.app.api_base = updated.api_base_url.clone();
                self.app
                    .worker
                    .set_client(CurriculumClient::from_config(&updated));
                self.app.config_form.apply_saved(updated);
                self.app.config_form.set_status(format!(
                    "Saved configuration to {}",
                    config::config_file_path().display()
                ));
                info!("App: configuration saved");
                if backend_changed {
                    info!("App: backend changed to {}; reloading curriculum", self.app.api_base);
                    self.app.start_session();
                }
            }
            Err(err) => {
                App::push_error(
                    &mut self.app.error,
                    format!("Failed to save configuration: {}", err),
                );
                self.app
                    .config_form
                    .set_status("Failed to save configuration. Check error panel.");
                warn!("App: failed to save configuration: {}", err);
            }
        }
    }

    fn reset_config_form(&mut self) {
        let current = config::current();
        self.app.config_form = ConfigForm::from_config(current);
        self.app
            .config_form
            .set_status("Reverted to saved configuration values.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::test_app;

    fn press(app: &mut App, code: KeyCode) {
        app.on_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn url_edit_captures_quit_keys() {
        let mut app = test_app();
        app.running = true;
        app.view = AppView::Config;
        for _ in 0..3 {
            press(&mut app, KeyCode::Down);
        }
        assert!(app.config_form.is_api_base_selected());

        press(&mut app, KeyCode::Enter);
        assert!(app.config_form.is_editing_api_base());
        for _ in 0..4 {
            press(&mut app, KeyCode::Backspace);
        }
        for ch in "5001".chars() {
            press(&mut app, KeyCode::Char(ch));
        }
        press(&mut app, KeyCode::Char('q'));
        assert!(app.running, "typing q into the URL must not quit");
        press(&mut app, KeyCode::Backspace);
        press(&mut app, KeyCode::Enter);

        assert!(!app.config_form.is_editing_api_base());
        assert_eq!(app.config_form.api_base_url, "http://localhost:5001");
        assert!(app.config_form.dirty);
    }

    #[test]
    fn escape_cancels_url_edit_without_quitting() {
        let mut app = test_app();
        app.running = true;
        app.view = AppView::Config;
        app.config_form.start_editing_api_base();
        press(&mut app, KeyCode::Char('x'));
        press(&mut app, KeyCode::Esc);

        assert!(app.running);
        assert!(!app.config_form.is_editing_api_base());
        assert_eq!(app.config_form.api_base_url, "http://localhost:5000");
        assert!(!app.config_form.dirty);
    }

    #[test]
    fn saving_without_changes_only_reports() {
        let mut app = test_app();
        app.view = AppView::Config;
        press(&mut app, KeyCode::Char('s'));
        assert_eq!(
            app.config_form.status.as_deref(),
            Some("No pending changes to save.")
        );
        assert!(app.error.is_none());
    }
}

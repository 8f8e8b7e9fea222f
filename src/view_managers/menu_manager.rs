use super::{ConfigManager, GeneratorManager, QuestionsManager, TestPaperManager};
use crate::app::App;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) const MENU_OPTIONS: [&str; 4] = [
    "1. Generate exam questions",
    "2. View generated questions",
    "3. Configure defaults",
    "4. Build a full test paper",
];

pub(crate) struct MenuManager<'a> {
    app: &'a mut App,
}

impl<'a> MenuManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Char('j')) => self.menu_next(),
            (KeyModifiers::NONE, KeyCode::Up | KeyCode::Char('k')) => self.menu_previous(),
            (KeyModifiers::NONE, KeyCode::Enter) => self.activate_menu_option(),
            (KeyModifiers::NONE, KeyCode::Char(ch @ '1'..='4')) => {
                self.app.menu_index = ch as usize - '1' as usize;
                self.activate_menu_option();
            }
            (KeyModifiers::NONE, KeyCode::Char('c') | KeyCode::Char('C')) => {
                ConfigManager::new(self.app).show_config()
            }
            _ => {}
        }
    }

    fn menu_next(&mut self) {
        self.app.menu_index = (self.app.menu_index + 1) % MENU_OPTIONS.len();
    }

    fn menu_previous(&mut self) {
        if self.app.menu_index == 0 {
            self.app.menu_index = MENU_OPTIONS.len() - 1;
        } else {
            self.app.menu_index -= 1;
        }
    }

    fn activate_menu_option(&mut self) {
        match self.app.menu_index {
            0 => GeneratorManager::show_generator(self.app),
            1 => QuestionsManager::show_questions(self.app),
            2 => ConfigManager::new(self.app).show_config(),
            3 => TestPaperManager::show_test_paper(self.app),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        app::{AppView, tests::test_app},
        worker::WorkerJob,
    };

    fn press(app: &mut App, ch: char) {
        MenuManager::new(app).handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
    }

    #[test]
    fn number_keys_open_views() {
        let mut app = test_app();
        app.view = AppView::Menu;
        press(&mut app, '3');
        assert_eq!(app.view, AppView::Config);
        assert_eq!(app.menu_index, 2);

        app.view = AppView::Menu;
        press(&mut app, '1');
        assert_eq!(app.view, AppView::Generator);
        assert!(
            !app.worker.take_held().is_empty(),
            "opening an empty generator loads subjects"
        );
    }

    #[test]
    fn four_opens_the_test_paper_and_loads_its_catalog() {
        let mut app = test_app();
        app.view = AppView::Menu;
        press(&mut app, '4');
        assert_eq!(app.view, AppView::TestPaper);
        assert_eq!(app.menu_index, 3);
        assert!(matches!(
            app.worker.take_held().as_slice(),
            [WorkerJob::TestCatalog(_)]
        ));
    }

    #[test]
    fn selection_wraps() {
        let mut app = test_app();
        let mut manager = MenuManager::new(&mut app);
        manager.menu_previous();
        assert_eq!(manager.app.menu_index, MENU_OPTIONS.len() - 1);
        manager.menu_next();
        assert_eq!(manager.app.menu_index, 0);
    }
}

use crate::{
    app::{App, AppView},
    test_paper::TestPaperController,
    worker::WorkerJob,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, warn};

const SCROLL_STEP: u16 = 5;

/// Rows of the test paper form. Strand rows carry the catalog index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PaperRow {
    Subject,
    Grade,
    Strand(usize),
    Generate,
}

pub(crate) fn paper_rows(controller: &TestPaperController) -> Vec<PaperRow> {
    let mut rows = vec![PaperRow::Subject, PaperRow::Grade];
    rows.extend(controller.visible_strands().into_iter().map(PaperRow::Strand));
    rows.push(PaperRow::Generate);
    rows
}

pub(crate) struct TestPaperManager<'a> {
    app: &'a mut App,
}

impl<'a> TestPaperManager<'a> {
    pub(crate) fn new(app: &'a mut App) -> Self {
        Self { app }
    }

    pub(crate) fn show_test_paper(app: &'a mut App) {
        app.view = AppView::TestPaper;
        if !app.test_paper.has_catalog() && !app.test_paper.is_loading() {
            Self::new(app).load_catalog();
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        let rows = paper_rows(&self.app.test_paper);
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Down | KeyCode::Tab) => {
                self.app.test_paper_focus = (self.focus_index(&rows) + 1) % rows.len();
            }
            (KeyModifiers::NONE, KeyCode::Up) | (KeyModifiers::SHIFT, KeyCode::BackTab) => {
                let index = self.focus_index(&rows);
                self.app.test_paper_focus = if index == 0 { rows.len() - 1 } else { index - 1 };
            }
            (KeyModifiers::NONE, KeyCode::Right) => self.change_focused(&rows, 1),
            (KeyModifiers::NONE, KeyCode::Left) => self.change_focused(&rows, -1),
            (KeyModifiers::NONE, KeyCode::Enter) => {
                if rows.get(self.focus_index(&rows)) == Some(&PaperRow::Generate) {
                    self.generate();
                } else {
                    self.app.test_paper_focus = (self.focus_index(&rows) + 1) % rows.len();
                }
            }
            (KeyModifiers::NONE, KeyCode::Char('g')) => self.generate(),
            (KeyModifiers::NONE, KeyCode::Char('a')) => {
                self.app.test_paper_answers = !self.app.test_paper_answers;
            }
            (KeyModifiers::NONE, KeyCode::PageDown) => {
                self.app.test_paper_scroll = self.app.test_paper_scroll.saturating_add(SCROLL_STEP);
            }
            (KeyModifiers::NONE, KeyCode::PageUp) => {
                self.app.test_paper_scroll = self.app.test_paper_scroll.saturating_sub(SCROLL_STEP);
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => {
                debug!("App: reloading test paper catalog");
                self.load_catalog();
            }
            (KeyModifiers::NONE, KeyCode::Char('m')) => self.app.return_to_menu(),
            _ => {}
        }
    }

    fn focus_index(&self, rows: &[PaperRow]) -> usize {
        self.app.test_paper_focus.min(rows.len() - 1)
    }

    fn change_focused(&mut self, rows: &[PaperRow], delta: i64) {
        let focus = self.focus_index(rows);
        let paper = &mut self.app.test_paper;
        match rows.get(focus) {
            Some(PaperRow::Subject) => paper.cycle_subject(delta),
            Some(PaperRow::Grade) => paper.cycle_grade(delta),
            Some(PaperRow::Strand(index)) => paper.adjust_count(*index, delta),
            Some(PaperRow::Generate) | None => {}
        }
        let row_count = paper_rows(&self.app.test_paper).len();
        self.app.test_paper_focus = self.app.test_paper_focus.min(row_count - 1);
    }

    fn load_catalog(&mut self) {
        let generation = self.app.test_paper.begin_load();
        self.app.test_paper_focus = 0;
        self.app.worker.submit(WorkerJob::TestCatalog(generation));
    }

    fn generate(&mut self) {
        if self.app.test_paper.is_generating() {
            debug!("App: test paper request ignored while one is in flight");
            return;
        }
        match self.app.test_paper.request() {
            Ok(request) => {
                self.app.loading_frame = 0;
                self.app.test_paper_answers = false;
                self.app.worker.submit(WorkerJob::GenerateTest(request));
            }
            Err(err) => {
                warn!("App: test paper refused: {err}");
                self.app.alert = Some(err.to_string());
            }
        }
    }
}

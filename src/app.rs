use crate::{
    api::CurriculumClient,
    config::{self, AppConfig, ConfigForm},
    question_board::QuestionBoard,
    questions::QuestionType,
    selection::{FetchTicket, SelectionController},
    test_paper::TestPaperController,
    ui_renderer::UiRenderer,
    view_managers::{
        ConfigManager, GeneratorManager, MenuManager, QuestionsManager, TestPaperManager,
        generator_manager::FormRow,
    },
    worker::{WorkerHandle, WorkerJob, WorkerMessage},
};
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{DefaultTerminal, Frame};
use std::time::Duration;
use tracing::{debug, info, warn};

pub(crate) const LOADING_FRAMES: [&str; 4] = ["-", "\\", "|", "/"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AppView {
    Menu,
    Generator,
    Questions,
    Config,
    TestPaper,
}

/// The main application which holds the state and logic of the application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    pub(crate) running: bool,
    /// Current view being displayed.
    pub(crate) view: AppView,
    /// Currently selected index in the main menu.
    pub(crate) menu_index: usize,
    /// Cascading selectors and the Generate gate.
    pub(crate) controller: SelectionController,
    /// Row of the generator form that has keyboard focus.
    pub(crate) focus: FormRow,
    /// Raw text of the question count input.
    pub(crate) num_questions_input: String,
    pub(crate) question_type: QuestionType,
    /// Render target for generated questions.
    pub(crate) board: QuestionBoard,
    /// Backend URL the worker talks to.
    pub(crate) api_base: String,
    /// Result of the startup health check.
    pub(crate) backend_status: Option<String>,
    /// Errors outside the selection flow (configuration, persistence).
    pub(crate) error: Option<String>,
    /// Blocking message; the next key press dismisses it.
    pub(crate) alert: Option<String>,
    /// Subject, grade and per-strand counts for a full test paper.
    pub(crate) test_paper: TestPaperController,
    /// Row of the test paper form that has keyboard focus.
    pub(crate) test_paper_focus: usize,
    pub(crate) test_paper_answers: bool,
    /// First visible line of the generated paper.
    pub(crate) test_paper_scroll: u16,
    /// Spinner frame index for the active loading indicator.
    pub(crate) loading_frame: usize,
    /// Holds the editable configuration state when rendering the config view.
    pub(crate) config_form: ConfigForm,
    pub(crate) worker: WorkerHandle,
}

impl App {
    /// Construct a new instance of [`App`] from the loaded configuration.
    /// A failed load is shown in the error panel; defaults are used instead.
    pub fn new(config_load: Result<()>) -> Self {
        let config = config::current();
        let worker = WorkerHandle::new(CurriculumClient::from_config(&config));
        let mut app = Self::with_worker(config, worker);
        if let Err(err) = config_load {
            warn!("App: configuration load failed: {err:#}");
            Self::push_error(&mut app.error, format!("Configuration load failed: {}", err));
        }
        app
    }

    pub(crate) fn with_worker(config: AppConfig, worker: WorkerHandle) -> Self {
        Self {
            running: false,
            view: AppView::Generator,
            menu_index: 0,
            controller: SelectionController::new(),
            focus: FormRow::Filter(crate::curriculum::FilterLevel::Subject),
            num_questions_input: config.default_num_questions.to_string(),
            question_type: config.default_question_type,
            board: QuestionBoard::default(),
            api_base: config.api_base_url.clone(),
            backend_status: None,
            error: None,
            alert: None,
            test_paper: TestPaperController::new(),
            test_paper_focus: 0,
            test_paper_answers: false,
            test_paper_scroll: 0,
            loading_frame: 0,
            config_form: ConfigForm::from_config(config),
            worker,
        }
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> Result<()> {
        self.running = true;
        info!("App: starting against {}", self.api_base);
        self.start_session();
        let tick_rate = Duration::from_millis(120);
        while self.running {
            self.poll_worker_messages();
            terminal.draw(|frame| self.render(frame))?;
            self.handle_crossterm_events(tick_rate)?;
        }
        Ok(())
    }

    /// Check the backend and refill the Subject selector, dropping any
    /// selection made against the previous lists.
    pub(crate) fn start_session(&mut self) {
        self.backend_status = None;
        self.worker.submit(WorkerJob::Health);
        let _ = self.controller.on_subject_change(None);
        let ticket = self.controller.load_subjects();
        self.dispatch(ticket);
    }

    pub(crate) fn dispatch(&mut self, ticket: FetchTicket) {
        debug!("App: dispatching {:?}", ticket.target);
        self.worker.submit(WorkerJob::Fetch(ticket));
    }

    /// Click Generate. A refused click raises the blocking alert.
    pub(crate) fn start_generate(&mut self) {
        match self.controller.on_generate_click(
            &self.num_questions_input,
            self.question_type.as_wire_name(),
            &mut self.board,
        ) {
            Ok(request) => {
                self.loading_frame = 0;
                self.worker.submit(WorkerJob::Generate(request));
            }
            Err(err) => {
                warn!("App: generate refused: {err}");
                self.alert = Some(err.to_string());
            }
        }
    }

    /// Dispatch rendering based on the active view.
    fn render(&self, frame: &mut Frame) {
        UiRenderer::new(self).render(frame);
    }

    /// Reads the crossterm events and updates the state of [`App`].
    fn handle_crossterm_events(&mut self, tick_rate: Duration) -> Result<()> {
        if event::poll(tick_rate)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Mouse(_) => {}
                Event::Resize(_, _) => {}
                _ => {}
            }
            self.poll_worker_messages();
        } else {
            self.on_tick();
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        if self.controller.is_generating() || self.test_paper.is_generating() {
            self.loading_frame = (self.loading_frame + 1) % LOADING_FRAMES.len();
        }
        self.poll_worker_messages();
    }

    pub(crate) fn poll_worker_messages(&mut self) {
        while let Some(message) = self.worker.try_recv() {
            self.handle_worker_message(message);
        }
    }

    pub(crate) fn handle_worker_message(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::Health(result) => {
                self.backend_status = Some(match result {
                    Ok(status) => status,
                    Err(err) => {
                        warn!("App: backend health check failed: {err}");
                        "unreachable".to_string()
                    }
                });
            }
            WorkerMessage::Options(ticket, result) => {
                self.controller.apply_options(&ticket, result);
            }
            WorkerMessage::Outcomes(ticket, result) => {
                self.controller.apply_learning_outcomes(&ticket, result);
            }
            WorkerMessage::Generated(result) => {
                let succeeded = result.is_ok();
                self.controller.finish_generate(result, &mut self.board);
                if succeeded && self.view == AppView::Generator {
                    self.view = AppView::Questions;
                    debug!("App: switched to questions view");
                }
            }
            WorkerMessage::TestCatalog(generation, result) => {
                self.test_paper.apply_catalog(generation, result);
            }
            WorkerMessage::TestGenerated(result) => {
                if result.is_ok() {
                    self.test_paper_scroll = 0;
                }
                self.test_paper.finish(result);
            }
        }
    }

    /// Handles the key events and updates the state of [`App`].
    pub(crate) fn on_key_event(&mut self, key: KeyEvent) {
        if self.alert.take().is_some() {
            debug!("App: alert dismissed");
            return;
        }
        if self.view == AppView::Config && self.config_form.is_editing_api_base() {
            ConfigManager::new(self).handle_key(key);
            return;
        }
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            _ => match self.view {
                AppView::Menu => MenuManager::new(self).handle_key(key),
                AppView::Generator => GeneratorManager::new(self).handle_key(key),
                AppView::Questions => QuestionsManager::new(self).handle_key(key),
                AppView::Config => ConfigManager::new(self).handle_key(key),
                AppView::TestPaper => TestPaperManager::new(self).handle_key(key),
            },
        }
    }

    pub(crate) fn return_to_menu(&mut self) {
        if matches!(self.view, AppView::Config) {
            self.config_form = ConfigForm::from_config(config::current());
        }
        self.view = AppView::Menu;
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }

    /// Append a message to an optional error slot.
    pub(crate) fn push_error(slot: &mut Option<String>, message: String) {
        if let Some(existing) = slot {
            existing.push_str(" | ");
            existing.push_str(&message);
        } else {
            *slot = Some(message);
        }
    }
}

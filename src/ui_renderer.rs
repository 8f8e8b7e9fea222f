use crate::view_managers::{
    generator_manager::FormRow,
    menu_manager::MENU_OPTIONS,
    test_paper_manager::{PaperRow, paper_rows},
};
use crate::{
    app::{App, AppView, LOADING_FRAMES},
    config,
    curriculum::FilterOption,
    questions::QuestionView,
    test_paper::{MAX_TOPIC_QUESTIONS, TestPaper},
};
use ratatui::{
    Frame,
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Clear, List, ListItem, ListState, Paragraph, Wrap},
};

pub(crate) struct UiRenderer<'a> {
    app: &'a App,
}

impl<'a> UiRenderer<'a> {
    pub(crate) fn new(app: &'a App) -> Self {
        Self { app }
    }

    pub(crate) fn render(&self, frame: &mut Frame) {
        match self.app.view {
            AppView::Menu => self.render_menu(frame),
            AppView::Generator => self.render_generator(frame),
            AppView::Questions => self.render_questions(frame),
            AppView::Config => self.render_config(frame),
            AppView::TestPaper => self.render_test_paper(frame),
        }
        if let Some(alert) = &self.app.alert {
            Self::render_alert(frame, alert);
        }
    }

    fn screen_layout(frame: &Frame, status_height: u16) -> std::rc::Rc<[Rect]> {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(status_height),
            ])
            .split(frame.area())
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let header_title = Line::from("Curriculum Exam Generator").bold().blue().centered();
        frame.render_widget(
            Paragraph::new(self.header_text())
                .block(Block::bordered().title(header_title))
                .centered(),
            area,
        );
    }

    fn render_menu(&self, frame: &mut Frame) {
        let app = self.app;
        let layout = Self::screen_layout(frame, 5);
        self.render_header(frame, layout[0]);

        let items: Vec<ListItem> = MENU_OPTIONS.iter().map(|label| ListItem::new(*label)).collect();
        let mut state = ListState::default();
        state.select(Some(app.menu_index));
        frame.render_stateful_widget(
            List::new(items)
                .block(Block::bordered().title(Line::from("Actions")))
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            layout[1],
            &mut state,
        );

        let mut status_lines = Vec::new();
        if let Some(error) = &app.error {
            status_lines.push(format!("Error: {}", error));
        }
        status_lines.push("Use ↑/↓ or j/k to choose. Press Enter to select.".to_string());
        status_lines
            .push("Press 1-4 for quick selection. Esc, Ctrl-C, or q to quit.".to_string());
        frame.render_widget(
            Paragraph::new(status_lines.join("\n"))
                .block(Block::bordered().title(Line::from("Status"))),
            layout[2],
        );
    }

    fn render_generator(&self, frame: &mut Frame) {
        let app = self.app;
        let layout = Self::screen_layout(frame, 6);
        self.render_header(frame, layout[0]);

        let body = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(9), Constraint::Min(3)])
            .split(layout[1]);

        let items: Vec<ListItem> = FormRow::ALL
            .iter()
            .map(|row| self.form_row_item(*row))
            .collect();
        let mut state = ListState::default();
        state.select(FormRow::ALL.iter().position(|row| *row == app.focus));
        frame.render_stateful_widget(
            List::new(items)
                .block(Block::bordered().title(Line::from("Curriculum")))
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            body[0],
            &mut state,
        );

        let outcome_text = if app.controller.is_loading_outcomes() {
            "Loading learning outcomes...".to_string()
        } else if let Some(id) = app.controller.active_outcome_id() {
            format!("Learning outcome #{} ready.", id)
        } else {
            "Select a sub-strand to load its learning outcome.".to_string()
        };
        let (message, style) = match app.controller.error_text() {
            Some(error) => (
                format!("{}\n\n{}", error, outcome_text),
                Style::default().fg(Color::Red),
            ),
            None => (outcome_text, Style::default()),
        };
        frame.render_widget(
            Paragraph::new(message)
                .style(style)
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(Line::from("Messages"))),
            body[1],
        );

        let mut status_lines = Vec::new();
        if let Some(error) = &app.error {
            status_lines.push(format!("Error: {}", error));
        }
        status_lines
            .push("↑/↓ move between fields. ←/→ change the selection or type.".to_string());
        status_lines
            .push("Type digits for the count. Enter on Generate or g generates.".to_string());
        status_lines.push(
            "r reloads subjects, v views questions, m returns to the menu, q quits.".to_string(),
        );
        frame.render_widget(
            Paragraph::new(status_lines.join("\n"))
                .block(Block::bordered().title(Line::from("Status"))),
            layout[2],
        );
    }

    fn form_row_item(&self, row: FormRow) -> ListItem<'static> {
        let controller = &self.app.controller;
        match row {
            FormRow::Filter(level) => {
                let field = controller.field(level);
                let value = if field.is_loading() {
                    "loading...".to_string()
                } else if !field.is_enabled() {
                    "(disabled)".to_string()
                } else {
                    match (field.selected_index(), field.selected_option()) {
                        (Some(index), Some(option)) => {
                            format!("{} ({}/{})", option.name, index + 1, field.options().len())
                        }
                        _ => format!("Select {}", level.label()),
                    }
                };
                let item = ListItem::new(format!("{:<11} ‹ {} ›", level.label(), value));
                if field.is_enabled() {
                    item
                } else {
                    item.style(Style::default().add_modifier(Modifier::DIM))
                }
            }
            FormRow::NumQuestions => {
                ListItem::new(format!("{:<11} {}_", "Questions", self.app.num_questions_input))
            }
            FormRow::QuestionType => ListItem::new(format!(
                "{:<11} ‹ {} ›",
                "Type",
                self.app.question_type.label()
            )),
            FormRow::Generate => {
                if controller.is_generating() {
                    ListItem::new(format!(
                        "[ Generating {} ]",
                        LOADING_FRAMES[self.app.loading_frame % LOADING_FRAMES.len()]
                    ))
                    .style(Style::default().fg(Color::Yellow))
                } else if controller.generate_enabled() {
                    ListItem::new("[ Generate ]")
                        .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
                } else {
                    ListItem::new("[ Generate ]")
                        .style(Style::default().add_modifier(Modifier::DIM))
                }
            }
        }
    }

    fn render_questions(&self, frame: &mut Frame) {
        let app = self.app;
        let board = &app.board;
        let layout = Self::screen_layout(frame, 5);
        self.render_header(frame, layout[0]);

        let question_text = match board.current() {
            None => "No questions to show. Generate some from the generator view.".to_string(),
            Some(question) => {
                let mut sections = vec![format!(
                    "Question {}/{}{}",
                    board.index + 1,
                    board.len(),
                    board
                        .generated_at()
                        .map(|at| format!("  (generated {})", at))
                        .unwrap_or_default()
                )];
                let mut meta = Vec::new();
                if let Some(kind) = &question.kind {
                    meta.push(format!("Type: {}", kind));
                }
                if let Some(level) = &question.taxonomy_level {
                    meta.push(format!("Level: {}", level));
                }
                if !meta.is_empty() {
                    sections.push(meta.join("  •  "));
                }
                sections.push(question.question.clone().unwrap_or_default());
                let options = question.option_texts();
                if !options.is_empty() {
                    sections.push(
                        options
                            .iter()
                            .enumerate()
                            .map(|(index, option)| {
                                format!("{}. {}", (b'A' + (index % 26) as u8) as char, option)
                            })
                            .collect::<Vec<_>>()
                            .join("\n"),
                    );
                }
                sections.push(if board.answer_revealed {
                    format!(
                        "Answer: {}",
                        question
                            .answer_text()
                            .unwrap_or_else(|| "<not provided>".to_string())
                    )
                } else {
                    "Answer: press a to reveal".to_string()
                });
                sections.join("\n\n")
            }
        };

        frame.render_widget(
            Paragraph::new(question_text)
                .wrap(Wrap { trim: false })
                .block(Block::bordered().title(Line::from("Generated Questions"))),
            layout[1],
        );

        let mut status_lines = Vec::new();
        if let Some(error) = &app.error {
            status_lines.push(format!("Error: {}", error));
        }
        status_lines.push(
            "←/→ or n/p move between questions. a or Enter toggles the answer.".to_string(),
        );
        status_lines.push("g returns to the generator, m to the menu, q quits.".to_string());
        frame.render_widget(
            Paragraph::new(status_lines.join("\n"))
                .block(Block::bordered().title(Line::from("Status"))),
            layout[2],
        );
    }

    fn render_config(&self, frame: &mut Frame) {
        let app = self.app;
        let form = &app.config_form;
        let layout = Self::screen_layout(frame, 7);

        let header_text = format!(
            "Config file: {}\nDefaults applied to the generator form.",
            config::config_file_path().display()
        );
        frame.render_widget(
            Paragraph::new(header_text)
                .block(
                    Block::bordered()
                        .title(Line::from("Configuration").bold().blue().centered()),
                )
                .centered(),
            layout[0],
        );

        let items = vec![
            ListItem::new(format!("Default question count: {}", form.num_questions)),
            ListItem::new(format!("Default question type: {}", form.question_type.label())),
            ListItem::new(if form.request_timeout_secs == 0 {
                "Request timeout: none".to_string()
            } else {
                format!("Request timeout: {}s", form.request_timeout_secs)
            }),
            ListItem::new(if form.is_editing_api_base() {
                format!("Backend URL (editing): {}_", form.api_base_buffer())
            } else {
                format!("Backend URL: {}", form.api_base_url)
            }),
        ];
        let mut list_state = ListState::default();
        list_state.select(Some(form.selected_index()));
        frame.render_stateful_widget(
            List::new(items)
                .block(Block::bordered().title(Line::from("Defaults")))
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            layout[1],
            &mut list_state,
        );

        let mut status_lines = Vec::new();
        if let Some(error) = &app.error {
            status_lines.push(format!("Error: {}", error));
        }
        status_lines
            .push("↑/↓ or j/k choose field. ←/→ or h/l adjust the value.".to_string());
        status_lines.push(
            "Select \"Backend URL\" and press Enter to edit. Enter applies, Esc cancels."
                .to_string(),
        );
        status_lines.push("Press s to save, r to reset, m to return to the menu.".to_string());
        if form.dirty {
            status_lines.push("Unsaved changes".to_string());
        }
        if let Some(config_status) = &form.status {
            status_lines.push(config_status.clone());
        }
        frame.render_widget(
            Paragraph::new(status_lines.join("\n"))
                .block(Block::bordered().title(Line::from("Status"))),
            layout[2],
        );
    }

    fn render_test_paper(&self, frame: &mut Frame) {
        let app = self.app;
        let paper = &app.test_paper;
        let layout = Self::screen_layout(frame, 5);
        self.render_header(frame, layout[0]);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(layout[1]);

        let rows = paper_rows(paper);
        let items: Vec<ListItem> = rows.iter().map(|row| self.paper_row_item(*row)).collect();
        let mut state = ListState::default();
        state.select(Some(app.test_paper_focus.min(rows.len() - 1)));
        frame.render_stateful_widget(
            List::new(items)
                .block(Block::bordered().title(Line::from("Test paper")))
                .highlight_symbol("▶ ")
                .highlight_style(Style::default().add_modifier(Modifier::REVERSED)),
            body[0],
            &mut state,
        );

        let (text, style) = if let Some(error) = paper.error() {
            (error.to_string(), Style::default().fg(Color::Red))
        } else if paper.is_loading() {
            ("Loading subjects, grades and strands...".to_string(), Style::default())
        } else if paper.is_generating() {
            (
                format!(
                    "Generating test paper {}",
                    LOADING_FRAMES[app.loading_frame % LOADING_FRAMES.len()]
                ),
                Style::default().fg(Color::Yellow),
            )
        } else if let Some(generated) = paper.paper() {
            (paper_text(generated, app.test_paper_answers), Style::default())
        } else {
            (
                "Pick a subject and grade, then give strands a question count.".to_string(),
                Style::default(),
            )
        };
        frame.render_widget(
            Paragraph::new(text)
                .style(style)
                .wrap(Wrap { trim: false })
                .scroll((app.test_paper_scroll, 0))
                .block(Block::bordered().title(Line::from("Paper"))),
            body[1],
        );

        let mut status_lines = Vec::new();
        if let Some(error) = &app.error {
            status_lines.push(format!("Error: {}", error));
        }
        status_lines
            .push("↑/↓ move, ←/→ change subject, grade or a strand's count.".to_string());
        status_lines.push(
            "g generates, a toggles answers, PgUp/PgDn scroll, r reloads, m menu.".to_string(),
        );
        frame.render_widget(
            Paragraph::new(status_lines.join("\n"))
                .block(Block::bordered().title(Line::from("Status"))),
            layout[2],
        );
    }

    fn paper_row_item(&self, row: PaperRow) -> ListItem<'static> {
        let paper = &self.app.test_paper;
        let choice = |label: &str, selected: Option<&FilterOption>, total: usize| {
            let value = if paper.is_loading() {
                "loading...".to_string()
            } else if total == 0 {
                "(none)".to_string()
            } else {
                selected.map_or_else(|| format!("Select {}", label), |option| option.name.clone())
            };
            ListItem::new(format!("{:<9} ‹ {} ›", label, value))
        };
        match row {
            PaperRow::Subject => {
                choice("Subject", paper.selected_subject(), paper.subjects().len())
            }
            PaperRow::Grade => choice("Grade", paper.selected_grade(), paper.grades().len()),
            PaperRow::Strand(index) => {
                let name = paper.strand(index).map_or("", |strand| strand.name.as_str());
                let count = paper.count(index);
                let item = ListItem::new(format!(
                    "  {:<20} ‹ {:>2}/{} ›",
                    name, count, MAX_TOPIC_QUESTIONS
                ));
                if count == 0 {
                    item.style(Style::default().add_modifier(Modifier::DIM))
                } else {
                    item
                }
            }
            PaperRow::Generate => {
                if paper.is_generating() {
                    ListItem::new("[ Generating... ]").style(Style::default().fg(Color::Yellow))
                } else {
                    ListItem::new("[ Generate test paper ]")
                        .style(Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
                }
            }
        }
    }

    fn render_alert(frame: &mut Frame, message: &str) {
        let [area] = Layout::horizontal([Constraint::Percentage(60)])
            .flex(Flex::Center)
            .areas(frame.area());
        let [area] = Layout::vertical([Constraint::Length(6)])
            .flex(Flex::Center)
            .areas(area);
        frame.render_widget(Clear, area);
        frame.render_widget(
            Paragraph::new(format!("{}\n\nPress any key to continue.", message))
                .wrap(Wrap { trim: true })
                .centered()
                .block(
                    Block::bordered()
                        .title(Line::from("Alert").bold().centered())
                        .border_style(Style::default().fg(Color::Yellow)),
                ),
            area,
        );
    }

    fn header_text(&self) -> String {
        let backend = match self.app.backend_status.as_deref() {
            Some(status) => status,
            None => "checking...",
        };
        format!("Backend: {} ({})", self.app.api_base, backend)
    }
}

/// Plain-text layout of a generated paper, questions numbered across sections.
fn paper_text(paper: &TestPaper, reveal_answers: bool) -> String {
    let mut lines = vec![
        paper
            .test_title
            .clone()
            .unwrap_or_else(|| "Test paper".to_string()),
    ];
    let mut number = 0;
    for (index, section) in paper.sections.iter().enumerate() {
        lines.push(String::new());
        lines.push(match &section.section_title {
            Some(title) => format!("Section {}: {}", index + 1, title),
            None => format!("Section {}", index + 1),
        });
        for view in section.views() {
            number += 1;
            lines.extend(question_lines(number, &view, reveal_answers));
        }
    }
    lines.join("\n")
}

fn question_lines(number: usize, view: &QuestionView, reveal_answer: bool) -> Vec<String> {
    let mut lines = vec![format!(
        "{}. {}",
        number,
        view.question.clone().unwrap_or_default()
    )];
    for (index, option) in view.option_texts().iter().enumerate() {
        lines.push(format!("   {}. {}", (b'A' + (index % 26) as u8) as char, option));
    }
    if reveal_answer {
        lines.push(format!(
            "   Answer: {}",
            view.answer_text()
                .unwrap_or_else(|| "<not provided>".to_string())
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn paper() -> TestPaper {
        serde_json::from_value(json!({
            "test_title": "Grade 4 Mathematics",
            "sections": [
                {"section_title": "Numbers", "questions": [
                    {
                        "type": "multiple_choice",
                        "question": "2+2=?",
                        "options": ["3", "4"],
                        "answer": "4"
                    }
                ]},
                {"questions": [{"question": "Name a shape.", "answer": "Square"}]}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn paper_numbers_questions_across_sections() {
        assert_eq!(
            paper_text(&paper(), false),
            [
                "Grade 4 Mathematics",
                "",
                "Section 1: Numbers",
                "1. 2+2=?",
                "   A. 3",
                "   B. 4",
                "",
                "Section 2",
                "2. Name a shape.",
            ]
            .join("\n")
        );
    }

    #[test]
    fn revealed_paper_lists_answers() {
        let text = paper_text(&paper(), true);
        assert!(text.contains("   B. 4\n   Answer: 4\n"));
        assert!(text.ends_with("2. Name a shape.\n   Answer: Square"));
    }
}

//! Cascading curriculum selection and the Generate gate.
//!
//! [`SelectionController`] owns the four dependent selectors (Subject →
//! Grade → Strand → Sub-Strand), the learning outcome captured for the
//! chosen sub-strand, the error display and the Generate loading state.
//! It performs no IO. Each change handler resets everything downstream of
//! the changed field and hands back a [`FetchTicket`] naming the lookup to
//! run; the caller runs it and feeds the result to [`apply_options`] or
//! [`apply_learning_outcomes`].
//!
//! Every field carries a generation that is bumped whenever the field is
//! reset. A ticket remembers the generation it was issued under, so a
//! response that arrives after its field has been reset again is dropped
//! instead of overwriting newer state.
//!
//! [`apply_options`]: SelectionController::apply_options
//! [`apply_learning_outcomes`]: SelectionController::apply_learning_outcomes

use crate::{
    api::ApiError,
    curriculum::{FilterLevel, FilterOption, LearningOutcome},
    outcome::{FirstOutcome, OutcomeChoice, OutcomeSelector},
    questions::{GenerateRequest, QuestionRenderer, parse_question_count},
};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{debug, warn};

/// Fallback shown when a generate call fails without a server message.
pub const GENERATE_FAILURE_FALLBACK: &str =
    "Failed to generate questions. Please try again later.";

const CLIENT_GUARD_MESSAGE: &str =
    "Please select a sub-strand with a valid learning outcome before generating questions.";

/// Errors surfaced to the user. `Display` is the exact text shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Failed to load data. Please check network connection.")]
    NetworkFailure,
    #[error("Error: Curriculum data is invalid. Please try another selection.")]
    InvalidCurriculumData,
    #[error("No learning outcomes found for this sub-strand. Please select another.")]
    EmptyResult,
    #[error("{0}")]
    GenerateRequestFailure(String),
    #[error("{message}", message = CLIENT_GUARD_MESSAGE)]
    ClientGuardFailure,
}

/// Which collection endpoint a lookup hits, with its scoping ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchTarget {
    Subjects,
    /// Grades are not scoped by subject on the backend.
    Grades,
    Strands {
        subject_id: String,
        grade_id: String,
    },
    SubStrands {
        strand_id: String,
    },
    LearningOutcomes {
        substrand_id: String,
    },
    /// Every strand regardless of subject or grade (`?all=true`).
    AllStrands,
}

impl FetchTarget {
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Subjects => "/api/subjects",
            Self::Grades => "/api/grades",
            Self::Strands { .. } | Self::AllStrands => "/api/strands",
            Self::SubStrands { .. } => "/api/substrands",
            Self::LearningOutcomes { .. } => "/api/learning_outcomes",
        }
    }

    pub fn query(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Subjects | Self::Grades => Vec::new(),
            Self::Strands {
                subject_id,
                grade_id,
            } => vec![
                ("subject_id", subject_id.clone()),
                ("grade_id", grade_id.clone()),
            ],
            Self::SubStrands { strand_id } => vec![("strand_id", strand_id.clone())],
            Self::LearningOutcomes { substrand_id } => {
                vec![("substrand_id", substrand_id.clone())]
            }
            Self::AllStrands => vec![("all", "true".to_string())],
        }
    }

    /// The selector this lookup populates; `None` for lookups outside the cascade.
    pub fn level(&self) -> Option<FilterLevel> {
        match self {
            Self::Subjects => Some(FilterLevel::Subject),
            Self::Grades => Some(FilterLevel::Grade),
            Self::Strands { .. } => Some(FilterLevel::Strand),
            Self::SubStrands { .. } => Some(FilterLevel::SubStrand),
            Self::LearningOutcomes { .. } | Self::AllStrands => None,
        }
    }
}

/// A lookup the controller wants run, stamped with the generation it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub target: FetchTarget,
    pub generation: u64,
}

/// Whether a lookup result was taken or dropped as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    Current,
    Stale,
}

#[derive(Debug, Clone)]
pub struct FilterField {
    level: FilterLevel,
    selected: Option<String>,
    options: Vec<FilterOption>,
    loading: bool,
    generation: u64,
}

impl FilterField {
    fn new(level: FilterLevel) -> Self {
        Self {
            level,
            selected: None,
            options: Vec::new(),
            loading: false,
            generation: 0,
        }
    }

    pub fn level(&self) -> FilterLevel {
        self.level
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn options(&self) -> &[FilterOption] {
        &self.options
    }

    /// Enabled only once a non-empty option list has been populated.
    pub fn is_enabled(&self) -> bool {
        !self.options.is_empty()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Position of the selected value within the options, if it is one of them.
    pub fn selected_index(&self) -> Option<usize> {
        let selected = self.selected.as_deref()?;
        self.options
            .iter()
            .position(|option| option.value().trim() == selected)
    }

    /// Distinct, non-empty option values in list order. An option whose id
    /// is missing, or repeats an earlier id, cannot be told apart once
    /// selected, so it is left out.
    pub fn selectable_values(&self) -> Vec<String> {
        let mut values: Vec<String> = Vec::with_capacity(self.options.len());
        for option in &self.options {
            let value = option.value().trim().to_string();
            if !value.is_empty() && !values.contains(&value) {
                values.push(value);
            }
        }
        values
    }

    pub fn selected_option(&self) -> Option<&FilterOption> {
        self.selected_index().map(|index| &self.options[index])
    }

    fn reset(&mut self) {
        self.selected = None;
        self.options.clear();
        self.loading = false;
        self.generation += 1;
    }

    fn ticket(&mut self, target: FetchTarget) -> FetchTicket {
        self.loading = true;
        FetchTicket {
            target,
            generation: self.generation,
        }
    }
}

#[derive(Debug)]
pub struct SelectionController<S: OutcomeSelector = FirstOutcome> {
    fields: [FilterField; 4],
    active_outcome: Option<Number>,
    outcome_generation: u64,
    outcome_loading: bool,
    generating: bool,
    error: Option<SelectionError>,
    questions: Option<Vec<Value>>,
    selector: S,
}

impl Default for SelectionController<FirstOutcome> {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionController<FirstOutcome> {
    pub fn new() -> Self {
        Self::with_selector(FirstOutcome)
    }
}

impl<S: OutcomeSelector> SelectionController<S> {
    pub fn with_selector(selector: S) -> Self {
        Self {
            fields: FilterLevel::ALL.map(FilterField::new),
            active_outcome: None,
            outcome_generation: 0,
            outcome_loading: false,
            generating: false,
            error: None,
            questions: None,
            selector,
        }
    }

    pub fn field(&self, level: FilterLevel) -> &FilterField {
        &self.fields[level.index()]
    }

    fn field_mut(&mut self, level: FilterLevel) -> &mut FilterField {
        &mut self.fields[level.index()]
    }

    pub fn active_outcome_id(&self) -> Option<&Number> {
        self.active_outcome.as_ref()
    }

    /// Generate is clickable iff an outcome id is held and no generation is running.
    pub fn generate_enabled(&self) -> bool {
        self.active_outcome.is_some() && !self.generating
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn is_loading_outcomes(&self) -> bool {
        self.outcome_loading
    }

    pub fn error(&self) -> Option<&SelectionError> {
        self.error.as_ref()
    }

    pub fn error_text(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }

    /// The last successfully generated question list.
    pub fn questions(&self) -> Option<&[Value]> {
        self.questions.as_deref()
    }

    /// Initial lookup that fills the Subject selector.
    pub fn load_subjects(&mut self) -> FetchTicket {
        let subject = self.field_mut(FilterLevel::Subject);
        subject.reset();
        subject.ticket(FetchTarget::Subjects)
    }

    pub fn on_subject_change(&mut self, subject_id: Option<&str>) -> Option<FetchTicket> {
        let subject_id = self.select(FilterLevel::Subject, subject_id)?;
        debug!("SelectionController: subject {subject_id} selected; loading grades");
        Some(self.field_mut(FilterLevel::Grade).ticket(FetchTarget::Grades))
    }

    pub fn on_grade_change(&mut self, grade_id: Option<&str>) -> Option<FetchTicket> {
        let grade_id = self.select(FilterLevel::Grade, grade_id)?;
        let subject_id = self.field(FilterLevel::Subject).selected.clone()?;
        debug!("SelectionController: loading strands for subject {subject_id}, grade {grade_id}");
        Some(self.field_mut(FilterLevel::Strand).ticket(FetchTarget::Strands {
            subject_id,
            grade_id,
        }))
    }

    pub fn on_strand_change(&mut self, strand_id: Option<&str>) -> Option<FetchTicket> {
        let strand_id = self.select(FilterLevel::Strand, strand_id)?;
        debug!("SelectionController: loading sub-strands for strand {strand_id}");
        Some(
            self.field_mut(FilterLevel::SubStrand)
                .ticket(FetchTarget::SubStrands { strand_id }),
        )
    }

    pub fn on_substrand_change(&mut self, substrand_id: Option<&str>) -> Option<FetchTicket> {
        let substrand_id = self.select(FilterLevel::SubStrand, substrand_id)?;
        debug!("SelectionController: loading learning outcomes for sub-strand {substrand_id}");
        self.outcome_loading = true;
        Some(FetchTicket {
            target: FetchTarget::LearningOutcomes { substrand_id },
            generation: self.outcome_generation,
        })
    }

    /// Record a new value for `level`, reset everything downstream of it and
    /// the captured outcome, and clear the error. Returns the value when a
    /// follow-up lookup is due.
    fn select(&mut self, level: FilterLevel, value: Option<&str>) -> Option<String> {
        let value = value
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        self.field_mut(level).selected = value.clone();
        for downstream in level.downstream() {
            self.field_mut(*downstream).reset();
        }
        self.clear_outcome();
        self.error = None;
        value
    }

    fn clear_outcome(&mut self) {
        self.active_outcome = None;
        self.outcome_loading = false;
        self.outcome_generation += 1;
    }

    /// Take the result of a selector lookup.
    pub fn apply_options(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<FilterOption>, ApiError>,
    ) -> Applied {
        let Some(level) = ticket.target.level() else {
            warn!("SelectionController: option result for {:?} ignored", ticket.target);
            return Applied::Stale;
        };
        let field = self.field_mut(level);
        if field.generation != ticket.generation {
            debug!(
                "SelectionController: dropping stale {} options (generation {} != {})",
                level.label(),
                ticket.generation,
                field.generation
            );
            return Applied::Stale;
        }
        field.loading = false;
        match result {
            Ok(options) => {
                debug!(
                    "SelectionController: {} populated with {} option(s)",
                    level.label(),
                    options.len()
                );
                field.options = options;
            }
            Err(err) => {
                warn!("SelectionController: failed to load {} options: {err}", level.label());
                field.options.clear();
                self.error = Some(SelectionError::NetworkFailure);
            }
        }
        Applied::Current
    }

    /// Take the result of a learning outcome lookup and settle the Generate gate.
    pub fn apply_learning_outcomes(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<LearningOutcome>, ApiError>,
    ) -> Applied {
        if ticket.generation != self.outcome_generation {
            debug!(
                "SelectionController: dropping stale learning outcomes (generation {} != {})",
                ticket.generation, self.outcome_generation
            );
            return Applied::Stale;
        }
        self.outcome_loading = false;
        let outcomes = match result {
            Ok(outcomes) => outcomes,
            Err(err) => {
                warn!("SelectionController: failed to load learning outcomes: {err}");
                self.error = Some(SelectionError::NetworkFailure);
                return Applied::Current;
            }
        };
        match self.selector.choose(&outcomes) {
            OutcomeChoice::Selected(id) => {
                debug!("SelectionController: learning outcome {id} captured");
                self.active_outcome = Some(id);
            }
            OutcomeChoice::InvalidId => {
                warn!("SelectionController: learning outcome id is not numeric");
                self.error = Some(SelectionError::InvalidCurriculumData);
            }
            OutcomeChoice::Empty => {
                debug!("SelectionController: sub-strand has no learning outcomes");
                self.error = Some(SelectionError::EmptyResult);
            }
        }
        Applied::Current
    }

    /// Start a generation. Fails with [`SelectionError::ClientGuardFailure`]
    /// and changes nothing when no outcome id is held.
    pub fn on_generate_click(
        &mut self,
        num_questions_input: &str,
        question_type: &str,
        renderer: &mut dyn QuestionRenderer,
    ) -> Result<GenerateRequest, SelectionError> {
        let Some(learning_outcome_id) = self.active_outcome.clone() else {
            warn!("SelectionController: generate requested without a learning outcome");
            return Err(SelectionError::ClientGuardFailure);
        };
        self.generating = true;
        self.error = None;
        renderer.clear();
        let request = GenerateRequest {
            learning_outcome_id,
            num_questions: parse_question_count(num_questions_input),
            question_type: question_type.to_string(),
        };
        debug!("SelectionController: generate request {request:?}");
        Ok(request)
    }

    /// Settle a generation started by [`on_generate_click`](Self::on_generate_click).
    pub fn finish_generate(
        &mut self,
        result: Result<Vec<Value>, ApiError>,
        renderer: &mut dyn QuestionRenderer,
    ) {
        self.generating = false;
        match result {
            Ok(questions) => {
                debug!("SelectionController: received {} question(s)", questions.len());
                renderer.render_questions(&questions);
                self.questions = Some(questions);
            }
            Err(err) => {
                warn!("SelectionController: question generation failed: {err}");
                let message = err
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| GENERATE_FAILURE_FALLBACK.to_string());
                self.error = Some(SelectionError::GenerateRequestFailure(message));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    #[derive(Default)]
    struct RecordingRenderer {
        rendered: Vec<Vec<Value>>,
        clears: usize,
    }

    impl QuestionRenderer for RecordingRenderer {
        fn render_questions(&mut self, questions: &[Value]) {
            self.rendered.push(questions.to_vec());
        }

        fn clear(&mut self) {
            self.clears += 1;
        }
    }

    fn options(names: &[(i64, &str)]) -> Vec<FilterOption> {
        names
            .iter()
            .map(|(id, name)| FilterOption::new(*id, *name))
            .collect()
    }

    fn status_error(body_message: Option<&str>) -> ApiError {
        ApiError::Status {
            url: "http://localhost:5000/api".to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            server_message: body_message.map(str::to_string),
        }
    }

    fn enabled_levels(controller: &SelectionController) -> Vec<FilterLevel> {
        FilterLevel::ALL
            .into_iter()
            .filter(|level| controller.field(*level).is_enabled())
            .collect()
    }

    /// Walk Math / 4 / Numbers / Addition and capture outcome 7.
    fn fully_selected() -> SelectionController {
        let mut controller = SelectionController::new();
        let ticket = controller.load_subjects();
        controller.apply_options(&ticket, Ok(options(&[(1, "Math"), (2, "English")])));

        let ticket = controller.on_subject_change(Some("1")).unwrap();
        controller.apply_options(&ticket, Ok(options(&[(4, "4"), (5, "5")])));

        let ticket = controller.on_grade_change(Some("4")).unwrap();
        controller.apply_options(&ticket, Ok(options(&[(10, "Numbers")])));

        let ticket = controller.on_strand_change(Some("10")).unwrap();
        controller.apply_options(&ticket, Ok(options(&[(20, "Addition")])));

        let ticket = controller.on_substrand_change(Some("20")).unwrap();
        controller.apply_learning_outcomes(
            &ticket,
            Ok(vec![LearningOutcome {
                id: json!(7),
                description: None,
                name: Some("Add2digit".to_string()),
            }]),
        );
        controller
    }

    #[test]
    fn guard_failure_text_is_the_full_sentence() {
        let text = SelectionError::ClientGuardFailure.to_string();
        assert!(text.starts_with("Please select a sub-strand with a valid learning outcome"));
        assert!(text.ends_with("before generating questions."));
    }

    #[test]
    fn tickets_carry_the_selected_ancestor_ids() {
        let mut controller = SelectionController::new();
        assert_eq!(
            controller.on_subject_change(Some("1")).unwrap().target,
            FetchTarget::Grades
        );
        assert_eq!(
            controller.on_grade_change(Some("4")).unwrap().target,
            FetchTarget::Strands {
                subject_id: "1".to_string(),
                grade_id: "4".to_string()
            }
        );
        assert_eq!(
            controller.on_strand_change(Some("10")).unwrap().target,
            FetchTarget::SubStrands {
                strand_id: "10".to_string()
            }
        );
        assert_eq!(
            controller.on_substrand_change(Some("20")).unwrap().target,
            FetchTarget::LearningOutcomes {
                substrand_id: "20".to_string()
            }
        );
    }

    #[test]
    fn empty_values_issue_no_lookup() {
        let mut controller = SelectionController::new();
        assert!(controller.on_subject_change(None).is_none());
        assert!(controller.on_subject_change(Some("")).is_none());
        assert!(controller.on_strand_change(Some("  ")).is_none());
        assert!(controller.on_substrand_change(None).is_none());
    }

    #[test]
    fn grade_change_without_subject_issues_no_lookup() {
        let mut controller = SelectionController::new();
        assert!(controller.on_grade_change(Some("4")).is_none());
        assert_eq!(controller.field(FilterLevel::Grade).selected(), Some("4"));
    }

    #[test]
    fn enabled_fields_follow_dependency_order() {
        let mut controller = SelectionController::new();
        assert!(enabled_levels(&controller).is_empty());

        let ticket = controller.load_subjects();
        controller.apply_options(&ticket, Ok(options(&[(1, "Math")])));
        assert_eq!(enabled_levels(&controller), vec![FilterLevel::Subject]);

        let ticket = controller.on_subject_change(Some("1")).unwrap();
        controller.apply_options(&ticket, Ok(options(&[(4, "4")])));
        assert_eq!(
            enabled_levels(&controller),
            vec![FilterLevel::Subject, FilterLevel::Grade]
        );

        let ticket = controller.on_grade_change(Some("4")).unwrap();
        controller.apply_options(&ticket, Ok(Vec::new()));
        assert_eq!(
            enabled_levels(&controller),
            vec![FilterLevel::Subject, FilterLevel::Grade]
        );
        assert!(controller.error().is_none(), "an empty list is not an error");
    }

    #[test]
    fn valid_outcome_enables_generate() {
        let controller = fully_selected();
        assert_eq!(controller.active_outcome_id(), Some(&Number::from(7)));
        assert!(controller.generate_enabled());
        assert!(controller.error().is_none());
        assert_eq!(enabled_levels(&controller), FilterLevel::ALL.to_vec());
    }

    #[test]
    fn changing_grade_disables_generate_and_clears_downstream() {
        let mut controller = fully_selected();

        let ticket = controller.on_grade_change(Some("5")).unwrap();

        assert!(!controller.generate_enabled());
        assert!(controller.active_outcome_id().is_none());
        let strand = controller.field(FilterLevel::Strand);
        assert!(strand.options().is_empty());
        assert!(strand.selected().is_none());
        assert!(!strand.is_enabled());
        assert!(strand.is_loading());
        let substrand = controller.field(FilterLevel::SubStrand);
        assert!(substrand.options().is_empty());
        assert!(substrand.selected().is_none());
        // Fields above the change keep their state.
        assert_eq!(controller.field(FilterLevel::Subject).selected(), Some("1"));
        assert_eq!(controller.field(FilterLevel::Grade).selected(), Some("5"));
        assert_eq!(controller.field(FilterLevel::Grade).options().len(), 2);
        assert_eq!(
            ticket.target,
            FetchTarget::Strands {
                subject_id: "1".to_string(),
                grade_id: "5".to_string()
            }
        );
    }

    #[test]
    fn every_ancestor_change_disables_generate() {
        for level in FilterLevel::ALL {
            let mut controller = fully_selected();
            match level {
                FilterLevel::Subject => controller.on_subject_change(Some("2")),
                FilterLevel::Grade => controller.on_grade_change(Some("5")),
                FilterLevel::Strand => controller.on_strand_change(None),
                FilterLevel::SubStrand => controller.on_substrand_change(None),
            };
            assert!(!controller.generate_enabled(), "{} change", level.label());
            assert!(controller.active_outcome_id().is_none());
        }
    }

    #[test]
    fn empty_outcome_list_reports_no_outcomes() {
        let mut controller = fully_selected();
        let ticket = controller.on_substrand_change(Some("20")).unwrap();
        controller.apply_learning_outcomes(&ticket, Ok(Vec::new()));

        assert!(!controller.generate_enabled());
        assert_eq!(
            controller.error_text().as_deref(),
            Some("No learning outcomes found for this sub-strand. Please select another.")
        );
    }

    #[test]
    fn non_numeric_outcome_id_reports_invalid_data() {
        let mut controller = fully_selected();
        let ticket = controller.on_substrand_change(Some("20")).unwrap();
        controller.apply_learning_outcomes(
            &ticket,
            Ok(vec![LearningOutcome {
                id: json!("abc"),
                description: None,
                name: Some("X".to_string()),
            }]),
        );

        assert!(!controller.generate_enabled());
        assert_eq!(
            controller.error_text().as_deref(),
            Some("Error: Curriculum data is invalid. Please try another selection.")
        );
    }

    #[test]
    fn failed_lookup_shows_network_error_and_leaves_field_disabled() {
        let mut controller = SelectionController::new();
        let ticket = controller.on_subject_change(Some("1")).unwrap();
        let applied = controller.apply_options(&ticket, Err(status_error(None)));

        assert_eq!(applied, Applied::Current);
        assert!(!controller.field(FilterLevel::Grade).is_enabled());
        assert!(!controller.field(FilterLevel::Grade).is_loading());
        assert_eq!(
            controller.error_text().as_deref(),
            Some("Failed to load data. Please check network connection.")
        );

        // The next change clears the error display.
        controller.on_subject_change(Some("1"));
        assert!(controller.error().is_none());
    }

    #[test]
    fn failed_outcome_lookup_shows_network_error() {
        let mut controller = fully_selected();
        let ticket = controller.on_substrand_change(Some("20")).unwrap();
        controller.apply_learning_outcomes(&ticket, Err(status_error(Some("boom"))));
        assert!(!controller.generate_enabled());
        assert_eq!(controller.error(), Some(&SelectionError::NetworkFailure));
    }

    #[test]
    fn stale_option_results_are_dropped() {
        let mut controller = SelectionController::new();
        let first = controller.on_subject_change(Some("1")).unwrap();
        let second = controller.on_subject_change(Some("2")).unwrap();

        assert_eq!(
            controller.apply_options(&second, Ok(options(&[(5, "5")]))),
            Applied::Current
        );
        assert_eq!(
            controller.apply_options(&first, Ok(options(&[(4, "4"), (6, "6")]))),
            Applied::Stale
        );
        assert_eq!(controller.field(FilterLevel::Grade).options(), &options(&[(5, "5")])[..]);
    }

    #[test]
    fn stale_outcome_results_cannot_enable_generate() {
        let mut controller = fully_selected();
        let ticket = controller.on_substrand_change(Some("20")).unwrap();
        controller.on_grade_change(Some("5"));

        let applied =
            controller.apply_learning_outcomes(&ticket, Ok(vec![LearningOutcome::new(9)]));

        assert_eq!(applied, Applied::Stale);
        assert!(!controller.generate_enabled());
        assert!(controller.active_outcome_id().is_none());
    }

    #[test]
    fn repeating_subject_change_matches_single_change() {
        let mut once = fully_selected();
        let once_ticket = once.on_subject_change(Some("1")).unwrap();

        let mut twice = fully_selected();
        twice.on_subject_change(Some("1"));
        let twice_ticket = twice.on_subject_change(Some("1")).unwrap();

        assert_eq!(once_ticket.target, twice_ticket.target);
        for level in FilterLevel::ALL {
            assert_eq!(once.field(level).selected(), twice.field(level).selected());
            assert_eq!(once.field(level).options(), twice.field(level).options());
            assert_eq!(once.field(level).is_loading(), twice.field(level).is_loading());
        }
        assert_eq!(once.generate_enabled(), twice.generate_enabled());
        assert_eq!(once.error(), twice.error());
    }

    #[test]
    fn generate_without_outcome_is_refused() {
        let mut controller = SelectionController::new();
        let mut renderer = RecordingRenderer::default();

        let result = controller.on_generate_click("5", "multiple_choice", &mut renderer);

        assert_eq!(result, Err(SelectionError::ClientGuardFailure));
        assert!(!controller.is_generating());
        assert_eq!(renderer.clears, 0);
    }

    #[test]
    fn generate_click_builds_request_and_locks_button() {
        let mut controller = fully_selected();
        let mut renderer = RecordingRenderer::default();

        let request = controller
            .on_generate_click("3", "short_answer", &mut renderer)
            .unwrap();

        assert_eq!(
            request,
            GenerateRequest {
                learning_outcome_id: Number::from(7),
                num_questions: Some(3),
                question_type: "short_answer".to_string(),
            }
        );
        assert!(controller.is_generating());
        assert!(!controller.generate_enabled());
        assert_eq!(renderer.clears, 1);
    }

    #[test]
    fn successful_generate_stores_and_renders_once() {
        let mut controller = fully_selected();
        let mut renderer = RecordingRenderer::default();
        controller
            .on_generate_click("1", "multiple_choice", &mut renderer)
            .unwrap();

        let questions = vec![json!({"question": "2+2=?"})];
        controller.finish_generate(Ok(questions.clone()), &mut renderer);

        assert_eq!(controller.questions(), Some(&questions[..]));
        assert_eq!(renderer.rendered, vec![questions]);
        assert!(controller.generate_enabled());
        assert!(!controller.is_generating());
    }

    #[test]
    fn failed_generate_shows_server_message_and_reenables() {
        let mut controller = fully_selected();
        let mut renderer = RecordingRenderer::default();
        controller
            .on_generate_click("1", "multiple_choice", &mut renderer)
            .unwrap();

        controller.finish_generate(Err(status_error(Some("Quota exceeded"))), &mut renderer);

        assert_eq!(controller.error_text().as_deref(), Some("Quota exceeded"));
        assert!(controller.generate_enabled());
        assert!(!controller.is_generating());
        assert!(renderer.rendered.is_empty());
    }

    #[test]
    fn failed_generate_without_message_uses_fallback_and_keeps_old_questions() {
        let mut controller = fully_selected();
        let mut renderer = RecordingRenderer::default();
        controller.on_generate_click("1", "true_false", &mut renderer).unwrap();
        let first = vec![json!({"question": "Is 2 even?"})];
        controller.finish_generate(Ok(first.clone()), &mut renderer);

        controller.on_generate_click("1", "true_false", &mut renderer).unwrap();
        controller.finish_generate(Err(status_error(None)), &mut renderer);

        assert_eq!(
            controller.error_text().as_deref(),
            Some(GENERATE_FAILURE_FALLBACK)
        );
        assert_eq!(controller.questions(), Some(&first[..]));
    }

    #[test]
    fn ancestor_change_during_generation_keeps_generate_disabled_afterwards() {
        let mut controller = fully_selected();
        let mut renderer = RecordingRenderer::default();
        controller
            .on_generate_click("2", "multiple_choice", &mut renderer)
            .unwrap();

        controller.on_subject_change(Some("2"));
        controller.finish_generate(Ok(vec![json!({"question": "late"})]), &mut renderer);

        assert!(!controller.generate_enabled());
        assert_eq!(renderer.rendered.len(), 1);
    }

    #[test]
    fn unparsable_count_is_sent_as_missing() {
        let mut controller = fully_selected();
        let mut renderer = RecordingRenderer::default();
        let request = controller
            .on_generate_click("many", "multiple_choice", &mut renderer)
            .unwrap();
        assert_eq!(request.num_questions, None);
    }
}

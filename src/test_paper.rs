//! Full test paper assembly: pick one subject and grade, give each strand of
//! that pair a question count, and ask the backend for a sectioned paper.
//!
//! Like [`SelectionController`](crate::SelectionController),
//! [`TestPaperController`] performs no IO. The caller loads the catalog
//! (subjects, grades and every strand) and feeds it back, then runs the
//! request built by [`TestPaperController::request`].

use crate::{
    api::ApiError,
    curriculum::{FilterOption, option_value},
    questions::QuestionView,
    selection::Applied,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// Fallback shown when a test paper request fails without a server message.
pub const TEST_PAPER_FAILURE_FALLBACK: &str =
    "Failed to generate the test paper. Please try again later.";

/// Upper bound for one strand's question count.
pub const MAX_TOPIC_QUESTIONS: u32 = 20;

/// A strand as listed by `/api/strands?all=true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrandEntry {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub subject_id: Option<Value>,
    #[serde(default)]
    pub grade_id: Option<Value>,
}

impl StrandEntry {
    /// Whether the strand belongs to the subject and grade. A strand that
    /// does not name its subject or grade is listed under every pair.
    fn belongs_to(&self, subject: &FilterOption, grade: &FilterOption) -> bool {
        let matches = |owner: &Option<Value>, option: &FilterOption| match owner {
            Some(id) if !id.is_null() => option_value(id) == option.value(),
            _ => true,
        };
        matches(&self.subject_id, subject) && matches(&self.grade_id, grade)
    }
}

/// Everything the test paper form selects from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TestCatalog {
    pub subjects: Vec<FilterOption>,
    pub grades: Vec<FilterOption>,
    pub strands: Vec<StrandEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestTopic {
    pub strand_id: Value,
    pub num_questions: u32,
}

/// Body of `POST /api/tests/generate`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestPaperRequest {
    pub subject_id: Value,
    pub grade_id: Value,
    pub topics: Vec<TestTopic>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TestPaper {
    #[serde(default)]
    pub test_title: Option<String>,
    #[serde(default)]
    pub sections: Vec<TestSection>,
}

impl TestPaper {
    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|section| section.questions.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TestSection {
    #[serde(default)]
    pub section_title: Option<String>,
    #[serde(default)]
    pub questions: Vec<Value>,
}

impl TestSection {
    pub fn views(&self) -> Vec<QuestionView> {
        self.questions.iter().map(QuestionView::from_value).collect()
    }
}

/// Errors surfaced on the test paper view. `Display` is the exact text shown.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TestPaperError {
    #[error("Failed to load data. Please check network connection.")]
    CatalogFailure,
    #[error("Select a subject and a grade before generating a test paper.")]
    MissingSelection,
    #[error("Give at least one strand a question count before generating a test paper.")]
    NoTopics,
    #[error("{0}")]
    GenerateFailure(String),
}

#[derive(Debug, Default)]
pub struct TestPaperController {
    catalog: TestCatalog,
    subject: Option<usize>,
    grade: Option<usize>,
    /// Question count per strand, aligned with `catalog.strands`.
    counts: Vec<u32>,
    generation: u64,
    loading: bool,
    generating: bool,
    error: Option<TestPaperError>,
    paper: Option<TestPaper>,
}

impl TestPaperController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subjects(&self) -> &[FilterOption] {
        &self.catalog.subjects
    }

    pub fn grades(&self) -> &[FilterOption] {
        &self.catalog.grades
    }

    pub fn selected_subject(&self) -> Option<&FilterOption> {
        self.subject.and_then(|index| self.catalog.subjects.get(index))
    }

    pub fn selected_grade(&self) -> Option<&FilterOption> {
        self.grade.and_then(|index| self.catalog.grades.get(index))
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn has_catalog(&self) -> bool {
        !self.catalog.subjects.is_empty()
    }

    pub fn error(&self) -> Option<&TestPaperError> {
        self.error.as_ref()
    }

    pub fn paper(&self) -> Option<&TestPaper> {
        self.paper.as_ref()
    }

    pub fn strand(&self, index: usize) -> Option<&StrandEntry> {
        self.catalog.strands.get(index)
    }

    pub fn count(&self, index: usize) -> u32 {
        self.counts.get(index).copied().unwrap_or_default()
    }

    /// Start a catalog load. The returned generation must accompany the
    /// result handed to [`apply_catalog`](Self::apply_catalog).
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.loading = true;
        self.catalog = TestCatalog::default();
        self.subject = None;
        self.grade = None;
        self.counts.clear();
        self.error = None;
        debug!("TestPaperController: loading catalog (generation {})", self.generation);
        self.generation
    }

    pub fn apply_catalog(
        &mut self,
        generation: u64,
        result: Result<TestCatalog, ApiError>,
    ) -> Applied {
        if generation != self.generation {
            debug!(
                "TestPaperController: dropping stale catalog (generation {} != {})",
                generation, self.generation
            );
            return Applied::Stale;
        }
        self.loading = false;
        match result {
            Ok(catalog) => {
                debug!(
                    "TestPaperController: catalog with {} subject(s), {} grade(s), {} strand(s)",
                    catalog.subjects.len(),
                    catalog.grades.len(),
                    catalog.strands.len()
                );
                self.counts = vec![0; catalog.strands.len()];
                self.catalog = catalog;
            }
            Err(err) => {
                warn!("TestPaperController: catalog load failed: {err}");
                self.error = Some(TestPaperError::CatalogFailure);
            }
        }
        Applied::Current
    }

    pub fn cycle_subject(&mut self, delta: i64) {
        let next = cycle_slot(self.subject, &self.catalog.subjects, delta);
        if next != self.subject {
            self.subject = next;
            self.reset_counts();
        }
    }

    pub fn cycle_grade(&mut self, delta: i64) {
        let next = cycle_slot(self.grade, &self.catalog.grades, delta);
        if next != self.grade {
            self.grade = next;
            self.reset_counts();
        }
    }

    /// Indices of the strands offered for the selected subject and grade,
    /// in catalog order. Empty until both are chosen.
    pub fn visible_strands(&self) -> Vec<usize> {
        let (Some(subject), Some(grade)) = (self.selected_subject(), self.selected_grade()) else {
            return Vec::new();
        };
        self.catalog
            .strands
            .iter()
            .enumerate()
            .filter(|(_, strand)| !option_value(&strand.id).is_empty())
            .filter(|(_, strand)| strand.belongs_to(subject, grade))
            .map(|(index, _)| index)
            .collect()
    }

    pub fn adjust_count(&mut self, strand: usize, delta: i64) {
        if let Some(count) = self.counts.get_mut(strand) {
            *count = (*count as i64 + delta).clamp(0, MAX_TOPIC_QUESTIONS as i64) as u32;
        }
    }

    /// Build the request for the current form and mark a generation as
    /// running. Strands left at zero are not sent.
    pub fn request(&mut self) -> Result<TestPaperRequest, TestPaperError> {
        let (Some(subject), Some(grade)) = (self.selected_subject(), self.selected_grade()) else {
            return Err(TestPaperError::MissingSelection);
        };
        let topics: Vec<TestTopic> = self
            .visible_strands()
            .into_iter()
            .filter(|index| self.count(*index) > 0)
            .map(|index| TestTopic {
                strand_id: self.catalog.strands[index].id.clone(),
                num_questions: self.count(index),
            })
            .collect();
        if topics.is_empty() {
            return Err(TestPaperError::NoTopics);
        }
        let request = TestPaperRequest {
            subject_id: subject.id.clone(),
            grade_id: grade.id.clone(),
            topics,
        };
        debug!(
            "TestPaperController: requesting a paper with {} topic(s)",
            request.topics.len()
        );
        self.generating = true;
        self.error = None;
        self.paper = None;
        Ok(request)
    }

    pub fn finish(&mut self, result: Result<TestPaper, ApiError>) {
        self.generating = false;
        match result {
            Ok(paper) => {
                debug!(
                    "TestPaperController: received {} section(s), {} question(s)",
                    paper.sections.len(),
                    paper.question_count()
                );
                self.paper = Some(paper);
            }
            Err(err) => {
                warn!("TestPaperController: test paper generation failed: {err}");
                let message = err
                    .server_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| TEST_PAPER_FAILURE_FALLBACK.to_string());
                self.error = Some(TestPaperError::GenerateFailure(message));
            }
        }
    }

    fn reset_counts(&mut self) {
        self.counts.iter_mut().for_each(|count| *count = 0);
        self.error = None;
    }
}

/// Step through the options that carry an id, with `None` as the
/// placeholder slot ahead of the first one.
fn cycle_slot(current: Option<usize>, options: &[FilterOption], delta: i64) -> Option<usize> {
    let mut candidates: Vec<usize> = Vec::with_capacity(options.len());
    let mut seen: Vec<String> = Vec::with_capacity(options.len());
    for (index, option) in options.iter().enumerate() {
        let value = option.value();
        if !value.trim().is_empty() && !seen.contains(&value) {
            seen.push(value);
            candidates.push(index);
        }
    }
    let slot = current
        .and_then(|index| candidates.iter().position(|candidate| *candidate == index))
        .map_or(0, |position| position as i64 + 1);
    let next = (slot + delta).rem_euclid(candidates.len() as i64 + 1) as usize;
    next.checked_sub(1).map(|position| candidates[position])
}

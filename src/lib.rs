//! Cascading curriculum selection (Subject, Grade, Strand, Sub-Strand) that
//! resolves a learning outcome and gates exam question generation, full test
//! paper assembly, and the terminal front end that drives both.

pub mod api;
pub mod app;
pub mod config;
pub mod curriculum;
pub mod log_util;
pub mod outcome;
pub mod question_board;
pub mod questions;
pub mod selection;
pub mod test_paper;

mod ui_renderer;
mod view_managers;
mod worker;

pub use app::App;
pub use selection::{SelectionController, SelectionError};

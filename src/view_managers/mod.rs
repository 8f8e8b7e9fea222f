pub mod config_manager;
pub mod generator_manager;
pub mod menu_manager;
pub mod questions_manager;
pub mod test_paper_manager;

pub(crate) use config_manager::ConfigManager;
pub(crate) use generator_manager::GeneratorManager;
pub(crate) use menu_manager::MenuManager;
pub(crate) use questions_manager::QuestionsManager;
pub(crate) use test_paper_manager::TestPaperManager;

use curriculum_quizgen::{App, config, log_util};
use dotenvy::dotenv;

fn main() -> color_eyre::Result<()> {
    dotenv().ok();
    color_eyre::install()?;
    let config_load = config::initialize();
    log_util::init_or_warn(&config::current().log_directory_path());
    let app = App::new(config_load);
    let terminal = ratatui::init();
    let result = app.run(terminal);
    ratatui::restore();
    result
}

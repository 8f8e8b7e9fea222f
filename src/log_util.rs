use color_eyre::eyre::{Context, Result, eyre};
use std::{fs::OpenOptions, path::Path, sync::Mutex};
use tracing_subscriber::EnvFilter;

const LOG_FILENAME: &str = "quizgen-debug.log";
const DEFAULT_FILTER: &str = "curriculum_quizgen=debug";

/// Route `tracing` output to the shared debug log. The terminal belongs to the UI,
/// so nothing is written to stdout or stderr.
pub fn init(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)
        .wrap_err_with(|| format!("failed to create log directory {}", log_dir.display()))?;
    let path = log_dir.join(LOG_FILENAME);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .wrap_err_with(|| format!("failed to open debug log at {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| eyre!("failed to install log subscriber: {err}"))
}

/// Like [`init`], but a log that cannot be opened is reported on stderr and
/// the app carries on without one. Returns whether logging is active.
pub fn init_or_warn(log_dir: &Path) -> bool {
    match init(log_dir) {
        Ok(()) => true,
        Err(err) => {
            eprintln!("quizgen: debug log disabled: {err:#}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unusable_log_directory_is_reported_not_fatal() {
        let blocker =
            std::env::temp_dir().join(format!("quizgen-log-blocker-{}", std::process::id()));
        std::fs::write(&blocker, b"not a directory").unwrap();

        assert!(!init_or_warn(&blocker.join("logs")));
        assert!(init(&blocker).is_err());

        std::fs::remove_file(&blocker).unwrap();
    }
}

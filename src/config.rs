use crate::questions::QuestionType;
use color_eyre::eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::{
    env, fs, io,
    path::PathBuf,
    sync::{OnceLock, RwLock},
    time::Duration,
};

/// Globally accessible application configuration values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url_value")]
    pub api_base_url: String,
    #[serde(default = "default_num_questions_value")]
    pub default_num_questions: u32,
    #[serde(default = "default_question_type_value")]
    pub default_question_type: QuestionType,
    /// Zero disables the timeout; a hung request then spins until restart.
    #[serde(default)]
    pub request_timeout_secs: u64,
    #[serde(default = "default_log_directory_value")]
    pub log_directory: String,
}

impl AppConfig {
    fn normalize(&mut self) {
        let trimmed = self.api_base_url.trim().trim_end_matches('/');
        self.api_base_url = if trimmed.is_empty() {
            DEFAULT_API_BASE_URL.to_string()
        } else {
            trimmed.to_string()
        };
        self.default_num_questions = self
            .default_num_questions
            .clamp(MIN_NUM_QUESTIONS, MAX_NUM_QUESTIONS);
        self.request_timeout_secs = self.request_timeout_secs.min(MAX_TIMEOUT_SECS);
        if self.log_directory.trim().is_empty() {
            self.log_directory = DEFAULT_LOG_DIRECTORY.to_string();
        }
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn log_directory_path(&self) -> PathBuf {
        PathBuf::from(&self.log_directory)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url_value(),
            default_num_questions: DEFAULT_NUM_QUESTIONS,
            default_question_type: default_question_type_value(),
            request_timeout_secs: 0,
            log_directory: default_log_directory_value(),
        }
    }
}

const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_NUM_QUESTIONS: u32 = 5;
const DEFAULT_LOG_DIRECTORY: &str = "output";
pub(crate) const MIN_NUM_QUESTIONS: u32 = 1;
/// Upper bound the backend enforces per request.
pub(crate) const MAX_NUM_QUESTIONS: u32 = 20;
pub(crate) const MAX_TIMEOUT_SECS: u64 = 600;
pub const API_BASE_ENV: &str = "QUIZGEN_API_BASE";

const CONFIG_FILE_PATH: &str = "config/app_config.toml";

static APP_CONFIG: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn config_lock() -> &'static RwLock<AppConfig> {
    APP_CONFIG.get_or_init(|| RwLock::new(AppConfig::default()))
}

/// Attempt to load configuration from disk. If loading fails, the in-memory config will be reset
/// to defaults and the error will be returned for the caller to surface if desired.
pub fn initialize() -> Result<()> {
    let loaded = load_config_from_disk();
    let lock = config_lock();
    let mut config = lock
        .write()
        .map_err(|_| eyre!("configuration lock poisoned"))?;
    match loaded {
        Ok(loaded) => {
            *config = loaded;
            apply_env_overrides(&mut config);
            Ok(())
        }
        Err(err) => {
            *config = AppConfig::default();
            apply_env_overrides(&mut config);
            Err(err)
        }
    }
}

/// Retrieve a clone of the current configuration.
pub fn current() -> AppConfig {
    match config_lock().read() {
        Ok(config) => config.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Apply the provided mutation to the in-memory configuration and persist the result to disk.
pub fn update<F>(mutator: F) -> Result<AppConfig>
where
    F: FnOnce(&mut AppConfig),
{
    apply_update(config_lock(), mutator, save_config_to_disk)
}

/// Mutate a copy, persist it, and only then publish it. A failed save
/// leaves the shared value untouched.
fn apply_update<F, P>(lock: &RwLock<AppConfig>, mutator: F, persist: P) -> Result<AppConfig>
where
    F: FnOnce(&mut AppConfig),
    P: FnOnce(&AppConfig) -> Result<()>,
{
    let mut config = lock
        .write()
        .map_err(|_| eyre!("configuration lock poisoned"))?;
    let mut updated = config.clone();
    mutator(&mut updated);
    updated.normalize();
    persist(&updated)?;
    *config = updated.clone();
    Ok(updated)
}

/// Path of the TOML file used for persistence, relative to the working directory.
pub fn config_file_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_PATH)
}

fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(base) = env::var(API_BASE_ENV) {
        if !base.trim().is_empty() {
            config.api_base_url = base;
            config.normalize();
        }
    }
}

fn load_config_from_disk() -> Result<AppConfig> {
    let path = config_file_path();
    match fs::read_to_string(&path) {
        Ok(contents) => parse_config(&contents)
            .wrap_err_with(|| format!("failed to parse configuration at {}", path.display())),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(err) => Err(eyre!(
            "failed to read configuration at {}: {}",
            path.display(),
            err
        )),
    }
}

fn parse_config(contents: &str) -> Result<AppConfig> {
    let mut config: AppConfig = toml::from_str(contents)?;
    config.normalize();
    Ok(config)
}

fn save_config_to_disk(config: &AppConfig) -> Result<()> {
    let path = config_file_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).wrap_err_with(|| {
            format!(
                "failed to create configuration directory {}",
                parent.display()
            )
        })?;
    }
    let serialized =
        toml::to_string_pretty(config).wrap_err("failed to serialize configuration to TOML")?;
    fs::write(&path, serialized)
        .wrap_err_with(|| format!("failed to write configuration to {}", path.display()))
}

fn default_api_base_url_value() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

const fn default_num_questions_value() -> u32 {
    DEFAULT_NUM_QUESTIONS
}

const fn default_question_type_value() -> QuestionType {
    QuestionType::MultipleChoice
}

fn default_log_directory_value() -> String {
    DEFAULT_LOG_DIRECTORY.to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigField {
    NumQuestions,
    QuestionType,
    RequestTimeout,
    ApiBase,
}

#[derive(Debug, Clone)]
pub struct ConfigForm {
    pub(crate) num_questions: u32,
    pub(crate) question_type: QuestionType,
    pub(crate) request_timeout_secs: u64,
    pub(crate) api_base_url: String,
    editing_api_base: bool,
    api_base_buffer: String,
    field: ConfigField,
    pub(crate) dirty: bool,
    pub(crate) status: Option<String>,
}

impl ConfigForm {
    pub(crate) fn from_config(config: AppConfig) -> Self {
        Self {
            num_questions: config.default_num_questions,
            question_type: config.default_question_type,
            request_timeout_secs: config.request_timeout_secs,
            api_base_url: config.api_base_url,
            editing_api_base: false,
            api_base_buffer: String::new(),
            field: ConfigField::NumQuestions,
            dirty: false,
            status: None,
        }
    }

    pub(crate) fn selected_index(&self) -> usize {
        self.field.index()
    }

    pub(crate) fn select_next(&mut self) {
        self.field = self.field.next();
    }

    pub(crate) fn select_previous(&mut self) {
        self.field = self.field.previous();
    }

    pub(crate) fn adjust_current(&mut self, delta: i64) {
        if delta == 0 {
            return;
        }

        match self.field {
            ConfigField::QuestionType => {
                self.question_type = if delta > 0 {
                    self.question_type.next()
                } else {
                    self.question_type.previous()
                };
                self.mark_dirty();
            }
            ConfigField::NumQuestions => {
                let updated = (i64::from(self.num_questions) + delta).clamp(
                    i64::from(MIN_NUM_QUESTIONS),
                    i64::from(MAX_NUM_QUESTIONS),
                ) as u32;
                if updated != self.num_questions {
                    self.num_questions = updated;
                    self.mark_dirty();
                }
            }
            ConfigField::RequestTimeout => {
                let step = delta.saturating_mul(5);
                let updated = (self.request_timeout_secs as i64 + step)
                    .clamp(0, MAX_TIMEOUT_SECS as i64) as u64;
                if updated != self.request_timeout_secs {
                    self.request_timeout_secs = updated;
                    self.mark_dirty();
                }
            }
            ConfigField::ApiBase => {}
        }
    }

    fn mark_dirty(&mut self) {
        self.dirty = true;
        self.status = None;
    }

    pub(crate) fn apply_saved(&mut self, config: AppConfig) {
        self.num_questions = config.default_num_questions;
        self.question_type = config.default_question_type;
        self.request_timeout_secs = config.request_timeout_secs;
        self.api_base_url = config.api_base_url;
        self.editing_api_base = false;
        self.api_base_buffer.clear();
        self.dirty = false;
        self.status = None;
    }

    pub(crate) fn set_status<S: Into<String>>(&mut self, status: S) {
        self.status = Some(status.into());
    }

    pub(crate) fn is_api_base_selected(&self) -> bool {
        matches!(self.field, ConfigField::ApiBase)
    }

    pub(crate) fn is_editing_api_base(&self) -> bool {
        self.editing_api_base
    }

    pub(crate) fn api_base_buffer(&self) -> &str {
        &self.api_base_buffer
    }

    pub(crate) fn start_editing_api_base(&mut self) {
        self.editing_api_base = true;
        self.api_base_buffer = self.api_base_url.clone();
        self.status = Some("Editing backend URL (Enter to apply, Esc to cancel)".to_string());
    }

    pub(crate) fn cancel_api_base_edit(&mut self) {
        self.editing_api_base = false;
        self.api_base_buffer.clear();
        self.status = Some("Cancelled backend URL edit.".to_string());
    }

    pub(crate) fn apply_api_base_edit(&mut self) {
        let new_value = self.api_base_buffer.trim().to_string();
        if new_value.is_empty() {
            self.status = Some("Backend URL cannot be empty.".to_string());
        } else if new_value != self.api_base_url {
            self.api_base_url = new_value;
            self.dirty = true;
            self.status = Some("Updated backend URL.".to_string());
        } else {
            self.status = Some("Backend URL unchanged.".to_string());
        }
        self.editing_api_base = false;
        self.api_base_buffer.clear();
    }

    pub(crate) fn backspace_api_base(&mut self) {
        self.api_base_buffer.pop();
    }

    pub(crate) fn push_api_base_char(&mut self, ch: char) {
        self.api_base_buffer.push(ch);
    }
}

impl ConfigField {
    fn index(self) -> usize {
        match self {
            Self::NumQuestions => 0,
            Self::QuestionType => 1,
            Self::RequestTimeout => 2,
            Self::ApiBase => 3,
        }
    }

    fn next(self) -> Self {
        match self {
            Self::NumQuestions => Self::QuestionType,
            Self::QuestionType => Self::RequestTimeout,
            Self::RequestTimeout => Self::ApiBase,
            Self::ApiBase => Self::NumQuestions,
        }
    }

    fn previous(self) -> Self {
        match self {
            Self::NumQuestions => Self::ApiBase,
            Self::QuestionType => Self::NumQuestions,
            Self::RequestTimeout => Self::QuestionType,
            Self::ApiBase => Self::RequestTimeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = parse_config("default_num_questions = 8\n").unwrap();
        assert_eq!(config.default_num_questions, 8);
        assert_eq!(config.api_base_url, "http://localhost:5000");
        assert_eq!(config.default_question_type, QuestionType::MultipleChoice);
        assert_eq!(config.request_timeout(), None);
        assert_eq!(config.log_directory, "output");
    }

    #[test]
    fn normalize_clamps_and_trims() {
        let config = parse_config(
            r#"
api_base_url = "http://backend:8080/"
default_num_questions = 99
default_question_type = "true_false"
request_timeout_secs = 30
log_directory = ""
"#,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "http://backend:8080");
        assert_eq!(config.default_num_questions, MAX_NUM_QUESTIONS);
        assert_eq!(config.default_question_type, QuestionType::TrueFalse);
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.log_directory, "output");
    }

    #[test]
    fn unknown_question_type_is_a_parse_error() {
        assert!(parse_config("default_question_type = \"essay\"\n").is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = AppConfig {
            request_timeout_secs: 15,
            default_question_type: QuestionType::FillInTheBlank,
            ..AppConfig::default()
        };
        let serialized = toml::to_string_pretty(&config).unwrap();
        assert_eq!(parse_config(&serialized).unwrap(), config);
    }

    #[test]
    fn form_adjustments_respect_bounds() {
        let mut form = ConfigForm::from_config(AppConfig {
            default_num_questions: MAX_NUM_QUESTIONS,
            ..AppConfig::default()
        });
        form.adjust_current(1);
        assert_eq!(form.num_questions, MAX_NUM_QUESTIONS);
        assert!(!form.dirty);

        form.adjust_current(-1);
        assert_eq!(form.num_questions, MAX_NUM_QUESTIONS - 1);
        assert!(form.dirty);

        form.select_next();
        form.adjust_current(1);
        assert_eq!(form.question_type, QuestionType::ShortAnswer);

        form.select_next();
        form.adjust_current(-1);
        assert_eq!(form.request_timeout_secs, 0);
        form.adjust_current(2);
        assert_eq!(form.request_timeout_secs, 10);
    }

    #[test]
    fn api_base_edit_applies_trimmed_value() {
        let mut form = ConfigForm::from_config(AppConfig::default());
        form.select_previous();
        assert!(form.is_api_base_selected());

        form.start_editing_api_base();
        for _ in 0.."http://localhost:5000".len() {
            form.backspace_api_base();
        }
        for ch in " http://10.0.0.2:5000 ".chars() {
            form.push_api_base_char(ch);
        }
        form.apply_api_base_edit();

        assert_eq!(form.api_base_url, "http://10.0.0.2:5000");
        assert!(form.dirty);
        assert!(!form.is_editing_api_base());
    }

    #[test]
    fn failed_save_keeps_previous_config() {
        let lock = RwLock::new(AppConfig::default());
        let result = apply_update(
            &lock,
            |config| config.api_base_url = "http://elsewhere:9000".to_string(),
            |_| Err(eyre!("disk full")),
        );
        assert!(result.is_err());
        assert_eq!(*lock.read().unwrap(), AppConfig::default());
    }

    #[test]
    fn successful_save_publishes_normalized_config() {
        let lock = RwLock::new(AppConfig::default());
        let mut persisted = None;
        let updated = apply_update(
            &lock,
            |config| {
                config.api_base_url = "http://elsewhere:9000/".to_string();
                config.default_num_questions = 0;
            },
            |config| {
                persisted = Some(config.clone());
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(updated.api_base_url, "http://elsewhere:9000");
        assert_eq!(updated.default_num_questions, MIN_NUM_QUESTIONS);
        assert_eq!(persisted.as_ref(), Some(&updated));
        assert_eq!(*lock.read().unwrap(), updated);
    }
}

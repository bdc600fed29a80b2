use crib_solver::SearchBudgets;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const DEFAULT_ATTEMPTS: usize = 10;
const DEFAULT_MAX_RETRIES: usize = 20;
const DEFAULT_WIN_THRESHOLD: u32 = 61;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root run configuration loaded from YAML. Every block has defaults, so an
/// empty document describes an offline dry run of the sample layout.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RunConfig {
    #[serde(default = "default_run_id")]
    pub run_id: String,
    #[serde(default)]
    pub games: GamesConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub automation: AutomationConfig,
    #[serde(default)]
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            run_id: default_run_id(),
            games: GamesConfig::default(),
            search: SearchConfig::default(),
            layout: LayoutConfig::default(),
            automation: AutomationConfig::default(),
            outputs: OutputsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RunConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: RunConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.games.validate()?;
        self.search.validate()?;
        self.layout.validate()?;
        self.automation.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve output templates (e.g., `{run_id}` placeholders) into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            jsonl: resolve_template(&self.run_id, &self.outputs.jsonl),
            plans_dir: self
                .outputs
                .plans_dir
                .as_deref()
                .map(|template| resolve_template(&self.run_id, template)),
        }
    }

    /// Forces the fixed sample layout and click-free automation.
    pub fn force_offline(&mut self) {
        self.layout.source = LayoutSourceKind::Sample;
        self.automation.driver = DriverKind::DryRun;
    }
}

/// How many games to play.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GamesConfig {
    #[serde(default = "default_attempts")]
    pub attempts: usize,
    /// Replay a game slot after a loss until it is won.
    #[serde(default)]
    pub until_won: bool,
    /// Losses tolerated per slot when `until_won` is set.
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
}

impl Default for GamesConfig {
    fn default() -> Self {
        Self {
            attempts: DEFAULT_ATTEMPTS,
            until_won: false,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl GamesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.attempts == 0 {
            return Err(ValidationError::field(
                "games.attempts",
                "number of attempts must be greater than zero",
            ));
        }
        if self.until_won && self.max_retries == 0 {
            return Err(ValidationError::field(
                "games.max_retries",
                "max_retries must be at least 1 when until_won is set",
            ));
        }
        Ok(())
    }
}

fn default_attempts() -> usize {
    DEFAULT_ATTEMPTS
}

fn default_max_retries() -> usize {
    DEFAULT_MAX_RETRIES
}

/// Search budgets. Unset budgets fall back to `CRIB_WIN_BUDGET` /
/// `CRIB_LOSS_BUDGET` and then to the solver defaults.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchConfig {
    #[serde(default = "default_win_threshold")]
    pub win_threshold: u32,
    #[serde(default)]
    pub win_budget: Option<usize>,
    #[serde(default)]
    pub loss_budget: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            win_threshold: DEFAULT_WIN_THRESHOLD,
            win_budget: None,
            loss_budget: None,
        }
    }
}

impl SearchConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.win_threshold == 0 {
            return Err(ValidationError::field(
                "search.win_threshold",
                "win threshold must be greater than zero",
            ));
        }
        if self.win_budget == Some(0) {
            return Err(ValidationError::field(
                "search.win_budget",
                "budget must be greater than zero",
            ));
        }
        if self.loss_budget == Some(0) {
            return Err(ValidationError::field(
                "search.loss_budget",
                "budget must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn budgets(&self) -> SearchBudgets {
        let env = SearchBudgets::from_env();
        SearchBudgets {
            win: self.win_budget.unwrap_or(env.win),
            loss: self.loss_budget.unwrap_or(env.loss),
        }
    }
}

fn default_win_threshold() -> u32 {
    DEFAULT_WIN_THRESHOLD
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSourceKind {
    #[default]
    Sample,
    Seeded,
    File,
    Command,
}

/// Where initial layouts come from.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct LayoutConfig {
    #[serde(default)]
    pub source: LayoutSourceKind,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
}

impl LayoutConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.source {
            LayoutSourceKind::File if self.path.is_none() => Err(ValidationError::field(
                "layout.path",
                "a layout file path is required when source is 'file'",
            )),
            LayoutSourceKind::Command
                if self.command.as_deref().map(str::trim).unwrap_or("").is_empty() =>
            {
                Err(ValidationError::field(
                    "layout.command",
                    "a recogniser command is required when source is 'command'",
                ))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DriverKind {
    #[default]
    DryRun,
    Command,
}

/// Click automation settings.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AutomationConfig {
    #[serde(default)]
    pub driver: DriverKind,
    /// Program and arguments run once per click; `{x}` and `{y}` are
    /// substituted with screen coordinates.
    #[serde(default)]
    pub click_command: Vec<String>,
    #[serde(default)]
    pub geometry: GeometryConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_card_delay_ms")]
    pub card_delay_ms: u64,
    #[serde(default = "default_new_game_delay_ms")]
    pub new_game_delay_ms: u64,
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            driver: DriverKind::DryRun,
            click_command: Vec::new(),
            geometry: GeometryConfig::default(),
            retry: RetryConfig::default(),
            card_delay_ms: default_card_delay_ms(),
            new_game_delay_ms: default_new_game_delay_ms(),
        }
    }
}

impl AutomationConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.retry.tries == 0 {
            return Err(ValidationError::field(
                "automation.retry.tries",
                "tries must be at least 1",
            ));
        }
        if self.driver == DriverKind::Command {
            let Some(program) = self.click_command.first() else {
                return Err(ValidationError::field(
                    "automation.click_command",
                    "a click command is required for the command driver",
                ));
            };
            if program.trim().is_empty() {
                return Err(ValidationError::field(
                    "automation.click_command",
                    "program must not be empty",
                ));
            }
            let has = |placeholder: &str| {
                self.click_command
                    .iter()
                    .any(|arg| arg.contains(placeholder))
            };
            if !has("{x}") || !has("{y}") {
                return Err(ValidationError::field(
                    "automation.click_command",
                    "click command must reference both {x} and {y}",
                ));
            }
        }
        Ok(())
    }
}

fn default_card_delay_ms() -> u64 {
    250
}

fn default_new_game_delay_ms() -> u64 {
    5_000
}

/// Screen positions of the game window, in pixels.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeometryConfig {
    pub origin_x: i32,
    pub origin_y: i32,
    pub card_width: i32,
    pub card_height: i32,
    pub next_stack: (i32, i32),
    pub new_game: (i32, i32),
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            origin_x: 1250,
            origin_y: 95,
            card_width: 362,
            card_height: 72,
            next_stack: (1980, 1050),
            new_game: (1320, 1050),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetryConfig {
    pub tries: u32,
    pub delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            tries: 3,
            delay_ms: 500,
        }
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    #[serde(default = "default_jsonl")]
    pub jsonl: String,
    #[serde(default)]
    pub plans_dir: Option<String>,
}

impl Default for OutputsConfig {
    fn default() -> Self {
        Self {
            jsonl: default_jsonl(),
            plans_dir: None,
        }
    }
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        let mut entries = vec![("outputs.jsonl", self.jsonl.as_str())];
        if let Some(plans_dir) = self.plans_dir.as_deref() {
            entries.push(("outputs.plans_dir", plans_dir));
        }

        for (label, value) in entries {
            if value.trim().is_empty() {
                return Err(ValidationError::field(label, "path must not be empty"));
            }

            let resolved = resolve_template(run_id, value);
            if resolved.components().count() == 0 {
                return Err(ValidationError::field(label, "resolved path is invalid"));
            }
        }
        Ok(())
    }
}

fn default_jsonl() -> String {
    "runs/{run_id}/games.jsonl".to_string()
}

/// Logging configuration defaults to console output only.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn default_run_id() -> String {
    "offline".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::field("run_id", "run_id must not be empty"));
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::field(
            "run_id",
            "run_id may only contain alphanumeric characters, '.', '_' or '-'",
        ));
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    let replaced = template.replace("{run_id}", run_id);
    PathBuf::from(replaced)
}

/// Fully resolved output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub jsonl: PathBuf,
    pub plans_dir: Option<PathBuf>,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

impl ValidationError {
    fn field(field: &str, message: &str) -> Self {
        ValidationError::InvalidField {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

//! Project configuration for dealflow, read from `.dealflow/dealflow.toml`.
//!
//! Values are layered file → environment → CLI. A missing file means
//! defaults everywhere.
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 3141
//! db_path = ".dealflow/crm.db"
//! dev_mode = false
//!
//! [pipeline]
//! won_stage = "Closed Won"
//! lost_stage = "Closed Lost"
//!
//! [reporting]
//! trend_months = 6
//! top_performers = 5
//! activity_window_days = 7
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! file = false
//! directory = ".dealflow/logs"
//! ```
//!
//! # Environment
//!
//! | Variable           | Overrides            |
//! |--------------------|----------------------|
//! | `DEALFLOW_PORT`    | `server.port`        |
//! | `DEALFLOW_DB_PATH` | `server.db_path`     |
//! | `DEALFLOW_LOG`     | `logging.level`      |
//!
//! A `.env` file in the project directory is loaded first with `dotenvy`;
//! variables already set in the process environment win.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::crm::reporting::ReportOptions;
use crate::crm::server::ServerConfig;

pub const DEALFLOW_DIR: &str = ".dealflow";
pub const CONFIG_FILE: &str = "dealflow.toml";

pub const ENV_PORT: &str = "DEALFLOW_PORT";
pub const ENV_DB_PATH: &str = "DEALFLOW_DB_PATH";
pub const ENV_LOG: &str = "DEALFLOW_LOG";

/// Root of `dealflow.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DealflowToml {
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub reporting: ReportingSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Relative paths resolve against the project directory.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
    #[serde(default)]
    pub dev_mode: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3141
}

fn default_db_path() -> PathBuf {
    PathBuf::from(DEALFLOW_DIR).join("crm.db")
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            dev_mode: false,
        }
    }
}

/// Stage names the reporting engine treats as terminal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSection {
    #[serde(default = "default_won_stage")]
    pub won_stage: String,
    #[serde(default = "default_lost_stage")]
    pub lost_stage: String,
}

fn default_won_stage() -> String {
    "Closed Won".to_string()
}

fn default_lost_stage() -> String {
    "Closed Lost".to_string()
}

impl Default for PipelineSection {
    fn default() -> Self {
        Self {
            won_stage: default_won_stage(),
            lost_stage: default_lost_stage(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportingSection {
    #[serde(default = "default_trend_months")]
    pub trend_months: u32,
    #[serde(default = "default_top_performers")]
    pub top_performers: usize,
    #[serde(default = "default_activity_window_days")]
    pub activity_window_days: i64,
}

fn default_trend_months() -> u32 {
    6
}

fn default_top_performers() -> usize {
    5
}

fn default_activity_window_days() -> i64 {
    7
}

impl Default for ReportingSection {
    fn default() -> Self {
        Self {
            trend_months: default_trend_months(),
            top_performers: default_top_performers(),
            activity_window_days: default_activity_window_days(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// An `EnvFilter` directive such as `info` or `dealflow=debug,tower_http=info`.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    /// Also write a daily rolling log file.
    #[serde(default)]
    pub file: bool,
    /// Log file directory, `.dealflow/logs` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            file: false,
            directory: None,
        }
    }
}

impl DealflowToml {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse dealflow.toml")
    }

    /// Load from `<dealflow_dir>/dealflow.toml`, or defaults when absent.
    pub fn load_or_default(dealflow_dir: &Path) -> Result<Self> {
        let path = dealflow_dir.join(CONFIG_FILE);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))
    }

    /// Non-fatal problems worth showing the user.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; an ephemeral port will be chosen".to_string());
        }
        if self.pipeline.won_stage.trim().is_empty() || self.pipeline.lost_stage.trim().is_empty()
        {
            warnings.push("pipeline.won_stage and pipeline.lost_stage must be set".to_string());
        } else if self
            .pipeline
            .won_stage
            .eq_ignore_ascii_case(&self.pipeline.lost_stage)
        {
            warnings.push(format!(
                "pipeline.won_stage and pipeline.lost_stage are both '{}'",
                self.pipeline.won_stage
            ));
        }
        if self.reporting.trend_months == 0 {
            warnings.push("reporting.trend_months is 0; the revenue trend will be empty".to_string());
        } else if self.reporting.trend_months > 36 {
            warnings.push(format!(
                "reporting.trend_months = {} is unusually large",
                self.reporting.trend_months
            ));
        }
        if self.reporting.top_performers == 0 {
            warnings.push("reporting.top_performers is 0; rankings will be empty".to_string());
        }
        if self.reporting.activity_window_days <= 0 {
            warnings.push(format!(
                "reporting.activity_window_days = {} counts no activity",
                self.reporting.activity_window_days
            ));
        }
        if tracing_subscriber::EnvFilter::try_new(&self.logging.level).is_err() {
            warnings.push(format!(
                "logging.level '{}' is not a valid filter directive",
                self.logging.level
            ));
        }

        warnings
    }
}

/// Resolved configuration for one project directory.
#[derive(Debug, Clone)]
pub struct DealflowConfig {
    pub project_dir: PathBuf,
    pub dealflow_dir: PathBuf,
    pub toml: DealflowToml,
    pub verbose: bool,
    pub cli_port: Option<u16>,
    pub cli_db_path: Option<PathBuf>,
    pub cli_dev_mode: bool,
}

impl DealflowConfig {
    /// Read `.dealflow/dealflow.toml` under `project_dir` and load `.env`.
    pub fn new(project_dir: PathBuf) -> Result<Self> {
        let project_dir = project_dir
            .canonicalize()
            .context("Failed to resolve project directory")?;
        let dealflow_dir = project_dir.join(DEALFLOW_DIR);
        let toml = DealflowToml::load_or_default(&dealflow_dir)?;

        let env_file = project_dir.join(".env");
        if env_file.exists() {
            dotenvy::from_path(&env_file)
                .with_context(|| format!("Failed to load {}", env_file.display()))?;
        }

        Ok(Self {
            project_dir,
            dealflow_dir,
            toml,
            verbose: false,
            cli_port: None,
            cli_db_path: None,
            cli_dev_mode: false,
        })
    }

    pub fn with_cli_args(project_dir: PathBuf, verbose: bool) -> Result<Self> {
        let mut config = Self::new(project_dir)?;
        config.verbose = verbose;
        Ok(config)
    }

    pub fn config_path(&self) -> PathBuf {
        self.dealflow_dir.join(CONFIG_FILE)
    }

    pub fn is_initialized(&self) -> bool {
        self.config_path().exists()
    }

    /// CLI → `DEALFLOW_PORT` → file.
    pub fn port(&self) -> Result<u16> {
        if let Some(port) = self.cli_port {
            return Ok(port);
        }
        match std::env::var(ENV_PORT) {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("{} is not a valid port: '{}'", ENV_PORT, raw)),
            Err(_) => Ok(self.toml.server.port),
        }
    }

    /// CLI → `DEALFLOW_DB_PATH` → file, resolved against the project directory.
    pub fn db_path(&self) -> PathBuf {
        let raw = self
            .cli_db_path
            .clone()
            .or_else(|| std::env::var(ENV_DB_PATH).ok().map(PathBuf::from))
            .unwrap_or_else(|| self.toml.server.db_path.clone());
        self.resolve(raw)
    }

    /// `--verbose` → `DEALFLOW_LOG` → file.
    pub fn log_level(&self) -> String {
        if self.verbose {
            return "debug".to_string();
        }
        std::env::var(ENV_LOG).unwrap_or_else(|_| self.toml.logging.level.clone())
    }

    pub fn log_dir(&self) -> PathBuf {
        match &self.toml.logging.directory {
            Some(dir) => self.resolve(dir.clone()),
            None => self.dealflow_dir.join("logs"),
        }
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions {
            won_stage: self.toml.pipeline.won_stage.clone(),
            lost_stage: self.toml.pipeline.lost_stage.clone(),
            trend_months: self.toml.reporting.trend_months,
            top_performers: self.toml.reporting.top_performers,
            activity_window_days: self.toml.reporting.activity_window_days,
        }
    }

    pub fn server_config(&self) -> Result<ServerConfig> {
        Ok(ServerConfig {
            host: self.toml.server.host.clone(),
            port: self.port()?,
            db_path: self.db_path(),
            dev_mode: self.cli_dev_mode || self.toml.server.dev_mode,
            offline: false,
            fixtures: None,
            reports: self.report_options(),
        })
    }

    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.toml.validate();
        if let Ok(raw) = std::env::var(ENV_PORT)
            && raw.trim().parse::<u16>().is_err()
        {
            warnings.push(format!("{} is not a valid port: '{}'", ENV_PORT, raw));
        }
        warnings
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        if path.is_absolute() {
            path
        } else {
            self.project_dir.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::tempdir;

    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    fn clear_env() {
        unsafe {
            std::env::remove_var(ENV_PORT);
            std::env::remove_var(ENV_DB_PATH);
            std::env::remove_var(ENV_LOG);
        }
    }

    #[test]
    fn test_parse_empty_uses_defaults() {
        let toml = DealflowToml::parse("").unwrap();
        assert_eq!(toml, DealflowToml::default());
        assert_eq!(toml.server.port, 3141);
        assert_eq!(toml.pipeline.won_stage, "Closed Won");
        assert_eq!(toml.reporting.trend_months, 6);
        assert_eq!(toml.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_parse_partial_sections() {
        let toml = DealflowToml::parse(
            r#"
[server]
port = 8080

[pipeline]
won_stage = "Won"

[logging]
format = "json"
file = true
"#,
        )
        .unwrap();
        assert_eq!(toml.server.port, 8080);
        assert_eq!(toml.server.host, "127.0.0.1");
        assert_eq!(toml.pipeline.won_stage, "Won");
        assert_eq!(toml.pipeline.lost_stage, "Closed Lost");
        assert_eq!(toml.logging.format, LogFormat::Json);
        assert!(toml.logging.file);
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        assert!(DealflowToml::parse("[server]\nport = \"eighty\"").is_err());
        assert!(DealflowToml::parse("[logging]\nformat = \"xml\"").is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut toml = DealflowToml::default();
        toml.reporting.top_performers = 10;
        toml.logging.directory = Some(PathBuf::from("/var/log/dealflow"));
        toml.save(&path).unwrap();

        let loaded = DealflowToml::load(&path).unwrap();
        assert_eq!(loaded, toml);
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempdir().unwrap();
        let toml = DealflowToml::load_or_default(dir.path()).unwrap();
        assert_eq!(toml, DealflowToml::default());
    }

    #[test]
    fn test_validate_defaults_clean() {
        assert!(DealflowToml::default().validate().is_empty());
    }

    #[test]
    fn test_validate_reports_problems() {
        let mut toml = DealflowToml::default();
        toml.pipeline.lost_stage = "closed won".to_string();
        toml.reporting.trend_months = 0;
        toml.reporting.activity_window_days = -1;
        toml.logging.level = "dealflow=loud".to_string();

        let warnings = toml.validate();
        assert_eq!(warnings.len(), 4, "{:?}", warnings);
        assert!(warnings.iter().any(|w| w.contains("both")));
        assert!(warnings.iter().any(|w| w.contains("trend_months")));
        assert!(warnings.iter().any(|w| w.contains("activity_window_days")));
        assert!(warnings.iter().any(|w| w.contains("logging.level")));
    }

    #[test]
    fn test_config_reads_project_file() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let dir = tempdir().unwrap();
        let dealflow_dir = dir.path().join(DEALFLOW_DIR);
        std::fs::create_dir_all(&dealflow_dir).unwrap();
        std::fs::write(
            dealflow_dir.join(CONFIG_FILE),
            "[server]\nport = 9000\ndb_path = \"data/crm.db\"\n",
        )
        .unwrap();

        let config = DealflowConfig::new(dir.path().to_path_buf()).unwrap();
        assert!(config.is_initialized());
        assert_eq!(config.port().unwrap(), 9000);
        assert!(config.db_path().is_absolute());
        assert!(config.db_path().ends_with("data/crm.db"));
        assert!(config.log_dir().ends_with(".dealflow/logs"));
    }

    #[test]
    fn test_env_overrides_file_and_cli_overrides_env() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let dir = tempdir().unwrap();
        let mut config = DealflowConfig::new(dir.path().to_path_buf()).unwrap();
        assert!(!config.is_initialized());
        assert_eq!(config.port().unwrap(), 3141);

        unsafe {
            std::env::set_var(ENV_PORT, "4000");
            std::env::set_var(ENV_DB_PATH, "/tmp/env.db");
            std::env::set_var(ENV_LOG, "warn");
        }
        assert_eq!(config.port().unwrap(), 4000);
        assert_eq!(config.db_path(), PathBuf::from("/tmp/env.db"));
        assert_eq!(config.log_level(), "warn");

        config.cli_port = Some(5000);
        config.verbose = true;
        assert_eq!(config.port().unwrap(), 5000);
        assert_eq!(config.log_level(), "debug");

        clear_env();
    }

    #[test]
    fn test_invalid_env_port_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let dir = tempdir().unwrap();
        let config = DealflowConfig::new(dir.path().to_path_buf()).unwrap();
        unsafe { std::env::set_var(ENV_PORT, "not-a-port") };
        assert!(config.port().is_err());
        assert!(config.validate().iter().any(|w| w.contains(ENV_PORT)));

        clear_env();
    }

    #[test]
    fn test_dotenv_file_is_loaded() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "DEALFLOW_LOG=trace\n").unwrap();
        let config = DealflowConfig::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(config.log_level(), "trace");

        clear_env();
    }

    #[test]
    fn test_report_options_follow_file() {
        let mut toml = DealflowToml::default();
        toml.pipeline.won_stage = "Won".to_string();
        toml.reporting.activity_window_days = 14;
        let dir = tempdir().unwrap();
        let mut config = DealflowConfig::new(dir.path().to_path_buf()).unwrap();
        config.toml = toml;

        let options = config.report_options();
        assert_eq!(options.won_stage, "Won");
        assert_eq!(options.lost_stage, "Closed Lost");
        assert_eq!(options.activity_window_days, 14);
    }
}
